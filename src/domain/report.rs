// ==========================================
// ACA 普查导入 - 行错误与导入结果
// ==========================================
// 不变量: processed_rows + failed_rows == total_rows
// 不变量: errors.len() <= failed_rows
// ==========================================

use crate::domain::record::Row;
use crate::domain::types::EntityType;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

// ==========================================
// RowErrorKind - 行错误分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowErrorKind {
    MissingField, // 必填字段为空
    Validation,   // 字段类型/格式校验失败
    Parsing,      // 分词层结构错误（保留）
    Database,     // 落库调用失败（含重试耗尽）
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::MissingField => write!(f, "MissingField"),
            RowErrorKind::Validation => write!(f, "Validation"),
            RowErrorKind::Parsing => write!(f, "Parsing"),
            RowErrorKind::Database => write!(f, "Database"),
        }
    }
}

// ==========================================
// RowError - 行级错误记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,         // 源文件物理行号（表头为第 1 行）
    pub row_data: Row,             // 原始行（诊断用）
    pub error_kind: RowErrorKind,  // 错误分类
    pub message: String,           // 错误描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,     // 出错字段（表头标签）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,  // 期望格式
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,  // 实际值
}

impl RowError {
    pub fn new(
        row_number: usize,
        row_data: Row,
        error_kind: RowErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            row_data,
            error_kind,
            message: message.into(),
            field: None,
            expected: None,
            received: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_received(mut self, received: impl Into<String>) -> Self {
        self.received = Some(received.into());
        self
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第 {} 行 [{}]: {}", self.row_number, self.error_kind, self.message)
    }
}

// ==========================================
// RowOutcome - 单行处理结果（仅用于汇总）
// ==========================================
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub row_number: usize,
    pub success: bool,
    pub elapsed: Duration,
    pub error: Option<RowError>,
}

impl RowOutcome {
    pub fn processed(row_number: usize, elapsed: Duration) -> Self {
        Self {
            row_number,
            success: true,
            elapsed,
            error: None,
        }
    }

    pub fn failed(error: RowError, elapsed: Duration) -> Self {
        Self {
            row_number: error.row_number,
            success: false,
            elapsed,
            error: Some(error),
        }
    }
}

// ==========================================
// PerformanceStats - 性能统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_time_ms: u64,        // 总耗时（含分词）
    pub parse_time_ms: u64,        // 分词耗时
    pub db_time_ms: u64,           // 批处理（校验 + 落库）墙钟耗时
    pub avg_row_time_ms: f64,      // 单行平均耗时
    pub min_row_time_ms: u64,      // 单行最短耗时
    pub max_row_time_ms: u64,      // 单行最长耗时
    pub throughput_rows_per_sec: u64, // 成功行数 / 总耗时秒
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
// 构建完成后不可变
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub import_id: String,
    pub file_name: String,
    pub entity_type: EntityType,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub failed_rows: usize,
    pub errors: Vec<RowError>,
    pub performance: PerformanceStats,
}

impl ImportResult {
    /// 是否所有行都成功
    pub fn is_clean(&self) -> bool {
        self.failed_rows == 0
    }
}
