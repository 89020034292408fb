// ==========================================
// ACA 普查导入 - 落库目标 Trait
// ==========================================
// 职责: 定义按实体类型 upsert 一条规范化记录的接口
// 红线: 落库目标不含校验逻辑，只接收已规范化的参数
// ==========================================

use crate::domain::record::NormalizedRecord;
use crate::domain::types::EntityType;
use crate::repository::error::SinkError;
use async_trait::async_trait;
use serde::Serialize;

// ==========================================
// SinkCall - 一次落库调用
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkCall {
    pub entity_type: EntityType,
    pub operation: &'static str, // 如 upsert_employee_census
    pub record_key: String,      // 自然键值以 `|` 拼接
    pub params: NormalizedRecord,
}

// ==========================================
// SinkResponse - 落库响应
// ==========================================
// 目标端可能"正常返回但声明失败"，由分发器转为错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl SinkResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ==========================================
// RecordSink Trait
// ==========================================
// 用途: 外部持久化目标
// 实现者: SqliteRecordSink（测试中另有桩实现）
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 以自然键 upsert 一条记录
    ///
    /// # 参数
    /// - call: 操作名 + 自然键 + 规范化参数
    ///
    /// # 返回
    /// - Ok(SinkResponse): 目标端响应（success=false 视为失败）
    /// - Err(SinkError): 调用失败（限流/连接/存储）
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError>;
}
