// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试用落库桩、临时文件与导入器构造
// ==========================================

#![allow(dead_code)]

use aca_census_import::config::ImportConfig;
use aca_census_import::importer::RecordImporterImpl;
use aca_census_import::repository::{RecordSink, SinkCall, SinkError, SinkResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 测试用固定处理日期
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

/// 重试等待压到 1ms 的导入配置
pub fn fast_config() -> ImportConfig {
    ImportConfig {
        base_delay_ms: 1,
        ..ImportConfig::default()
    }
}

/// 以指定落库目标创建导入器（固定处理日期）
pub fn create_importer(sink: Arc<dyn RecordSink>, config: ImportConfig) -> RecordImporterImpl {
    RecordImporterImpl::new(sink, config)
        .expect("Failed to create RecordImporterImpl")
        .with_today(test_today())
}

/// 写入临时 CSV 文件
///
/// # 返回
/// - NamedTempFile: 临时文件（需要保持存活）
pub fn write_temp_csv(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp csv");
    temp_file
        .write_all(content.as_bytes())
        .expect("Failed to write temp csv");
    temp_file.flush().expect("Failed to flush temp csv");
    temp_file
}

/// 生成 N 行工时 CSV（员工 E0001 起）
pub fn payroll_hours_csv(rows: usize) -> String {
    let mut csv = String::from("Employee ID,Pay Period Start,Hours Worked\n");
    for i in 1..=rows {
        csv.push_str(&format!("E{:04},2024-01-01,{}\n", i, 30 + i % 20));
    }
    csv
}

// ==========================================
// 落库桩
// ==========================================

/// 记录所有调用、全部成功
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.record_key.clone())
            .collect()
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(SinkResponse::ok())
    }
}

/// 每个键前 N 次失败，之后成功
pub struct FlakySink {
    failures_per_key: usize,
    error: SinkError,
    attempts: Mutex<HashMap<String, usize>>,
    pub total_calls: AtomicUsize,
}

impl FlakySink {
    pub fn new(failures_per_key: usize) -> Self {
        Self::with_error(failures_per_key, SinkError::ConnectionError("连接被重置".to_string()))
    }

    /// 以限流错误失败
    pub fn rate_limited(failures_per_key: usize) -> Self {
        Self::with_error(failures_per_key, SinkError::RateLimited("429 Too Many Requests".to_string()))
    }

    fn with_error(failures_per_key: usize, error: SinkError) -> Self {
        Self {
            failures_per_key,
            error,
            attempts: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn attempts_for(&self, key: &str) -> usize {
        self.attempts.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RecordSink for FlakySink {
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(call.record_key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        if attempt <= self.failures_per_key {
            Err(self.error.clone())
        } else {
            Ok(SinkResponse::ok())
        }
    }
}

/// 指定键永远失败，其余成功
pub struct SelectiveFailSink {
    failing_keys: Vec<String>,
    pub total_calls: AtomicUsize,
}

impl SelectiveFailSink {
    pub fn new(failing_keys: &[&str]) -> Self {
        Self {
            failing_keys: failing_keys.iter().map(|k| k.to_string()).collect(),
            total_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordSink for SelectiveFailSink {
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.iter().any(|k| call.record_key.starts_with(k.as_str())) {
            Err(SinkError::StorageError("disk I/O error".to_string()))
        } else {
            Ok(SinkResponse::ok())
        }
    }
}

/// 目标端以 success=false 拒绝
pub struct RejectingSink;

#[async_trait]
impl RecordSink for RejectingSink {
    async fn upsert(&self, _call: &SinkCall) -> Result<SinkResponse, SinkError> {
        Ok(SinkResponse::failed("duplicate key violates unique constraint"))
    }
}

/// 行越靠后失败越快（模拟批内完成顺序与文件顺序相反）
pub struct LateRowsFailFirstSink;

#[async_trait]
impl RecordSink for LateRowsFailFirstSink {
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
        let seq: u64 = call
            .record_key
            .split('|')
            .next()
            .and_then(|id| id.parse().ok())
            .unwrap_or(0);
        let delay_ms = 20u64.saturating_sub(seq) * 5;
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        Err(SinkError::StorageError(format!("row {} rejected", seq)))
    }
}
