// ==========================================
// ACA 普查导入 - 落库分发器
// ==========================================
// 职责:
// - (实体类型, 规范化记录) → 落库调用（操作名 + 自然键 + 参数）
// - 执行单次调用；响应声明失败 / 超时统一转为 SinkError
// 约束: 不做重试，重试由 RetryPolicy 包裹
// ==========================================

use crate::domain::record::NormalizedRecord;
use crate::importer::schema::Schema;
use crate::repository::{RecordSink, SinkCall, SinkError};
use std::sync::Arc;
use std::time::Duration;

/// 自然键分隔符
pub const RECORD_KEY_SEPARATOR: &str = "|";

pub struct SinkDispatcher {
    sink: Arc<dyn RecordSink>,
    call_timeout: Option<Duration>,
}

impl SinkDispatcher {
    pub fn new(sink: Arc<dyn RecordSink>, call_timeout: Option<Duration>) -> Self {
        Self { sink, call_timeout }
    }

    /// 构造落库调用
    ///
    /// 自然键取模式声明的键字段规范值，以 `|` 拼接（null 取空段）；
    /// 全部键字段为 null 时自然键为空串，由落库目标拒绝
    pub fn build_call(schema: &Schema, params: NormalizedRecord) -> SinkCall {
        let parts: Vec<String> = schema
            .key_fields
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            })
            .collect();

        let record_key = if parts.iter().all(String::is_empty) {
            String::new()
        } else {
            parts.join(RECORD_KEY_SEPARATOR)
        };

        SinkCall {
            entity_type: schema.entity_type,
            operation: schema.operation,
            record_key,
            params,
        }
    }

    /// 执行一次落库调用
    pub async fn dispatch(&self, call: &SinkCall) -> Result<(), SinkError> {
        let response = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.sink.upsert(call))
                .await
                .map_err(|_| SinkError::Timeout(limit.as_millis() as u64))??,
            None => self.sink.upsert(call).await?,
        };

        if response.success {
            Ok(())
        } else {
            Err(SinkError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| format!("{} 返回失败", call.operation)),
            ))
        }
    }
}
