// ==========================================
// ACA 普查导入 - 落库层错误类型
// ==========================================
// 范围: 单次落库调用失败（由重试执行器决定是否重试）
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 限流识别标记（小写比较）
const RATE_LIMIT_MARKERS: [&str; 3] = ["rate limit", "429", "too many requests"];

/// 落库错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    // ===== 目标端拒绝 =====
    #[error("落库被限流: {0}")]
    RateLimited(String),

    #[error("落库被拒绝: {0}")]
    Rejected(String),

    // ===== 连接 / 超时 =====
    #[error("落库连接失败: {0}")]
    ConnectionError(String),

    #[error("落库调用超时: {0}ms")]
    Timeout(u64),

    // ===== 存储错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库写入失败: {0}")]
    StorageError(String),

    #[error("参数序列化失败: {0}")]
    SerializationError(String),
}

impl SinkError {
    /// 是否为限流类错误
    ///
    /// 显式 RateLimited 变体，或目标端拒绝/连接错误的原始消息带限流标记；
    /// 超时等格式化数值不参与匹配
    pub fn is_rate_limited(&self) -> bool {
        match self {
            SinkError::RateLimited(_) => true,
            SinkError::Rejected(message) | SinkError::ConnectionError(message) => {
                let message = message.to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m))
            }
            _ => false,
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for SinkError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                SinkError::ConnectionError(msg.unwrap_or_else(|| e.to_string()))
            }
            _ => SinkError::StorageError(err.to_string()),
        }
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type SinkResult<T> = Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(SinkError::RateLimited("slow down".into()).is_rate_limited());
        assert!(SinkError::Rejected("HTTP 429".into()).is_rate_limited());
        assert!(SinkError::ConnectionError("Too Many Requests".into()).is_rate_limited());
        assert!(SinkError::Rejected("Rate Limit exceeded".into()).is_rate_limited());

        assert!(!SinkError::Rejected("constraint failed".into()).is_rate_limited());
        assert!(!SinkError::Timeout(500).is_rate_limited());
    }

    #[test]
    fn test_timeout_of_429ms_is_not_rate_limited() {
        let err = SinkError::Timeout(429);
        assert!(err.to_string().contains("429"));
        assert!(!err.is_rate_limited());
        assert!(!SinkError::StorageError("page 429 corrupt".into()).is_rate_limited());
    }
}
