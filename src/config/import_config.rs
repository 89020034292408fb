// ==========================================
// ACA 普查导入 - 导入运行参数
// ==========================================
// 职责: 批大小 / 批内并发 / 重试 / 超时 / 错误上限
// 来源: 默认值 ← config_kv(global) ← 命令行覆写
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("配置值无效: key={key}, value={value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置锁获取失败: {0}")]
    LockError(String),

    #[error("配置存储访问失败: {0}")]
    StorageError(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::StorageError(err.to_string())
    }
}

// ==========================================
// ImportConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub batch_size: usize,              // 每批行数
    pub concurrency: usize,             // 批内最大同时在途行数
    pub max_attempts: u32,              // 单行落库最大尝试次数（含首次）
    pub base_delay_ms: u64,             // 线性退避基数: 第 n 次失败后等待 base × n
    pub call_timeout_ms: Option<u64>,   // 单次落库调用超时（None 不限）
    pub max_reported_errors: usize,     // 报告中保留的错误明细上限
}

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 1_000;

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            call_timeout_ms: None,
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }
}

impl ImportConfig {
    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(key: &str, value: impl ToString, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.batch_size == 0 {
            return Err(invalid("batch_size", self.batch_size, "必须大于 0"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency", self.concurrency, "必须大于 0"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", self.max_attempts, "必须大于 0"));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(invalid("call_timeout_ms", 0, "必须大于 0 或不设置"));
        }
        Ok(())
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}
