// ==========================================
// ACA 普查导入 - 重试执行器
// ==========================================
// 策略: 线性退避，第 n 次失败后等待 base × n，最多尝试 max_attempts 次
// 示例: max=3, base=1s → 失败后依次等待 1s、2s，第 3 次失败即放弃
// 约束: 最后一次失败后不再等待；返回最后一次的错误
// ==========================================

use crate::config::ImportConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 重试耗尽后的错误（保留实际尝试次数与最后一次错误）
#[derive(Debug, Clone, PartialEq)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "尝试 {} 次后失败: {}", self.attempts, self.last_error)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

// ==========================================
// RetryPolicy
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// max_attempts 为 0 时按 1 处理（至少执行一次）
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 attempt 次失败后的等待时长
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// 任意错误都重试
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.execute_if(op, |_| true).await
    }

    /// 仅当 `should_retry` 判定为可重试时重试，否则立即返回该错误
    pub async fn execute_if<T, E, F, Fut, P>(
        &self,
        mut op: F,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "重试后成功");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_attempts && should_retry(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "调用失败，等待后重试"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(RetryError {
                        attempts: attempt,
                        last_error: e,
                    })
                }
            }
        }
    }
}
