// ==========================================
// ACA 普查导入 - 批调度器
// ==========================================
// 调度规则:
// - 按文件顺序切成固定大小的批（最后一批可不足）
// - 批与批严格串行：上一批全部结束才开始下一批
// - 批内并发处理，同时在途不超过 concurrency
// - 每行恰好产生一个 RowOutcome（处理函数 panic 也不例外）
// ==========================================

use crate::config::ImportConfig;
use crate::domain::report::RowOutcome;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error, info};

pub struct BatchScheduler {
    batch_size: usize,
    concurrency: usize,
}

impl BatchScheduler {
    /// 0 值按 1 处理
    pub fn new(batch_size: usize, concurrency: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.batch_size, config.concurrency)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 给定行数需要的批数
    pub fn batch_count(&self, total_rows: usize) -> usize {
        (total_rows + self.batch_size - 1) / self.batch_size
    }

    /// 执行调度
    ///
    /// # 参数
    /// - items: 待处理行（文件顺序）
    /// - process: 单行处理（校验 + 落库），返回该行结果
    /// - on_panic: 单行处理 panic 时构造失败结果
    /// - on_outcome: 结果回调（批内按完成顺序）
    ///
    /// # 返回
    /// - 实际执行的批数
    pub async fn run<T, F, Fut, P, S>(
        &self,
        items: Vec<T>,
        process: F,
        on_panic: P,
        mut on_outcome: S,
    ) -> usize
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = RowOutcome>,
        P: Fn(T, String) -> RowOutcome,
        S: FnMut(RowOutcome),
    {
        let total_batches = self.batch_count(items.len());
        let mut rows = items.into_iter();
        let mut batch_no = 0;

        loop {
            let batch: Vec<T> = rows.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            batch_no += 1;

            let batch_len = batch.len();
            let started = Instant::now();
            debug!(batch = batch_no, total_batches, rows = batch_len, "批次开始");

            let mut pending = batch.into_iter();
            let mut in_flight = FuturesUnordered::new();
            for item in pending.by_ref().take(self.concurrency) {
                in_flight.push(guarded(&process, &on_panic, item));
            }

            let mut failed = 0usize;
            while let Some(outcome) = in_flight.next().await {
                if !outcome.success {
                    failed += 1;
                }
                on_outcome(outcome);
                if let Some(item) = pending.next() {
                    in_flight.push(guarded(&process, &on_panic, item));
                }
            }

            info!(
                batch = batch_no,
                total_batches,
                rows = batch_len,
                failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "批次完成"
            );
        }

        batch_no
    }
}

/// 执行单行处理，panic 转为失败结果
async fn guarded<T, F, Fut, P>(process: &F, on_panic: &P, item: T) -> RowOutcome
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = RowOutcome>,
    P: Fn(T, String) -> RowOutcome,
{
    let backup = item.clone();
    match AssertUnwindSafe(async { process(item).await })
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "单行处理 panic，按失败计入");
            on_panic(backup, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知 panic".to_string()
    }
}
