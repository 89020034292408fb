// ==========================================
// ACA 普查导入 - 汇总报告构建器
// ==========================================
// 职责:
// - 逐行累积结果（成功/失败、单行耗时、错误明细）
// - 完成时计算计数与性能统计，生成不可变 ImportResult
// 不变量: processed + failed == total；errors.len() <= failed
// 约束: 错误明细超过上限时保留行号最小的 N 条，其余只计数
// ==========================================

use crate::domain::report::{ImportResult, PerformanceStats, RowError, RowOutcome};
use crate::domain::types::EntityType;
use crate::importer::error::ImportError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct ReportBuilder {
    import_id: String,
    file_name: String,
    entity_type: EntityType,
    started: Instant,
    max_reported_errors: usize,

    total_rows: usize,
    processed_rows: usize,
    failed_rows: usize,
    errors: BinaryHeap<ByRowNumber>,
    dropped_errors: usize,

    parse_time: Duration,
    db_time: Duration,
    row_time_sum: Duration,
    row_time_min: Option<Duration>,
    row_time_max: Duration,
}

impl ReportBuilder {
    /// 开始计时
    pub fn new(
        import_id: impl Into<String>,
        file_name: impl Into<String>,
        entity_type: EntityType,
        max_reported_errors: usize,
    ) -> Self {
        Self::started_at(
            import_id,
            file_name,
            entity_type,
            max_reported_errors,
            Instant::now(),
        )
    }

    /// 指定起始时刻（总耗时需覆盖构建器创建之前的读文件/分词时）
    pub fn started_at(
        import_id: impl Into<String>,
        file_name: impl Into<String>,
        entity_type: EntityType,
        max_reported_errors: usize,
        started: Instant,
    ) -> Self {
        Self {
            import_id: import_id.into(),
            file_name: file_name.into(),
            entity_type,
            started,
            max_reported_errors,
            total_rows: 0,
            processed_rows: 0,
            failed_rows: 0,
            errors: BinaryHeap::new(),
            dropped_errors: 0,
            parse_time: Duration::ZERO,
            db_time: Duration::ZERO,
            row_time_sum: Duration::ZERO,
            row_time_min: None,
            row_time_max: Duration::ZERO,
        }
    }

    pub fn set_total_rows(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
    }

    pub fn record_parse_time(&mut self, elapsed: Duration) {
        self.parse_time = elapsed;
    }

    pub fn record_db_time(&mut self, elapsed: Duration) {
        self.db_time = elapsed;
    }

    /// 累积单行结果
    pub fn record(&mut self, outcome: RowOutcome) {
        self.row_time_sum += outcome.elapsed;
        self.row_time_max = self.row_time_max.max(outcome.elapsed);
        self.row_time_min = Some(match self.row_time_min {
            Some(min) => min.min(outcome.elapsed),
            None => outcome.elapsed,
        });

        if outcome.success {
            self.processed_rows += 1;
            return;
        }

        self.failed_rows += 1;
        if let Some(error) = outcome.error {
            self.keep_error(error);
        }
    }

    /// 按行号保留最靠前的错误（批内完成顺序与文件顺序无关）
    fn keep_error(&mut self, error: RowError) {
        if self.errors.len() < self.max_reported_errors {
            self.errors.push(ByRowNumber(error));
            return;
        }

        self.dropped_errors += 1;
        let evict = matches!(
            self.errors.peek(),
            Some(last) if error.row_number < last.0.row_number
        );
        if evict {
            self.errors.pop();
            self.errors.push(ByRowNumber(error));
        }
    }

    pub fn failed_rows(&self) -> usize {
        self.failed_rows
    }

    /// 生成最终结果
    pub fn build(mut self) -> ImportResult {
        let total_time = self.started.elapsed();

        // 未产生结果的行按失败计入
        let accounted = self.processed_rows + self.failed_rows;
        if accounted < self.total_rows {
            warn!(
                missing = self.total_rows - accounted,
                "部分行未产生处理结果，按失败计入"
            );
            self.failed_rows = self.total_rows - self.processed_rows;
        }
        let total_rows = self.total_rows.max(accounted);

        if self.dropped_errors > 0 {
            warn!(
                kept = self.errors.len(),
                dropped = self.dropped_errors,
                "错误明细超过上限，超出部分仅计数"
            );
        }

        // 错误按行号升序
        let errors: Vec<RowError> = std::mem::take(&mut self.errors)
            .into_sorted_vec()
            .into_iter()
            .map(|e| e.0)
            .collect();

        let samples = accounted as u32;
        let avg_row_time_ms = if samples == 0 {
            0.0
        } else {
            (self.row_time_sum / samples).as_secs_f64() * 1000.0
        };

        let total_secs = total_time.as_secs_f64();
        let throughput_rows_per_sec = if total_secs > 0.0 {
            (self.processed_rows as f64 / total_secs).round() as u64
        } else {
            self.processed_rows as u64
        };

        let performance = PerformanceStats {
            total_time_ms: total_time.as_millis() as u64,
            parse_time_ms: self.parse_time.as_millis() as u64,
            db_time_ms: self.db_time.as_millis() as u64,
            avg_row_time_ms,
            min_row_time_ms: self.row_time_min.unwrap_or_default().as_millis() as u64,
            max_row_time_ms: self.row_time_max.as_millis() as u64,
            throughput_rows_per_sec,
        };

        info!(
            import_id = %self.import_id,
            total_rows,
            processed_rows = self.processed_rows,
            failed_rows = self.failed_rows,
            total_time_ms = performance.total_time_ms,
            "导入汇总完成"
        );

        ImportResult {
            success: true,
            import_id: self.import_id,
            file_name: self.file_name,
            entity_type: self.entity_type,
            total_rows,
            processed_rows: self.processed_rows,
            failed_rows: self.failed_rows,
            errors,
            performance,
        }
    }
}

/// 堆中按行号排序的错误（堆顶为行号最大者）
struct ByRowNumber(RowError);

impl PartialEq for ByRowNumber {
    fn eq(&self, other: &Self) -> bool {
        self.0.row_number == other.0.row_number
    }
}

impl Eq for ByRowNumber {}

impl PartialOrd for ByRowNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByRowNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.row_number.cmp(&other.0.row_number)
    }
}

/// 将错误明细导出为 CSV（便于在源文件中定位修正）
///
/// 列: row_number, error_kind, field, expected, received, message, row_data(JSON)
pub fn write_errors_csv(errors: &[RowError], path: &Path) -> Result<usize, ImportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "row_number",
        "error_kind",
        "field",
        "expected",
        "received",
        "message",
        "row_data",
    ])?;

    for error in errors {
        let row_data = serde_json::to_string(&error.row_data)
            .map_err(|e| ImportError::ReportExportError(e.to_string()))?;
        writer.write_record([
            error.row_number.to_string(),
            error.error_kind.to_string(),
            error.field.clone().unwrap_or_default(),
            error.expected.clone().unwrap_or_default(),
            error.received.clone().unwrap_or_default(),
            error.message.clone(),
            row_data,
        ])?;
    }

    writer
        .flush()
        .map_err(|e| ImportError::ReportExportError(e.to_string()))?;
    Ok(errors.len())
}
