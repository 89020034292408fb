// ==========================================
// ACA 普查导入 - 记录导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到落库目标
// 流程: 实体类型识别 → 读取 → 分词 → 分批（行校验 → 落库 + 重试）→ 汇总
// ==========================================
// 致命错误（整体失败，不处理任何行）:
// - 未知实体类型（在读取文件之前判定）
// - 文件不存在 / 无数据行
// 其余一切失败都是行级数据，计入报告
// ==========================================

use crate::config::ImportConfig;
use crate::domain::report::{ImportResult, RowError, RowErrorKind, RowOutcome};
use crate::domain::types::EntityType;
use crate::importer::batch_scheduler::BatchScheduler;
use crate::importer::error::ImportError;
use crate::importer::file_parser::{read_source, CsvTokenizer, ParsedRow};
use crate::importer::record_importer_trait::{FileParser, RecordImporter, RowValidator};
use crate::importer::report_builder::ReportBuilder;
use crate::importer::retry::RetryPolicy;
use crate::importer::row_validator::SchemaRowValidator;
use crate::importer::schema::{schema_for, Schema};
use crate::importer::sink_dispatcher::SinkDispatcher;
use crate::repository::RecordSink;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RecordImporterImpl - 记录导入器实现
// ==========================================
pub struct RecordImporterImpl {
    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_validator: Box<dyn RowValidator>,
    dispatcher: SinkDispatcher,

    // 运行参数
    retry: RetryPolicy,
    scheduler: BatchScheduler,
    max_reported_errors: usize,

    // 处理日期（None 取本地当天）
    today: Option<NaiveDate>,
}

impl RecordImporterImpl {
    /// 使用默认分词器与行校验器创建导入器
    ///
    /// # 参数
    /// - sink: 落库目标
    /// - config: 导入运行参数（创建时校验）
    pub fn new(sink: Arc<dyn RecordSink>, config: ImportConfig) -> Result<Self, ImportError> {
        Self::with_components(
            sink,
            config,
            Box::new(CsvTokenizer),
            Box::new(SchemaRowValidator),
        )
    }

    /// 注入全部组件创建导入器
    ///
    /// # 参数
    /// - sink: 落库目标
    /// - config: 导入运行参数
    /// - file_parser: 分词器
    /// - row_validator: 行校验器
    pub fn with_components(
        sink: Arc<dyn RecordSink>,
        config: ImportConfig,
        file_parser: Box<dyn FileParser>,
        row_validator: Box<dyn RowValidator>,
    ) -> Result<Self, ImportError> {
        config.validate()?;

        Ok(Self {
            file_parser,
            row_validator,
            dispatcher: SinkDispatcher::new(sink, config.call_timeout()),
            retry: RetryPolicy::from_config(&config),
            scheduler: BatchScheduler::from_config(&config),
            max_reported_errors: config.max_reported_errors,
            today: None,
        })
    }

    /// 固定处理日期（缺省日期字段取此值）
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn processing_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn parse_entity_type(entity_type: &str) -> Result<EntityType, ImportError> {
        entity_type.parse::<EntityType>().map_err(|e| {
            error!(entity_type = %entity_type, "未知实体类型，拒绝导入");
            ImportError::from(e)
        })
    }

    /// 处理单行: 结构缺陷 → 校验/规范化 → 落库（带重试）
    ///
    /// 任何失败都转为 RowOutcome，不向上传播
    async fn process_row(
        &self,
        schema: &'static Schema,
        parsed: ParsedRow,
        today: NaiveDate,
    ) -> RowOutcome {
        let started = Instant::now();
        let row_number = parsed.line_number;

        if let Some(defect) = parsed.defect {
            let err = RowError::new(row_number, parsed.row, RowErrorKind::Parsing, defect);
            return RowOutcome::failed(err, started.elapsed());
        }

        let record = match self
            .row_validator
            .validate(schema, &parsed.row, row_number, today)
        {
            Ok(record) => record,
            Err(err) => {
                debug!(row = row_number, kind = %err.error_kind, error = %err.message, "行校验失败");
                return RowOutcome::failed(err, started.elapsed());
            }
        };

        let call = SinkDispatcher::build_call(schema, record);
        match self.retry.execute(|| self.dispatcher.dispatch(&call)).await {
            Ok(()) => RowOutcome::processed(row_number, started.elapsed()),
            Err(e) => {
                warn!(
                    row = row_number,
                    attempts = e.attempts,
                    rate_limited = e.last_error.is_rate_limited(),
                    error = %e.last_error,
                    "落库失败，重试已耗尽"
                );
                let err = RowError::new(
                    row_number,
                    parsed.row,
                    RowErrorKind::Database,
                    format!("落库失败（已尝试 {} 次）: {}", e.attempts, e.last_error),
                );
                RowOutcome::failed(err, started.elapsed())
            }
        }
    }

    /// 单行处理 panic 时的结果
    fn panic_outcome(parsed: ParsedRow, message: String) -> RowOutcome {
        let err = RowError::new(
            parsed.line_number,
            parsed.row,
            RowErrorKind::Validation,
            format!("行处理异常中止: {}", message),
        );
        RowOutcome::failed(err, Default::default())
    }

    #[instrument(skip(self, text, started), fields(import_id))]
    async fn run_import(
        &self,
        file_name: &str,
        text: &str,
        entity_type: EntityType,
        started: Instant,
    ) -> Result<ImportResult, ImportError> {
        let import_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("import_id", import_id.as_str());
        info!(import_id = %import_id, file_name = %file_name, entity_type = %entity_type, "开始导入");

        // === 步骤 1: 分词 ===
        let parse_start = Instant::now();
        let parsed = self.file_parser.parse_text(text);
        let parse_time = parse_start.elapsed();

        if parsed.is_empty() {
            warn!(file_name = %file_name, "文件为空或只有表头，拒绝导入");
            return Err(ImportError::EmptyFile(file_name.to_string()));
        }
        info!(
            headers = parsed.headers.len(),
            total_rows = parsed.rows.len(),
            parse_time_ms = parse_time.as_millis() as u64,
            "分词完成"
        );

        // === 步骤 2: 分批处理（批间串行，批内并发） ===
        let schema = schema_for(entity_type);
        let today = self.processing_date();
        let mut report = ReportBuilder::started_at(
            import_id,
            file_name,
            entity_type,
            self.max_reported_errors,
            started,
        );
        report.set_total_rows(parsed.rows.len());
        report.record_parse_time(parse_time);

        let db_start = Instant::now();
        let batches = self
            .scheduler
            .run(
                parsed.rows,
                |row| self.process_row(schema, row, today),
                Self::panic_outcome,
                |outcome| report.record(outcome),
            )
            .await;
        report.record_db_time(db_start.elapsed());
        info!(
            batches,
            failed_rows = report.failed_rows(),
            db_time_ms = db_start.elapsed().as_millis() as u64,
            "分批处理完成"
        );

        // === 步骤 3: 汇总 ===
        Ok(report.build())
    }
}

#[async_trait]
impl RecordImporter for RecordImporterImpl {
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        entity_type: &str,
    ) -> Result<ImportResult, ImportError> {
        let started = Instant::now();
        let entity_type = Self::parse_entity_type(entity_type)?;

        let path = file_path.as_ref();
        let text = read_source(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.run_import(&file_name, &text, entity_type, started).await
    }

    async fn import_text(
        &self,
        file_name: &str,
        text: &str,
        entity_type: &str,
    ) -> Result<ImportResult, ImportError> {
        let started = Instant::now();
        let entity_type = Self::parse_entity_type(entity_type)?;
        self.run_import(file_name, text, entity_type, started).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{SinkCall, SinkError, SinkResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<SinkCall>>,
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(SinkResponse::ok())
        }
    }

    struct PanickingValidator {
        seen: AtomicUsize,
    }

    impl RowValidator for PanickingValidator {
        fn validate(
            &self,
            schema: &Schema,
            row: &crate::domain::record::Row,
            row_number: usize,
            today: NaiveDate,
        ) -> Result<crate::domain::record::NormalizedRecord, RowError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if row.get("Company Code") == Some("BOOM") {
                panic!("validator blew up");
            }
            SchemaRowValidator.validate(schema, row, row_number, today)
        }
    }

    fn fast_config() -> ImportConfig {
        ImportConfig {
            base_delay_ms: 1,
            ..ImportConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[tokio::test]
    async fn test_import_text_upserts_every_valid_row() {
        let sink = Arc::new(RecordingSink::default());
        let importer = RecordImporterImpl::new(sink.clone(), fast_config())
            .unwrap()
            .with_today(today());

        let text = "Employee ID,Plan Code\nE1,GOLD\n,GOLD\nE3,SILVER\n";
        let result = importer
            .import_text("enroll.csv", text, "EmployeePlanEnrollment")
            .await
            .unwrap();

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.processed_rows, 2);
        assert_eq!(result.failed_rows, 1);
        assert_eq!(result.errors[0].row_number, 3);
        assert_eq!(result.errors[0].error_kind, RowErrorKind::MissingField);

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|c| c.operation == "upsert_employee_plan_enrollment"));
        // 缺省日期取处理当天，并进入自然键
        assert!(calls.iter().any(|c| c.record_key == "1|GOLD|2026-10-17"));
    }

    #[tokio::test]
    async fn test_unknown_entity_type_is_fatal() {
        let sink = Arc::new(RecordingSink::default());
        let importer = RecordImporterImpl::new(sink.clone(), fast_config()).unwrap();

        let err = importer
            .import_text("x.csv", "A\n1\n", "Pets")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::UnknownEntityType(ref t) if t == "Pets"));
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_header_only_is_fatal() {
        let importer =
            RecordImporterImpl::new(Arc::new(RecordingSink::default()), fast_config()).unwrap();

        let err = importer
            .import_text("empty.csv", "Company Code,Company Name\n", "CompanyDetails")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile(_)));
    }

    #[tokio::test]
    async fn test_unterminated_quote_is_parsing_error() {
        let importer =
            RecordImporterImpl::new(Arc::new(RecordingSink::default()), fast_config()).unwrap();

        let text = "Company Code,Company Name\nC1,Acme\nC2,\"Open\n";
        let result = importer
            .import_text("c.csv", text, "CompanyDetails")
            .await
            .unwrap();

        assert_eq!(result.processed_rows, 1);
        assert_eq!(result.failed_rows, 1);
        assert_eq!(result.errors[0].error_kind, RowErrorKind::Parsing);
    }

    #[tokio::test]
    async fn test_validator_panic_is_contained() {
        let validator = PanickingValidator {
            seen: AtomicUsize::new(0),
        };
        let sink = Arc::new(RecordingSink::default());
        let importer = RecordImporterImpl::with_components(
            sink.clone(),
            fast_config(),
            Box::new(CsvTokenizer),
            Box::new(validator),
        )
        .unwrap();

        let mut text = String::from("Company Code,Company Name\n");
        for i in 0..15 {
            if i == 3 {
                text.push_str("BOOM,Bad\n");
            } else {
                text.push_str(&format!("C{},Co {}\n", i, i));
            }
        }

        let result = importer
            .import_text("c.csv", &text, "CompanyDetails")
            .await
            .unwrap();

        assert_eq!(result.total_rows, 15);
        assert_eq!(result.processed_rows, 14);
        assert_eq!(result.failed_rows, 1);
        assert_eq!(result.errors[0].row_number, 5);
        assert_eq!(sink.calls.lock().unwrap().len(), 14);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ImportConfig {
            concurrency: 0,
            ..ImportConfig::default()
        };
        let result = RecordImporterImpl::new(Arc::new(RecordingSink::default()), config);
        assert!(matches!(result, Err(ImportError::InvalidConfig(_))));
    }
}
