// ==========================================
// ACA 普查导入 - 导入层
// ==========================================
// 职责: CSV 文本 → 规范化记录 → 落库目标，逐行汇总结果
// 流程: 分词 → 分批调度 → 行校验 → 落库分发 + 重试 → 汇总报告
// ==========================================

// 模块声明
pub mod batch_scheduler;
pub mod error;
pub mod file_parser;
pub mod normalizers;
pub mod record_importer_impl;
pub mod record_importer_trait;
pub mod report_builder;
pub mod retry;
pub mod row_validator;
pub mod schema;
pub mod sink_dispatcher;

// 重导出核心类型
pub use batch_scheduler::BatchScheduler;
pub use error::ImportError;
pub use file_parser::{CsvTokenizer, ParsedFile, ParsedRow};
pub use record_importer_impl::RecordImporterImpl;
pub use report_builder::{write_errors_csv, ReportBuilder};
pub use retry::{RetryError, RetryPolicy};
pub use row_validator::SchemaRowValidator;
pub use schema::{schema_for, FieldKind, FieldSpec, Schema};
pub use sink_dispatcher::SinkDispatcher;

// 重导出 Trait 接口
pub use record_importer_trait::{FileParser, RecordImporter, RowValidator};
