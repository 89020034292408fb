// ==========================================
// ACA 普查导入 - 核心库
// ==========================================
// 定位: 员工普查 / 计划 / 参保 / 工时等表格数据的批量导入管道
// 技术栈: Rust + Tokio + SQLite
// 流程: CSV 分词 → 别名解析与规范化 → 校验 → 分批并发落库（线性退避重试）→ 导入报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行 / 规范化记录 / 行错误 / 导入结果
pub mod domain;

// 落库层 - 落库目标接口与 SQLite 实现
pub mod repository;

// 导入层 - 导入管道
pub mod importer;

// 配置层 - 导入运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// API 层 - 对外导入接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    EntityType, FieldValue, ImportResult, NormalizedRecord, PerformanceStats, Row, RowError,
    RowErrorKind,
};

// 导入器
pub use importer::{ImportError, RecordImporter, RecordImporterImpl, RetryPolicy};

// 落库
pub use repository::{RecordSink, SinkCall, SinkError, SinkResponse, SqliteRecordSink};

// 配置
pub use config::{ConfigManager, ImportConfig};

// API
pub use api::{ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ACA 普查导入";
