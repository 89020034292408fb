// ==========================================
// ACA 普查导入 - 领域模型层
// ==========================================
// 职责: 定义实体类型、行、规范化记录、行错误、导入结果
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod record;
pub mod report;
pub mod types;

// 重导出核心类型
pub use record::{FieldValue, NormalizedRecord, Row};
pub use report::{ImportResult, PerformanceStats, RowError, RowErrorKind, RowOutcome};
pub use types::{EntityType, UnknownEntityType};
