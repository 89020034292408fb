// ==========================================
// ACA 普查导入 - 落库层
// ==========================================
// 红线: 落库层不含校验/规范化逻辑
// 职责: 提供落库目标接口与 SQLite 实现，屏蔽存储细节
// 约束: 所有写入使用参数化 SQL
// ==========================================

pub mod error;
pub mod record_sink;
pub mod sqlite_record_sink;

// 重导出核心类型
pub use error::{SinkError, SinkResult};
pub use record_sink::{RecordSink, SinkCall, SinkResponse};
pub use sqlite_record_sink::SqliteRecordSink;
