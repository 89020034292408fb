// ==========================================
// ACA 普查导入 - SQLite 落库目标实现
// ==========================================
// 职责: 以 (operation, record_key) 为自然键 upsert 规范化记录
// 存储: sink_records 表，参数整体以 JSON 保存
// 红线: Repository 不含业务规则，只做数据写入/查询
// ==========================================

use crate::db::open_sqlite_connection;
use crate::perf::install_sqlite_tracing;
use crate::repository::error::{SinkError, SinkResult};
use crate::repository::record_sink::{RecordSink, SinkCall, SinkResponse};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;

const CREATE_SINK_RECORDS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sink_records (
    operation    TEXT NOT NULL,
    entity_type  TEXT NOT NULL,
    record_key   TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (operation, record_key)
)
"#;

// ==========================================
// SqliteRecordSink
// ==========================================
pub struct SqliteRecordSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordSink {
    /// 打开（或创建）落库数据库
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> SinkResult<Self> {
        let mut conn = open_sqlite_connection(db_path)?;
        install_sqlite_tracing(&mut conn);
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 复用已有连接（与配置管理共用同一库时使用）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> SinkResult<Self> {
        {
            let c = conn
                .lock()
                .map_err(|e| SinkError::LockError(e.to_string()))?;
            c.execute_batch(CREATE_SINK_RECORDS_SQL)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> SinkResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SinkError::LockError(e.to_string()))
    }

    /// 某操作下的记录数
    pub fn count_records(&self, operation: &str) -> SinkResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sink_records WHERE operation = ?1",
            params![operation],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 按自然键读取已落库参数
    pub fn find_payload(
        &self,
        operation: &str,
        record_key: &str,
    ) -> SinkResult<Option<serde_json::Value>> {
        let conn = self.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM sink_records WHERE operation = ?1 AND record_key = ?2",
                params![operation, record_key],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(SinkError::from))
            .transpose()
    }
}

#[async_trait]
impl RecordSink for SqliteRecordSink {
    async fn upsert(&self, call: &SinkCall) -> Result<SinkResponse, SinkError> {
        if call.record_key.is_empty() {
            return Ok(SinkResponse::failed(format!(
                "{}: 自然键为空，无法定位记录",
                call.operation
            )));
        }

        let payload = serde_json::to_string(&call.params)?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO sink_records (operation, entity_type, record_key, payload_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(operation, record_key) DO UPDATE SET
                payload_json = excluded.payload_json,
                updated_at = excluded.updated_at
            "#,
            params![
                call.operation,
                call.entity_type.as_str(),
                call.record_key,
                payload,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(
            operation = call.operation,
            record_key = %call.record_key,
            "记录已落库"
        );
        Ok(SinkResponse::ok())
    }
}
