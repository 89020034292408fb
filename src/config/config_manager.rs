// ==========================================
// ACA 普查导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)，导入只读取 global scope
// ==========================================

use crate::config::import_config::{
    ConfigError, DEFAULT_BASE_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_REPORTED_ERRORS,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const CREATE_CONFIG_KV_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key      TEXT NOT NULL,
    value    TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
)
"#;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（表不存在时建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            conn_guard.execute_batch(CREATE_CONFIG_KV_SQL)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ConfigError> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置值，不存在时取默认值
    ///
    /// 解析失败报 InvalidValue（不静默回退默认值）
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                reason: "无法解析为非负整数".to_string(),
            }),
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 打开导入接口时写入日志，记录本次运行使用的配置
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::BATCH_SIZE, DEFAULT_BATCH_SIZE)
    }

    async fn get_concurrency(&self) -> Result<usize, ConfigError> {
        // 未配置并发时跟随批大小
        let batch_size = self.get_batch_size().await?;
        self.get_parsed_or_default(config_keys::CONCURRENCY, batch_size)
    }

    async fn get_max_attempts(&self) -> Result<u32, ConfigError> {
        self.get_parsed_or_default(config_keys::RETRY_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)
    }

    async fn get_base_delay_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(config_keys::RETRY_BASE_DELAY_MS, DEFAULT_BASE_DELAY_MS)
    }

    async fn get_call_timeout_ms(&self) -> Result<Option<u64>, ConfigError> {
        match self.get_config_value(config_keys::CALL_TIMEOUT_MS)? {
            Some(raw) if !raw.trim().is_empty() => self
                .get_parsed_or_default(config_keys::CALL_TIMEOUT_MS, 0u64)
                .map(Some),
            _ => Ok(None),
        }
    }

    async fn get_max_reported_errors(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::MAX_REPORTED_ERRORS, DEFAULT_MAX_REPORTED_ERRORS)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分批
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const CONCURRENCY: &str = "import.concurrency";

    // 重试
    pub const RETRY_MAX_ATTEMPTS: &str = "import.retry.max_attempts";
    pub const RETRY_BASE_DELAY_MS: &str = "import.retry.base_delay_ms";
    pub const CALL_TIMEOUT_MS: &str = "import.call_timeout_ms";

    // 报告
    pub const MAX_REPORTED_ERRORS: &str = "import.max_reported_errors";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::import_config::ImportConfig;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let (_temp_file, manager) = create_manager();

        let config = manager.load_import_config().await.unwrap();
        assert_eq!(config, ImportConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_from_config_kv() {
        let (_temp_file, manager) = create_manager();
        manager.set_config_value(config_keys::BATCH_SIZE, "25").unwrap();
        manager
            .set_config_value(config_keys::RETRY_BASE_DELAY_MS, "50")
            .unwrap();
        manager
            .set_config_value(config_keys::CALL_TIMEOUT_MS, "2000")
            .unwrap();

        let config = manager.load_import_config().await.unwrap();
        assert_eq!(config.batch_size, 25);
        // 并发跟随批大小
        assert_eq!(config.concurrency, 25);
        assert_eq!(config.base_delay_ms, 50);
        assert_eq!(config.call_timeout_ms, Some(2000));
    }

    #[tokio::test]
    async fn test_unparseable_value_is_error() {
        let (_temp_file, manager) = create_manager();
        manager
            .set_config_value(config_keys::RETRY_MAX_ATTEMPTS, "three")
            .unwrap();

        let err = manager.load_import_config().await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let (_temp_file, manager) = create_manager();
        manager.set_config_value(config_keys::BATCH_SIZE, "0").unwrap();

        assert!(manager.load_import_config().await.is_err());
    }

    #[test]
    fn test_config_snapshot() {
        let (_temp_file, manager) = create_manager();
        manager.set_config_value(config_keys::BATCH_SIZE, "5").unwrap();
        manager.set_config_value(config_keys::BATCH_SIZE, "6").unwrap();

        let snapshot: serde_json::Value =
            serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot[config_keys::BATCH_SIZE], "6");
    }
}
