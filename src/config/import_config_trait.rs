// ==========================================
// ACA 普查导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::{ConfigError, ImportConfig};
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道运行参数读取
// 实现者: ConfigManager（从 config_kv 表读取，缺省取默认值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取批大小
    ///
    /// # 默认值
    /// - 10
    async fn get_batch_size(&self) -> Result<usize, ConfigError>;

    /// 获取批内并发上限
    ///
    /// # 默认值
    /// - 10（等于批大小，即整批同时在途）
    async fn get_concurrency(&self) -> Result<usize, ConfigError>;

    /// 获取单行落库最大尝试次数
    ///
    /// # 默认值
    /// - 3
    async fn get_max_attempts(&self) -> Result<u32, ConfigError>;

    /// 获取线性退避基数（毫秒）
    ///
    /// # 默认值
    /// - 1000
    async fn get_base_delay_ms(&self) -> Result<u64, ConfigError>;

    /// 获取单次落库调用超时（毫秒）
    ///
    /// # 默认值
    /// - None（不限）
    async fn get_call_timeout_ms(&self) -> Result<Option<u64>, ConfigError>;

    /// 获取报告中错误明细上限
    ///
    /// # 默认值
    /// - 1000
    async fn get_max_reported_errors(&self) -> Result<usize, ConfigError>;

    /// 读取完整导入配置并校验
    async fn load_import_config(&self) -> Result<ImportConfig, ConfigError> {
        let config = ImportConfig {
            batch_size: self.get_batch_size().await?,
            concurrency: self.get_concurrency().await?,
            max_attempts: self.get_max_attempts().await?,
            base_delay_ms: self.get_base_delay_ms().await?,
            call_timeout_ms: self.get_call_timeout_ms().await?,
            max_reported_errors: self.get_max_reported_errors().await?,
        };
        config.validate()?;
        Ok(config)
    }
}
