// ==========================================
// ACA 普查导入 - 导入API
// ==========================================
// 职责: 封装导入调用，输出对外 JSON 结构
// - 管道跑完（即使有失败行）: success=true + 计数 + 错误明细 + 性能
// - 致命错误: { success: false, error }
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfig, ImportConfigReader};
use crate::domain::report::{ImportResult, PerformanceStats, RowError};
use crate::domain::types::EntityType;
use crate::importer::{ImportError, RecordImporter, RecordImporterImpl};
use crate::repository::SqliteRecordSink;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// 导入API响应
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImportApiResponse {
    Completed(ImportSummaryResponse),
    Failed(ImportFailureResponse),
}

impl ImportApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportApiResponse::Completed(_))
    }

    pub fn summary(&self) -> Option<&ImportSummaryResponse> {
        match self {
            ImportApiResponse::Completed(summary) => Some(summary),
            ImportApiResponse::Failed(_) => None,
        }
    }
}

/// 导入汇总（管道跑完）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaryResponse {
    /// 恒为 true: 表示管道跑完，不表示零失败
    pub success: bool,
    pub import_id: String,
    pub file_name: String,
    /// 实体类型
    pub file_type: EntityType,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub failed_rows: usize,
    /// 无失败行时省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RowError>>,
    pub performance: PerformanceResponse,
}

/// 性能统计（对外结构）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub total_time_ms: u64,
    pub parse_time_ms: u64,
    pub db_time_ms: u64,
    pub avg_row_time_ms: f64,
    pub min_row_time_ms: u64,
    pub max_row_time_ms: u64,
    /// 行/秒
    pub throughput: u64,
}

/// 致命错误
#[derive(Debug, Clone, Serialize)]
pub struct ImportFailureResponse {
    pub success: bool,
    pub error: String,
}

impl From<PerformanceStats> for PerformanceResponse {
    fn from(stats: PerformanceStats) -> Self {
        Self {
            total_time_ms: stats.total_time_ms,
            parse_time_ms: stats.parse_time_ms,
            db_time_ms: stats.db_time_ms,
            avg_row_time_ms: stats.avg_row_time_ms,
            min_row_time_ms: stats.min_row_time_ms,
            max_row_time_ms: stats.max_row_time_ms,
            throughput: stats.throughput_rows_per_sec,
        }
    }
}

impl From<ImportResult> for ImportSummaryResponse {
    fn from(result: ImportResult) -> Self {
        let errors = (result.failed_rows > 0).then_some(result.errors);
        Self {
            success: result.success,
            import_id: result.import_id,
            file_name: result.file_name,
            file_type: result.entity_type,
            total_rows: result.total_rows,
            processed_rows: result.processed_rows,
            failed_rows: result.failed_rows,
            errors,
            performance: result.performance.into(),
        }
    }
}

impl From<ApiError> for ImportFailureResponse {
    fn from(err: ApiError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}

/// 导入API
pub struct ImportApi {
    importer: Arc<RecordImporterImpl>,
}

impl ImportApi {
    /// 使用已构造的导入器创建 ImportApi
    pub fn new(importer: Arc<RecordImporterImpl>) -> Self {
        Self { importer }
    }

    /// 基于 SQLite 库创建 ImportApi（配置读 config_kv，记录写 sink_records）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - overrides: 调用方覆写（在 config_kv 之上再调整）
    pub async fn open(
        db_path: &str,
        overrides: impl FnOnce(&mut ImportConfig),
    ) -> ApiResult<Self> {
        let config_manager = ConfigManager::new(db_path)?;
        let mut config = config_manager.load_import_config().await?;
        overrides(&mut config);

        let snapshot = config_manager.get_config_snapshot()?;
        info!(
            db_path = %db_path,
            config_kv = %snapshot,
            batch_size = config.batch_size,
            concurrency = config.concurrency,
            max_attempts = config.max_attempts,
            base_delay_ms = config.base_delay_ms,
            "导入配置已加载"
        );

        let sink = SqliteRecordSink::new(db_path)?;
        let importer = RecordImporterImpl::new(Arc::new(sink), config)?;
        Ok(Self::new(Arc::new(importer)))
    }

    /// 导入 CSV 文件
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - entity_type: 实体类型名称
    ///
    /// # 返回
    /// - Completed: 管道跑完（可能含失败行）
    /// - Failed: 致命错误（未处理任何行）
    pub async fn import_file(&self, file_path: &str, entity_type: &str) -> ImportApiResponse {
        let result = self.importer.import_file(file_path, entity_type).await;
        Self::respond(result)
    }

    /// 导入内存文本（上传内容已读入内存时使用）
    pub async fn import_text(
        &self,
        file_name: &str,
        text: &str,
        entity_type: &str,
    ) -> ImportApiResponse {
        let result = self.importer.import_text(file_name, text, entity_type).await;
        Self::respond(result)
    }

    fn respond(result: Result<ImportResult, ImportError>) -> ImportApiResponse {
        match result {
            Ok(import_result) => {
                info!(
                    file_name = %import_result.file_name,
                    processed_rows = import_result.processed_rows,
                    failed_rows = import_result.failed_rows,
                    "导入完成"
                );
                ImportApiResponse::Completed(import_result.into())
            }
            Err(e) => {
                let api_err = ApiError::from(e);
                error!(error = %api_err, "导入失败");
                ImportApiResponse::Failed(api_err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RecordSink, SinkCall, SinkError, SinkResponse};
    use async_trait::async_trait;

    struct AcceptAllSink;

    #[async_trait]
    impl RecordSink for AcceptAllSink {
        async fn upsert(&self, _call: &SinkCall) -> Result<SinkResponse, SinkError> {
            Ok(SinkResponse::ok())
        }
    }

    fn create_api() -> ImportApi {
        let config = ImportConfig {
            base_delay_ms: 1,
            ..ImportConfig::default()
        };
        let importer = RecordImporterImpl::new(Arc::new(AcceptAllSink), config).unwrap();
        ImportApi::new(Arc::new(importer))
    }

    #[tokio::test]
    async fn test_clean_import_omits_errors() {
        let api = create_api();
        let resp = api
            .import_text("plans.csv", "Plan Code,Plan Name\nGOLD,Gold PPO\n", "PlanMaster")
            .await;

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["fileName"], "plans.csv");
        assert_eq!(json["fileType"], "PlanMaster");
        assert_eq!(json["totalRows"], 1);
        assert_eq!(json["processedRows"], 1);
        assert!(json.get("errors").is_none());
        assert!(json["performance"]["throughput"].is_u64());
        assert!(json["performance"].get("totalTimeMs").is_some());
    }

    #[tokio::test]
    async fn test_failed_rows_are_listed() {
        let api = create_api();
        let resp = api
            .import_text("plans.csv", "Plan Code,Plan Name\nGOLD,\n", "PlanMaster")
            .await;

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["failedRows"], 1);
        assert_eq!(json["errors"][0]["errorKind"], "MissingField");
        assert_eq!(json["errors"][0]["rowNumber"], 2);
        assert_eq!(json["errors"][0]["rowData"]["Plan Code"], "GOLD");
    }

    #[tokio::test]
    async fn test_fatal_error_shape() {
        let api = create_api();
        let resp = api.import_file("/definitely/missing.csv", "PlanMaster").await;

        assert!(!resp.is_success());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("missing.csv"));
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_open_reads_config_kv() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        ConfigManager::new(db_path)
            .unwrap()
            .set_config_value(crate::config::config_keys::BATCH_SIZE, "0")
            .unwrap();

        // config_kv 中的非法值在覆写之前即被拒绝
        let api = ImportApi::open(db_path, |c| c.batch_size = 5).await;
        assert!(api.is_err());

        ConfigManager::new(db_path)
            .unwrap()
            .set_config_value(crate::config::config_keys::BATCH_SIZE, "4")
            .unwrap();
        let api = ImportApi::open(db_path, |c| c.base_delay_ms = 1).await.unwrap();
        let resp = api
            .import_text("plans.csv", "Plan Code,Plan Name\nGOLD,Gold\n", "PlanMaster")
            .await;
        assert!(resp.is_success());
    }
}
