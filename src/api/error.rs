// ==========================================
// ACA 普查导入 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将导入/配置/落库错误转换为用户可读消息
// 约束: 所有错误信息必须包含显式原因
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::SinkError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("导入失败: {0}")]
    ImportError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),
}

// 实现 From<ImportError>
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnknownEntityType(_) | ImportError::EmptyFile(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ImportError::FileNotFound(_) => ApiError::NotFound(err.to_string()),
            ImportError::InvalidConfig(e) => ApiError::ConfigError(e.to_string()),
            _ => ApiError::ImportError(err.to_string()),
        }
    }
}

// 实现 From<ConfigError>
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { .. } => ApiError::ConfigError(err.to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

// 实现 From<SinkError>
impl From<SinkError> for ApiError {
    fn from(err: SinkError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::UnknownEntityType("Pets".into()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(err.to_string(), "无效输入: 未知实体类型: Pets");

        let err: ApiError = ImportError::FileNotFound("a.csv".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
