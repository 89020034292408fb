// ==========================================
// ACA 普查导入 - 导入模块错误类型
// ==========================================
// 范围: 仅整体导入级（致命）错误
// 行级失败不走 Err 通道，统一转换为 RowError 数据
// 工具: thiserror 派生宏
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::UnknownEntityType;
use thiserror::Error;

/// 导入模块错误类型（整体导入失败）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件为空或格式无效: {0}")]
    EmptyFile(String),

    // ===== 请求参数错误 =====
    #[error("未知实体类型: {0}")]
    UnknownEntityType(String),

    #[error("导入配置无效: {0}")]
    InvalidConfig(#[from] ConfigError),

    // ===== 报告导出错误 =====
    #[error("错误明细导出失败: {0}")]
    ReportExportError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<UnknownEntityType>
impl From<UnknownEntityType> for ImportError {
    fn from(err: UnknownEntityType) -> Self {
        ImportError::UnknownEntityType(err.0)
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::ReportExportError(err.to_string())
    }
}
