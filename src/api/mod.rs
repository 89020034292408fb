// ==========================================
// ACA 普查导入 - API 层
// ==========================================
// 职责: 提供导入接口，供命令行（或上层服务）调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{
    ImportApi, ImportApiResponse, ImportFailureResponse, ImportSummaryResponse,
    PerformanceResponse,
};
