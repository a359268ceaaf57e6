// ==========================================
// PPC 竞价优化引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 调用
// ==========================================

pub mod error;
pub mod optimizer_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use optimizer_api::{
    DraftDocument, FinalizeResponse, OptimizeResponse, OptimizerApi, ReportRequest, RunStatus,
};
