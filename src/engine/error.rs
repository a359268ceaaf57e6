// ==========================================
// PPC 竞价优化引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 审核阶段错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("change index {index} out of range (working set has {len} changes)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid bid: {0} (must be a finite, non-negative number)")]
    InvalidBid(f64),
}

/// 导出错误
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export row: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to finish export buffer: {0}")]
    Buffer(String),
}
