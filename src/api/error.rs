// ==========================================
// PPC 竞价优化引擎 - API层错误类型
// ==========================================
// 职责: 汇总各层错误,转换Repository错误为用户可读的错误消息
// 约束: 结构性导入错误整批失败,行级问题不进入此类型
// ==========================================

use crate::engine::error::{ExportError, ReviewError};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 导入错误（整批失败,无任何变更）
    // ==========================================
    #[error("ingestion failed: {0}")]
    Ingestion(#[from] ImportError),

    // ==========================================
    // 审核 / 导出错误
    // ==========================================
    #[error("review rejected: {0}")]
    Review(#[from] ReviewError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    // ==========================================
    // 输入错误
    // ==========================================
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为导入错误（CLI 退出码 2）
    pub fn is_ingestion(&self) -> bool {
        matches!(self, ApiError::Ingestion(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock poisoned: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("unique constraint violated: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("field {}: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "WeeklySnapshot".to_string(),
            id: "client-1/2026-10-12".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("WeeklySnapshot"));
                assert!(msg.contains("client-1/2026-10-12"));
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_ingestion_error_is_flagged() {
        let err: ApiError = ImportError::SheetNotFound {
            file: "bulk.xlsx".to_string(),
            expected: "\"Entidad\" or \"Entity\"".to_string(),
        }
        .into();
        assert!(err.is_ingestion());
        assert!(err.to_string().contains("Entidad"));

        let err: ApiError = ReviewError::InvalidBid(-1.0).into();
        assert!(!err.is_ingestion());
    }
}
