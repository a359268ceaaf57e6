// ==========================================
// PPC 竞价优化引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 此处只有结构性错误（整批失败）; 行级问题走 RowError
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx/.xls/.ods/.csv/.tsv)")]
    UnsupportedFormat(String),

    #[error("failed to read file: {0}")]
    FileReadError(String),

    #[error("failed to parse workbook: {0}")]
    ExcelParseError(String),

    #[error("failed to parse delimited text: {0}")]
    CsvParseError(String),

    #[error("file {file} contains no sheets")]
    EmptyWorkbook { file: String },

    // ===== 结构性错误 =====
    #[error("no sheet in {file} has the expected column {expected}")]
    SheetNotFound { file: String, expected: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于"用户需修正源文件"的结构性错误
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportError::SheetNotFound { .. } | ImportError::EmptyWorkbook { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_not_found_message_names_column() {
        let err = ImportError::SheetNotFound {
            file: "bulk.xlsx".to_string(),
            expected: "\"Entidad\" or \"Entity\"".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Entity"));
        assert!(msg.contains("bulk.xlsx"));
        assert!(err.is_structural());
        assert!(!ImportError::CsvParseError("x".to_string()).is_structural());
    }
}
