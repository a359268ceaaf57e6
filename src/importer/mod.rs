// ==========================================
// PPC 竞价优化引擎 - 导入层
// ==========================================
// 职责: 上传报表 → 规范行（关键词 / 活动 / 搜索词）
// 支持: Excel (多 sheet), CSV / TSV
// ==========================================

// 模块声明
pub mod column_resolver;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod numeric;
pub mod report_importer;
pub mod workbook;

// 重导出核心类型
pub use column_resolver::{resolve, ColumnMatcher, FieldCandidates};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{BulkFieldMapper, SearchTermFieldMapper};
pub use file_parser::{CsvParser, ExcelParser, TabularSource, UniversalFileParser};
pub use report_importer::{ReportImporter, BULK_SIGNATURE, SEARCH_TERM_SIGNATURE};
pub use workbook::{locate_sheet, LocatedSheet, Sheet, SheetRow, Workbook};

// 重导出 Trait 接口
pub use importer_trait::{BulkIngest, FieldMapper, FileParser, SearchTermIngest};
