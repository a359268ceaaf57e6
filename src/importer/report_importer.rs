// ==========================================
// PPC 竞价优化引擎 - 报表导入器实现
// ==========================================
// 职责: 整合导入流程,从上传文件到规范行
// 流程: 解析 → 定位 sheet → 字段映射 → 行错误收集
// 红线: 结构性问题整批失败; 行级问题只记录,不中断
// ==========================================

use crate::domain::report::RowError;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{BulkFieldMapper, SearchTermFieldMapper};
use crate::importer::file_parser::{TabularSource, UniversalFileParser};
use crate::importer::importer_trait::{BulkIngest, FieldMapper, FileParser, SearchTermIngest};
use crate::importer::workbook::{locate_sheet, LocatedSheet};
use tracing::{debug, info, instrument, warn};

/// Bulk 报表签名列
pub const BULK_SIGNATURE: &[&str] = &["Entidad", "Entity"];

/// 搜索词报表签名列
pub const SEARCH_TERM_SIGNATURE: &[&str] = &[
    "Término de búsqueda de cliente",
    "Término de búsqueda",
    "Search Term",
];

// ==========================================
// ReportImporter - 报表导入器
// ==========================================
pub struct ReportImporter {
    file_parser: Box<dyn FileParser>,
    bulk_mapper: BulkFieldMapper,
    search_term_mapper: SearchTermFieldMapper,
}

impl Default for ReportImporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportImporter {
    /// 创建导入器
    ///
    /// # 参数
    /// - acos_is_percent: 报表中 ACOS 列是否为百分数（是则除以 100）
    pub fn new(acos_is_percent: bool) -> Self {
        Self::with_parser(Box::new(UniversalFileParser), acos_is_percent)
    }

    pub fn with_parser(file_parser: Box<dyn FileParser>, acos_is_percent: bool) -> Self {
        Self {
            file_parser,
            bulk_mapper: BulkFieldMapper { acos_is_percent },
            search_term_mapper: SearchTermFieldMapper { acos_is_percent },
        }
    }

    /// 导入 Bulk 报表
    ///
    /// # 返回
    /// - Ok(BulkIngest): 关键词行 + 活动行（保持源文件顺序）+ 行错误
    /// - Err: 文件无法解析,或没有任何 sheet 含实体列
    #[instrument(skip(self, source), fields(file = %source.file_name))]
    pub fn ingest_bulk(&self, source: &TabularSource) -> ImportResult<BulkIngest> {
        let located = self.locate(source, BULK_SIGNATURE)?;
        let (rows, errors) = map_rows(&self.bulk_mapper, &located);

        info!(
            sheet = %located.sheet_name,
            rows = rows.len(),
            row_errors = errors.len(),
            "Bulk 报表导入完成"
        );

        Ok(BulkIngest {
            sheet_name: located.sheet_name,
            rows,
            errors,
        })
    }

    /// 导入搜索词报表
    #[instrument(skip(self, source), fields(file = %source.file_name))]
    pub fn ingest_search_terms(&self, source: &TabularSource) -> ImportResult<SearchTermIngest> {
        let located = self.locate(source, SEARCH_TERM_SIGNATURE)?;
        let (rows, errors) = map_rows(&self.search_term_mapper, &located);

        info!(
            sheet = %located.sheet_name,
            rows = rows.len(),
            row_errors = errors.len(),
            "搜索词报表导入完成"
        );

        Ok(SearchTermIngest {
            sheet_name: located.sheet_name,
            rows,
            errors,
        })
    }

    fn locate(&self, source: &TabularSource, signature: &[&str]) -> ImportResult<LocatedSheet> {
        let workbook = self.file_parser.parse_workbook(source)?;
        debug!(sheets = workbook.sheets.len(), "工作簿解析完成");

        locate_sheet(&workbook, signature).ok_or_else(|| {
            let expected = signature
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect::<Vec<_>>()
                .join(" or ");
            warn!(file = %source.file_name, expected = %expected, "未找到目标 sheet");
            ImportError::SheetNotFound {
                file: source.file_name.clone(),
                expected,
            }
        })
    }
}

/// 逐行映射,收集行错误
fn map_rows<M: FieldMapper>(mapper: &M, located: &LocatedSheet) -> (Vec<M::Output>, Vec<RowError>) {
    let mut rows = Vec::with_capacity(located.rows.len());
    let mut errors = Vec::new();

    for row in &located.rows {
        match mapper.map_row(row) {
            Ok(Some(mapped)) => rows.push(mapped),
            Ok(None) => {}
            Err(e) => {
                debug!(row = e.row, reason = %e.reason, "行映射失败");
                errors.push(e);
            }
        }
    }

    (rows, errors)
}
