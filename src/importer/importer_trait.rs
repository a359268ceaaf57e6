// ==========================================
// PPC 竞价优化引擎 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → sheet 定位 → 字段映射 → 行级错误收集
// ==========================================

use crate::domain::report::{BulkRow, RowError, SearchTermRow};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::TabularSource;
use crate::importer::workbook::{SheetRow, Workbook};

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件字节 → 工作簿原始网格（阶段 0）
// 实现者: ExcelParser, CsvParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析为工作簿
    ///
    /// # 返回
    /// - Ok(Workbook): 所有 sheet 的原始网格（CSV 只有一个 sheet）
    /// - Err: 文件格式错误
    fn parse_workbook(&self, source: &TabularSource) -> ImportResult<Workbook>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行对象 → 规范行（阶段 1）
// 实现者: BulkFieldMapper, SearchTermFieldMapper
pub trait FieldMapper: Send + Sync {
    type Output;

    /// 映射单行
    ///
    /// # 返回
    /// - Ok(Some(row)): 映射成功
    /// - Ok(None): 与计算无关的行（如广告组、商品广告实体）,静默忽略
    /// - Err(RowError): 行结构缺失,由调用方收集
    fn map_row(&self, row: &SheetRow) -> Result<Option<Self::Output>, RowError>;
}

/// Bulk 报表导入结果
#[derive(Debug, Clone, Default)]
pub struct BulkIngest {
    pub sheet_name: String,
    pub rows: Vec<BulkRow>,
    pub errors: Vec<RowError>,
}

impl BulkIngest {
    pub fn keywords(&self) -> impl Iterator<Item = &crate::domain::KeywordRow> {
        self.rows.iter().filter_map(|r| match r {
            BulkRow::Keyword(k) => Some(k),
            BulkRow::Campaign(_) => None,
        })
    }

    pub fn keyword_rows(&self) -> Vec<crate::domain::KeywordRow> {
        self.keywords().cloned().collect()
    }
}

/// 搜索词报表导入结果
#[derive(Debug, Clone, Default)]
pub struct SearchTermIngest {
    pub sheet_name: String,
    pub rows: Vec<SearchTermRow>,
    pub errors: Vec<RowError>,
}
