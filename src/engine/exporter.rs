// ==========================================
// PPC 竞价优化引擎 - 变更导出
// ==========================================
// 职责: Final 变更集 → 广告后台可上传的表格
// 格式: XLSX（单工作表 "Optimización",竞价为数值单元格）; CSV 为备选
// 列顺序固定: 商品, 实体, 操作, 活动 ID, 广告组 ID, 关键词 ID, 竞价, 状态, 关键词文本, 匹配方式
// ==========================================

use crate::domain::change::{FinalChangeSet, ProposedChange};
use crate::domain::types::{ExportFormat, ExportLocale, KeywordState, MatchType};
use crate::engine::error::ExportError;
use chrono::NaiveDate;
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::{info, instrument};

/// 工作表名（与语言无关,后台模板固定）
pub const SHEET_NAME: &str = "Optimización";

/// 竞价列下标
const BID_COLUMN: u16 = 6;

const HEADERS_ES: [&str; 10] = [
    "Producto",
    "Entidad",
    "Operación",
    "ID de la campaña",
    "ID del grupo de anuncios",
    "ID de palabra clave",
    "Puja",
    "Estado",
    "Texto de palabra clave",
    "Tipo de coincidencia",
];

const HEADERS_EN: [&str; 10] = [
    "Product",
    "Entity",
    "Operation",
    "Campaign ID",
    "Ad Group ID",
    "Keyword ID",
    "Bid",
    "State",
    "Keyword Text",
    "Match Type",
];

/// 导出行（除竞价外均为已本地化的单元格文本）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub product: String,
    pub entity: String,
    pub operation: String,
    pub campaign_id: String,
    pub ad_group_id: String,
    pub keyword_id: String,
    pub bid: f64,
    pub state: String,
    pub keyword_text: String,
    pub match_type: String,
}

impl ExportRow {
    fn from_change(change: &ProposedChange, locale: ExportLocale) -> Self {
        Self {
            product: change.product_ref.clone().unwrap_or_default(),
            entity: entity_label(locale).to_string(),
            operation: change.operation.to_string(),
            campaign_id: change.campaign_id.clone(),
            ad_group_id: change.ad_group_id.clone(),
            keyword_id: change.keyword_id.clone(),
            bid: change.bid,
            state: state_label(change.state, locale).to_string(),
            keyword_text: change.keyword_text.clone(),
            match_type: match_type_label(change.match_type, locale).to_string(),
        }
    }

    /// 竞价两位小数文本
    pub fn bid_text(&self) -> String {
        format!("{:.2}", self.bid)
    }

    /// 文本列（竞价列为 None）
    fn text_cells(&self) -> [Option<&str>; 10] {
        [
            Some(self.product.as_str()),
            Some(self.entity.as_str()),
            Some(self.operation.as_str()),
            Some(self.campaign_id.as_str()),
            Some(self.ad_group_id.as_str()),
            Some(self.keyword_id.as_str()),
            None,
            Some(self.state.as_str()),
            Some(self.keyword_text.as_str()),
            Some(self.match_type.as_str()),
        ]
    }
}

pub fn headers(locale: ExportLocale) -> [&'static str; 10] {
    match locale {
        ExportLocale::Es => HEADERS_ES,
        ExportLocale::En => HEADERS_EN,
    }
}

fn entity_label(locale: ExportLocale) -> &'static str {
    match locale {
        ExportLocale::Es => "Palabra clave",
        ExportLocale::En => "Keyword",
    }
}

fn state_label(state: KeywordState, locale: ExportLocale) -> &'static str {
    match (state, locale) {
        (KeywordState::Enabled, ExportLocale::Es) => "habilitado",
        (KeywordState::Paused, ExportLocale::Es) => "pausado",
        (KeywordState::Enabled, ExportLocale::En) => "enabled",
        (KeywordState::Paused, ExportLocale::En) => "paused",
    }
}

fn match_type_label(match_type: MatchType, locale: ExportLocale) -> &'static str {
    match (match_type, locale) {
        (MatchType::Exact, ExportLocale::Es) => "exacta",
        (MatchType::Phrase, ExportLocale::Es) => "frase",
        (MatchType::Broad, ExportLocale::Es) => "amplia",
        (MatchType::Exact, ExportLocale::En) => "exact",
        (MatchType::Phrase, ExportLocale::En) => "phrase",
        (MatchType::Broad, ExportLocale::En) => "broad",
    }
}

/// 结构化导出（供界面内审核展示）
pub fn rows(final_set: &FinalChangeSet, locale: ExportLocale) -> Vec<ExportRow> {
    final_set
        .changes()
        .iter()
        .map(|c| ExportRow::from_change(c, locale))
        .collect()
}

/// 按格式序列化
#[instrument(skip(final_set), fields(changes = final_set.len()))]
pub fn serialize(
    final_set: &FinalChangeSet,
    locale: ExportLocale,
    format: ExportFormat,
) -> Result<Vec<u8>, ExportError> {
    let bytes = match format {
        ExportFormat::Xlsx => serialize_xlsx(final_set, locale)?,
        ExportFormat::Csv => serialize_csv(final_set, locale)?,
    };
    info!(bytes = bytes.len(), locale = %locale, format = %format, "变更文件已生成");
    Ok(bytes)
}

/// 单工作表 XLSX; 空文本单元格不写入
pub fn serialize_xlsx(final_set: &FinalChangeSet, locale: ExportLocale) -> Result<Vec<u8>, ExportError> {
    let header_format = Format::new().set_bold();
    let bid_format = Format::new().set_num_format("0.00");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(headers(locale)) {
        worksheet.write_string_with_format(0, col, title, &header_format)?;
    }

    for (row_idx, row) in (1u32..).zip(rows(final_set, locale)) {
        for (col, cell) in (0u16..).zip(row.text_cells()) {
            if let Some(text) = cell.filter(|t| !t.is_empty()) {
                worksheet.write_string(row_idx, col, text)?;
            }
        }
        worksheet.write_number_with_format(row_idx, BID_COLUMN, row.bid, &bid_format)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// 逗号分隔 CSV,首行为表头
pub fn serialize_csv(final_set: &FinalChangeSet, locale: ExportLocale) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().delimiter(b',').from_writer(Vec::new());
    writer.write_record(headers(locale))?;
    for row in rows(final_set, locale) {
        let bid = row.bid_text();
        let record = row.text_cells().map(|cell| cell.unwrap_or(bid.as_str()));
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

/// 导出文件名
pub fn file_name(today: NaiveDate, locale: ExportLocale, format: ExportFormat) -> String {
    let stem = match locale {
        ExportLocale::Es => "optimizacion_ppc",
        ExportLocale::En => "ppc_optimization",
    };
    format!("{}_{}.{}", stem, today.format("%Y%m%d"), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChangeOrigin, EntityKind, Operation};
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    fn final_set() -> FinalChangeSet {
        let update = ProposedChange {
            operation: Operation::Update,
            entity: EntityKind::Keyword,
            campaign_id: "C1".to_string(),
            ad_group_id: "AG1".to_string(),
            keyword_id: "K1".to_string(),
            keyword_text: "blue widget".to_string(),
            match_type: MatchType::Broad,
            bid: 0.05,
            original_bid: Some(0.8),
            state: KeywordState::Enabled,
            origin: ChangeOrigin::Bleeder,
            product_ref: Some("SKU-1".to_string()),
            acos: None,
            sales: None,
        };
        let create = ProposedChange {
            operation: Operation::Create,
            keyword_id: String::new(),
            keyword_text: "widget, large".to_string(),
            match_type: MatchType::Exact,
            bid: 0.8,
            original_bid: None,
            origin: ChangeOrigin::Harvest,
            ..update.clone()
        };
        FinalChangeSet::from_reviewed(vec![update, create])
    }

    #[test]
    fn test_spanish_export_column_order() {
        let bytes = serialize(&final_set(), ExportLocale::Es, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Producto,Entidad,Operación,ID de la campaña,ID del grupo de anuncios,\
             ID de palabra clave,Puja,Estado,Texto de palabra clave,Tipo de coincidencia"
        );
        assert_eq!(
            lines[1],
            "SKU-1,Palabra clave,UPDATE,C1,AG1,K1,0.05,habilitado,blue widget,amplia"
        );
        // CREATE 的关键词 ID 为空; 含逗号的文本被引号包裹
        assert_eq!(
            lines[2],
            "SKU-1,Palabra clave,CREATE,C1,AG1,,0.80,habilitado,\"widget, large\",exacta"
        );
    }

    #[test]
    fn test_english_rows() {
        let rows = rows(&final_set(), ExportLocale::En);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "Keyword");
        assert_eq!(rows[0].state, "enabled");
        assert_eq!(rows[1].match_type, "exact");
        assert_eq!(rows[1].keyword_id, "");
        assert_eq!(rows[1].bid_text(), "0.80");
        assert_eq!(headers(ExportLocale::En)[6], "Bid");
    }

    #[test]
    fn test_empty_set_has_header_only() {
        let bytes = serialize_csv(&FinalChangeSet::from_reviewed(Vec::new()), ExportLocale::En).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Product,Entity,Operation,Campaign ID,Ad Group ID,Keyword ID,Bid,State,Keyword Text,Match Type\n"
        );
    }

    #[test]
    fn test_file_name() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            file_name(day, ExportLocale::Es, ExportFormat::Xlsx),
            "optimizacion_ppc_20261016.xlsx"
        );
        assert_eq!(
            file_name(day, ExportLocale::En, ExportFormat::Csv),
            "ppc_optimization_20261016.csv"
        );
    }

    #[test]
    fn test_xlsx_single_sheet_with_numeric_bid() {
        let bytes = serialize(&final_set(), ExportLocale::Es, ExportFormat::Xlsx).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let grid: Vec<&[Data]> = range.rows().collect();
        assert_eq!(grid.len(), 3);

        let header: Vec<String> = grid[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, headers(ExportLocale::Es).to_vec());

        assert_eq!(grid[1][6], Data::Float(0.05));
        assert_eq!(grid[2][6], Data::Float(0.8));
        assert_eq!(grid[1][5], Data::String("K1".to_string()));
        // CREATE 的关键词 ID 为空单元格
        assert_eq!(grid[2][5], Data::Empty);
        assert_eq!(grid[2][2], Data::String("CREATE".to_string()));
        assert_eq!(grid[2][8], Data::String("widget, large".to_string()));
    }

    #[test]
    fn test_xlsx_empty_set_has_header_only() {
        let bytes = serialize_xlsx(&FinalChangeSet::from_reviewed(Vec::new()), ExportLocale::En).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.height(), 1);
        assert_eq!(range.get((0, 6)), Some(&Data::String("Bid".to_string())));
    }
}
