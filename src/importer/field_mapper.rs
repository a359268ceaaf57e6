// ==========================================
// PPC 竞价优化引擎 - 字段映射器实现
// ==========================================
// 阶段 1: 行对象 → 规范行
// 流程: 列解析（候选表） → 数值归一化 → 结构校验
// 行级问题返回 RowError,由导入器收集,不中断整批
// ==========================================

use crate::domain::report::{BulkRow, CampaignRow, KeywordRow, RowError, SearchTermRow};
use crate::domain::types::{EntityKind, IngestSource, MatchType};
use crate::importer::column_resolver::{resolve, ColumnMatcher, FieldCandidates};
use crate::importer::importer_trait::FieldMapper;
use crate::importer::numeric::normalize_opt;
use crate::importer::workbook::SheetRow;

/// 行映射上下文（ACOS 单位 + 数据来源）
struct RowContext<'a> {
    row: &'a SheetRow,
    source: IngestSource,
}

impl<'a> RowContext<'a> {
    fn text(&self, candidates: &[ColumnMatcher]) -> Option<String> {
        resolve(self.row, candidates).map(|v| v.to_string())
    }

    fn required(&self, candidates: &[ColumnMatcher], what: &str) -> Result<String, RowError> {
        self.text(candidates).ok_or_else(|| self.error(format!("missing {}", what)))
    }

    /// 数值字段: 缺失视为 0,负数视为行错误
    fn non_negative(&self, candidates: &[ColumnMatcher], what: &str) -> Result<f64, RowError> {
        let value = normalize_opt(resolve(self.row, candidates));
        if value < 0.0 {
            return Err(self.error(format!("negative {}: {}", what, value)));
        }
        Ok(value)
    }

    fn error(&self, reason: String) -> RowError {
        let reason = if self.row.truncated {
            format!("{} (row is shorter than the header)", reason)
        } else {
            reason
        };
        RowError::new(self.source, self.row.row_number, reason)
    }
}

fn to_ratio(acos: f64, acos_is_percent: bool) -> f64 {
    if acos_is_percent {
        acos / 100.0
    } else {
        acos
    }
}

// ==========================================
// BulkFieldMapper - Bulk 报表行映射
// ==========================================
pub struct BulkFieldMapper {
    /// 报表 ACOS 列是否为百分数
    pub acos_is_percent: bool,
}

impl Default for BulkFieldMapper {
    fn default() -> Self {
        Self {
            acos_is_percent: true,
        }
    }
}

impl FieldMapper for BulkFieldMapper {
    type Output = BulkRow;

    fn map_row(&self, row: &SheetRow) -> Result<Option<BulkRow>, RowError> {
        let ctx = RowContext {
            row,
            source: IngestSource::Bulk,
        };

        let entity = ctx.required(FieldCandidates::entity(), "entity type")?;
        match EntityKind::parse(&entity) {
            EntityKind::Campaign => self.map_campaign(&ctx).map(|c| Some(BulkRow::Campaign(c))),
            EntityKind::Keyword => self.map_keyword(&ctx).map(|k| Some(BulkRow::Keyword(k))),
            EntityKind::Other => Ok(None),
        }
    }
}

impl BulkFieldMapper {
    fn map_campaign(&self, ctx: &RowContext<'_>) -> Result<CampaignRow, RowError> {
        Ok(CampaignRow {
            campaign_id: ctx.required(FieldCandidates::campaign_id(), "campaign id")?,
            campaign_name: ctx.required(FieldCandidates::campaign_name(), "campaign name")?,
            row_number: ctx.row.row_number,
        })
    }

    fn map_keyword(&self, ctx: &RowContext<'_>) -> Result<KeywordRow, RowError> {
        let campaign_id = ctx.required(FieldCandidates::campaign_id(), "campaign id")?;

        let keyword_text = ctx.text(FieldCandidates::keyword_text()).unwrap_or_default();
        let keyword_id = ctx.text(FieldCandidates::keyword_id()).unwrap_or_default();
        if keyword_text.is_empty() && keyword_id.is_empty() {
            return Err(ctx.error("missing keyword text and keyword id".to_string()));
        }

        let bid = ctx.non_negative(FieldCandidates::bid(), "bid")?;
        let sales = ctx.non_negative(FieldCandidates::sales(), "sales")?;
        let clicks = ctx.non_negative(FieldCandidates::clicks(), "clicks")?.round() as u64;
        let acos = to_ratio(
            ctx.non_negative(FieldCandidates::acos(), "acos")?,
            self.acos_is_percent,
        );

        // 花费列缺失或为 0 时回退为 bid × clicks
        let explicit_spend = ctx.non_negative(FieldCandidates::spend(), "spend")?;
        let spend = if explicit_spend > 0.0 {
            explicit_spend
        } else {
            bid * clicks as f64
        };

        Ok(KeywordRow {
            campaign_id,
            ad_group_id: ctx.text(FieldCandidates::ad_group_id()).unwrap_or_default(),
            keyword_id,
            keyword_text,
            match_type: ctx
                .text(FieldCandidates::match_type())
                .and_then(|m| MatchType::parse(&m)),
            bid,
            acos,
            sales,
            clicks,
            spend,
            product_ref: ctx.text(FieldCandidates::product()),
            row_number: ctx.row.row_number,
        })
    }
}

// ==========================================
// SearchTermFieldMapper - 搜索词报表行映射
// ==========================================
pub struct SearchTermFieldMapper {
    pub acos_is_percent: bool,
}

impl Default for SearchTermFieldMapper {
    fn default() -> Self {
        Self {
            acos_is_percent: true,
        }
    }
}

impl FieldMapper for SearchTermFieldMapper {
    type Output = SearchTermRow;

    fn map_row(&self, row: &SheetRow) -> Result<Option<SearchTermRow>, RowError> {
        let ctx = RowContext {
            row,
            source: IngestSource::SearchTerms,
        };

        let search_term = ctx.required(FieldCandidates::search_term(), "search term")?;
        let origin_campaign_name =
            ctx.required(FieldCandidates::search_term_campaign(), "campaign name")?;
        let orders = ctx.non_negative(FieldCandidates::orders(), "orders")?.round() as u64;
        let acos = to_ratio(
            ctx.non_negative(FieldCandidates::acos(), "acos")?,
            self.acos_is_percent,
        );

        Ok(Some(SearchTermRow {
            search_term,
            origin_campaign_name,
            orders,
            acos,
            row_number: row.row_number,
        }))
    }
}
