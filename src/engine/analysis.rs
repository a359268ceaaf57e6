// ==========================================
// PPC 竞价优化引擎 - 表现分析
// ==========================================
// 职责: 规范行 → 账户概览 + Top 5 止血 / 优胜 / 收割机会
// 用途: 审核前的说明报告; 不产生变更
// ==========================================

use crate::domain::report::{KeywordRow, SearchTermRow};
use crate::engine::decision::DecisionConfig;
use serde::Serialize;
use tracing::instrument;

const TOP_N: usize = 5;

/// 账户概览
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClientContext {
    pub target_acos: f64,
    pub total_spend: f64,
    pub total_sales: f64,
    /// spend / sales; 销售为 0 时为 0
    pub global_acos: f64,
}

/// 止血候选
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BleederInsight {
    pub keyword_text: String,
    pub campaign_id: String,
    pub keyword_id: String,
    pub bid: f64,
    pub clicks: u64,
    pub spend: f64,
}

/// 优胜关键词
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerInsight {
    pub keyword_text: String,
    pub campaign_id: String,
    pub acos: f64,
    pub sales: f64,
    /// sales / clicks; 无点击时为 0
    pub conversion_rate: f64,
    pub spend: f64,
}

/// 收割机会
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestOpportunity {
    pub term: String,
    pub origin_campaign: String,
    pub orders: u64,
    pub acos: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub client_context: ClientContext,
    pub bleeders: Vec<BleederInsight>,
    pub winners: Vec<WinnerInsight>,
    pub harvest_opportunities: Vec<HarvestOpportunity>,
}

/// 花费 / 销售汇总与整体 ACOS
pub fn spend_totals(keywords: &[KeywordRow]) -> (f64, f64, f64) {
    let spend: f64 = keywords.iter().map(|k| k.spend).sum();
    let sales: f64 = keywords.iter().map(|k| k.sales).sum();
    (spend, sales, ratio(spend, sales))
}

pub(crate) fn ratio(spend: f64, sales: f64) -> f64 {
    if sales > 0.0 {
        spend / sales
    } else {
        0.0
    }
}

// ==========================================
// PerformanceAnalyzer
// ==========================================
pub struct PerformanceAnalyzer {
    config: DecisionConfig,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl PerformanceAnalyzer {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(keywords = keywords.len(), search_terms = search_terms.len()))]
    pub fn analyze(
        &self,
        keywords: &[KeywordRow],
        search_terms: &[SearchTermRow],
        target_acos: f64,
    ) -> AnalysisReport {
        let (total_spend, total_sales, global_acos) = spend_totals(keywords);

        AnalysisReport {
            client_context: ClientContext {
                target_acos,
                total_spend,
                total_sales,
                global_acos,
            },
            bleeders: self.bleeders(keywords),
            winners: self.winners(keywords),
            harvest_opportunities: self.harvest_opportunities(search_terms),
        }
    }

    fn bleeders(&self, keywords: &[KeywordRow]) -> Vec<BleederInsight> {
        let mut list: Vec<&KeywordRow> = keywords
            .iter()
            .filter(|k| k.sales == 0.0 && k.spend > self.config.bleeder_spend_floor)
            .collect();
        list.sort_by(|a, b| b.spend.total_cmp(&a.spend));

        list.into_iter()
            .take(TOP_N)
            .map(|k| BleederInsight {
                keyword_text: k.keyword_text.clone(),
                campaign_id: k.campaign_id.clone(),
                keyword_id: k.keyword_id.clone(),
                bid: k.bid,
                clicks: k.clicks,
                spend: k.spend,
            })
            .collect()
    }

    fn winners(&self, keywords: &[KeywordRow]) -> Vec<WinnerInsight> {
        let mut list: Vec<&KeywordRow> = keywords
            .iter()
            .filter(|k| k.acos > 0.0 && k.acos < self.config.winner_acos_ceiling && k.sales > 0.0)
            .collect();
        list.sort_by(|a, b| a.acos.total_cmp(&b.acos));

        list.into_iter()
            .take(TOP_N)
            .map(|k| WinnerInsight {
                keyword_text: k.keyword_text.clone(),
                campaign_id: k.campaign_id.clone(),
                acos: k.acos,
                sales: k.sales,
                conversion_rate: if k.clicks > 0 {
                    k.sales / k.clicks as f64
                } else {
                    0.0
                },
                spend: k.spend,
            })
            .collect()
    }

    fn harvest_opportunities(&self, search_terms: &[SearchTermRow]) -> Vec<HarvestOpportunity> {
        let mut list: Vec<&SearchTermRow> = search_terms
            .iter()
            .filter(|t| {
                t.orders >= self.config.harvest_min_orders && t.acos < self.config.harvest_max_acos
            })
            .collect();
        list.sort_by(|a, b| b.orders.cmp(&a.orders));

        list.into_iter()
            .take(TOP_N)
            .map(|t| HarvestOpportunity {
                term: t.search_term.trim().to_string(),
                origin_campaign: t.origin_campaign_name.trim().to_string(),
                orders: t.orders,
                acos: t.acos,
            })
            .collect()
    }
}
