// ==========================================
// PPC 竞价优化引擎 - 搜索词收割
// ==========================================
// 职责: 表现良好的搜索词 → 新建精确匹配关键词 (CREATE)
// 条件: orders ≥ 1 且 acos < 0.30 且来源活动可在索引中匹配
// 种子: 匹配活动下首个关键词行的竞价 / 广告组 / 商品; 无则默认 0.5
// ==========================================

use crate::domain::change::{round_bid, ProposedChange};
use crate::domain::report::{KeywordRow, SearchTermRow};
use crate::domain::types::{ChangeOrigin, EntityKind, KeywordState, MatchType, Operation};
use crate::engine::campaign_index::CampaignIndex;
use crate::engine::decision::DecisionConfig;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub struct HarvestPlanner<'c> {
    config: &'c DecisionConfig,
}

impl<'c> HarvestPlanner<'c> {
    pub fn new(config: &'c DecisionConfig) -> Self {
        Self { config }
    }

    /// 搜索词是否满足收割条件（不含活动匹配）
    pub fn qualifies(&self, term: &SearchTermRow) -> bool {
        term.orders >= self.config.harvest_min_orders && term.acos < self.config.harvest_max_acos
    }

    /// 生成 CREATE 建议（按搜索词行顺序）
    ///
    /// 同一运行中 (活动 ID, 小写搜索词) 只生成一次
    pub fn plan(
        &self,
        search_terms: &[SearchTermRow],
        keywords: &[KeywordRow],
        index: &CampaignIndex,
    ) -> Vec<ProposedChange> {
        let mut seeds: HashMap<&str, &KeywordRow> = HashMap::new();
        for kw in keywords {
            seeds.entry(kw.campaign_id.trim()).or_insert(kw);
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut creates = Vec::new();

        for term in search_terms.iter().filter(|t| self.qualifies(t)) {
            let text = term.search_term.trim();
            if text.is_empty() {
                continue;
            }

            let Some(campaign_id) = index.match_campaign(&term.origin_campaign_name) else {
                debug!(
                    term = %text,
                    campaign = %term.origin_campaign_name,
                    "搜索词来源活动未匹配,跳过"
                );
                continue;
            };

            if !seen.insert((campaign_id.to_string(), text.to_lowercase())) {
                continue;
            }

            let seed = seeds.get(campaign_id).copied();
            creates.push(ProposedChange {
                operation: Operation::Create,
                entity: EntityKind::Keyword,
                campaign_id: campaign_id.to_string(),
                ad_group_id: seed.map(|s| s.ad_group_id.clone()).unwrap_or_default(),
                keyword_id: String::new(),
                keyword_text: text.to_string(),
                match_type: MatchType::Exact,
                bid: round_bid(seed.map_or(self.config.harvest_default_bid, |s| s.bid)),
                original_bid: None,
                state: KeywordState::Enabled,
                origin: ChangeOrigin::Harvest,
                product_ref: seed.and_then(|s| s.product_ref.clone()),
                acos: Some(term.acos),
                sales: None,
            });
        }

        creates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{BulkRow, CampaignRow};
    use crate::engine::campaign_index::CampaignIndexBuilder;

    fn index() -> CampaignIndex {
        CampaignIndexBuilder::default()
            .build(&[
                BulkRow::Campaign(CampaignRow {
                    campaign_id: "C1".to_string(),
                    campaign_name: "Manual-A".to_string(),
                    row_number: 2,
                }),
                BulkRow::Campaign(CampaignRow {
                    campaign_id: "C2".to_string(),
                    campaign_name: "Manual-B".to_string(),
                    row_number: 3,
                }),
            ])
            .index
    }

    fn seed_keyword(campaign_id: &str, bid: f64) -> KeywordRow {
        KeywordRow {
            campaign_id: campaign_id.to_string(),
            ad_group_id: "AG7".to_string(),
            keyword_id: "K1".to_string(),
            keyword_text: "widget".to_string(),
            match_type: None,
            bid,
            acos: 0.0,
            sales: 0.0,
            clicks: 0,
            spend: 0.0,
            product_ref: Some("SKU-9".to_string()),
            row_number: 4,
        }
    }

    fn term(text: &str, campaign: &str, orders: u64, acos: f64) -> SearchTermRow {
        SearchTermRow {
            search_term: text.to_string(),
            origin_campaign_name: campaign.to_string(),
            orders,
            acos,
            row_number: 2,
        }
    }

    #[test]
    fn test_harvest_gating() {
        let cfg = DecisionConfig::default();
        let planner = HarvestPlanner::new(&cfg);
        let terms = vec![
            term("no orders", "Manual-A", 0, 0.10),
            term("too expensive", "Manual-A", 2, 0.30),
            term("unknown campaign", "Other", 2, 0.10),
            term("blue widget", "Manual-A", 3, 0.15),
        ];
        let creates = planner.plan(&terms, &[seed_keyword("C1", 0.80)], &index());
        assert_eq!(creates.len(), 1);

        let c = &creates[0];
        assert_eq!(c.operation, Operation::Create);
        assert_eq!(c.campaign_id, "C1");
        assert_eq!(c.keyword_text, "blue widget");
        assert_eq!(c.keyword_id, "");
        assert_eq!(c.match_type, MatchType::Exact);
        assert_eq!(c.bid, 0.80);
        assert_eq!(c.ad_group_id, "AG7");
        assert_eq!(c.product_ref.as_deref(), Some("SKU-9"));
    }

    #[test]
    fn test_default_seed_bid() {
        let cfg = DecisionConfig::default();
        let creates = HarvestPlanner::new(&cfg).plan(
            &[term("red widget", "manual-b", 1, 0.0)],
            &[seed_keyword("C1", 0.80)],
            &index(),
        );
        assert_eq!(creates[0].campaign_id, "C2");
        assert_eq!(creates[0].bid, 0.5);
        assert_eq!(creates[0].ad_group_id, "");
    }

    #[test]
    fn test_duplicate_terms_create_once() {
        let cfg = DecisionConfig::default();
        let creates = HarvestPlanner::new(&cfg).plan(
            &[
                term("Blue Widget", "Manual-A", 3, 0.15),
                term("blue widget", "Manual-A", 1, 0.20),
                term("blue widget", "Manual-B", 1, 0.20),
            ],
            &[],
            &index(),
        );
        assert_eq!(creates.len(), 2);
        assert_eq!(creates[0].keyword_text, "Blue Widget");
        assert_eq!(creates[1].campaign_id, "C2");
    }
}
