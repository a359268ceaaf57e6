// ==========================================
// PPC 竞价优化引擎 - 决策引擎
// ==========================================
// 职责: 关键词行 + 搜索词行 + 活动索引 → Draft 变更集
// 红线: 纯函数,相同输入产生相同 Draft
// ==========================================
// 输出顺序: UPDATE 按 Bulk 行顺序,其后 CREATE 按搜索词行顺序
// ==========================================

use crate::domain::change::ChangeSet;
use crate::domain::report::{KeywordRow, SearchTermRow};
use crate::domain::types::BidPolicy;
use crate::engine::bid_rules::BidRuleEngine;
use crate::engine::campaign_index::CampaignIndex;
use crate::engine::harvest::HarvestPlanner;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

// ==========================================
// DecisionConfig - 阈值与系数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub bid_policy: BidPolicy,

    // 止血规则
    pub bleeder_spend_floor: f64,
    pub bleeder_bid: f64,

    // 提价规则
    pub winner_acos_ceiling: f64,
    pub winner_multiplier: f64,

    // 固定回调（FlatCorrection 策略）
    pub flat_correction_acos: f64,
    pub flat_correction_multiplier: f64,

    /// 相对变化小于等于该比例的调整不输出
    pub min_relative_change: f64,

    // 收割规则
    pub harvest_max_acos: f64,
    pub harvest_min_orders: u64,
    pub harvest_default_bid: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            bid_policy: BidPolicy::TargetConvergence,
            bleeder_spend_floor: 5.0,
            bleeder_bid: 0.05,
            winner_acos_ceiling: 0.10,
            winner_multiplier: 1.2,
            flat_correction_acos: 0.35,
            flat_correction_multiplier: 0.8,
            min_relative_change: 0.05,
            harvest_max_acos: 0.30,
            harvest_min_orders: 1,
            harvest_default_bid: 0.5,
        }
    }
}

// ==========================================
// DecisionEngine
// ==========================================
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// 生成 Draft 变更集
    ///
    /// # 参数
    /// - keywords: Bulk 关键词行（源文件顺序）
    /// - search_terms: 搜索词行（源文件顺序）
    /// - index: 已构建完成的活动索引
    /// - target_acos: 目标 ACOS（比率,如 0.20）
    #[instrument(skip_all, fields(keywords = keywords.len(), search_terms = search_terms.len()))]
    pub fn decide(
        &self,
        keywords: &[KeywordRow],
        search_terms: &[SearchTermRow],
        index: &CampaignIndex,
        target_acos: f64,
    ) -> ChangeSet {
        let rules = BidRuleEngine::new(&self.config);
        let mut changes: Vec<_> = keywords
            .iter()
            .filter_map(|kw| rules.propose(kw, target_acos))
            .collect();
        let updates = changes.len();

        let harvest = HarvestPlanner::new(&self.config).plan(search_terms, keywords, index);
        let creates = harvest.len();
        changes.extend(harvest);

        info!(
            policy = %self.config.bid_policy,
            target_acos,
            updates,
            creates,
            "决策完成"
        );
        ChangeSet::new(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{BulkRow, CampaignRow};
    use crate::domain::types::{ChangeOrigin, MatchType, Operation};
    use crate::engine::campaign_index::CampaignIndexBuilder;

    fn keyword(id: &str, bid: f64, acos: f64, sales: f64, spend: f64, row: usize) -> KeywordRow {
        KeywordRow {
            campaign_id: "C1".to_string(),
            ad_group_id: "AG1".to_string(),
            keyword_id: id.to_string(),
            keyword_text: format!("kw {}", id),
            match_type: Some(MatchType::Broad),
            bid,
            acos,
            sales,
            clicks: 10,
            spend,
            product_ref: None,
            row_number: row,
        }
    }

    fn index() -> CampaignIndex {
        CampaignIndexBuilder::default()
            .build(&[BulkRow::Campaign(CampaignRow {
                campaign_id: "C1".to_string(),
                campaign_name: "Manual-A".to_string(),
                row_number: 2,
            })])
            .index
    }

    fn term(text: &str, orders: u64, acos: f64, row: usize) -> SearchTermRow {
        SearchTermRow {
            search_term: text.to_string(),
            origin_campaign_name: "Manual-A".to_string(),
            orders,
            acos,
            row_number: row,
        }
    }

    #[test]
    fn test_updates_precede_creates() {
        let keywords = vec![
            keyword("K1", 1.0, 0.40, 50.0, 20.0, 3),
            keyword("K2", 0.8, 0.0, 0.0, 7.0, 4),
            keyword("K3", 1.0, 0.20, 50.0, 10.0, 5),
        ];
        let terms = vec![term("blue widget", 3, 0.15, 2)];

        let draft = DecisionEngine::default().decide(&keywords, &terms, &index(), 0.20);
        let changes = draft.changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].keyword_id, "K1");
        assert_eq!(changes[0].origin, ChangeOrigin::Convergence);
        assert_eq!(changes[0].bid, 0.5);
        assert_eq!(changes[1].keyword_id, "K2");
        assert_eq!(changes[1].origin, ChangeOrigin::Bleeder);
        assert_eq!(changes[2].operation, Operation::Create);
        assert_eq!(changes[2].bid, 1.0);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let keywords = vec![
            keyword("K1", 1.0, 0.05, 50.0, 2.5, 3),
            keyword("K2", 0.8, 0.0, 0.0, 7.0, 4),
        ];
        let terms = vec![term("blue widget", 3, 0.15, 2), term("red", 0, 0.1, 3)];
        let engine = DecisionEngine::default();
        let first = engine.decide(&keywords, &terms, &index(), 0.20);
        let second = engine.decide(&keywords, &terms, &index(), 0.20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_inputs_yield_empty_draft() {
        let draft = DecisionEngine::default().decide(&[], &[], &CampaignIndex::default(), 0.20);
        assert!(draft.is_empty());
    }
}
