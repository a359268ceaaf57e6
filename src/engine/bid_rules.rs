// ==========================================
// PPC 竞价优化引擎 - 竞价规则
// ==========================================
// 红线: 严格优先级,命中第一条即停止
// ==========================================
// 1. Bleeder: sales == 0 且 spend > 地板 → 地板价（总是输出）
// 2. Winner: 0 < acos < 上限 → bid × 1.2
// 3. TargetConvergence: acos > 0 且 acos ≠ target → max(0, bid × target/acos)
//    FlatCorrection: acos > 0.35 → bid × 0.8
// 输出过滤: |new − bid| / bid > 0.05（Bleeder 除外）
// ==========================================

use crate::domain::change::{round_bid, ProposedChange};
use crate::domain::report::KeywordRow;
use crate::domain::types::{
    BidPolicy, ChangeOrigin, EntityKind, KeywordState, MatchType, Operation,
};
use crate::engine::decision::DecisionConfig;

/// ACOS 与目标视为相等的容差
const ACOS_EPSILON: f64 = 1e-9;

/// 规则判定结果（未取整）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidDecision {
    pub new_bid: f64,
    pub origin: ChangeOrigin,
}

// ==========================================
// BidRuleEngine
// ==========================================
pub struct BidRuleEngine<'c> {
    config: &'c DecisionConfig,
}

impl<'c> BidRuleEngine<'c> {
    pub fn new(config: &'c DecisionConfig) -> Self {
        Self { config }
    }

    /// 按优先级判定单个关键词
    ///
    /// # 返回
    /// - Some(BidDecision): 命中的规则及新竞价
    /// - None: 无规则命中（含 bid ≤ 0 的非止血情形）
    pub fn evaluate(&self, kw: &KeywordRow, target_acos: f64) -> Option<BidDecision> {
        let cfg = self.config;

        if kw.sales == 0.0 && kw.spend > cfg.bleeder_spend_floor {
            return Some(BidDecision {
                new_bid: cfg.bleeder_bid,
                origin: ChangeOrigin::Bleeder,
            });
        }

        if kw.bid <= 0.0 {
            return None;
        }

        if kw.acos > 0.0 && kw.acos < cfg.winner_acos_ceiling {
            return Some(BidDecision {
                new_bid: kw.bid * cfg.winner_multiplier,
                origin: ChangeOrigin::Winner,
            });
        }

        match cfg.bid_policy {
            BidPolicy::TargetConvergence
                if kw.acos > 0.0 && (kw.acos - target_acos).abs() > ACOS_EPSILON =>
            {
                Some(BidDecision {
                    new_bid: (kw.bid * target_acos / kw.acos).max(0.0),
                    origin: ChangeOrigin::Convergence,
                })
            }
            BidPolicy::FlatCorrection if kw.acos > cfg.flat_correction_acos => {
                Some(BidDecision {
                    new_bid: kw.bid * cfg.flat_correction_multiplier,
                    origin: ChangeOrigin::FlatCorrection,
                })
            }
            _ => None,
        }
    }

    /// 判定并应用输出过滤,生成 UPDATE 建议
    pub fn propose(&self, kw: &KeywordRow, target_acos: f64) -> Option<ProposedChange> {
        let decision = self.evaluate(kw, target_acos)?;

        let mut change = ProposedChange {
            operation: Operation::Update,
            entity: EntityKind::Keyword,
            campaign_id: kw.campaign_id.clone(),
            ad_group_id: kw.ad_group_id.clone(),
            keyword_id: kw.keyword_id.clone(),
            keyword_text: kw.keyword_text.clone(),
            match_type: kw.match_type.unwrap_or(MatchType::Exact),
            bid: decision.new_bid,
            original_bid: Some(kw.bid),
            state: KeywordState::Enabled,
            origin: decision.origin,
            product_ref: kw.product_ref.clone(),
            acos: Some(kw.acos),
            sales: Some(kw.sales),
        };

        // 过滤基于未取整的新竞价
        if decision.origin != ChangeOrigin::Bleeder
            && change
                .relative_change()
                .map_or(true, |r| r <= self.config.min_relative_change)
        {
            return None;
        }

        change.bid = round_bid(change.bid);
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(bid: f64, acos: f64, sales: f64, spend: f64) -> KeywordRow {
        KeywordRow {
            campaign_id: "C1".to_string(),
            ad_group_id: "AG1".to_string(),
            keyword_id: "K1".to_string(),
            keyword_text: "blue widget".to_string(),
            match_type: Some(MatchType::Phrase),
            bid,
            acos,
            sales,
            clicks: 10,
            spend,
            product_ref: Some("SKU-1".to_string()),
            row_number: 2,
        }
    }

    #[test]
    fn test_bleeder_always_emitted() {
        let cfg = DecisionConfig::default();
        let rules = BidRuleEngine::new(&cfg);
        let change = rules.propose(&kw(0.80, 0.0, 0.0, 7.0), 0.20).unwrap();
        assert_eq!(change.origin, ChangeOrigin::Bleeder);
        assert_eq!(change.bid, 0.05);
        assert_eq!(change.original_bid, Some(0.80));
        assert_eq!(change.match_type, MatchType::Phrase);

        // 原竞价已是地板价,仍然输出
        let again = rules.propose(&kw(0.05, 0.0, 0.0, 7.0), 0.20).unwrap();
        assert_eq!(again.bid, 0.05);

        // 零竞价也输出
        assert!(rules.propose(&kw(0.0, 0.0, 0.0, 7.0), 0.20).is_some());
    }

    #[test]
    fn test_bleeder_needs_spend_above_floor() {
        let cfg = DecisionConfig::default();
        let rules = BidRuleEngine::new(&cfg);
        assert!(rules.evaluate(&kw(0.80, 0.0, 0.0, 5.0), 0.20).is_none());
    }

    #[test]
    fn test_winner_raises_bid() {
        let cfg = DecisionConfig::default();
        let change = BidRuleEngine::new(&cfg)
            .propose(&kw(1.00, 0.05, 100.0, 5.0), 0.20)
            .unwrap();
        assert_eq!(change.origin, ChangeOrigin::Winner);
        assert_eq!(change.bid, 1.20);
    }

    #[test]
    fn test_convergence_halves_bid() {
        let cfg = DecisionConfig::default();
        let change = BidRuleEngine::new(&cfg)
            .propose(&kw(1.00, 0.40, 50.0, 20.0), 0.20)
            .unwrap();
        assert_eq!(change.origin, ChangeOrigin::Convergence);
        assert_eq!(change.bid, 0.50);
    }

    #[test]
    fn test_small_change_filtered() {
        let cfg = DecisionConfig::default();
        let rules = BidRuleEngine::new(&cfg);
        // 0.20 / 0.21 ≈ 0.952 → 变化 4.8%,不输出
        assert!(rules.propose(&kw(1.00, 0.21, 50.0, 10.5), 0.20).is_none());
        // acos 恰等于目标
        assert!(rules.evaluate(&kw(1.00, 0.20, 50.0, 10.0), 0.20).is_none());
        // 0.20 / 0.19 ≈ 1.0526 → 变化 5.3%,输出且取整
        let change = rules.propose(&kw(1.00, 0.19, 50.0, 9.5), 0.20).unwrap();
        assert_eq!(change.bid, 1.05);
        assert_eq!(change.original_bid, Some(1.00));
    }

    #[test]
    fn test_zero_acos_and_zero_bid_are_noops() {
        let cfg = DecisionConfig::default();
        let rules = BidRuleEngine::new(&cfg);
        assert!(rules.evaluate(&kw(1.00, 0.0, 10.0, 3.0), 0.20).is_none());
        assert!(rules.evaluate(&kw(0.0, 0.40, 10.0, 3.0), 0.20).is_none());
    }

    #[test]
    fn test_flat_correction_policy() {
        let cfg = DecisionConfig {
            bid_policy: BidPolicy::FlatCorrection,
            ..DecisionConfig::default()
        };
        let rules = BidRuleEngine::new(&cfg);

        let change = rules.propose(&kw(1.00, 0.50, 50.0, 25.0), 0.20).unwrap();
        assert_eq!(change.origin, ChangeOrigin::FlatCorrection);
        assert_eq!(change.bid, 0.80);

        // 0.30 高于目标但未超过 0.35,平直策略不调整
        assert!(rules.evaluate(&kw(1.00, 0.30, 50.0, 15.0), 0.20).is_none());

        // Winner 仍然优先
        let winner = rules.propose(&kw(1.00, 0.05, 50.0, 2.5), 0.20).unwrap();
        assert_eq!(winner.origin, ChangeOrigin::Winner);
    }

    #[test]
    fn test_bleeder_precedes_winner() {
        let cfg = DecisionConfig::default();
        // sales == 0 但 acos 字段被填了低值,仍按止血处理
        let decision = BidRuleEngine::new(&cfg)
            .evaluate(&kw(1.00, 0.05, 0.0, 9.0), 0.20)
            .unwrap();
        assert_eq!(decision.origin, ChangeOrigin::Bleeder);
    }
}
