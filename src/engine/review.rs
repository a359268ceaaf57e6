// ==========================================
// PPC 竞价优化引擎 - 变更审核
// ==========================================
// 职责: Draft 的独立工作副本; 编辑 / 删除 → 显式提交为 Final
// 红线: 不回写 Draft; 编辑不重新走规则校验
// ==========================================

use crate::domain::change::{round_bid, ChangeSet, ChangeSummary, FinalChangeSet, ProposedChange};
use crate::domain::types::ChangeStage;
use crate::engine::error::ReviewError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ChangeReview {
    working: Vec<ProposedChange>,
}

impl ChangeReview {
    /// 打开审核（深拷贝 Draft）
    pub fn open(draft: &ChangeSet) -> Self {
        Self {
            working: draft.changes().to_vec(),
        }
    }

    pub fn stage(&self) -> ChangeStage {
        ChangeStage::UnderReview
    }

    pub fn changes(&self) -> &[ProposedChange] {
        &self.working
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::from_changes(&self.working)
    }

    /// 覆盖单条变更的竞价（两位小数存储）
    pub fn edit_bid(&mut self, index: usize, bid: f64) -> Result<(), ReviewError> {
        if !bid.is_finite() || bid < 0.0 {
            return Err(ReviewError::InvalidBid(bid));
        }
        let len = self.working.len();
        let change = self
            .working
            .get_mut(index)
            .ok_or(ReviewError::IndexOutOfRange { index, len })?;

        debug!(index, from = change.bid, to = bid, "审核修改竞价");
        change.bid = round_bid(bid);
        Ok(())
    }

    /// 删除单条变更,返回被删除项
    pub fn remove(&mut self, index: usize) -> Result<ProposedChange, ReviewError> {
        if index >= self.working.len() {
            return Err(ReviewError::IndexOutOfRange {
                index,
                len: self.working.len(),
            });
        }
        let removed = self.working.remove(index);
        debug!(index, keyword = %removed.keyword_text, "审核删除变更");
        Ok(removed)
    }

    /// 提交,冻结为 Final
    pub fn commit(self) -> FinalChangeSet {
        FinalChangeSet::from_reviewed(self.working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        ChangeOrigin, EntityKind, KeywordState, MatchType, Operation,
    };

    fn draft() -> ChangeSet {
        let base = ProposedChange {
            operation: Operation::Update,
            entity: EntityKind::Keyword,
            campaign_id: "C1".to_string(),
            ad_group_id: "AG1".to_string(),
            keyword_id: "K1".to_string(),
            keyword_text: "blue widget".to_string(),
            match_type: MatchType::Exact,
            bid: 0.05,
            original_bid: Some(0.8),
            state: KeywordState::Enabled,
            origin: ChangeOrigin::Bleeder,
            product_ref: None,
            acos: Some(0.0),
            sales: Some(0.0),
        };
        let create = ProposedChange {
            operation: Operation::Create,
            keyword_id: String::new(),
            keyword_text: "red widget".to_string(),
            bid: 0.8,
            original_bid: None,
            origin: ChangeOrigin::Harvest,
            ..base.clone()
        };
        ChangeSet::new(vec![base, create])
    }

    #[test]
    fn test_review_does_not_mutate_draft() {
        let draft = draft();
        let snapshot = draft.clone();

        let mut review = ChangeReview::open(&draft);
        assert_eq!(review.stage(), ChangeStage::UnderReview);
        review.edit_bid(0, 0.456).unwrap();
        review.remove(1).unwrap();
        let final_set = review.commit();

        assert_eq!(draft, snapshot);
        assert_eq!(final_set.len(), 1);
        assert_eq!(final_set.changes()[0].bid, 0.46);
        assert_eq!(final_set.stage(), ChangeStage::Final);
    }

    #[test]
    fn test_edit_bypasses_rules() {
        let mut review = ChangeReview::open(&draft());
        // 审核可任意改价,包括把止血价改回原价
        review.edit_bid(0, 0.8).unwrap();
        assert_eq!(review.changes()[0].bid, 0.8);
        assert_eq!(review.summary().total_changes, 2);
    }

    #[test]
    fn test_out_of_range_and_invalid_bid() {
        let mut review = ChangeReview::open(&draft());
        assert_eq!(
            review.edit_bid(5, 1.0),
            Err(ReviewError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            review.remove(2).unwrap_err(),
            ReviewError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert_eq!(review.edit_bid(0, -1.0), Err(ReviewError::InvalidBid(-1.0)));
        assert!(matches!(
            review.edit_bid(0, f64::NAN),
            Err(ReviewError::InvalidBid(_))
        ));
    }

    #[test]
    fn test_commit_empty_review() {
        let mut review = ChangeReview::open(&draft());
        review.remove(0).unwrap();
        review.remove(0).unwrap();
        assert!(review.is_empty());
        assert!(review.commit().is_empty());
    }
}
