// ==========================================
// PPC 竞价优化引擎 - 变更集
// ==========================================
// 职责: 建议变更 (ProposedChange) 与变更集生命周期
// 生命周期: Draft (ChangeSet) → UnderReview (engine::review) → Final (FinalChangeSet)
// 红线: Draft 生成后不可原地修改; 审核只作用于副本
// ==========================================

use crate::domain::types::{
    ChangeOrigin, ChangeStage, EntityKind, KeywordState, MatchType, Operation,
};
use serde::{Deserialize, Serialize};

/// 竞价统一保留两位小数
pub fn round_bid(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// ProposedChange - 单条建议变更
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedChange {
    pub operation: Operation,
    pub entity: EntityKind,
    pub campaign_id: String,
    pub ad_group_id: String,
    /// CREATE 时为空
    pub keyword_id: String,
    pub keyword_text: String,
    pub match_type: MatchType,
    /// 新竞价（两位小数）
    pub bid: f64,
    /// 仅 UPDATE 有值
    pub original_bid: Option<f64>,
    pub state: KeywordState,
    pub origin: ChangeOrigin,
    pub product_ref: Option<String>,

    // 审核参考信息
    pub acos: Option<f64>,
    pub sales: Option<f64>,
}

impl ProposedChange {
    /// 相对原竞价的变化比例（CREATE 或原竞价为 0 时为 None）
    pub fn relative_change(&self) -> Option<f64> {
        match self.original_bid {
            Some(orig) if orig > 0.0 => Some((self.bid - orig).abs() / orig),
            _ => None,
        }
    }
}

// ==========================================
// ChangeSummary - 变更统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total_changes: usize,
    pub updates: usize,
    pub new_keywords: usize,
}

impl ChangeSummary {
    pub fn from_changes(changes: &[ProposedChange]) -> Self {
        let updates = changes
            .iter()
            .filter(|c| c.operation == Operation::Update)
            .count();
        let new_keywords = changes
            .iter()
            .filter(|c| c.operation == Operation::Create)
            .count();
        Self {
            total_changes: changes.len(),
            updates,
            new_keywords,
        }
    }
}

// ==========================================
// ChangeSet - 决策引擎输出的草稿
// ==========================================
// 字段私有: 外部只能读取,修改必须经过 ChangeReview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<ProposedChange>,
}

impl ChangeSet {
    pub(crate) fn new(changes: Vec<ProposedChange>) -> Self {
        Self { changes }
    }

    pub fn stage(&self) -> ChangeStage {
        ChangeStage::Draft
    }

    pub fn changes(&self) -> &[ProposedChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::from_changes(&self.changes)
    }
}

// ==========================================
// FinalChangeSet - 审核提交后的冻结变更集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalChangeSet {
    changes: Vec<ProposedChange>,
}

impl FinalChangeSet {
    pub(crate) fn from_reviewed(changes: Vec<ProposedChange>) -> Self {
        Self { changes }
    }

    pub fn stage(&self) -> ChangeStage {
        ChangeStage::Final
    }

    pub fn changes(&self) -> &[ProposedChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::from_changes(&self.changes)
    }
}
