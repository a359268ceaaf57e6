// ==========================================
// PPC 竞价优化引擎 - 引擎层
// ==========================================
// 职责: 活动索引 → 竞价规则 / 收割 → 审核 → 导出 / 快照
// 红线: Engine 不拼 SQL; 每条变更必须带来源规则 (origin)
// ==========================================

pub mod analysis;
pub mod bid_rules;
pub mod campaign_index;
pub mod decision;
pub mod error;
pub mod exporter;
pub mod harvest;
pub mod review;
pub mod snapshot;

// 重导出核心引擎
pub use analysis::{
    AnalysisReport, BleederInsight, ClientContext, HarvestOpportunity, PerformanceAnalyzer,
    WinnerInsight,
};
pub use bid_rules::{BidDecision, BidRuleEngine};
pub use campaign_index::{CampaignConflict, CampaignIndex, CampaignIndexBuild, CampaignIndexBuilder};
pub use decision::{DecisionConfig, DecisionEngine};
pub use error::{ExportError, ReviewError};
pub use exporter::ExportRow;
pub use harvest::HarvestPlanner;
pub use review::ChangeReview;
pub use snapshot::{week_start, SnapshotDeriver, SnapshotOutcome, SnapshotWriter};
