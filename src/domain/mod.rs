// ==========================================
// PPC 竞价优化引擎 - 领域模型层
// ==========================================
// 职责: 定义规范行、变更集、快照与枚举类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod change;
pub mod report;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use change::{round_bid, ChangeSet, ChangeSummary, FinalChangeSet, ProposedChange};
pub use report::{BulkRow, CampaignRow, KeywordRow, RowError, SearchTermRow};
pub use snapshot::{TopProduct, WeeklySnapshot};
pub use types::{
    BidPolicy, ChangeOrigin, ChangeStage, DuplicatePolicy, EntityKind, ExportFormat,
    ExportLocale, IngestSource, KeywordState, MatchType, Operation,
};
