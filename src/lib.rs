// ==========================================
// PPC 竞价优化引擎 - 核心库
// ==========================================
// 输入: Bulk 报表 + 搜索词报表
// 输出: 可审核的竞价变更 → CSV 导出 + 周度快照
// 系统定位: 决策支持工具 (人工审核后提交)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 规范行、变更集、快照
pub mod domain;

// 导入层 - 报表解析
pub mod importer;

// 引擎层 - 决策 / 审核 / 导出 / 快照
pub mod engine;

// 数据仓储层 - 快照存储
pub mod repository;

// 配置层 - 阈值与策略
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 流水线入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BidPolicy, ChangeOrigin, ChangeSet, ChangeStage, ChangeSummary, DuplicatePolicy,
    ExportLocale, FinalChangeSet, KeywordRow, MatchType, Operation, ProposedChange, RowError,
    SearchTermRow, WeeklySnapshot,
};

// 引擎
pub use engine::{
    CampaignIndex, CampaignIndexBuilder, ChangeReview, DecisionConfig, DecisionEngine,
    PerformanceAnalyzer, SnapshotWriter,
};

// 导入
pub use importer::{ReportImporter, TabularSource};

// 配置
pub use config::{ConfigManager, OptimizerSettings};

// API
pub use api::{ApiError, ApiResult, OptimizerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "PPC Bid Optimizer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
