// ==========================================
// PPC 竞价优化引擎 - 优化配置读取 Trait
// ==========================================
// 职责: 定义决策引擎 / 导入 / 导出所需的配置读取接口
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{BidPolicy, DuplicatePolicy, ExportFormat, ExportLocale};
use crate::engine::decision::DecisionConfig;
use crate::repository::RepositoryResult;
use async_trait::async_trait;
use serde::Serialize;

// ==========================================
// OptimizerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait OptimizerConfigReader: Send + Sync {
    // ===== 目标与策略 =====

    /// 目标 ACOS（百分数）
    ///
    /// # 默认值
    /// - 20
    async fn get_target_acos_pct(&self) -> RepositoryResult<f64>;

    /// # 默认值
    /// - TARGET_CONVERGENCE
    async fn get_bid_policy(&self) -> RepositoryResult<BidPolicy>;

    // ===== 竞价规则阈值 =====

    /// 止血规则的花费下限（默认 5）
    async fn get_bleeder_spend_floor(&self) -> RepositoryResult<f64>;

    /// 止血价（默认 0.05）
    async fn get_bleeder_bid(&self) -> RepositoryResult<f64>;

    /// 优胜规则 ACOS 上限（比率,默认 0.10）
    async fn get_winner_acos_ceiling(&self) -> RepositoryResult<f64>;

    /// 优胜提价系数（默认 1.2）
    async fn get_winner_multiplier(&self) -> RepositoryResult<f64>;

    /// 固定回调触发 ACOS（比率,默认 0.35）
    async fn get_flat_correction_acos(&self) -> RepositoryResult<f64>;

    /// 固定回调系数（默认 0.8）
    async fn get_flat_correction_multiplier(&self) -> RepositoryResult<f64>;

    /// 最小相对变化（默认 0.05）
    async fn get_min_relative_change(&self) -> RepositoryResult<f64>;

    // ===== 收割 =====

    /// 收割 ACOS 上限（比率,默认 0.30）
    async fn get_harvest_max_acos(&self) -> RepositoryResult<f64>;

    /// 收割最少订单数（默认 1）
    async fn get_harvest_min_orders(&self) -> RepositoryResult<u64>;

    /// 无种子关键词时的默认竞价（默认 0.5）
    async fn get_harvest_default_bid(&self) -> RepositoryResult<f64>;

    // ===== 导入 / 导出 =====

    /// # 默认值
    /// - KEEP_FIRST
    async fn get_campaign_duplicate_policy(&self) -> RepositoryResult<DuplicatePolicy>;

    /// 报表 ACOS 列是否为百分数（默认 true）
    async fn get_acos_is_percent(&self) -> RepositoryResult<bool>;

    /// 导出语言（默认 es）
    async fn get_export_locale(&self) -> RepositoryResult<ExportLocale>;

    /// 导出格式（默认 xlsx）
    async fn get_export_format(&self) -> RepositoryResult<ExportFormat>;
}

/// 单次运行的完整设置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerSettings {
    /// 百分数
    pub target_acos_pct: f64,
    pub decision: DecisionConfig,
    pub duplicate_policy: DuplicatePolicy,
    pub acos_is_percent: bool,
    pub export_locale: ExportLocale,
    pub export_format: ExportFormat,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            target_acos_pct: 20.0,
            decision: DecisionConfig::default(),
            duplicate_policy: DuplicatePolicy::KeepFirst,
            acos_is_percent: true,
            export_locale: ExportLocale::Es,
            export_format: ExportFormat::Xlsx,
        }
    }
}

impl OptimizerSettings {
    /// 目标 ACOS 比率
    pub fn target_acos(&self) -> f64 {
        self.target_acos_pct / 100.0
    }
}

/// 读取决策引擎配置
pub async fn load_decision_config<R>(reader: &R) -> RepositoryResult<DecisionConfig>
where
    R: OptimizerConfigReader + ?Sized,
{
    Ok(DecisionConfig {
        bid_policy: reader.get_bid_policy().await?,
        bleeder_spend_floor: reader.get_bleeder_spend_floor().await?,
        bleeder_bid: reader.get_bleeder_bid().await?,
        winner_acos_ceiling: reader.get_winner_acos_ceiling().await?,
        winner_multiplier: reader.get_winner_multiplier().await?,
        flat_correction_acos: reader.get_flat_correction_acos().await?,
        flat_correction_multiplier: reader.get_flat_correction_multiplier().await?,
        min_relative_change: reader.get_min_relative_change().await?,
        harvest_max_acos: reader.get_harvest_max_acos().await?,
        harvest_min_orders: reader.get_harvest_min_orders().await?,
        harvest_default_bid: reader.get_harvest_default_bid().await?,
    })
}

/// 读取完整设置
pub async fn load_settings<R>(reader: &R) -> RepositoryResult<OptimizerSettings>
where
    R: OptimizerConfigReader + ?Sized,
{
    Ok(OptimizerSettings {
        target_acos_pct: reader.get_target_acos_pct().await?,
        decision: load_decision_config(reader).await?,
        duplicate_policy: reader.get_campaign_duplicate_policy().await?,
        acos_is_percent: reader.get_acos_is_percent().await?,
        export_locale: reader.get_export_locale().await?,
        export_format: reader.get_export_format().await?,
    })
}
