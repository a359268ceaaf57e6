// ==========================================
// PPC 竞价优化引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约束: 缺失或无法解析的值一律回退默认值
// ==========================================

use crate::config::optimizer_config_trait::OptimizerConfigReader;
use crate::db::{configure_sqlite_connection, ensure_config_table, open_sqlite_connection};
use crate::domain::types::{BidPolicy, DuplicatePolicy, ExportFormat, ExportLocale};
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）并确保 config_kv 存在
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_config_table(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        debug!(key, value, "配置已写入");
        Ok(())
    }

    /// 列出全部 global 配置（按键排序）
    pub fn list_global_config(&self) -> RepositoryResult<Vec<(String, String)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取非负有限数值; 解析失败回退默认值
    fn get_non_negative(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(default))
    }
}

#[async_trait]
impl OptimizerConfigReader for ConfigManager {
    async fn get_target_acos_pct(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::TARGET_ACOS_PCT, 20.0)
    }

    async fn get_bid_policy(&self) -> RepositoryResult<BidPolicy> {
        let value = self.get_config_or_default(config_keys::BID_POLICY, "TARGET_CONVERGENCE")?;
        Ok(BidPolicy::parse(&value).unwrap_or(BidPolicy::TargetConvergence))
    }

    async fn get_bleeder_spend_floor(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::BLEEDER_SPEND_FLOOR, 5.0)
    }

    async fn get_bleeder_bid(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::BLEEDER_BID, 0.05)
    }

    async fn get_winner_acos_ceiling(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::WINNER_ACOS_CEILING, 0.10)
    }

    async fn get_winner_multiplier(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::WINNER_MULTIPLIER, 1.2)
    }

    async fn get_flat_correction_acos(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::FLAT_CORRECTION_ACOS, 0.35)
    }

    async fn get_flat_correction_multiplier(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::FLAT_CORRECTION_MULTIPLIER, 0.8)
    }

    async fn get_min_relative_change(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::MIN_RELATIVE_CHANGE, 0.05)
    }

    async fn get_harvest_max_acos(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::HARVEST_MAX_ACOS, 0.30)
    }

    async fn get_harvest_min_orders(&self) -> RepositoryResult<u64> {
        let value = self.get_config_or_default(config_keys::HARVEST_MIN_ORDERS, "1")?;
        Ok(value.trim().parse::<u64>().unwrap_or(1))
    }

    async fn get_harvest_default_bid(&self) -> RepositoryResult<f64> {
        self.get_non_negative(config_keys::HARVEST_DEFAULT_BID, 0.5)
    }

    async fn get_campaign_duplicate_policy(&self) -> RepositoryResult<DuplicatePolicy> {
        let value =
            self.get_config_or_default(config_keys::CAMPAIGN_DUPLICATE_POLICY, "KEEP_FIRST")?;
        Ok(DuplicatePolicy::parse(&value).unwrap_or(DuplicatePolicy::KeepFirst))
    }

    async fn get_acos_is_percent(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::ACOS_IS_PERCENT, "true")?;
        Ok(!matches!(
            value.trim().to_lowercase().as_str(),
            "false" | "0" | "no"
        ))
    }

    async fn get_export_locale(&self) -> RepositoryResult<ExportLocale> {
        let value = self.get_config_or_default(config_keys::EXPORT_LOCALE, "es")?;
        Ok(ExportLocale::parse(&value).unwrap_or(ExportLocale::Es))
    }

    async fn get_export_format(&self) -> RepositoryResult<ExportFormat> {
        let value = self.get_config_or_default(config_keys::EXPORT_FORMAT, "xlsx")?;
        Ok(ExportFormat::parse(&value).unwrap_or(ExportFormat::Xlsx))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 目标与策略
    pub const TARGET_ACOS_PCT: &str = "target_acos_pct";
    pub const BID_POLICY: &str = "bid_policy";

    // 竞价规则
    pub const BLEEDER_SPEND_FLOOR: &str = "bleeder_spend_floor";
    pub const BLEEDER_BID: &str = "bleeder_bid";
    pub const WINNER_ACOS_CEILING: &str = "winner_acos_ceiling";
    pub const WINNER_MULTIPLIER: &str = "winner_multiplier";
    pub const FLAT_CORRECTION_ACOS: &str = "flat_correction_acos";
    pub const FLAT_CORRECTION_MULTIPLIER: &str = "flat_correction_multiplier";
    pub const MIN_RELATIVE_CHANGE: &str = "min_relative_change";

    // 收割
    pub const HARVEST_MAX_ACOS: &str = "harvest_max_acos";
    pub const HARVEST_MIN_ORDERS: &str = "harvest_min_orders";
    pub const HARVEST_DEFAULT_BID: &str = "harvest_default_bid";

    // 导入 / 导出
    pub const CAMPAIGN_DUPLICATE_POLICY: &str = "campaign_duplicate_policy";
    pub const ACOS_IS_PERCENT: &str = "acos_is_percent";
    pub const EXPORT_LOCALE: &str = "export_locale";
    pub const EXPORT_FORMAT: &str = "export_format";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::optimizer_config_trait::{load_decision_config, load_settings};
    use crate::engine::decision::DecisionConfig;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let cfg = load_decision_config(&manager()).await.unwrap();
        assert_eq!(cfg, DecisionConfig::default());

        let settings = load_settings(&manager()).await.unwrap();
        assert_eq!(settings.target_acos_pct, 20.0);
        assert_eq!(settings.export_locale, ExportLocale::Es);
        assert_eq!(settings.export_format, ExportFormat::Xlsx);
        assert!(settings.acos_is_percent);
    }

    #[tokio::test]
    async fn test_overrides() {
        let mgr = manager();
        mgr.set_global_config_value(config_keys::BID_POLICY, "flat").unwrap();
        mgr.set_global_config_value(config_keys::TARGET_ACOS_PCT, "25").unwrap();
        mgr.set_global_config_value(config_keys::CAMPAIGN_DUPLICATE_POLICY, "LAST_WRITE_WINS")
            .unwrap();
        mgr.set_global_config_value(config_keys::ACOS_IS_PERCENT, "false").unwrap();
        mgr.set_global_config_value(config_keys::EXPORT_FORMAT, "csv").unwrap();

        let settings = load_settings(&mgr).await.unwrap();
        assert_eq!(settings.decision.bid_policy, BidPolicy::FlatCorrection);
        assert_eq!(settings.target_acos_pct, 25.0);
        assert!((settings.target_acos() - 0.25).abs() < 1e-9);
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::LastWriteWins);
        assert!(!settings.acos_is_percent);
        assert_eq!(settings.export_format, ExportFormat::Csv);
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let mgr = manager();
        mgr.set_global_config_value(config_keys::BLEEDER_BID, "-1").unwrap();
        mgr.set_global_config_value(config_keys::WINNER_MULTIPLIER, "abc").unwrap();
        mgr.set_global_config_value(config_keys::EXPORT_LOCALE, "fr").unwrap();

        assert_eq!(mgr.get_bleeder_bid().await.unwrap(), 0.05);
        assert_eq!(mgr.get_winner_multiplier().await.unwrap(), 1.2);
        assert_eq!(mgr.get_export_locale().await.unwrap(), ExportLocale::Es);

        mgr.set_global_config_value(config_keys::EXPORT_FORMAT, "pdf").unwrap();
        assert_eq!(mgr.get_export_format().await.unwrap(), ExportFormat::Xlsx);
    }

    #[test]
    fn test_set_overwrites_and_lists() {
        let mgr = manager();
        mgr.set_global_config_value("target_acos_pct", "30").unwrap();
        mgr.set_global_config_value("target_acos_pct", "15").unwrap();
        assert_eq!(
            mgr.list_global_config().unwrap(),
            vec![("target_acos_pct".to_string(), "15".to_string())]
        );
    }
}
