// ==========================================
// PPC 竞价优化引擎 - 配置层
// ==========================================
// 职责: 阈值 / 策略 / 语言配置,支持覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod optimizer_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use optimizer_config_trait::{
    load_decision_config, load_settings, OptimizerConfigReader, OptimizerSettings,
};
