// ==========================================
// PPC 竞价优化引擎 - 周度快照
// ==========================================
// 职责: 每客户每周一条汇总记录（花费/销售/ACOS/Top 产品）
// 约束: (client_id, week_start_date) 唯一; 重跑覆盖不重复
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Top 产品条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub sales: f64,
    pub spend: f64,
    /// 比率
    pub acos: f64,
}

// ==========================================
// WeeklySnapshot
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub snapshot_id: String,
    pub client_id: String,
    /// 周一
    pub week_start_date: NaiveDate,
    pub total_spend: f64,
    pub total_sales: f64,
    /// 比率; 销售为 0 时为 0
    pub global_acos: f64,
    pub top_products: Vec<TopProduct>,
    /// 由外部摘要服务回填
    pub ai_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
