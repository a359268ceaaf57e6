// ==========================================
// PPC 竞价优化引擎 - 报表规范行
// ==========================================
// 职责: Bulk 报表 / 搜索词报表解析后的规范化行结构
// 约束: 导入完成后只读
// ==========================================

use crate::domain::types::{IngestSource, MatchType};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// KeywordRow - Bulk 关键词行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRow {
    pub campaign_id: String,
    pub ad_group_id: String,
    pub keyword_id: String,
    pub keyword_text: String,
    /// 源文件未给出或无法识别时为 None,导出时按 exact 处理
    pub match_type: Option<MatchType>,
    pub bid: f64,
    /// 比率（非百分比）; 0 表示无数据
    pub acos: f64,
    pub sales: f64,
    pub clicks: u64,
    /// 花费列缺失或为 0 时回退为 bid × clicks
    pub spend: f64,
    pub product_ref: Option<String>,

    // 元信息
    pub row_number: usize,
}

// ==========================================
// CampaignRow - Bulk 活动行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRow {
    pub campaign_id: String,
    pub campaign_name: String,
    pub row_number: usize,
}

// ==========================================
// BulkRow - Bulk 报表中参与计算的实体行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkRow {
    Campaign(CampaignRow),
    Keyword(KeywordRow),
}

// ==========================================
// SearchTermRow - 搜索词报表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTermRow {
    pub search_term: String,
    pub origin_campaign_name: String,
    pub orders: u64,
    /// 比率（非百分比）
    pub acos: f64,
    pub row_number: usize,
}

// ==========================================
// RowError - 行级解析错误
// ==========================================
// 单行问题不阻断导入,累积后随响应返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub source: IngestSource,
    /// 源表中的物理行号（表头为第 1 行）
    pub row: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(source: IngestSource, row: usize, reason: impl Into<String>) -> Self {
        Self {
            source,
            row,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_display() {
        let err = RowError::new(IngestSource::Bulk, 7, "missing campaign id");
        assert_eq!(err.to_string(), "Row 7: missing campaign id");
    }
}
