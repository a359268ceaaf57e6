// ==========================================
// PPC 竞价优化引擎 - 活动索引
// ==========================================
// 职责: Bulk 活动行 → 活动名到活动 ID 的查找表
// 红线: 构建完成后只读; 必须先于收割步骤构建
// ==========================================
// 冲突: 同名（大小写不敏感）映射到不同 ID 时上报 CampaignConflict
// - KeepFirst: 保留首个 ID
// - LastWriteWins: 后写覆盖
// ==========================================

use crate::domain::report::{BulkRow, RowError};
use crate::domain::types::{DuplicatePolicy, IngestSource};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

// ==========================================
// CampaignIndex - 只读活动索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CampaignIndex {
    /// (活动名, 活动 ID),保持插入顺序
    entries: Vec<(String, String)>,
    /// 小写活动名 → entries 下标
    by_lower: HashMap<String, usize>,
}

impl CampaignIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 精确查找（大小写不敏感）
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        self.by_lower
            .get(&key)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// 收割用活动匹配
    ///
    /// # 规则
    /// 1. 大小写不敏感相等
    /// 2. 任一方向的子串包含,按插入顺序取第一个
    /// 3. 空名称永不匹配
    pub fn match_campaign(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(id) = self.get(&needle) {
            return Some(id);
        }

        self.entries
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                key.contains(needle.as_str()) || needle.contains(key.as_str())
            })
            .map(|(_, id)| id.as_str())
    }
}

// ==========================================
// CampaignConflict - 重名冲突
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignConflict {
    pub campaign_name: String,
    pub kept_id: String,
    pub discarded_id: String,
    /// 后出现的活动行行号
    pub row_number: usize,
}

impl CampaignConflict {
    /// 以行警告形式上报
    pub fn to_row_error(&self) -> RowError {
        RowError::new(
            IngestSource::Bulk,
            self.row_number,
            format!(
                "duplicate campaign name '{}' (ids {} and {}); using {}",
                self.campaign_name, self.kept_id, self.discarded_id, self.kept_id
            ),
        )
    }
}

/// 构建结果
#[derive(Debug, Clone, Default)]
pub struct CampaignIndexBuild {
    pub index: CampaignIndex,
    pub conflicts: Vec<CampaignConflict>,
}

// ==========================================
// CampaignIndexBuilder
// ==========================================
pub struct CampaignIndexBuilder {
    policy: DuplicatePolicy,
}

impl Default for CampaignIndexBuilder {
    fn default() -> Self {
        Self::new(DuplicatePolicy::KeepFirst)
    }
}

impl CampaignIndexBuilder {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    /// 从 Bulk 行构建索引（只处理活动行）
    pub fn build(&self, rows: &[BulkRow]) -> CampaignIndexBuild {
        let mut index = CampaignIndex::default();
        let mut conflicts = Vec::new();

        for row in rows {
            let BulkRow::Campaign(campaign) = row else {
                continue;
            };
            let name = campaign.campaign_name.trim();
            let id = campaign.campaign_id.trim();
            if name.is_empty() || id.is_empty() {
                continue;
            }

            let key = name.to_lowercase();
            match index.by_lower.get(&key).copied() {
                None => {
                    index.by_lower.insert(key, index.entries.len());
                    index.entries.push((name.to_string(), id.to_string()));
                }
                Some(idx) if index.entries[idx].1 == id => {}
                Some(idx) => {
                    let existing = index.entries[idx].1.clone();
                    let (kept_id, discarded_id) = match self.policy {
                        DuplicatePolicy::KeepFirst => (existing, id.to_string()),
                        DuplicatePolicy::LastWriteWins => {
                            index.entries[idx].1 = id.to_string();
                            (id.to_string(), existing)
                        }
                    };
                    warn!(
                        campaign = %name,
                        kept = %kept_id,
                        discarded = %discarded_id,
                        row = campaign.row_number,
                        "活动名重复"
                    );
                    conflicts.push(CampaignConflict {
                        campaign_name: name.to_string(),
                        kept_id,
                        discarded_id,
                        row_number: campaign.row_number,
                    });
                }
            }
        }

        debug!(
            campaigns = index.len(),
            conflicts = conflicts.len(),
            "活动索引构建完成"
        );
        CampaignIndexBuild { index, conflicts }
    }
}
