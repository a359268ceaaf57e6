// ==========================================
// PPC 竞价优化引擎 - 周度快照
// ==========================================
// 职责: 关键词行 → 周度汇总 → upsert
// 红线: 写入失败只记录日志,不影响导出
// ==========================================

use crate::domain::report::KeywordRow;
use crate::domain::snapshot::{TopProduct, WeeklySnapshot};
use crate::engine::analysis::{ratio, spend_totals};
use crate::repository::WeeklySnapshotRepository;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const TOP_PRODUCTS: usize = 5;

/// 所在周的周一
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

// ==========================================
// SnapshotDeriver - 汇总计算（纯函数）
// ==========================================
pub struct SnapshotDeriver;

impl SnapshotDeriver {
    /// 生成快照
    ///
    /// # 参数
    /// - client_id: 客户 ID
    /// - keywords: 本次导入的关键词行
    /// - today: 运行日期（用于计算周一）
    pub fn derive(client_id: &str, keywords: &[KeywordRow], today: NaiveDate) -> WeeklySnapshot {
        let (total_spend, total_sales, global_acos) = spend_totals(keywords);
        let now = Utc::now();

        WeeklySnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            week_start_date: week_start(today),
            total_spend,
            total_sales,
            global_acos,
            top_products: Self::top_products(keywords),
            ai_summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 按商品（无商品时按关键词文本）聚合销售额,取前 5
    pub fn top_products(keywords: &[KeywordRow]) -> Vec<TopProduct> {
        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, (f64, f64)> = HashMap::new();

        for kw in keywords {
            let name = kw
                .product_ref
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| kw.keyword_text.trim())
                .to_string();
            if name.is_empty() {
                continue;
            }
            let entry = totals.entry(name.clone()).or_insert_with(|| {
                order.push(name);
                (0.0, 0.0)
            });
            entry.0 += kw.sales;
            entry.1 += kw.spend;
        }

        // 按首次出现顺序收集后稳定排序
        let mut products: Vec<TopProduct> = order
            .into_iter()
            .filter_map(|name| {
                totals.get(&name).map(|&(sales, spend)| TopProduct {
                    acos: ratio(spend, sales),
                    name,
                    sales,
                    spend,
                })
            })
            .collect();
        products.sort_by(|a, b| b.sales.total_cmp(&a.sales));
        products.truncate(TOP_PRODUCTS);
        products
    }
}

/// 快照写入结果
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    Saved(WeeklySnapshot),
    Failed { reason: String },
}

impl SnapshotOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SnapshotOutcome::Saved(_))
    }
}

// ==========================================
// SnapshotWriter
// ==========================================
pub struct SnapshotWriter {
    repo: Arc<dyn WeeklySnapshotRepository>,
}

impl SnapshotWriter {
    pub fn new(repo: Arc<dyn WeeklySnapshotRepository>) -> Self {
        Self { repo }
    }

    /// 汇总并写入; 失败时记录 warn 并返回 Failed
    #[instrument(skip(self, keywords), fields(keywords = keywords.len()))]
    pub async fn record(
        &self,
        client_id: &str,
        keywords: &[KeywordRow],
        today: NaiveDate,
    ) -> SnapshotOutcome {
        let snapshot = SnapshotDeriver::derive(client_id, keywords, today);

        match self.repo.upsert(&snapshot).await {
            Ok(saved) => {
                info!(
                    week = %saved.week_start_date,
                    total_spend = saved.total_spend,
                    total_sales = saved.total_sales,
                    "周度快照已保存"
                );
                SnapshotOutcome::Saved(saved)
            }
            Err(e) => {
                warn!(error = %e, "周度快照保存失败,已忽略");
                SnapshotOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;

    fn kw(product: Option<&str>, text: &str, sales: f64, spend: f64) -> KeywordRow {
        KeywordRow {
            campaign_id: "C1".to_string(),
            ad_group_id: "AG1".to_string(),
            keyword_id: "K1".to_string(),
            keyword_text: text.to_string(),
            match_type: None,
            bid: 0.5,
            acos: 0.0,
            sales,
            clicks: 1,
            spend,
            product_ref: product.map(|p| p.to_string()),
            row_number: 2,
        }
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2026-10-16 是周五
        let friday = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(week_start(friday), NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        assert_eq!(week_start(monday), monday);
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(week_start(sunday), monday);
    }

    #[test]
    fn test_top_products_aggregation() {
        let keywords = vec![
            kw(Some("SKU-1"), "a", 100.0, 20.0),
            kw(Some("SKU-2"), "b", 50.0, 5.0),
            kw(Some("SKU-1"), "c", 60.0, 12.0),
            kw(None, "loose keyword", 70.0, 7.0),
        ];
        let products = SnapshotDeriver::top_products(&keywords);
        assert_eq!(products[0].name, "SKU-1");
        assert_eq!(products[0].sales, 160.0);
        assert!((products[0].acos - 0.2).abs() < 1e-9);
        assert_eq!(products[1].name, "loose keyword");
        assert_eq!(products.len(), 3);
    }

    #[test]
    fn test_derive_totals() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let snap = SnapshotDeriver::derive("client-1", &[kw(None, "a", 0.0, 7.0)], today);
        assert_eq!(snap.total_spend, 7.0);
        assert_eq!(snap.global_acos, 0.0);
        assert_eq!(snap.week_start_date, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
    }

    struct FailingRepo;

    #[async_trait]
    impl WeeklySnapshotRepository for FailingRepo {
        async fn upsert(&self, _snapshot: &WeeklySnapshot) -> RepositoryResult<WeeklySnapshot> {
            Err(RepositoryError::DatabaseConnectionError("disk full".to_string()))
        }
        async fn find_by_client_week(
            &self,
            _client_id: &str,
            _week_start_date: NaiveDate,
        ) -> RepositoryResult<Option<WeeklySnapshot>> {
            Ok(None)
        }
        async fn list_by_client(
            &self,
            _client_id: &str,
            _limit: usize,
        ) -> RepositoryResult<Vec<WeeklySnapshot>> {
            Ok(Vec::new())
        }
        async fn set_ai_summary(
            &self,
            _client_id: &str,
            _week_start_date: NaiveDate,
            _summary: &str,
        ) -> RepositoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let writer = SnapshotWriter::new(Arc::new(FailingRepo));
        let outcome = writer
            .record("client-1", &[], NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
            .await;
        match outcome {
            SnapshotOutcome::Failed { reason } => assert!(reason.contains("disk full")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
