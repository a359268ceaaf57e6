// ==========================================
// PPC 竞价优化引擎 - 周度快照 Repository
// ==========================================
// 职责: ppc_weekly_snapshots 表读写
// 红线: Repository 不含业务规则; (client_id, week_start_date) 唯一,写入一律 upsert
// ==========================================

use crate::domain::snapshot::{TopProduct, WeeklySnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// WeeklySnapshotRepository Trait
// ==========================================
// 实现者: SqliteWeeklySnapshotRepository
#[async_trait]
pub trait WeeklySnapshotRepository: Send + Sync {
    /// 写入或覆盖某客户某周的快照
    ///
    /// # 返回
    /// - Ok(WeeklySnapshot): 落库后的记录（覆盖时保留原 snapshot_id 与 created_at）
    async fn upsert(&self, snapshot: &WeeklySnapshot) -> RepositoryResult<WeeklySnapshot>;

    async fn find_by_client_week(
        &self,
        client_id: &str,
        week_start_date: NaiveDate,
    ) -> RepositoryResult<Option<WeeklySnapshot>>;

    /// 按周倒序列出客户历史快照
    async fn list_by_client(
        &self,
        client_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<WeeklySnapshot>>;

    /// 回填摘要文本
    async fn set_ai_summary(
        &self,
        client_id: &str,
        week_start_date: NaiveDate,
        summary: &str,
    ) -> RepositoryResult<()>;
}

// ==========================================
// SqliteWeeklySnapshotRepository
// ==========================================
pub struct SqliteWeeklySnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWeeklySnapshotRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_table() {
            tracing::warn!("ppc_weekly_snapshots ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        crate::db::ensure_snapshot_table(&conn)?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawSnapshotRow> {
        Ok(RawSnapshotRow {
            snapshot_id: row.get(0)?,
            client_id: row.get(1)?,
            week_start_date: row.get(2)?,
            total_spend: row.get(3)?,
            total_sales: row.get(4)?,
            global_acos: row.get(5)?,
            top_products_json: row.get(6)?,
            ai_summary: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn find_sync(
        conn: &Connection,
        client_id: &str,
        week_start_date: NaiveDate,
    ) -> RepositoryResult<Option<WeeklySnapshot>> {
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM ppc_weekly_snapshots WHERE client_id = ?1 AND week_start_date = ?2",
                    SELECT_COLUMNS
                ),
                params![client_id, week_start_date.format(DATE_FORMAT).to_string()],
                Self::map_row,
            )
            .optional()?;
        raw.map(RawSnapshotRow::into_snapshot).transpose()
    }
}

const SELECT_COLUMNS: &str = "snapshot_id, client_id, week_start_date, total_spend, total_sales, \
     global_acos, top_products_json, ai_summary, created_at, updated_at";

/// 数据库原始行（日期与 JSON 仍为文本）
struct RawSnapshotRow {
    snapshot_id: String,
    client_id: String,
    week_start_date: String,
    total_spend: f64,
    total_sales: f64,
    global_acos: f64,
    top_products_json: String,
    ai_summary: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawSnapshotRow {
    fn into_snapshot(self) -> RepositoryResult<WeeklySnapshot> {
        let week_start_date = NaiveDate::parse_from_str(&self.week_start_date, DATE_FORMAT)
            .map_err(|e| RepositoryError::FieldValueError {
                field: "week_start_date".to_string(),
                message: e.to_string(),
            })?;
        let top_products: Vec<TopProduct> = serde_json::from_str(&self.top_products_json)?;

        Ok(WeeklySnapshot {
            snapshot_id: self.snapshot_id,
            client_id: self.client_id,
            week_start_date,
            total_spend: self.total_spend,
            total_sales: self.total_sales,
            global_acos: self.global_acos,
            top_products,
            ai_summary: self.ai_summary,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_timestamp(field: &str, value: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
impl WeeklySnapshotRepository for SqliteWeeklySnapshotRepository {
    async fn upsert(&self, snapshot: &WeeklySnapshot) -> RepositoryResult<WeeklySnapshot> {
        let conn = self.get_conn()?;
        let top_products_json = serde_json::to_string(&snapshot.top_products)?;

        conn.execute(
            r#"
            INSERT INTO ppc_weekly_snapshots (
              snapshot_id, client_id, week_start_date,
              total_spend, total_sales, global_acos,
              top_products_json, ai_summary, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(client_id, week_start_date) DO UPDATE SET
              total_spend = excluded.total_spend,
              total_sales = excluded.total_sales,
              global_acos = excluded.global_acos,
              top_products_json = excluded.top_products_json,
              ai_summary = excluded.ai_summary,
              updated_at = excluded.updated_at
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.client_id,
                snapshot.week_start_date.format(DATE_FORMAT).to_string(),
                snapshot.total_spend,
                snapshot.total_sales,
                snapshot.global_acos,
                top_products_json,
                snapshot.ai_summary,
                snapshot.created_at.to_rfc3339(),
                snapshot.updated_at.to_rfc3339(),
            ],
        )?;

        Self::find_sync(&conn, &snapshot.client_id, snapshot.week_start_date)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "WeeklySnapshot".to_string(),
                id: format!("{}/{}", snapshot.client_id, snapshot.week_start_date),
            }
        })
    }

    async fn find_by_client_week(
        &self,
        client_id: &str,
        week_start_date: NaiveDate,
    ) -> RepositoryResult<Option<WeeklySnapshot>> {
        let conn = self.get_conn()?;
        Self::find_sync(&conn, client_id, week_start_date)
    }

    async fn list_by_client(
        &self,
        client_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<WeeklySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ppc_weekly_snapshots WHERE client_id = ?1 \
             ORDER BY week_start_date DESC LIMIT ?2",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![client_id, limit as i64], Self::map_row)?;
        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?.into_snapshot()?);
        }
        Ok(snapshots)
    }

    async fn set_ai_summary(
        &self,
        client_id: &str,
        week_start_date: NaiveDate,
        summary: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE ppc_weekly_snapshots SET ai_summary = ?1, updated_at = ?2 \
             WHERE client_id = ?3 AND week_start_date = ?4",
            params![
                summary,
                Utc::now().to_rfc3339(),
                client_id,
                week_start_date.format(DATE_FORMAT).to_string()
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WeeklySnapshot".to_string(),
                id: format!("{}/{}", client_id, week_start_date),
            });
        }
        Ok(())
    }
}
