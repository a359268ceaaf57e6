// ==========================================
// PPC 竞价优化引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PPC_OPTIMIZER_DB";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建全部表
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    ensure_config_table(conn)?;
    ensure_snapshot_table(conn)
}

/// 配置表（scope_id + key 唯一）
pub fn ensure_config_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL DEFAULT 'global',
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );
        "#,
    )
}

/// 周度快照表（每客户每周一条）
pub fn ensure_snapshot_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ppc_weekly_snapshots (
          snapshot_id TEXT PRIMARY KEY,
          client_id TEXT NOT NULL,
          week_start_date TEXT NOT NULL,
          total_spend REAL NOT NULL DEFAULT 0,
          total_sales REAL NOT NULL DEFAULT 0,
          global_acos REAL NOT NULL DEFAULT 0,
          top_products_json TEXT NOT NULL DEFAULT '[]',
          ai_summary TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          UNIQUE (client_id, week_start_date)
        );

        CREATE INDEX IF NOT EXISTS idx_weekly_snapshots_client_week
          ON ppc_weekly_snapshots(client_id, week_start_date DESC);
        "#,
    )
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PPC_OPTIMIZER_DB > 用户数据目录 > 当前目录
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("ppc-optimizer").join("ppc_optimizer.db"))
        .unwrap_or_else(|| PathBuf::from("ppc_optimizer.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' \
                 AND name IN ('config_kv', 'ppc_weekly_snapshots')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_snapshot_week_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let insert = "INSERT INTO ppc_weekly_snapshots \
            (snapshot_id, client_id, week_start_date, created_at, updated_at) \
            VALUES (?1, 'c1', '2026-10-12', 'x', 'x')";
        conn.execute(insert, ["a"]).unwrap();
        assert!(conn.execute(insert, ["b"]).is_err());
    }
}
