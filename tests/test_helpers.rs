// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、报表夹具文件
// ==========================================

#![allow(dead_code)]

use ppc_optimizer::db::{ensure_schema, open_sqlite_connection};
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

/// 西语 Bulk 导出: 1 个活动 + 1 个止血关键词 + 1 个广告组行
pub const BULK_ES: &str = "\
Producto,Entidad,Operación,ID de la campaña,ID del grupo de anuncios,ID de palabra clave,Nombre de la campaña (solo informativo),Texto de palabra clave,Tipo de coincidencia,Puja,Clics,Gasto,Ventas,ACOS
,Campaña,,C1,,,Manual-A,,,,,,,
SKU-1,Palabra clave,,C1,AG1,K1,,widget,Exacta,\"0,80\",20,\"7,00\",0,0
,Grupo de anuncios,,C1,AG1,,,,,,,,,
";

/// 西语搜索词报表: 一个可收割的词
pub const SEARCH_TERMS_ES: &str = "\
Nombre de campaña,Término de búsqueda de cliente,Pedidos totales de 7 días (#),Coste publicitario de las ventas (ACOS) total
Manual-A,blue widget,3,\"15,00 %\"
";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 在临时目录写入报表文件
pub fn write_report(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}
