// ==========================================
// PPC 竞价优化引擎 - 工作簿模型与定位
// ==========================================
// 职责: 多 sheet 原始网格 → 按签名列定位目标 sheet → 行对象
// 说明: CSV 视为只有一个 sheet 的工作簿
// ==========================================

use serde::Serialize;

// ==========================================
// Sheet - 原始网格（首行为表头）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub grid: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, grid: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }

    /// 规范化后的表头
    pub fn headers(&self) -> Vec<String> {
        self.grid
            .first()
            .map(|row| row.iter().map(|h| normalize_header(h)).collect())
            .unwrap_or_default()
    }
}

// ==========================================
// Workbook - 按原始顺序保存的 sheet 列表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// 来源文件名（用于错误提示）
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(file_name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            file_name: file_name.into(),
            sheets,
        }
    }
}

// ==========================================
// SheetRow - 行对象（保持表头自然顺序）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRow {
    /// 源表物理行号（表头为第 1 行）
    pub row_number: usize,
    /// (表头, 单元格值); 顺序即表头顺序
    pub cells: Vec<(String, String)>,
    /// 该行实际单元格数少于表头数
    pub truncated: bool,
}

impl SheetRow {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// 定位结果
#[derive(Debug, Clone)]
pub struct LocatedSheet {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// 表头规范化: 去 BOM、首尾空白,内部连续空白折叠为单个空格
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 按签名列定位 sheet
///
/// # 规则
/// - 按 sheet 顺序扫描
/// - 任一表头（大小写不敏感）包含任一签名列名即命中
/// - 返回首个命中的 sheet,空白行跳过但行号保留
pub fn locate_sheet(workbook: &Workbook, signature_columns: &[&str]) -> Option<LocatedSheet> {
    let signatures: Vec<String> = signature_columns
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    for sheet in &workbook.sheets {
        if sheet.grid.is_empty() {
            continue;
        }

        let headers = sheet.headers();
        let found = headers.iter().any(|h| {
            let lower = h.to_lowercase();
            signatures.iter().any(|sig| lower.contains(sig.as_str()))
        });

        if !found {
            continue;
        }

        let rows = sheet
            .grid
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, cells)| SheetRow {
                row_number: idx + 1,
                cells: headers
                    .iter()
                    .enumerate()
                    .map(|(col, h)| {
                        let value = cells.get(col).map(|v| v.trim()).unwrap_or("");
                        (h.clone(), value.to_string())
                    })
                    .collect(),
                truncated: cells.len() < headers.len(),
            })
            .filter(|row| !row.is_blank())
            .collect();

        return Some(LocatedSheet {
            sheet_name: sheet.name.clone(),
            headers,
            rows,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Campaign   ID "), "Campaign ID");
        assert_eq!(normalize_header("\u{feff}Entity"), "Entity");
    }

    #[test]
    fn test_locate_skips_non_matching_sheets() {
        let wb = Workbook::new(
            "bulk.xlsx",
            vec![
                Sheet::new("Portfolios", grid(&[&["Portfolio ID", "Name"], &["P1", "x"]])),
                Sheet::new(
                    "Sponsored Products",
                    grid(&[&[" Entity ", "Campaign ID"], &["Keyword", "C1"]]),
                ),
            ],
        );

        let located = locate_sheet(&wb, &["Entidad", "Entity"]).unwrap();
        assert_eq!(located.sheet_name, "Sponsored Products");
        assert_eq!(located.headers, vec!["Entity", "Campaign ID"]);
        assert_eq!(located.rows.len(), 1);
        assert_eq!(located.rows[0].row_number, 2);
        assert_eq!(
            located.rows[0].cells[0],
            ("Entity".to_string(), "Keyword".to_string())
        );
    }

    #[test]
    fn test_locate_case_insensitive_contains() {
        let wb = Workbook::new(
            "st.csv",
            vec![Sheet::new(
                "st",
                grid(&[&["Customer SEARCH TERM", "Orders"], &["blue widget", "3"]]),
            )],
        );
        assert!(locate_sheet(&wb, &["search term"]).is_some());
        assert!(locate_sheet(&wb, &["Entidad"]).is_none());
    }

    #[test]
    fn test_blank_rows_skipped_numbering_preserved() {
        let wb = Workbook::new(
            "bulk.csv",
            vec![Sheet::new(
                "bulk",
                grid(&[
                    &["Entity", "Bid"],
                    &["Keyword", "0.5"],
                    &["", " "],
                    &["Keyword"],
                ]),
            )],
        );
        let located = locate_sheet(&wb, &["Entity"]).unwrap();
        assert_eq!(located.rows.len(), 2);
        assert_eq!(located.rows[1].row_number, 4);
        assert!(located.rows[1].truncated);
        assert_eq!(located.rows[1].cells[1].1, "");
    }
}
