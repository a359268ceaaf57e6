// ==========================================
// PPC 竞价优化引擎 - 文件解析器实现
// ==========================================
// 阶段 0: 文件字节 → 工作簿原始网格
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / 分隔文本 (.csv/.tsv/.txt)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use crate::importer::numeric::normalize_number;
use crate::importer::workbook::{Sheet, Workbook};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

// ==========================================
// TabularSource - 上传文件（文件名 + 字节）
// ==========================================
#[derive(Debug, Clone)]
pub struct TabularSource {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl TabularSource {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// 从磁盘读取（I/O 边界）
    pub async fn read<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }

    fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 按表头行中出现次数最多者选择分隔符（, ; \t）
    pub fn sniff_delimiter(text: &str) -> u8 {
        let header = text.lines().next().unwrap_or("");
        // max_by_key 取最后一个最大值; 逆序后平局落在 ','
        [b',', b';', b'\t']
            .into_iter()
            .rev()
            .max_by_key(|d| header.bytes().filter(|b| b == d).count())
            .filter(|d| header.bytes().any(|b| b == *d))
            .unwrap_or(b',')
    }
}

impl FileParser for CsvParser {
    fn parse_workbook(&self, source: &TabularSource) -> ImportResult<Workbook> {
        let text = String::from_utf8_lossy(&source.bytes);
        let text = text.trim_start_matches('\u{feff}');
        let delimiter = match source.extension().as_str() {
            "tsv" => b'\t',
            _ => Self::sniff_delimiter(text),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(record.iter().map(|v| v.to_string()).collect());
        }

        debug!(
            file = %source.file_name,
            delimiter = %(delimiter as char).escape_default(),
            rows = grid.len(),
            "CSV 解析完成"
        );

        let sheet_name = Path::new(&source.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Sheet1".to_string());

        Ok(Workbook::new(
            source.file_name.clone(),
            vec![Sheet::new(sheet_name, grid)],
        ))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_workbook(&self, source: &TabularSource) -> ImportResult<Workbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(source.bytes.clone()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::EmptyWorkbook {
                file: source.file_name.clone(),
            });
        }

        // 逐个读取全部 sheet,由定位阶段决定使用哪一个
        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            let grid: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect();
            debug!(sheet = %name, rows = grid.len(), "读取工作表");
            sheets.push(Sheet::new(name, grid));
        }

        Ok(Workbook::new(source.file_name.clone(), sheets))
    }
}

/// 单元格 → 文本; 原生数字先归一化
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Float(v) => normalize_number(*v).to_string(),
        Data::Int(v) => v.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

// ==========================================
// 通用文件解析器（扩展名优先,其次魔数嗅探）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_workbook(&self, source: &TabularSource) -> ImportResult<Workbook> {
        let ext = source.extension();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => CsvParser.parse_workbook(source),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => ExcelParser.parse_workbook(source),
            _ if source.bytes.starts_with(XLSX_MAGIC) || source.bytes.starts_with(XLS_MAGIC) => {
                ExcelParser.parse_workbook(source)
            }
            _ if !ext.is_empty() => Err(ImportError::UnsupportedFormat(ext)),
            _ if std::str::from_utf8(&source.bytes).is_ok() => CsvParser.parse_workbook(source),
            _ => Err(ImportError::UnsupportedFormat(source.file_name.clone())),
        }
    }
}
