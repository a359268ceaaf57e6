// ==========================================
// PPC 竞价优化引擎 - 列解析器
// ==========================================
// 职责: 按显式有序的候选列表,从行对象中取第一个"存在且非空"的值
// 红线: 纯函数,无缓存,优先级只由候选顺序决定
// ==========================================
// 匹配方式:
// - Literal: 表头去空白后大小写不敏感相等
// - Contains: 表头大小写不敏感包含
// - Pattern: 正则匹配表头
// 同一候选命中多个表头时,按行的自然表头顺序尝试
// ==========================================

use crate::importer::workbook::SheetRow;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub enum ColumnMatcher {
    Literal(String),
    Contains(String),
    Pattern(Regex),
}

impl ColumnMatcher {
    pub fn literal(name: &str) -> Self {
        ColumnMatcher::Literal(name.trim().to_lowercase())
    }

    pub fn contains(fragment: &str) -> Self {
        ColumnMatcher::Contains(fragment.trim().to_lowercase())
    }

    /// 构造正则匹配器; 仅用于静态候选表,非法正则属于编码错误
    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Ok(ColumnMatcher::Pattern(Regex::new(re)?))
    }

    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        match self {
            ColumnMatcher::Literal(lit) => header.to_lowercase() == *lit,
            ColumnMatcher::Contains(frag) => header.to_lowercase().contains(frag.as_str()),
            ColumnMatcher::Pattern(re) => re.is_match(header),
        }
    }
}

/// 解析字段值
///
/// # 返回
/// - Some(&str): 首个候选命中的非空值（已去首尾空白）
/// - None: 所有候选均未命中或值为空
pub fn resolve<'r>(row: &'r SheetRow, candidates: &[ColumnMatcher]) -> Option<&'r str> {
    candidates.iter().find_map(|matcher| {
        row.iter()
            .filter(|(key, _)| matcher.matches(key))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    })
}

// ==========================================
// 字段候选表（英/西两种导出表头）
// ==========================================
pub struct FieldCandidates;

fn lits(names: &[&str]) -> Vec<ColumnMatcher> {
    names.iter().map(|n| ColumnMatcher::literal(n)).collect()
}

fn with(mut base: Vec<ColumnMatcher>, extra: ColumnMatcher) -> Vec<ColumnMatcher> {
    base.push(extra);
    base
}

static ENTITY: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| lits(&["Entidad", "Entity"]));

static CAMPAIGN_ID: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["ID de la campaña", "Campaign ID", "Campaign Id"]));

// Bulk 新版表头: "Campaign Name (Informational only)" / "Nombre de la campaña (solo informativo)"
static CAMPAIGN_NAME: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| {
    let mut list = lits(&["Campaña", "Campaign", "Nombre de campaña", "Campaign Name"]);
    list.push(ColumnMatcher::contains("campaign name"));
    list.push(ColumnMatcher::contains("nombre de la campaña"));
    list
});

static AD_GROUP_ID: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["ID del grupo de anuncios", "Ad Group ID", "Ad Group Id"]));

static KEYWORD_ID: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["ID de palabra clave", "Keyword ID", "Keyword Id"]));

static KEYWORD_TEXT: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["Texto de palabra clave", "Keyword Text", "Keyword"]));

static MATCH_TYPE: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["Tipo de coincidencia", "Match Type"]));

static BID: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| lits(&["Puja", "Bid"]));

static ACOS: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| {
    with(
        lits(&[
            "ACOS",
            "ACOS total",
            "Total ACOS",
            "Coste publicitario de las ventas (ACOS) total",
        ]),
        ColumnMatcher::contains("acos"),
    )
});

static SALES: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["Ventas", "Sales", "Revenue"]));

static CLICKS: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| lits(&["Clics", "Clicks"]));

static SPEND: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["Gasto", "Spend", "Cost", "Coste"]));

static PRODUCT: LazyLock<Vec<ColumnMatcher>> =
    LazyLock::new(|| lits(&["Producto", "Product", "SKU"]));

static SEARCH_TERM: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| {
    lits(&[
        "Término de búsqueda de cliente",
        "Término de búsqueda",
        "Customer Search Term",
        "Search Term",
    ])
});

static ORDERS: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| {
    let mut list = lits(&[
        "Pedidos totales de 7 días (#)",
        "Pedidos",
        "Orders",
        "Total Orders",
        "7 Day Total Orders (#)",
    ]);
    // 其他归因窗口: "14 Day Total Orders (#)" / "Pedidos totales de 14 días (#)"
    if let Ok(p) = ColumnMatcher::pattern(r"(?i)^(\d+ day total orders|pedidos totales de \d+ días)")
    {
        list.push(p);
    }
    list
});

static ST_CAMPAIGN: LazyLock<Vec<ColumnMatcher>> = LazyLock::new(|| {
    with(
        lits(&["Campaña", "Campaign", "Nombre de campaña", "Campaign Name"]),
        ColumnMatcher::contains("campaign name"),
    )
});

impl FieldCandidates {
    pub fn entity() -> &'static [ColumnMatcher] {
        &ENTITY
    }
    pub fn campaign_id() -> &'static [ColumnMatcher] {
        &CAMPAIGN_ID
    }
    pub fn campaign_name() -> &'static [ColumnMatcher] {
        &CAMPAIGN_NAME
    }
    pub fn ad_group_id() -> &'static [ColumnMatcher] {
        &AD_GROUP_ID
    }
    pub fn keyword_id() -> &'static [ColumnMatcher] {
        &KEYWORD_ID
    }
    pub fn keyword_text() -> &'static [ColumnMatcher] {
        &KEYWORD_TEXT
    }
    pub fn match_type() -> &'static [ColumnMatcher] {
        &MATCH_TYPE
    }
    pub fn bid() -> &'static [ColumnMatcher] {
        &BID
    }
    pub fn acos() -> &'static [ColumnMatcher] {
        &ACOS
    }
    pub fn sales() -> &'static [ColumnMatcher] {
        &SALES
    }
    pub fn clicks() -> &'static [ColumnMatcher] {
        &CLICKS
    }
    pub fn spend() -> &'static [ColumnMatcher] {
        &SPEND
    }
    pub fn product() -> &'static [ColumnMatcher] {
        &PRODUCT
    }
    pub fn search_term() -> &'static [ColumnMatcher] {
        &SEARCH_TERM
    }
    pub fn orders() -> &'static [ColumnMatcher] {
        &ORDERS
    }
    pub fn search_term_campaign() -> &'static [ColumnMatcher] {
        &ST_CAMPAIGN
    }
}
