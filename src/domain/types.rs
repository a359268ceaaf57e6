// ==========================================
// PPC 竞价优化引擎 - 领域类型定义
// ==========================================
// 职责: 操作类型 / 实体类型 / 匹配方式 / 变更来源 / 策略枚举
// 红线: 只描述取值,不含判定逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 变更操作 (Operation)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create, // 新建关键词（收割）
    Update, // 调整现有关键词竞价
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
        }
    }
}

// ==========================================
// Bulk 实体类型 (Entity)
// ==========================================
// 导出文件存在英/西两种取值: Keyword / Palabra clave, Campaign / Campaña
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Campaign,
    Keyword,
    Other,
}

impl EntityKind {
    /// 解析 Bulk 文件中的实体列（大小写不敏感、去首尾空白）
    pub fn parse(raw: &str) -> EntityKind {
        match raw.trim().to_lowercase().as_str() {
            "keyword" | "palabra clave" => EntityKind::Keyword,
            "campaign" | "campaña" | "campana" => EntityKind::Campaign,
            _ => EntityKind::Other,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Campaign => write!(f, "CAMPAIGN"),
            EntityKind::Keyword => write!(f, "KEYWORD"),
            EntityKind::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// 匹配方式 (Match Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Phrase,
    Broad,
}

impl MatchType {
    /// 解析匹配方式; 无法识别时返回 None
    pub fn parse(raw: &str) -> Option<MatchType> {
        match raw.trim().to_lowercase().as_str() {
            "exact" | "exacta" => Some(MatchType::Exact),
            "phrase" | "frase" => Some(MatchType::Phrase),
            "broad" | "amplia" => Some(MatchType::Broad),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "EXACT"),
            MatchType::Phrase => write!(f, "PHRASE"),
            MatchType::Broad => write!(f, "BROAD"),
        }
    }
}

// ==========================================
// 关键词状态 (Keyword State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordState {
    Enabled,
    Paused,
}

impl fmt::Display for KeywordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordState::Enabled => write!(f, "ENABLED"),
            KeywordState::Paused => write!(f, "PAUSED"),
        }
    }
}

// ==========================================
// 变更来源 (Change Origin)
// ==========================================
// 对应命中的规则,用于审核界面解释
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeOrigin {
    Bleeder,        // 零销售高花费 → 压到地板价
    Winner,         // 低 ACOS → 提价
    Convergence,    // 按目标 ACOS 比例收敛
    FlatCorrection, // 固定比例回调（备选策略）
    Harvest,        // 搜索词收割
}

impl fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOrigin::Bleeder => write!(f, "Bleeder"),
            ChangeOrigin::Winner => write!(f, "Winner"),
            ChangeOrigin::Convergence => write!(f, "Convergence"),
            ChangeOrigin::FlatCorrection => write!(f, "FlatCorrection"),
            ChangeOrigin::Harvest => write!(f, "Harvest"),
        }
    }
}

// ==========================================
// 变更集阶段 (ChangeSet Stage)
// ==========================================
// Draft → UnderReview → Final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStage {
    Draft,
    UnderReview,
    Final,
}

impl fmt::Display for ChangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeStage::Draft => write!(f, "DRAFT"),
            ChangeStage::UnderReview => write!(f, "UNDER_REVIEW"),
            ChangeStage::Final => write!(f, "FINAL"),
        }
    }
}

// ==========================================
// 竞价调整策略 (Bid Policy)
// ==========================================
// TargetConvergence: bid × target/acos（主策略）
// FlatCorrection: acos 超阈值时固定 ×0.8（备选策略,不与主策略混用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidPolicy {
    TargetConvergence,
    FlatCorrection,
}

impl BidPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidPolicy::TargetConvergence => "TARGET_CONVERGENCE",
            BidPolicy::FlatCorrection => "FLAT_CORRECTION",
        }
    }

    pub fn parse(s: &str) -> Option<BidPolicy> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "TARGET_CONVERGENCE" | "PROPORTIONAL" => Some(BidPolicy::TargetConvergence),
            "FLAT_CORRECTION" | "FLAT" => Some(BidPolicy::FlatCorrection),
            _ => None,
        }
    }
}

impl fmt::Display for BidPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 活动名重复处理策略 (Duplicate Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicatePolicy {
    KeepFirst,     // 保留首个 ID,上报冲突
    LastWriteWins, // 兼容旧行为: 后写覆盖,同样上报冲突
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::KeepFirst => "KEEP_FIRST",
            DuplicatePolicy::LastWriteWins => "LAST_WRITE_WINS",
        }
    }

    pub fn parse(s: &str) -> Option<DuplicatePolicy> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "KEEP_FIRST" => Some(DuplicatePolicy::KeepFirst),
            "LAST_WRITE_WINS" => Some(DuplicatePolicy::LastWriteWins),
            _ => None,
        }
    }
}

// ==========================================
// 导出语言 (Export Locale)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLocale {
    Es,
    En,
}

impl ExportLocale {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportLocale::Es => "es",
            ExportLocale::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<ExportLocale> {
        match s.trim().to_lowercase().as_str() {
            "es" | "es-es" | "es-mx" => Some(ExportLocale::Es),
            "en" | "en-us" | "en-gb" => Some(ExportLocale::En),
            _ => None,
        }
    }
}

impl fmt::Display for ExportLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 导出格式 (Export Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn parse(s: &str) -> Option<ExportFormat> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// 文件扩展名
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数据来源 (Ingest Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestSource {
    Bulk,
    SearchTerms,
}

impl fmt::Display for IngestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestSource::Bulk => write!(f, "BULK"),
            IngestSource::SearchTerms => write!(f, "SEARCH_TERMS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parse_bilingual() {
        assert_eq!(EntityKind::parse("Keyword"), EntityKind::Keyword);
        assert_eq!(EntityKind::parse("  palabra clave "), EntityKind::Keyword);
        assert_eq!(EntityKind::parse("Campaña"), EntityKind::Campaign);
        assert_eq!(EntityKind::parse("CAMPAIGN"), EntityKind::Campaign);
        assert_eq!(EntityKind::parse("Ad Group"), EntityKind::Other);
    }

    #[test]
    fn test_match_type_parse() {
        assert_eq!(MatchType::parse("exacta"), Some(MatchType::Exact));
        assert_eq!(MatchType::parse("Broad"), Some(MatchType::Broad));
        assert_eq!(MatchType::parse("negativeExact"), None);
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse("XLSX"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse(".csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("pdf"), None);
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(BidPolicy::parse("flat"), Some(BidPolicy::FlatCorrection));
        assert_eq!(
            BidPolicy::parse("target-convergence"),
            Some(BidPolicy::TargetConvergence)
        );
        assert_eq!(BidPolicy::parse("??"), None);
        assert_eq!(
            DuplicatePolicy::parse("last_write_wins"),
            Some(DuplicatePolicy::LastWriteWins)
        );
    }
}
