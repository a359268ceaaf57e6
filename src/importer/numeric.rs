// ==========================================
// PPC 竞价优化引擎 - 数值归一化
// ==========================================
// 职责: 带货币符号 / 千分位 / 小数点歧义的文本 → 有限 f64
// 红线: 全函数,永不 panic,无法解析一律返回 0
// ==========================================
// 规则:
// 1) 去除货币符号、空白（含 NBSP）、百分号、首尾字母货币代码
// 2) 同时存在 ',' 与 '.' 时,最后出现者为小数点,另一者为千分位并删除
// 3) 只有一种分隔符且出现多次时,视为千分位并删除（1,234,567 / 1.234.567）
// 4) 只有一个 ',' 时,',' 视为小数点
// 5) 其余情况按原样解析
// ==========================================

const CURRENCY_SYMBOLS: &[char] = &[
    '€', '$', '£', '¥', '₹', '₩', '₽', '₺', '₫', '₱', '฿', '₪', '₴', '₦', '₡', '₲', '₵', '¢',
];

/// 文本数值归一化
pub fn normalize(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c.is_ascii_alphabetic());

    if cleaned.is_empty() {
        return 0.0;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let canonical = match (last_comma, last_dot) {
        // 欧式 1.234,56
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        // 美式 1,234.56
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned.to_string(),
    };

    finite_or_zero(canonical.parse::<f64>().unwrap_or(0.0))
}

/// 数值型单元格（Excel 原生数字）直接透传,非有限值归零
pub fn normalize_number(value: f64) -> f64 {
    finite_or_zero(value)
}

/// 可选单元格的便捷入口（缺失即 0）
pub fn normalize_opt(value: Option<&str>) -> f64 {
    value.map(normalize).unwrap_or(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
