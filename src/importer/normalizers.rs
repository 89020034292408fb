// ==========================================
// ACA 普查导入 - 字段规范化函数
// ==========================================
// 职责: 原始字符串 → 规范形式（日期 / 布尔 / 编码展开 / 员工号）
// 约束: 纯函数、全函数，任何输入都不 panic
// ==========================================

use chrono::NaiveDate;

// ==========================================
// 日期
// ==========================================

/// 形如 YYYY-MM-DD（只检查形状，不检查取值）
fn is_iso_date_shape(value: &str) -> bool {
    let b = value.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

/// 规范化日期
///
/// - `YYYY-MM-DD`: 构造日期校验有效性
/// - `MM/DD/YYYY`: 月日补零后重组为 `YYYY-MM-DD`
/// - 其他 / 空串: None
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if is_iso_date_shape(value) {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let parts: Vec<&str> = value.split('/').collect();
    if let [month, day, year] = parts.as_slice() {
        let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if month.len() <= 2
            && day.len() <= 2
            && year.len() == 4
            && all_digits(month)
            && all_digits(day)
            && all_digits(year)
        {
            let iso = format!("{}-{:0>2}-{:0>2}", year, month, day);
            return NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok();
        }
    }

    None
}

/// 时间戳取日期部分
///
/// - 已是 `YYYY-MM-DD`: 原样返回
/// - ISO 时间戳: 取第一个 `T` 之前的部分
/// - 其他: None
pub fn timestamp_to_date(value: &str) -> Option<String> {
    let value = value.trim();
    if is_iso_date_shape(value) {
        return Some(value.to_string());
    }
    match value.split_once('T') {
        Some((date_part, _)) if is_iso_date_shape(date_part) => Some(date_part.to_string()),
        _ => None,
    }
}

// ==========================================
// 布尔
// ==========================================

/// 通用布尔: true / yes / 1 / y（不区分大小写）
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "y"
    )
}

/// Y/N 标志: Y / YES / TRUE（不区分大小写）
///
/// 与 `parse_bool` 的真值集合不同（不接受 "1"），两者作用于不同来源约定的字段
pub fn parse_yn_flag(value: &str) -> bool {
    matches!(value.trim().to_uppercase().as_str(), "Y" | "YES" | "TRUE")
}

// ==========================================
// 编码展开（未知编码原样透传）
// ==========================================

/// 发薪频率
pub fn expand_pay_frequency(value: &str) -> String {
    let expanded = match value.trim().to_uppercase().as_str() {
        "W" => "Weekly",
        "B" | "BW" => "Bi-Weekly",
        "S" | "SM" => "Semi-Monthly",
        "M" => "Monthly",
        "Q" => "Quarterly",
        "A" => "Annually",
        _ => return value.to_string(),
    };
    expanded.to_string()
}

/// 雇佣类型
pub fn expand_employment_type(value: &str) -> String {
    let expanded = match value.trim().to_uppercase().as_str() {
        "1" | "FT" => "Full Time",
        "2" | "PT" => "Part Time",
        "3" => "Seasonal",
        "4" => "Variable Hour",
        _ => return value.to_string(),
    };
    expanded.to_string()
}

/// 参保状态编码
pub fn expand_enrollment_code(value: &str) -> String {
    let expanded = match value.trim().to_uppercase().as_str() {
        "E" => "Enrolled",
        "W" => "Waived",
        "D" => "Declined",
        "T" => "Terminated",
        "C" => "COBRA",
        _ => return value.to_string(),
    };
    expanded.to_string()
}

// ==========================================
// 标识符 / 数值
// ==========================================

/// 员工号: TRIM → 去掉一个前缀 E（不区分大小写）→ 仅保留数字
///
/// 结果为空串时由下游按"缺失"处理
pub fn normalize_employee_id(value: &str) -> String {
    let trimmed = value.trim();
    let rest = trimmed
        .strip_prefix('E')
        .or_else(|| trimmed.strip_prefix('e'))
        .unwrap_or(trimmed);
    rest.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 数值解析（允许千分位逗号与前导 `$`）
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_date_iso() {
        assert_eq!(normalize_date("2024-03-01"), Some(ymd(2024, 3, 1)));
        assert_eq!(normalize_date(" 2024-03-01 "), Some(ymd(2024, 3, 1)));
        assert_eq!(normalize_date("2024-02-30"), None);
    }

    #[test]
    fn test_normalize_date_us_format() {
        assert_eq!(normalize_date("1/5/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(normalize_date("12/31/2023"), Some(ymd(2023, 12, 31)));
        assert_eq!(normalize_date("13/01/2024"), None);
        assert_eq!(normalize_date("1/5/24"), None);
    }

    #[test]
    fn test_normalize_date_invalid_is_none() {
        for input in ["", "   ", "tomorrow", "2024/01/05", "01-05-2024", "//", "1//2024"] {
            assert_eq!(normalize_date(input), None, "input: {:?}", input);
        }
    }

    #[test]
    fn test_normalize_date_idempotent() {
        for input in ["2024-03-01", "3/1/2024", "03/01/2024", "2/29/2024"] {
            let once = normalize_date(input).unwrap();
            let twice = normalize_date(&once.format("%Y-%m-%d").to_string());
            assert_eq!(twice, Some(once), "input: {}", input);
        }
    }

    #[test]
    fn test_timestamp_to_date() {
        assert_eq!(timestamp_to_date("2024-03-01"), Some("2024-03-01".to_string()));
        assert_eq!(
            timestamp_to_date("2024-03-01T08:30:00Z"),
            Some("2024-03-01".to_string())
        );
        assert_eq!(timestamp_to_date("Tuesday"), None);
        assert_eq!(timestamp_to_date("03/01/2024"), None);
    }

    #[test]
    fn test_parse_bool_general() {
        for t in ["true", "TRUE", "Yes", "1", "y", " Y "] {
            assert!(parse_bool(t), "{}", t);
        }
        for f in ["false", "no", "0", "", "2", "on"] {
            assert!(!parse_bool(f), "{}", f);
        }
    }

    #[test]
    fn test_parse_yn_flag_differs_from_general() {
        assert!(parse_yn_flag("y"));
        assert!(parse_yn_flag("Yes"));
        assert!(parse_yn_flag("TRUE"));
        assert!(!parse_yn_flag("1"));
        assert!(parse_bool("1"));
    }

    #[test]
    fn test_enum_expansion_pass_through() {
        assert_eq!(expand_pay_frequency("M"), "Monthly");
        assert_eq!(expand_pay_frequency("b"), "Bi-Weekly");
        assert_eq!(expand_pay_frequency("Fortnightly"), "Fortnightly");

        assert_eq!(expand_employment_type("1"), "Full Time");
        assert_eq!(expand_employment_type("Contractor"), "Contractor");

        assert_eq!(expand_enrollment_code("E"), "Enrolled");
        assert_eq!(expand_enrollment_code("X"), "X");
    }

    #[test]
    fn test_normalize_employee_id() {
        assert_eq!(normalize_employee_id("E1001"), "1001");
        assert_eq!(normalize_employee_id("E007"), "007");
        assert_eq!(normalize_employee_id("  e007 "), "007");
        assert_eq!(normalize_employee_id("1001"), "1001");
        assert_eq!(normalize_employee_id("EE12"), "12");
        assert_eq!(normalize_employee_id("12-34"), "1234");
        assert_eq!(normalize_employee_id(""), "");
        assert_eq!(normalize_employee_id("ABC"), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("40"), Some(40.0));
        assert_eq!(parse_number("37.5"), Some(37.5));
        assert_eq!(parse_number("$1,250.00"), Some(1250.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("forty"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
