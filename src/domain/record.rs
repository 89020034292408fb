// ==========================================
// ACA 普查导入 - 行与规范化记录
// ==========================================
// Row: 分词器产出的原始行（表头标签 → 原始字符串，保持表头顺序）
// NormalizedRecord: 校验通过后交给落库端的参数集（规范参数名 → 规范化值）
// 生命周期: 仅在本行处理期间存在；失败时 Row 随 RowError 保留用于诊断
// ==========================================

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

// ==========================================
// Row - 原始行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// 写入字段；同名表头后写覆盖先写，但保留首次出现的位置
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ==========================================
// FieldValue - 规范化字段值
// ==========================================
// 日期序列化为纯 YYYY-MM-DD 字符串，不带时间部分
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

// ==========================================
// NormalizedRecord - 规范化记录
// ==========================================
// 参数名来自 Schema 声明（&'static str），顺序与声明一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    params: Vec<(&'static str, FieldValue)>,
}

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            params: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.params.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.params.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// 转为 JSON 对象（含 null 参数）
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (k, v) in &self.params {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_duplicate_header_keeps_position() {
        let mut row = Row::new();
        row.insert("A", "1");
        row.insert("B", "2");
        row.insert("A", "3");

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("A"), Some("3"));
        assert_eq!(row.iter().next(), Some(("A", "3")));
    }

    #[test]
    fn test_row_serializes_in_header_order() {
        let row: Row = vec![("Zip", "02110"), ("City", "Boston")].into_iter().collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"Zip":"02110","City":"Boston"}"#);
    }

    #[test]
    fn test_normalized_record_json_shape() {
        let mut record = NormalizedRecord::new();
        record.insert("employee_id", FieldValue::Text("1001".to_string()));
        record.insert(
            "hire_date",
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        );
        record.insert("hours_worked", FieldValue::Number(37.5));
        record.insert("is_full_time", FieldValue::Bool(true));
        record.insert("termination_date", FieldValue::Null);

        let json = record.to_json();
        assert_eq!(json["employee_id"], "1001");
        assert_eq!(json["hire_date"], "2024-03-01");
        assert_eq!(json["hours_worked"], 37.5);
        assert_eq!(json["is_full_time"], true);
        assert!(json["termination_date"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
