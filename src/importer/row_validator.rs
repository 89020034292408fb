// ==========================================
// ACA 普查导入 - 行校验器实现
// ==========================================
// 流程:
// 1. 按别名优先级解析必填字段（首个非空匹配胜出）
// 2. 必填缺失 → MissingField（短路，只报告声明顺序中的第一个）
// 3. 数值 / 严格日期字段规范化失败 → Validation
// 4. 构造 NormalizedRecord: 全部声明参数，未解析的可选字段为 null，
//    期间类日期字段缺省取处理当天
// ==========================================

use crate::domain::record::{FieldValue, NormalizedRecord, Row};
use crate::domain::report::{RowError, RowErrorKind};
use crate::importer::normalizers::{
    expand_employment_type, expand_enrollment_code, expand_pay_frequency, normalize_date,
    normalize_employee_id, parse_bool, parse_number, parse_yn_flag, timestamp_to_date,
};
use crate::importer::record_importer_trait::RowValidator;
use crate::importer::schema::{FieldKind, FieldSpec, Schema};
use chrono::NaiveDate;

/// 解析到的字段: (命中的表头标签, 原始值)
type Resolved<'r> = (&'static str, &'r str);

/// 按别名顺序探测行，返回首个非空值
pub fn resolve_field<'r>(row: &'r Row, field: &FieldSpec) -> Option<Resolved<'r>> {
    field.aliases.iter().find_map(|alias| {
        row.get(alias)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (*alias, v))
    })
}

pub struct SchemaRowValidator;

impl RowValidator for SchemaRowValidator {
    fn validate(
        &self,
        schema: &Schema,
        row: &Row,
        row_number: usize,
        today: NaiveDate,
    ) -> Result<NormalizedRecord, RowError> {
        // === 必填字段（短路） ===
        for field in schema.required_fields() {
            let missing = match resolve_field(row, field) {
                None => true,
                Some((_, raw)) => {
                    field.kind == FieldKind::EmployeeId && normalize_employee_id(raw).is_empty()
                }
            };
            if missing {
                let mut err = RowError::new(
                    row_number,
                    row.clone(),
                    RowErrorKind::MissingField,
                    format!("必填字段缺失: {}", field.label()),
                )
                .with_field(field.label())
                .with_expected(field.kind.expectation());
                if let Some((_, raw)) = resolve_field(row, field) {
                    err = err.with_received(raw);
                }
                return Err(err);
            }
        }

        // === 规范化 + 类型校验 ===
        let mut record = NormalizedRecord::with_capacity(schema.fields.len());
        for field in schema.fields {
            let value = match resolve_field(row, field) {
                None if field.default_today => FieldValue::Date(today),
                None => FieldValue::Null,
                Some((label, raw)) => normalize_field(field, raw).ok_or_else(|| {
                    RowError::new(
                        row_number,
                        row.clone(),
                        RowErrorKind::Validation,
                        format!("字段格式无效: {} = {:?}", label, raw),
                    )
                    .with_field(label)
                    .with_expected(field.kind.expectation())
                    .with_received(raw)
                })?,
            };
            record.insert(field.name, value);
        }

        Ok(record)
    }
}

/// 单字段规范化；None 表示违反字段的类型约束
fn normalize_field(field: &FieldSpec, raw: &str) -> Option<FieldValue> {
    let value = match field.kind {
        FieldKind::Text => FieldValue::Text(raw.to_string()),
        FieldKind::EmployeeId => {
            let id = normalize_employee_id(raw);
            if id.is_empty() {
                FieldValue::Null
            } else {
                FieldValue::Text(id)
            }
        }
        FieldKind::Date => match normalize_date(raw) {
            Some(date) => FieldValue::Date(date),
            // 缺省取当天的字段下游非空，无法解析时不静默置空
            None if field.default_today => return None,
            None => FieldValue::Null,
        },
        FieldKind::StrictDate => FieldValue::Date(normalize_date(raw)?),
        FieldKind::Number => FieldValue::Number(parse_number(raw)?),
        FieldKind::Bool => FieldValue::Bool(parse_bool(raw)),
        FieldKind::YesNo => FieldValue::Bool(parse_yn_flag(raw)),
        FieldKind::PayFrequency => FieldValue::Text(expand_pay_frequency(raw)),
        FieldKind::EmploymentType => FieldValue::Text(expand_employment_type(raw)),
        FieldKind::EnrollmentCode => FieldValue::Text(expand_enrollment_code(raw)),
        FieldKind::Timestamp => match timestamp_to_date(raw) {
            Some(date) => match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                Ok(d) => FieldValue::Date(d),
                Err(_) => FieldValue::Text(date),
            },
            None => FieldValue::Null,
        },
    };
    Some(value)
}
