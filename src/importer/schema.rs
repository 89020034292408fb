// ==========================================
// ACA 普查导入 - 实体模式注册表
// ==========================================
// 职责: 每种实体类型的声明式模式
// - 规范参数名 + 表头别名（按优先级: 人类可读标签 → 机器键）
// - 字段类型（决定规范化函数与校验）
// - 必填 / 缺省取当天
// - 落库操作名 + 自然键
// 约束: 静态只读表，新增实体类型只需新增一条声明
// ==========================================

use crate::domain::types::EntityType;

// ==========================================
// FieldKind - 字段类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,           // 原样文本
    EmployeeId,     // 员工号规范化；结果为空视为缺失
    Date,           // 日期规范化，无法解析 → null
    StrictDate,     // 日期规范化，非空但无法解析 → Validation
    Number,         // 必须可解析为数值 → 否则 Validation
    Bool,           // 通用布尔
    YesNo,          // Y/N 标志
    PayFrequency,   // 发薪频率编码展开
    EmploymentType, // 雇佣类型编码展开
    EnrollmentCode, // 参保状态编码展开
    Timestamp,      // 时间戳取日期部分
}

impl FieldKind {
    /// 校验失败时提示的期望格式
    pub fn expectation(&self) -> &'static str {
        match self {
            FieldKind::Date | FieldKind::StrictDate => "YYYY-MM-DD 或 MM/DD/YYYY",
            FieldKind::Number => "数值",
            FieldKind::Timestamp => "YYYY-MM-DD 或 ISO 时间戳",
            FieldKind::EmployeeId => "含数字的员工号",
            _ => "文本",
        }
    }
}

// ==========================================
// FieldSpec - 字段声明
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub required: bool,
    pub default_today: bool,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        kind: FieldKind,
    ) -> Self {
        Self {
            name,
            aliases,
            kind,
            required: false,
            default_today: false,
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// 无来源值时取处理当天（期间/生效日期类字段）
    pub const fn today_by_default(self) -> Self {
        Self {
            default_today: true,
            ..self
        }
    }

    /// 报错时使用的字段标签（首个别名）
    pub fn label(&self) -> &'static str {
        self.aliases.first().copied().unwrap_or(self.name)
    }
}

// ==========================================
// Schema - 实体模式
// ==========================================
#[derive(Debug)]
pub struct Schema {
    pub entity_type: EntityType,
    pub operation: &'static str,              // 落库操作名
    pub key_fields: &'static [&'static str],  // 自然键（规范参数名）
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// 必填字段（声明顺序）
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// 按实体类型取模式
pub fn schema_for(entity_type: EntityType) -> &'static Schema {
    match entity_type {
        EntityType::CompanyDetails => &COMPANY_DETAILS,
        EntityType::PlanMaster => &PLAN_MASTER,
        EntityType::EmployeeCensus => &EMPLOYEE_CENSUS,
        EntityType::EmployeeAddress => &EMPLOYEE_ADDRESS,
        EntityType::EmployeeWaitingPeriod => &EMPLOYEE_WAITING_PERIOD,
        EntityType::EmployeePlanEligibility => &EMPLOYEE_PLAN_ELIGIBILITY,
        EntityType::EmployeePlanEnrollment => &EMPLOYEE_PLAN_ENROLLMENT,
        EntityType::EmployeeDependent => &EMPLOYEE_DEPENDENT,
        EntityType::PlanEnrollmentCost => &PLAN_ENROLLMENT_COST,
        EntityType::PayrollHours => &PAYROLL_HOURS,
    }
}

use FieldKind as K;

const EMPLOYEE_ID: FieldSpec =
    FieldSpec::new("employee_id", &["Employee ID", "employee_id", "EmployeeID"], K::EmployeeId)
        .required();
const PLAN_CODE: FieldSpec = FieldSpec::new("plan_code", &["Plan Code", "plan_code"], K::Text);

// ==========================================
// 公司信息
// ==========================================
static COMPANY_DETAILS: Schema = Schema {
    entity_type: EntityType::CompanyDetails,
    operation: "upsert_company_details",
    key_fields: &["company_code"],
    fields: &[
        FieldSpec::new("company_code", &["Company Code", "company_code"], K::Text).required(),
        FieldSpec::new("company_name", &["Company Name", "company_name"], K::Text).required(),
        FieldSpec::new("ein", &["EIN", "ein"], K::Text),
        FieldSpec::new("address_line1", &["Address Line 1", "address_line1"], K::Text),
        FieldSpec::new("city", &["City", "city"], K::Text),
        FieldSpec::new("state", &["State", "state"], K::Text),
        FieldSpec::new("zip_code", &["Zip Code", "zip_code"], K::Text),
        FieldSpec::new("contact_name", &["Contact Name", "contact_name"], K::Text),
        FieldSpec::new("contact_email", &["Contact Email", "contact_email"], K::Text),
        FieldSpec::new("contact_phone", &["Contact Phone", "contact_phone"], K::Text),
        FieldSpec::new("is_ale", &["Is ALE", "is_ale"], K::YesNo),
    ],
};

// ==========================================
// 计划主数据
// ==========================================
static PLAN_MASTER: Schema = Schema {
    entity_type: EntityType::PlanMaster,
    operation: "upsert_plan_master",
    key_fields: &["plan_code"],
    fields: &[
        PLAN_CODE.required(),
        FieldSpec::new("plan_name", &["Plan Name", "plan_name"], K::Text).required(),
        FieldSpec::new("plan_type", &["Plan Type", "plan_type"], K::Text),
        FieldSpec::new("carrier_name", &["Carrier Name", "carrier_name"], K::Text),
        FieldSpec::new("offers_mec", &["Offers MEC", "offers_mec"], K::YesNo),
        FieldSpec::new("offers_min_value", &["Offers Minimum Value", "offers_min_value"], K::YesNo),
        FieldSpec::new("is_self_insured", &["Self Insured", "is_self_insured"], K::YesNo),
        FieldSpec::new("plan_start_date", &["Plan Start Date", "plan_start_date"], K::Date)
            .today_by_default(),
        FieldSpec::new("plan_end_date", &["Plan End Date", "plan_end_date"], K::Date),
    ],
};

// ==========================================
// 员工普查
// ==========================================
static EMPLOYEE_CENSUS: Schema = Schema {
    entity_type: EntityType::EmployeeCensus,
    operation: "upsert_employee_census",
    key_fields: &["employee_id"],
    fields: &[
        EMPLOYEE_ID,
        FieldSpec::new("first_name", &["First Name", "first_name"], K::Text).required(),
        FieldSpec::new("last_name", &["Last Name", "last_name"], K::Text).required(),
        FieldSpec::new("middle_name", &["Middle Name", "middle_name"], K::Text),
        FieldSpec::new("ssn", &["SSN", "ssn"], K::Text),
        FieldSpec::new("date_of_birth", &["Date of Birth", "date_of_birth", "DOB"], K::StrictDate),
        FieldSpec::new("hire_date", &["Hire Date", "hire_date"], K::StrictDate),
        FieldSpec::new("termination_date", &["Termination Date", "termination_date"], K::Date),
        FieldSpec::new("employment_type", &["Employment Type", "employment_type"], K::EmploymentType),
        FieldSpec::new("pay_frequency", &["Pay Frequency", "pay_frequency"], K::PayFrequency),
        FieldSpec::new("is_full_time", &["Full Time", "is_full_time"], K::Bool),
        FieldSpec::new("job_title", &["Job Title", "job_title"], K::Text),
        FieldSpec::new("work_state", &["Work State", "work_state"], K::Text),
    ],
};

// ==========================================
// 员工地址
// ==========================================
static EMPLOYEE_ADDRESS: Schema = Schema {
    entity_type: EntityType::EmployeeAddress,
    operation: "upsert_employee_address",
    key_fields: &["employee_id", "effective_date"],
    fields: &[
        EMPLOYEE_ID,
        FieldSpec::new("address_line1", &["Address Line 1", "address_line1"], K::Text).required(),
        FieldSpec::new("address_line2", &["Address Line 2", "address_line2"], K::Text),
        FieldSpec::new("city", &["City", "city"], K::Text),
        FieldSpec::new("state", &["State", "state"], K::Text),
        FieldSpec::new("zip_code", &["Zip Code", "zip_code"], K::Text),
        FieldSpec::new("country", &["Country", "country"], K::Text),
        FieldSpec::new("effective_date", &["Effective Date", "effective_date"], K::Date)
            .today_by_default(),
    ],
};

// ==========================================
// 等待期
// ==========================================
static EMPLOYEE_WAITING_PERIOD: Schema = Schema {
    entity_type: EntityType::EmployeeWaitingPeriod,
    operation: "upsert_employee_waiting_period",
    key_fields: &["employee_id", "plan_code", "effective_date"],
    fields: &[
        EMPLOYEE_ID,
        PLAN_CODE.required(),
        FieldSpec::new("effective_date", &["Effective Date", "effective_date"], K::Date)
            .today_by_default(),
        FieldSpec::new("waiting_period_end", &["Waiting Period End", "waiting_period_end"], K::Date),
        FieldSpec::new("waiting_period_days", &["Waiting Period Days", "waiting_period_days"], K::Number),
        FieldSpec::new("is_waiting_period", &["Is Waiting Period", "is_waiting_period"], K::Bool),
    ],
};

// ==========================================
// 计划资格
// ==========================================
static EMPLOYEE_PLAN_ELIGIBILITY: Schema = Schema {
    entity_type: EntityType::EmployeePlanEligibility,
    operation: "upsert_employee_plan_eligibility",
    key_fields: &["employee_id", "plan_code", "eligibility_start_date"],
    fields: &[
        EMPLOYEE_ID,
        PLAN_CODE.required(),
        FieldSpec::new(
            "eligibility_start_date",
            &["Eligibility Start Date", "eligibility_start_date"],
            K::Date,
        )
        .today_by_default(),
        FieldSpec::new("eligibility_end_date", &["Eligibility End Date", "eligibility_end_date"], K::Date),
        FieldSpec::new("is_eligible", &["Eligible", "is_eligible"], K::YesNo),
        FieldSpec::new("dependents_eligible", &["Dependents Eligible", "dependents_eligible"], K::YesNo),
        FieldSpec::new("spouse_eligible", &["Spouse Eligible", "spouse_eligible"], K::YesNo),
    ],
};

// ==========================================
// 计划参保
// ==========================================
static EMPLOYEE_PLAN_ENROLLMENT: Schema = Schema {
    entity_type: EntityType::EmployeePlanEnrollment,
    operation: "upsert_employee_plan_enrollment",
    key_fields: &["employee_id", "plan_code", "coverage_start_date"],
    fields: &[
        EMPLOYEE_ID,
        PLAN_CODE.required(),
        FieldSpec::new("enrollment_code", &["Enrollment Code", "enrollment_code"], K::EnrollmentCode),
        FieldSpec::new("coverage_tier", &["Coverage Tier", "coverage_tier"], K::Text),
        FieldSpec::new("coverage_start_date", &["Coverage Start Date", "coverage_start_date"], K::Date)
            .today_by_default(),
        FieldSpec::new("coverage_end_date", &["Coverage End Date", "coverage_end_date"], K::Date),
        FieldSpec::new("enrolled_on", &["Enrolled On", "enrolled_on"], K::Timestamp),
    ],
};

// ==========================================
// 受抚养人
// ==========================================
static EMPLOYEE_DEPENDENT: Schema = Schema {
    entity_type: EntityType::EmployeeDependent,
    operation: "upsert_employee_dependent",
    key_fields: &["employee_id", "dependent_first_name", "dependent_last_name"],
    fields: &[
        EMPLOYEE_ID,
        FieldSpec::new(
            "dependent_first_name",
            &["Dependent First Name", "dependent_first_name"],
            K::Text,
        )
        .required(),
        FieldSpec::new(
            "dependent_last_name",
            &["Dependent Last Name", "dependent_last_name"],
            K::Text,
        )
        .required(),
        FieldSpec::new("relationship", &["Relationship", "relationship"], K::Text),
        FieldSpec::new("dependent_ssn", &["Dependent SSN", "dependent_ssn"], K::Text),
        FieldSpec::new("dependent_dob", &["Dependent DOB", "dependent_dob"], K::Date),
        FieldSpec::new("is_covered", &["Covered", "is_covered"], K::YesNo),
        FieldSpec::new("coverage_start_date", &["Coverage Start Date", "coverage_start_date"], K::Date),
        FieldSpec::new("coverage_end_date", &["Coverage End Date", "coverage_end_date"], K::Date),
    ],
};

// ==========================================
// 计划参保费用
// ==========================================
static PLAN_ENROLLMENT_COST: Schema = Schema {
    entity_type: EntityType::PlanEnrollmentCost,
    operation: "upsert_plan_enrollment_cost",
    key_fields: &["plan_code", "coverage_tier", "cost_period_start"],
    fields: &[
        PLAN_CODE.required(),
        FieldSpec::new("coverage_tier", &["Coverage Tier", "coverage_tier"], K::Text).required(),
        FieldSpec::new("employee_cost", &["Employee Cost", "employee_cost"], K::Number).required(),
        FieldSpec::new("employer_cost", &["Employer Cost", "employer_cost"], K::Number),
        FieldSpec::new("cost_period_start", &["Cost Period Start", "cost_period_start"], K::Date)
            .today_by_default(),
        FieldSpec::new("cost_period_end", &["Cost Period End", "cost_period_end"], K::Date),
    ],
};

// ==========================================
// 工资工时
// ==========================================
static PAYROLL_HOURS: Schema = Schema {
    entity_type: EntityType::PayrollHours,
    operation: "upsert_payroll_hours",
    key_fields: &["employee_id", "pay_period_start"],
    fields: &[
        EMPLOYEE_ID,
        FieldSpec::new("pay_period_start", &["Pay Period Start", "pay_period_start"], K::StrictDate)
            .required(),
        FieldSpec::new("pay_period_end", &["Pay Period End", "pay_period_end"], K::Date),
        FieldSpec::new("hours_worked", &["Hours Worked", "hours_worked", "Hours"], K::Number)
            .required(),
        FieldSpec::new("gross_wages", &["Gross Wages", "gross_wages"], K::Number),
        FieldSpec::new("pay_date", &["Pay Date", "pay_date"], K::Timestamp),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_entity_type_has_schema() {
        for t in EntityType::ALL {
            let schema = schema_for(t);
            assert_eq!(schema.entity_type, t);
            assert!(schema.operation.starts_with("upsert_"));
            assert!(schema.required_fields().count() >= 1, "{} 无必填字段", t);
        }
    }

    #[test]
    fn test_operations_are_unique() {
        let ops: HashSet<&str> = EntityType::ALL
            .iter()
            .map(|t| schema_for(*t).operation)
            .collect();
        assert_eq!(ops.len(), EntityType::ALL.len());
    }

    #[test]
    fn test_key_fields_are_declared() {
        for t in EntityType::ALL {
            let schema = schema_for(t);
            for key in schema.key_fields {
                assert!(schema.field(key).is_some(), "{}: 自然键 {} 未声明", t, key);
            }
        }
    }

    #[test]
    fn test_param_names_unique_and_aliases_present() {
        for t in EntityType::ALL {
            let schema = schema_for(t);
            let names: HashSet<&str> = schema.param_names().collect();
            assert_eq!(names.len(), schema.fields.len(), "{}: 参数名重复", t);
            for field in schema.fields {
                assert!(!field.aliases.is_empty());
                assert!(field.aliases.contains(&field.name), "{}: 缺机器键别名", field.name);
            }
        }
    }

    #[test]
    fn test_required_order_follows_declaration() {
        let schema = schema_for(EntityType::EmployeeCensus);
        let required: Vec<&str> = schema.required_fields().map(|f| f.name).collect();
        assert_eq!(required, vec!["employee_id", "first_name", "last_name"]);
        assert_eq!(schema.fields[0].label(), "Employee ID");
    }
}
