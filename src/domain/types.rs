// ==========================================
// ACA 普查导入 - 领域类型定义
// ==========================================
// 职责: 实体类型（导入文件所遵循的记录模式）
// 约束: 闭集，共 10 种；每次导入只选一种，不按行推断
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 实体类型 (Entity Type)
// ==========================================
// 序列化格式: PascalCase（与 API 边界 fileType 一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    CompanyDetails,
    PlanMaster,
    EmployeeCensus,
    EmployeeAddress,
    EmployeeWaitingPeriod,
    EmployeePlanEligibility,
    EmployeePlanEnrollment,
    EmployeeDependent,
    PlanEnrollmentCost,
    PayrollHours,
}

impl EntityType {
    /// 全部实体类型（声明顺序）
    pub const ALL: [EntityType; 10] = [
        EntityType::CompanyDetails,
        EntityType::PlanMaster,
        EntityType::EmployeeCensus,
        EntityType::EmployeeAddress,
        EntityType::EmployeeWaitingPeriod,
        EntityType::EmployeePlanEligibility,
        EntityType::EmployeePlanEnrollment,
        EntityType::EmployeeDependent,
        EntityType::PlanEnrollmentCost,
        EntityType::PayrollHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::CompanyDetails => "CompanyDetails",
            EntityType::PlanMaster => "PlanMaster",
            EntityType::EmployeeCensus => "EmployeeCensus",
            EntityType::EmployeeAddress => "EmployeeAddress",
            EntityType::EmployeeWaitingPeriod => "EmployeeWaitingPeriod",
            EntityType::EmployeePlanEligibility => "EmployeePlanEligibility",
            EntityType::EmployeePlanEnrollment => "EmployeePlanEnrollment",
            EntityType::EmployeeDependent => "EmployeeDependent",
            EntityType::PlanEnrollmentCost => "PlanEnrollmentCost",
            EntityType::PayrollHours => "PayrollHours",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知实体类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityType(pub String);

impl fmt::Display for UnknownEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知实体类型: {}", self.0)
    }
}

impl std::error::Error for UnknownEntityType {}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    /// 精确匹配类型名（前后空白忽略，大小写敏感）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownEntityType(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert_eq!(
            " PayrollHours ".parse::<EntityType>().unwrap(),
            EntityType::PayrollHours
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        let err = "EmployeePets".parse::<EntityType>().unwrap_err();
        assert_eq!(err, UnknownEntityType("EmployeePets".to_string()));
        assert!("employeecensus".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&EntityType::EmployeePlanEnrollment).unwrap();
        assert_eq!(json, "\"EmployeePlanEnrollment\"");
    }
}
