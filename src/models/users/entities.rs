use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Student, // 学生
    Tutor,   // 辅导老师
    Admin,   // 管理员
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const TUTOR: &'static str = "tutor";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn tutor_roles() -> &'static [&'static UserRole] {
        &[&Self::Tutor, &Self::Admin]
    }
    pub fn student_roles() -> &'static [&'static UserRole] {
        &[&Self::Student]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Student, &Self::Tutor, &Self::Admin]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::TUTOR => Ok(UserRole::Tutor),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, tutor, admin"
            ))),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Tutor => write!(f, "{}", UserRole::TUTOR),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "tutor" => Ok(UserRole::Tutor),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

/// 用户身份视图
///
/// 账号的签发与管理属于外部身份服务；这里只保留本服务需要的
/// 字段：展示信息、角色、以及学生归属的班级（cohort）。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    /// 学生所在班级标签；辅导老师与管理员为 None
    pub cohort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_roundtrip() {
        for role in UserRole::all_roles() {
            let parsed = UserRole::from_str(&role.to_string()).unwrap();
            assert_eq!(&&parsed, role);
        }
    }

    #[test]
    fn test_role_deserialize_rejects_unknown() {
        let result: Result<UserRole, _> = serde_json::from_str("\"teacher\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_tutor_roles_include_admin() {
        assert!(UserRole::tutor_roles().contains(&&UserRole::Admin));
        assert!(!UserRole::tutor_roles().contains(&&UserRole::Student));
    }
}
