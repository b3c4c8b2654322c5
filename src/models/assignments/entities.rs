use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 作业难度
#[derive(Debug, Clone, Copy, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const EASY: &'static str = "easy";
    pub const MEDIUM: &'static str = "medium";
    pub const HARD: &'static str = "hard";
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            Difficulty::EASY => Ok(Difficulty::Easy),
            Difficulty::MEDIUM => Ok(Difficulty::Medium),
            Difficulty::HARD => Ok(Difficulty::Hard),
            _ => Err(serde::de::Error::custom(format!(
                "无效的难度: '{s}'. 支持的难度: easy, medium, hard"
            ))),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "{}", Difficulty::EASY),
            Difficulty::Medium => write!(f, "{}", Difficulty::MEDIUM),
            Difficulty::Hard => write!(f, "{}", Difficulty::HARD),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    // 唯一 ID
    pub id: i64,
    // 布置者（辅导老师）ID，创建后不可变更
    pub owner_id: i64,
    // 目标班级标签
    pub audience_class: String,
    // 科目
    pub subject: String,
    // 标题
    pub title: String,
    // 描述
    pub description: Option<String>,
    // 作答要求
    pub instructions: Option<String>,
    // 满分（正整数）
    pub total_points: i32,
    // 难度
    pub difficulty: Difficulty,
    // 截止时间，创建后不可变更
    pub due_at: chrono::DateTime<chrono::Utc>,
    // 截止后是否仍接受首次提交
    pub allow_late: bool,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
    // 更新时间
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
