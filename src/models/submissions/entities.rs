use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 提交状态（持久化状态机：submitted -> graded，单向）
#[derive(Debug, Clone, Copy, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

impl SubmissionStatus {
    pub const SUBMITTED: &'static str = "submitted";
    pub const GRADED: &'static str = "graded";
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            SubmissionStatus::SUBMITTED => Ok(SubmissionStatus::Submitted),
            SubmissionStatus::GRADED => Ok(SubmissionStatus::Graded),
            _ => Err(serde::de::Error::custom(format!(
                "无效的提交状态: '{s}'. 支持的状态: submitted, graded"
            ))),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Submitted => write!(f, "{}", SubmissionStatus::SUBMITTED),
            SubmissionStatus::Graded => write!(f, "{}", SubmissionStatus::GRADED),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(SubmissionStatus::Submitted),
            "graded" => Ok(SubmissionStatus::Graded),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

// 学生视角的派生状态（按请求计算，不落库）
#[derive(Debug, Clone, Copy, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum StudentAssignmentStatus {
    NotSubmitted,
    Submitted,
    Graded,
}

/// 提交记录
///
/// 每个 (assignment_id, student_id) 至多一条；重复提交原地覆盖。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    // 文本作答；附件提交时可为空
    pub content: Option<String>,
    // 附件存储服务返回的不透明引用
    pub attachment_ref: Option<String>,
    pub status: SubmissionStatus,
    // submitted_at > due_at（严格大于）；每次提交重新计算
    pub is_late: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    // 批改前为 None，批改后落在 [0, total_points]
    pub points_earned: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 首次提交的写入内容（由生命周期引擎产出，存储层持久化）
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDraft {
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub is_late: bool,
}

/// 重新提交的写入内容
#[derive(Debug, Clone, PartialEq)]
pub struct ResubmissionDraft {
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub is_late: bool,
}

/// 批改结果的写入内容
#[derive(Debug, Clone, PartialEq)]
pub struct GradeDraft {
    pub points_earned: i32,
    pub feedback: Option<String>,
    pub graded_at: chrono::DateTime<chrono::Utc>,
}

/// 按作业聚合的提交数量
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionTally {
    pub submitted: i64,
    pub graded: i64,
}
