use serde::Serialize;
use ts_rs::TS;

use crate::models::PaginationInfo;
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::models::users::entities::User;

/// 提交者信息
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionStudent {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
}

impl SubmissionStudent {
    /// 身份服务中查不到时回退为占位名
    pub fn from_lookup(student_id: i64, user: Option<&User>) -> Self {
        match user {
            Some(u) => Self {
                id: u.id,
                username: u.username.clone(),
                display_name: u.display_name.clone(),
            },
            None => Self {
                id: student_id,
                username: "未知用户".to_string(),
                display_name: None,
            },
        }
    }
}

/// 提交视图（学生本人视角）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionResponse {
    pub id: i64,
    pub assignment_id: i64,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub points_earned: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            assignment_id: s.assignment_id,
            content: s.content,
            attachment_ref: s.attachment_ref,
            status: s.status,
            is_late: s.is_late,
            submitted_at: s.submitted_at,
            points_earned: s.points_earned,
            feedback: s.feedback,
            graded_at: s.graded_at,
        }
    }
}

/// 作业列表里附带的本人提交摘要
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct OwnSubmissionBrief {
    pub id: i64,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub points_earned: Option<i32>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Submission> for OwnSubmissionBrief {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id,
            status: s.status,
            is_late: s.is_late,
            submitted_at: s.submitted_at,
            points_earned: s.points_earned,
            graded_at: s.graded_at,
        }
    }
}

/// 提交列表项（辅导老师视角，含提交者信息）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListItem {
    pub id: i64,
    pub assignment_id: i64,
    pub student: SubmissionStudent,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub points_earned: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 提交列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListResponse {
    pub items: Vec<SubmissionListItem>,
    pub pagination: PaginationInfo,
}
