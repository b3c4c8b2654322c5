use serde::Serialize;
use ts_rs::TS;

use crate::models::assignments::entities::{Assignment, Difficulty};
use crate::models::submissions::entities::StudentAssignmentStatus;
use crate::models::submissions::responses::OwnSubmissionBrief;

/// 布置者信息
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentOwner {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
}

/// 作业基础视图
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentView {
    pub id: i64,
    pub audience_class: String,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub total_points: i32,
    pub difficulty: Difficulty,
    pub due_at: chrono::DateTime<chrono::Utc>,
    pub allow_late: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner: AssignmentOwner,
}

impl AssignmentView {
    pub fn from_assignment(assignment: Assignment, owner: AssignmentOwner) -> Self {
        Self {
            id: assignment.id,
            audience_class: assignment.audience_class,
            subject: assignment.subject,
            title: assignment.title,
            description: assignment.description,
            instructions: assignment.instructions,
            total_points: assignment.total_points,
            difficulty: assignment.difficulty,
            due_at: assignment.due_at,
            allow_late: assignment.allow_late,
            created_at: assignment.created_at,
            owner,
        }
    }
}

/// 学生视角的作业列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentAssignmentItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: AssignmentView,
    pub status: StudentAssignmentStatus,
    pub is_overdue: bool,
    pub my_submission: Option<OwnSubmissionBrief>,
}

/// 学生视角的作业列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentAssignmentListResponse {
    pub items: Vec<StudentAssignmentItem>,
}

/// 辅导老师视角的作业列表项（带批改进度）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct TutorAssignmentItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: AssignmentView,
    pub submission_count: i64,
    pub graded_count: i64,
    pub pending_grading: i64,
}

/// 辅导老师视角的作业列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct TutorAssignmentListResponse {
    pub items: Vec<TutorAssignmentItem>,
}
