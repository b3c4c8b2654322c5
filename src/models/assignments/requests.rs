use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::models::assignments::entities::Difficulty;

/// 创建作业请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    pub audience_class: String,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub total_points: i32,
    pub difficulty: Difficulty,
    pub due_at: DateTime<Utc>, // ISO 8601 格式，如 "2026-01-24T12:00:00Z"
    pub allow_late: Option<bool>,
}
