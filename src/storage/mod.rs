use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{
    assignments::{entities::Assignment, requests::CreateAssignmentRequest},
    submissions::entities::{
        GradeDraft, ResubmissionDraft, Submission, SubmissionDraft, SubmissionTally,
    },
    users::entities::User,
};

pub mod memory_storage;
pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户查询方法
    // 用户记录由外部身份服务写入，这里只读
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 批量查询，用于列表展示的身份关联
    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>>;

    /// 作业管理方法
    // 创建作业
    async fn create_assignment(
        &self,
        owner_id: i64,
        req: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment>;
    // 通过ID获取作业
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    // 列出某班级的作业，按 due_at 升序，id 升序兜底保证顺序稳定
    async fn list_assignments_for_class(&self, audience_class: &str) -> Result<Vec<Assignment>>;
    // 列出某辅导老师布置的作业，排序同上
    async fn list_assignments_by_owner(&self, owner_id: i64) -> Result<Vec<Assignment>>;
    // 按作业聚合提交/已批改数量
    async fn tally_submissions(
        &self,
        assignment_ids: &[i64],
    ) -> Result<HashMap<i64, SubmissionTally>>;

    /// 提交管理方法
    // 通过ID获取提交
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    // 获取某学生对某作业的提交（至多一条）
    async fn get_submission_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>>;
    // 获取某学生在一批作业下的全部提交
    async fn list_submissions_for_student(
        &self,
        student_id: i64,
        assignment_ids: &[i64],
    ) -> Result<Vec<Submission>>;
    // 列出某作业的提交，按 submitted_at 升序分页，返回 (本页, 总数)
    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Submission>, u64)>;
    // 插入首次提交；(assignment_id, student_id) 唯一索引冲突时返回 WriteConflict
    async fn insert_submission(&self, draft: SubmissionDraft) -> Result<Submission>;
    // 条件更新：仅当记录仍为 submitted 时覆盖内容；条件不满足返回 None
    async fn revise_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: ResubmissionDraft,
    ) -> Result<Option<Submission>>;
    // 条件更新：仅当记录仍为 submitted 时写入批改结果；条件不满足返回 None
    async fn grade_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: GradeDraft,
    ) -> Result<Option<Submission>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let config = AppConfig::get();

    // memory:// 用于本地演示与测试，无持久化
    if config.database.url.starts_with("memory://") {
        return Ok(Arc::new(memory_storage::MemoryStorage::new()));
    }

    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
