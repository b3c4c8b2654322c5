//! 提交存储操作
//!
//! 提交与批改共享同一条记录，两类写入都是以 status 为条件的
//! 单行条件更新，保证互斥。

use super::SeaOrmStorage;
use crate::entity::prelude::Submissions;
use crate::entity::submissions::{ActiveModel, Column};
use crate::errors::{Result, TuitionSystemError};
use crate::models::submissions::entities::{
    GradeDraft, ResubmissionDraft, Submission, SubmissionDraft, SubmissionStatus,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

impl SeaOrmStorage {
    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取某学生对某作业的提交
    pub async fn get_submission_for_student_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取某学生在一批作业下的全部提交
    pub async fn list_submissions_for_student_impl(
        &self,
        student_id: i64,
        assignment_ids: &[i64],
    ) -> Result<Vec<Submission>> {
        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Submissions::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssignmentId.is_in(assignment_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| {
                TuitionSystemError::database_operation(format!("查询学生提交失败: {e}"))
            })?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 列出某作业的提交（分页，按提交时间升序）
    pub async fn list_submissions_for_assignment_impl(
        &self,
        assignment_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Submission>, u64)> {
        let paginator = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_asc(Column::SubmittedAt)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询提交总数失败: {e}")))?;

        let submissions = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询提交列表失败: {e}")))?
            .into_iter()
            .map(|m| m.into_submission())
            .collect();

        Ok((submissions, total))
    }

    /// 插入首次提交
    ///
    /// (assignment_id, student_id) 上有唯一索引，并发的首次提交只有
    /// 一个能成功，其余转为 WriteConflict 由调用方重走读-改-写。
    pub async fn insert_submission_impl(&self, draft: SubmissionDraft) -> Result<Submission> {
        let model = ActiveModel {
            assignment_id: Set(draft.assignment_id),
            student_id: Set(draft.student_id),
            content: Set(draft.content),
            attachment_ref: Set(draft.attachment_ref),
            status: Set(SubmissionStatus::Submitted.to_string()),
            is_late: Set(draft.is_late),
            submitted_at: Set(draft.submitted_at.timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(result) => Ok(result.into_submission()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(TuitionSystemError::write_conflict(format!(
                        "提交记录已存在: assignment={}, student={}",
                        draft.assignment_id, draft.student_id
                    )))
                }
                _ => Err(TuitionSystemError::database_operation(format!(
                    "创建提交失败: {e}"
                ))),
            },
        }
    }

    /// 覆盖未批改的提交
    pub async fn revise_submission_if_ungraded_impl(
        &self,
        submission_id: i64,
        draft: ResubmissionDraft,
    ) -> Result<Option<Submission>> {
        let result = Submissions::update_many()
            .col_expr(Column::Content, Expr::value(draft.content))
            .col_expr(Column::AttachmentRef, Expr::value(draft.attachment_ref))
            .col_expr(Column::SubmittedAt, Expr::value(draft.submitted_at.timestamp()))
            .col_expr(Column::IsLate, Expr::value(draft.is_late))
            .filter(Column::Id.eq(submission_id))
            .filter(Column::Status.eq(SubmissionStatus::SUBMITTED))
            .exec(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("覆盖提交失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_submission_by_id_impl(submission_id).await
    }

    /// 写入批改结果
    pub async fn grade_submission_if_ungraded_impl(
        &self,
        submission_id: i64,
        draft: GradeDraft,
    ) -> Result<Option<Submission>> {
        let result = Submissions::update_many()
            .col_expr(Column::PointsEarned, Expr::value(Some(draft.points_earned)))
            .col_expr(Column::Feedback, Expr::value(draft.feedback))
            .col_expr(Column::GradedAt, Expr::value(Some(draft.graded_at.timestamp())))
            .col_expr(
                Column::Status,
                Expr::value(SubmissionStatus::Graded.to_string()),
            )
            .filter(Column::Id.eq(submission_id))
            .filter(Column::Status.eq(SubmissionStatus::SUBMITTED))
            .exec(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("写入批改失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_submission_by_id_impl(submission_id).await
    }
}
