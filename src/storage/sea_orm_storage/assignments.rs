//! 作业存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Column};
use crate::entity::prelude::{Assignments, Submissions};
use crate::entity::submissions::Column as SubmissionColumn;
use crate::errors::{Result, TuitionSystemError};
use crate::models::{
    assignments::{entities::Assignment, requests::CreateAssignmentRequest},
    submissions::entities::{SubmissionStatus, SubmissionTally},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_assignment_impl(
        &self,
        owner_id: i64,
        req: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let model = ActiveModel {
            owner_id: Set(owner_id),
            audience_class: Set(req.audience_class),
            subject: Set(req.subject),
            title: Set(req.title),
            description: Set(req.description),
            instructions: Set(req.instructions),
            total_points: Set(req.total_points),
            difficulty: Set(req.difficulty.to_string()),
            due_at: Set(req.due_at.timestamp()),
            allow_late: Set(req.allow_late.unwrap_or(true)),
            created_at: Set(now.timestamp()),
            updated_at: Set(now.timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 列出某班级的作业
    ///
    /// 截止时间最近的排在最前，同一截止时间按 id 保证顺序稳定。
    pub async fn list_assignments_for_class_impl(
        &self,
        audience_class: &str,
    ) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(Column::AudienceClass.eq(audience_class))
            .order_by_asc(Column::DueAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询班级作业失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 列出某辅导老师布置的作业
    pub async fn list_assignments_by_owner_impl(&self, owner_id: i64) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_asc(Column::DueAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| {
                TuitionSystemError::database_operation(format!("查询布置的作业失败: {e}"))
            })?;

        Ok(results.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 按作业聚合提交数量与已批改数量
    pub async fn tally_submissions_impl(
        &self,
        assignment_ids: &[i64],
    ) -> Result<HashMap<i64, SubmissionTally>> {
        if assignment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, String)> = Submissions::find()
            .select_only()
            .column(SubmissionColumn::AssignmentId)
            .column(SubmissionColumn::Status)
            .filter(SubmissionColumn::AssignmentId.is_in(assignment_ids.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("统计提交失败: {e}")))?;

        let mut tallies: HashMap<i64, SubmissionTally> = HashMap::new();
        for (assignment_id, status) in rows {
            let tally = tallies.entry(assignment_id).or_default();
            tally.submitted += 1;
            if status == SubmissionStatus::GRADED {
                tally.graded += 1;
            }
        }

        Ok(tallies)
    }
}
