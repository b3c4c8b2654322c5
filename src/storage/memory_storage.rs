//! 内存存储实现
//!
//! 配置 `database.url = "memory://"` 时启用，无持久化。生命周期引擎
//! 与业务层的测试也跑在这个后端上，不依赖任何数据库。
//!
//! 并发保证与 SeaORM 后端一致：同一条提交上的覆盖与批改互斥。
//! 首次提交经由 (assignment_id, student_id) 索引的 entry 锁串行化，
//! 覆盖与批改经由行级 `get_mut` 串行化。

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::errors::{Result, TuitionSystemError};
use crate::models::{
    assignments::{entities::Assignment, requests::CreateAssignmentRequest},
    submissions::entities::{
        GradeDraft, ResubmissionDraft, Submission, SubmissionDraft, SubmissionStatus,
        SubmissionTally,
    },
    users::entities::User,
};
use crate::storage::Storage;

/// 内存存储实现
#[derive(Default)]
pub struct MemoryStorage {
    users: DashMap<i64, User>,
    assignments: DashMap<i64, Assignment>,
    submissions: DashMap<i64, Submission>,
    // (assignment_id, student_id) -> submission_id，承担唯一索引职责
    submission_index: DashMap<(i64, i64), i64>,
    next_assignment_id: AtomicI64,
    next_submission_id: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            next_assignment_id: AtomicI64::new(1),
            next_submission_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// 写入用户记录
    ///
    /// 生产部署中用户由外部身份服务同步；内存后端用这个入口
    /// 灌入演示或测试数据。
    pub fn put_user(&self, user: User) {
        self.users.insert(user.id, user);
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }

    async fn create_assignment(
        &self,
        owner_id: i64,
        req: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let id = self.next_assignment_id.fetch_add(1, Ordering::SeqCst);
        let assignment = Assignment {
            id,
            owner_id,
            audience_class: req.audience_class,
            subject: req.subject,
            title: req.title,
            description: req.description,
            instructions: req.instructions,
            total_points: req.total_points,
            difficulty: req.difficulty,
            due_at: req.due_at,
            allow_late: req.allow_late.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        Ok(self.assignments.get(&assignment_id).map(|a| a.clone()))
    }

    async fn list_assignments_for_class(&self, audience_class: &str) -> Result<Vec<Assignment>> {
        let mut results: Vec<Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.audience_class == audience_class)
            .map(|a| a.clone())
            .collect();
        results.sort_by_key(|a| (a.due_at, a.id));
        Ok(results)
    }

    async fn list_assignments_by_owner(&self, owner_id: i64) -> Result<Vec<Assignment>> {
        let mut results: Vec<Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .map(|a| a.clone())
            .collect();
        results.sort_by_key(|a| (a.due_at, a.id));
        Ok(results)
    }

    async fn tally_submissions(
        &self,
        assignment_ids: &[i64],
    ) -> Result<HashMap<i64, SubmissionTally>> {
        let mut tallies: HashMap<i64, SubmissionTally> = HashMap::new();
        for submission in self.submissions.iter() {
            if !assignment_ids.contains(&submission.assignment_id) {
                continue;
            }
            let tally = tallies.entry(submission.assignment_id).or_default();
            tally.submitted += 1;
            if submission.status == SubmissionStatus::Graded {
                tally.graded += 1;
            }
        }
        Ok(tallies)
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        Ok(self.submissions.get(&submission_id).map(|s| s.clone()))
    }

    async fn get_submission_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let submission_id = match self.submission_index.get(&(assignment_id, student_id)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.submissions.get(&submission_id).map(|s| s.clone()))
    }

    async fn list_submissions_for_student(
        &self,
        student_id: i64,
        assignment_ids: &[i64],
    ) -> Result<Vec<Submission>> {
        Ok(self
            .submissions
            .iter()
            .filter(|s| s.student_id == student_id && assignment_ids.contains(&s.assignment_id))
            .map(|s| s.clone())
            .collect())
    }

    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Submission>, u64)> {
        let mut results: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .map(|s| s.clone())
            .collect();
        results.sort_by_key(|s| (s.submitted_at, s.id));

        let total = results.len() as u64;
        let start = ((page.max(1) - 1) * size) as usize;
        let items = results
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect();

        Ok((items, total))
    }

    async fn insert_submission(&self, draft: SubmissionDraft) -> Result<Submission> {
        // entry 持有分片锁，并发的首次提交在这里串行化
        match self
            .submission_index
            .entry((draft.assignment_id, draft.student_id))
        {
            Entry::Occupied(_) => Err(TuitionSystemError::write_conflict(format!(
                "提交记录已存在: assignment={}, student={}",
                draft.assignment_id, draft.student_id
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_submission_id.fetch_add(1, Ordering::SeqCst);
                let submission = Submission {
                    id,
                    assignment_id: draft.assignment_id,
                    student_id: draft.student_id,
                    content: draft.content,
                    attachment_ref: draft.attachment_ref,
                    status: SubmissionStatus::Submitted,
                    is_late: draft.is_late,
                    submitted_at: draft.submitted_at,
                    points_earned: None,
                    feedback: None,
                    graded_at: None,
                };
                // 先写行再发布索引，读方经索引一定能找到行
                self.submissions.insert(id, submission.clone());
                slot.insert(id);
                Ok(submission)
            }
        }
    }

    async fn revise_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: ResubmissionDraft,
    ) -> Result<Option<Submission>> {
        match self.submissions.get_mut(&submission_id) {
            Some(mut submission) if submission.status == SubmissionStatus::Submitted => {
                submission.content = draft.content;
                submission.attachment_ref = draft.attachment_ref;
                submission.submitted_at = draft.submitted_at;
                submission.is_late = draft.is_late;
                Ok(Some(submission.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn grade_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: GradeDraft,
    ) -> Result<Option<Submission>> {
        match self.submissions.get_mut(&submission_id) {
            Some(mut submission) if submission.status == SubmissionStatus::Submitted => {
                submission.points_earned = Some(draft.points_earned);
                submission.feedback = draft.feedback;
                submission.graded_at = Some(draft.graded_at);
                submission.status = SubmissionStatus::Graded;
                Ok(Some(submission.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::Difficulty;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn due_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
    }

    async fn storage_with_assignment() -> (Arc<MemoryStorage>, Assignment) {
        let storage = Arc::new(MemoryStorage::new());
        let assignment = storage
            .create_assignment(
                100,
                CreateAssignmentRequest {
                    audience_class: "Grade 8".to_string(),
                    subject: "Mathematics".to_string(),
                    title: "Quadratic equations".to_string(),
                    description: None,
                    instructions: None,
                    total_points: 100,
                    difficulty: Difficulty::Medium,
                    due_at: due_at(),
                    allow_late: Some(true),
                },
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        (storage, assignment)
    }

    fn draft(assignment_id: i64, student_id: i64, content: &str) -> SubmissionDraft {
        SubmissionDraft {
            assignment_id,
            student_id,
            content: Some(content.to_string()),
            attachment_ref: None,
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            is_late: false,
        }
    }

    #[tokio::test]
    async fn test_insert_then_lookup() {
        let (storage, assignment) = storage_with_assignment().await;

        let created = storage
            .insert_submission(draft(assignment.id, 200, "answer"))
            .await
            .unwrap();

        let found = storage
            .get_submission_for_student(assignment.id, 200)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.status, SubmissionStatus::Submitted);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let (storage, assignment) = storage_with_assignment().await;

        storage
            .insert_submission(draft(assignment.id, 200, "first"))
            .await
            .unwrap();
        let second = storage
            .insert_submission(draft(assignment.id, 200, "second"))
            .await;
        assert!(second.is_err());

        let (_, total) = storage
            .list_submissions_for_assignment(assignment.id, 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_submits_leave_one_record() {
        let (storage, assignment) = storage_with_assignment().await;

        let s1 = storage.clone();
        let s2 = storage.clone();
        let id = assignment.id;
        let a = tokio::spawn(async move { s1.insert_submission(draft(id, 200, "from a")).await });
        let b = tokio::spawn(async move { s2.insert_submission(draft(id, 200, "from b")).await });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok_count, 1);

        let (items, total) = storage
            .list_submissions_for_assignment(assignment.id, 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 1);
        // 留下的内容必须来自赢得写入的那一方
        let winner = results.iter().find(|r| r.is_ok()).unwrap().as_ref().unwrap();
        assert_eq!(items[0].content, winner.content);
        assert_eq!(items[0].submitted_at, winner.submitted_at);
    }

    #[tokio::test]
    async fn test_revise_refreshes_content() {
        let (storage, assignment) = storage_with_assignment().await;
        let created = storage
            .insert_submission(draft(assignment.id, 200, "v1"))
            .await
            .unwrap();

        let later = Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
        let revised = storage
            .revise_submission_if_ungraded(
                created.id,
                ResubmissionDraft {
                    content: Some("v2".to_string()),
                    attachment_ref: Some("ref-1".to_string()),
                    submitted_at: later,
                    is_late: true,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(revised.content.as_deref(), Some("v2"));
        assert!(revised.is_late);
        assert_eq!(revised.submitted_at, later);
        // 仍然只有一条记录
        let (_, total) = storage
            .list_submissions_for_assignment(assignment.id, 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_grade_blocks_revise_and_regrade() {
        let (storage, assignment) = storage_with_assignment().await;
        let created = storage
            .insert_submission(draft(assignment.id, 200, "answer"))
            .await
            .unwrap();

        let graded_at = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let graded = storage
            .grade_submission_if_ungraded(
                created.id,
                GradeDraft {
                    points_earned: 85,
                    feedback: Some("Good work".to_string()),
                    graded_at,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);

        // 批改后覆盖失败
        let revise = storage
            .revise_submission_if_ungraded(
                created.id,
                ResubmissionDraft {
                    content: Some("too late".to_string()),
                    attachment_ref: None,
                    submitted_at: graded_at,
                    is_late: true,
                },
            )
            .await
            .unwrap();
        assert!(revise.is_none());

        // 二次批改失败，首次结果原样保留
        let regrade = storage
            .grade_submission_if_ungraded(
                created.id,
                GradeDraft {
                    points_earned: 40,
                    feedback: None,
                    graded_at,
                },
            )
            .await
            .unwrap();
        assert!(regrade.is_none());

        let current = storage
            .get_submission_by_id(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.points_earned, Some(85));
        assert_eq!(current.feedback.as_deref(), Some("Good work"));
        assert_eq!(current.content.as_deref(), Some("answer"));
    }

    #[tokio::test]
    async fn test_class_listing_orders_by_due_then_id() {
        let storage = MemoryStorage::new();
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        for (title, due) in [
            ("late", Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()),
            ("soon", Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()),
            ("same-due-a", Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()),
        ] {
            storage
                .create_assignment(
                    100,
                    CreateAssignmentRequest {
                        audience_class: "Grade 8".to_string(),
                        subject: "Physics".to_string(),
                        title: title.to_string(),
                        description: None,
                        instructions: None,
                        total_points: 10,
                        difficulty: Difficulty::Easy,
                        due_at: due,
                        allow_late: None,
                    },
                    created,
                )
                .await
                .unwrap();
        }

        let listed = storage.list_assignments_for_class("Grade 8").await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|a| a.title.as_str()).collect();
        // 截止早的在前；同截止时间按 id（即创建顺序）稳定排序
        assert_eq!(titles, vec!["soon", "same-due-a", "late"]);
    }
}
