pub mod detail;
pub mod grade;
pub mod list;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::submissions::requests::{
    GradeSubmissionRequest, SubmissionListParams, SubmitAssignmentRequest,
};
use crate::storage::Storage;
use crate::utils::clock::Clock;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            clock: None,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_clock(&self, request: &HttpRequest) -> Arc<dyn Clock> {
        if let Some(clock) = &self.clock {
            clock.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Clock>>>()
                .expect("Clock not found in app data")
                .get_ref()
                .clone()
        }
    }

    /// 提交作业（首次提交或批改前的覆盖）
    pub async fn submit_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: SubmitAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_assignment(self, request, assignment_id, req).await
    }

    /// 批改提交
    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        req: GradeSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        grade::grade_submission(self, request, submission_id, req).await
    }

    /// 列出某作业的全部提交（辅导老师视角）
    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        params: SubmissionListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_submissions(self, request, assignment_id, params).await
    }

    /// 获取本人对某作业的提交
    pub async fn get_my_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_my_submission(self, request, assignment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::{HttpMessage, test, web};
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::assignments::entities::{Assignment, Difficulty};
    use crate::models::assignments::requests::CreateAssignmentRequest;
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::models::users::entities::{User, UserRole};
    use crate::storage::memory_storage::MemoryStorage;
    use crate::utils::clock::FixedClock;

    fn due_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
    }

    fn before_due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
    }

    fn after_due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap()
    }

    fn student(id: i64, cohort: &str) -> User {
        User {
            id,
            username: format!("student_{id}"),
            display_name: None,
            role: UserRole::Student,
            cohort: Some(cohort.to_string()),
        }
    }

    fn tutor(id: i64) -> User {
        User {
            id,
            username: format!("tutor_{id}"),
            display_name: None,
            role: UserRole::Tutor,
            cohort: None,
        }
    }

    async fn seeded_assignment(allow_late: bool) -> (Arc<MemoryStorage>, Assignment) {
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
                    allow_late: Some(allow_late),
                },
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        (storage, assignment)
    }

    fn request_as(
        storage: &Arc<MemoryStorage>,
        now: DateTime<Utc>,
        user: User,
    ) -> actix_web::HttpRequest {
        let req = test::TestRequest::default()
            .app_data(web::Data::new(Arc::clone(storage) as Arc<dyn Storage>))
            .app_data(web::Data::new(Arc::new(FixedClock(now)) as Arc<dyn Clock>))
            .to_http_request();
        req.extensions_mut().insert(user);
        req
    }

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn submit_req(content: &str) -> SubmitAssignmentRequest {
        SubmitAssignmentRequest {
            content: Some(content.to_string()),
            attachment_ref: None,
        }
    }

    #[tokio::test]
    async fn test_submit_then_grade_then_freeze() {
        let (storage, assignment) = seeded_assignment(true).await;
        let service = SubmissionService::new_lazy();

        // 按时提交
        let req = request_as(&storage, before_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("my answer"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"]["status"], "submitted");
        assert_eq!(json["data"]["is_late"], false);
        let submission_id = json["data"]["id"].as_i64().unwrap();

        // 布置者批改
        let req = request_as(
            &storage,
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap(),
            tutor(100),
        );
        let resp = service
            .grade_submission(
                &req,
                submission_id,
                GradeSubmissionRequest {
                    points_earned: 85,
                    feedback: Some("Good work".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["status"], "graded");
        assert_eq!(json["data"]["points_earned"], 85);
        assert_eq!(json["data"]["feedback"], "Good work");

        // 批改后不可再提交
        let req = request_as(&storage, after_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("try again"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        let json = body_json(resp).await;
        assert_eq!(json["code"], crate::models::ErrorCode::AlreadyGraded as i32);

        // 不可二次批改，首次结果不变
        let req = request_as(&storage, after_due(), tutor(100));
        let resp = service
            .grade_submission(
                &req,
                submission_id,
                GradeSubmissionRequest {
                    points_earned: 40,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);

        let current = storage
            .get_submission_by_id(submission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.points_earned, Some(85));
        assert_eq!(current.feedback.as_deref(), Some("Good work"));
    }

    #[tokio::test]
    async fn test_late_first_submission_recorded_when_allowed() {
        let (storage, assignment) = seeded_assignment(true).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, after_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("late answer"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["is_late"], true);
        assert_eq!(json["data"]["status"], "submitted");
    }

    #[tokio::test]
    async fn test_late_first_submission_rejected_when_disallowed() {
        let (storage, assignment) = seeded_assignment(false).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, after_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("too late"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        let json = body_json(resp).await;
        assert_eq!(json["code"], crate::models::ErrorCode::DeadlinePassed as i32);

        // 没有留下任何记录
        let (_, total) = storage
            .list_submissions_for_assignment(assignment.id, 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_in_place() {
        let (storage, assignment) = seeded_assignment(false).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, before_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("v1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        // 截止后修订已有提交：allow_late=false 也放行，is_late 翻为 true
        let req = request_as(&storage, after_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("v2"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["content"], "v2");
        assert_eq!(json["data"]["is_late"], true);

        // 仍然只有一条记录，submitted_at 被刷新
        let (items, total) = storage
            .list_submissions_for_assignment(assignment.id, 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].submitted_at, after_due());
        assert_eq!(items[0].status, SubmissionStatus::Submitted);
    }

    #[tokio::test]
    async fn test_submit_outside_audience_class_is_not_found() {
        let (storage, assignment) = seeded_assignment(true).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, before_due(), student(300, "Grade 9"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("wrong class"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let json = body_json(resp).await;
        assert_eq!(
            json["code"],
            crate::models::ErrorCode::AssignmentNotFound as i32
        );
    }

    #[tokio::test]
    async fn test_grade_rejects_out_of_range_without_mutation() {
        let (storage, assignment) = seeded_assignment(true).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, before_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("answer"))
            .await
            .unwrap();
        let submission_id = body_json(resp).await["data"]["id"].as_i64().unwrap();

        let req = request_as(&storage, after_due(), tutor(100));
        let resp = service
            .grade_submission(
                &req,
                submission_id,
                GradeSubmissionRequest {
                    points_earned: 150,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json = body_json(resp).await;
        assert_eq!(
            json["code"],
            crate::models::ErrorCode::ScoreOutOfRange as i32
        );

        // 拒绝时不产生任何写入
        let current = storage
            .get_submission_by_id(submission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Submitted);
        assert_eq!(current.points_earned, None);
    }

    #[tokio::test]
    async fn test_only_owner_may_grade() {
        let (storage, assignment) = seeded_assignment(true).await;
        let service = SubmissionService::new_lazy();

        let req = request_as(&storage, before_due(), student(200, "Grade 8"));
        let resp = service
            .submit_assignment(&req, assignment.id, submit_req("answer"))
            .await
            .unwrap();
        let submission_id = body_json(resp).await["data"]["id"].as_i64().unwrap();

        // 别的辅导老师不能批改
        let req = request_as(&storage, after_due(), tutor(101));
        let resp = service
            .grade_submission(
                &req,
                submission_id,
                GradeSubmissionRequest {
                    points_earned: 60,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
    }
}
