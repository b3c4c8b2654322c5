pub mod create;
pub mod detail;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::storage::Storage;
use crate::utils::clock::Clock;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AssignmentService {
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

    /// 创建作业
    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, req).await
    }

    /// 列出作业（按角色返回不同视图）
    pub async fn list_assignments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request).await
    }

    /// 获取作业详情
    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_assignment(self, request, assignment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::{HttpMessage, test, web};
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::assignments::entities::Difficulty;
    use crate::models::submissions::entities::{GradeDraft, SubmissionDraft};
    use crate::models::users::entities::{User, UserRole};
    use crate::storage::memory_storage::MemoryStorage;
    use crate::utils::clock::FixedClock;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
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
            display_name: Some("王老师".to_string()),
            role: UserRole::Tutor,
            cohort: None,
        }
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

    fn create_req(title: &str, due: DateTime<Utc>) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            audience_class: "Grade 8".to_string(),
            subject: "Mathematics".to_string(),
            title: title.to_string(),
            description: None,
            instructions: None,
            total_points: 100,
            difficulty: Difficulty::Easy,
            due_at: due,
            allow_late: Some(true),
        }
    }

    fn draft(assignment_id: i64, student_id: i64, submitted_at: DateTime<Utc>) -> SubmissionDraft {
        SubmissionDraft {
            assignment_id,
            student_id,
            content: Some("answer".to_string()),
            attachment_ref: None,
            submitted_at,
            is_late: false,
        }
    }

    /// 布置三个作业：5 号截止（已提交）、12 号截止（已批改）、20 号截止（未提交）
    async fn seeded() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage.put_user(tutor(100));
        storage.put_user(student(200, "Grade 8"));

        let a1 = storage
            .create_assignment(100, create_req("past due", day(5)), day(1))
            .await
            .unwrap();
        let a2 = storage
            .create_assignment(100, create_req("graded one", day(12)), day(1))
            .await
            .unwrap();
        storage
            .create_assignment(100, create_req("untouched", day(20)), day(1))
            .await
            .unwrap();

        storage
            .insert_submission(draft(a1.id, 200, day(4)))
            .await
            .unwrap();
        let graded = storage
            .insert_submission(draft(a2.id, 200, day(9)))
            .await
            .unwrap();
        storage
            .grade_submission_if_ungraded(
                graded.id,
                GradeDraft {
                    points_earned: 90,
                    feedback: None,
                    graded_at: day(10),
                },
            )
            .await
            .unwrap();

        storage
    }

    #[tokio::test]
    async fn test_student_listing_orders_and_annotates() {
        let storage = seeded().await;
        let service = AssignmentService::new_lazy();

        // 3 月 10 日的视角：第一个作业已逾期，另两个未到期
        let req = request_as(&storage, day(10), student(200, "Grade 8"));
        let resp = service.list_assignments(&req).await.unwrap();
        assert_eq!(resp.status(), 200);

        let json = body_json(resp).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);

        // 截止时间升序
        assert_eq!(items[0]["title"], "past due");
        assert_eq!(items[1]["title"], "graded one");
        assert_eq!(items[2]["title"], "untouched");

        assert_eq!(items[0]["status"], "submitted");
        assert_eq!(items[0]["is_overdue"], true);
        assert_eq!(items[1]["status"], "graded");
        assert_eq!(items[1]["my_submission"]["points_earned"], 90);
        assert_eq!(items[2]["status"], "not_submitted");
        assert_eq!(items[2]["is_overdue"], false);
        assert!(items[2]["my_submission"].is_null());

        // 布置者信息被关联
        assert_eq!(items[0]["owner"]["username"], "tutor_100");
    }

    #[tokio::test]
    async fn test_student_of_other_class_sees_nothing() {
        let storage = seeded().await;
        let service = AssignmentService::new_lazy();

        let req = request_as(&storage, day(10), student(300, "Grade 9"));
        let resp = service.list_assignments(&req).await.unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_tutor_listing_counts_grading_progress() {
        let storage = seeded().await;
        let service = AssignmentService::new_lazy();

        let req = request_as(&storage, day(10), tutor(100));
        let resp = service.list_assignments(&req).await.unwrap();
        assert_eq!(resp.status(), 200);

        let json = body_json(resp).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);

        // "past due": 1 份提交未批改
        assert_eq!(items[0]["submission_count"], 1);
        assert_eq!(items[0]["graded_count"], 0);
        assert_eq!(items[0]["pending_grading"], 1);

        // "graded one": 1 份提交已批改
        assert_eq!(items[1]["submission_count"], 1);
        assert_eq!(items[1]["graded_count"], 1);
        assert_eq!(items[1]["pending_grading"], 0);

        // "untouched": 无提交
        assert_eq!(items[2]["submission_count"], 0);
    }

    #[tokio::test]
    async fn test_assignment_detail_hidden_from_other_class() {
        let storage = seeded().await;
        let service = AssignmentService::new_lazy();

        let req = request_as(&storage, day(10), student(300, "Grade 9"));
        let resp = service.get_assignment(&req, 1).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
