//! 提交生命周期引擎
//!
//! 对 (作业, 学生, 当前时间) 三元组回答两个问题：现在处于什么状态、
//! 哪些操作是合法的。所有函数都是纯函数，不触碰存储；写入内容以
//! Draft 的形式交给存储层原子落库。
//!
//! 状态机（每条提交记录）：
//!
//! ```text
//!  (none) --submit--> Submitted --grade--> Graded
//!               ^          |
//!               |          | 重新提交（仅覆盖内容，状态不变）
//!               +----------+
//! ```
//!
//! `Graded` 为终态，没有出边。

use chrono::{DateTime, Utc};

use crate::models::assignments::entities::Assignment;
use crate::models::submissions::entities::{
    GradeDraft, ResubmissionDraft, StudentAssignmentStatus, Submission, SubmissionDraft,
    SubmissionStatus,
};

/// 学生视角的派生状态视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub status: StudentAssignmentStatus,
    pub is_overdue: bool,
}

/// 通过校验的提交属于哪一种写入
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitKind {
    /// 首次提交，插入新记录
    Initial,
    /// 覆盖已有未批改记录
    Resubmission,
}

/// 提交被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitRejection {
    /// 截止时间已过且该作业不接受迟到的首次提交
    DeadlinePassed,
    /// 已批改的提交不可再改动
    AlreadyGraded,
}

/// 批改被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradeRejection {
    /// 该提交已批改过，批改是一次性的
    AlreadyGraded,
    /// 分数不在 [0, total_points] 内
    ScoreOutOfRange { total_points: i32 },
}

/// 提交写入计划
#[derive(Debug, Clone)]
pub enum SubmissionWrite {
    Create(SubmissionDraft),
    Revise {
        submission_id: i64,
        draft: ResubmissionDraft,
    },
}

/// 迟交判定：严格大于截止时间才算迟交，踩点提交不算
pub fn is_late(submitted_at: DateTime<Utc>, due_at: DateTime<Utc>) -> bool {
    submitted_at > due_at
}

/// 计算学生视角的派生状态
///
/// `is_overdue` 只与当前时间和截止时间有关，与该学生是否提交无关。
pub fn compute_status(
    assignment: &Assignment,
    submission: Option<&Submission>,
    now: DateTime<Utc>,
) -> StatusView {
    let status = match submission {
        Some(s) if s.status == SubmissionStatus::Graded => StudentAssignmentStatus::Graded,
        Some(_) => StudentAssignmentStatus::Submitted,
        None => StudentAssignmentStatus::NotSubmitted,
    };

    StatusView {
        status,
        is_overdue: now > assignment.due_at,
    }
}

/// 校验提交请求是否合法
///
/// 规则：
/// - 已批改的提交永远不可覆盖；
/// - 未批改的提交在批改前可以随时覆盖，截止时间只影响 `is_late` 标记；
/// - 首次提交在截止后由作业的 `allow_late` 决定是否接受。
pub fn validate_submit(
    assignment: &Assignment,
    existing: Option<&Submission>,
    now: DateTime<Utc>,
) -> Result<SubmitKind, SubmitRejection> {
    match existing {
        Some(s) if s.status == SubmissionStatus::Graded => Err(SubmitRejection::AlreadyGraded),
        Some(_) => Ok(SubmitKind::Resubmission),
        None => {
            if now > assignment.due_at && !assignment.allow_late {
                Err(SubmitRejection::DeadlinePassed)
            } else {
                Ok(SubmitKind::Initial)
            }
        }
    }
}

/// 产出提交的写入计划
///
/// 调用方需先通过 [`validate_submit`]。`submitted_at` 每次刷新为当前
/// 时间，`is_late` 随之重新计算，不保留上一次的值。
pub fn build_submission(
    assignment: &Assignment,
    existing: Option<&Submission>,
    student_id: i64,
    content: Option<String>,
    attachment_ref: Option<String>,
    now: DateTime<Utc>,
) -> SubmissionWrite {
    let late = is_late(now, assignment.due_at);

    match existing {
        Some(s) => SubmissionWrite::Revise {
            submission_id: s.id,
            draft: ResubmissionDraft {
                content,
                attachment_ref,
                submitted_at: now,
                is_late: late,
            },
        },
        None => SubmissionWrite::Create(SubmissionDraft {
            assignment_id: assignment.id,
            student_id,
            content,
            attachment_ref,
            submitted_at: now,
            is_late: late,
        }),
    }
}

/// 校验并产出批改的写入计划
///
/// 批改是单向迁移：成功后提交进入终态，本函数之后对同一条记录
/// 再次调用会拒绝。
pub fn build_grade(
    assignment: &Assignment,
    submission: &Submission,
    points_earned: i32,
    feedback: Option<String>,
    now: DateTime<Utc>,
) -> Result<GradeDraft, GradeRejection> {
    if submission.status == SubmissionStatus::Graded {
        return Err(GradeRejection::AlreadyGraded);
    }

    if points_earned < 0 || points_earned > assignment.total_points {
        return Err(GradeRejection::ScoreOutOfRange {
            total_points: assignment.total_points,
        });
    }

    Ok(GradeDraft {
        points_earned,
        feedback,
        graded_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::Difficulty;
    use chrono::TimeZone;

    fn due_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
    }

    fn assignment(allow_late: bool) -> Assignment {
        Assignment {
            id: 1,
            owner_id: 100,
            audience_class: "Grade 8".to_string(),
            subject: "Mathematics".to_string(),
            title: "Quadratic equations".to_string(),
            description: None,
            instructions: None,
            total_points: 100,
            difficulty: Difficulty::Medium,
            due_at: due_at(),
            allow_late,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn submission(status: SubmissionStatus) -> Submission {
        Submission {
            id: 7,
            assignment_id: 1,
            student_id: 200,
            content: Some("answer".to_string()),
            attachment_ref: None,
            status,
            is_late: false,
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            points_earned: None,
            feedback: None,
            graded_at: None,
        }
    }

    fn graded_submission() -> Submission {
        let mut s = submission(SubmissionStatus::Graded);
        s.points_earned = Some(85);
        s.feedback = Some("Good work".to_string());
        s.graded_at = Some(Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
        s
    }

    fn before_due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
    }

    fn after_due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap()
    }

    #[test]
    fn test_status_not_submitted() {
        let view = compute_status(&assignment(true), None, before_due());
        assert_eq!(view.status, StudentAssignmentStatus::NotSubmitted);
        assert!(!view.is_overdue);
    }

    #[test]
    fn test_status_submitted_then_overdue_flag_flips() {
        let a = assignment(true);
        let s = submission(SubmissionStatus::Submitted);

        let view = compute_status(&a, Some(&s), before_due());
        assert_eq!(view.status, StudentAssignmentStatus::Submitted);
        assert!(!view.is_overdue);

        let view = compute_status(&a, Some(&s), after_due());
        assert_eq!(view.status, StudentAssignmentStatus::Submitted);
        assert!(view.is_overdue);
    }

    #[test]
    fn test_status_graded_dominates() {
        let view = compute_status(&assignment(true), Some(&graded_submission()), after_due());
        assert_eq!(view.status, StudentAssignmentStatus::Graded);
    }

    #[test]
    fn test_status_is_deterministic() {
        let a = assignment(true);
        let s = submission(SubmissionStatus::Submitted);
        let first = compute_status(&a, Some(&s), after_due());
        let second = compute_status(&a, Some(&s), after_due());
        assert_eq!(first, second);
    }

    #[test]
    fn test_overdue_boundary_is_strict() {
        // now == due_at 恰好踩点：不算逾期，也不算迟交
        let view = compute_status(&assignment(true), None, due_at());
        assert!(!view.is_overdue);
        assert!(!is_late(due_at(), due_at()));
        assert!(is_late(due_at() + chrono::Duration::seconds(1), due_at()));
    }

    #[test]
    fn test_submit_allowed_before_due() {
        assert_eq!(
            validate_submit(&assignment(false), None, before_due()),
            Ok(SubmitKind::Initial)
        );
    }

    #[test]
    fn test_first_submit_after_due_rejected_when_late_disallowed() {
        assert_eq!(
            validate_submit(&assignment(false), None, after_due()),
            Err(SubmitRejection::DeadlinePassed)
        );
    }

    #[test]
    fn test_first_submit_after_due_accepted_when_late_allowed() {
        assert_eq!(
            validate_submit(&assignment(true), None, after_due()),
            Ok(SubmitKind::Initial)
        );
    }

    #[test]
    fn test_resubmit_allowed_even_after_due() {
        // 截止只挡首次提交；已有的未批改提交在批改前都可以修订
        let s = submission(SubmissionStatus::Submitted);
        assert_eq!(
            validate_submit(&assignment(false), Some(&s), after_due()),
            Ok(SubmitKind::Resubmission)
        );
    }

    #[test]
    fn test_resubmit_rejected_once_graded() {
        let s = graded_submission();
        assert_eq!(
            validate_submit(&assignment(true), Some(&s), before_due()),
            Err(SubmitRejection::AlreadyGraded)
        );
        // 逾期与否不影响拒绝原因
        assert_eq!(
            validate_submit(&assignment(false), Some(&s), after_due()),
            Err(SubmitRejection::AlreadyGraded)
        );
    }

    #[test]
    fn test_build_initial_submission_on_time() {
        let a = assignment(true);
        let write = build_submission(
            &a,
            None,
            200,
            Some("my answer".to_string()),
            None,
            before_due(),
        );

        match write {
            SubmissionWrite::Create(draft) => {
                assert_eq!(draft.assignment_id, 1);
                assert_eq!(draft.student_id, 200);
                assert_eq!(draft.submitted_at, before_due());
                assert!(!draft.is_late);
            }
            SubmissionWrite::Revise { .. } => panic!("expected a create"),
        }
    }

    #[test]
    fn test_build_initial_submission_late() {
        let a = assignment(true);
        let write = build_submission(&a, None, 200, Some("late".to_string()), None, after_due());

        match write {
            SubmissionWrite::Create(draft) => assert!(draft.is_late),
            SubmissionWrite::Revise { .. } => panic!("expected a create"),
        }
    }

    #[test]
    fn test_resubmission_refreshes_timestamp_and_lateness() {
        // 按时提交过一次，截止后再覆盖：is_late 重新计算，由 false 翻成 true
        let a = assignment(true);
        let existing = submission(SubmissionStatus::Submitted);
        assert!(!existing.is_late);

        let write = build_submission(
            &a,
            Some(&existing),
            200,
            Some("revised".to_string()),
            Some("file-ref-1".to_string()),
            after_due(),
        );

        match write {
            SubmissionWrite::Revise {
                submission_id,
                draft,
            } => {
                assert_eq!(submission_id, existing.id);
                assert_eq!(draft.submitted_at, after_due());
                assert!(draft.is_late);
                assert_eq!(draft.attachment_ref.as_deref(), Some("file-ref-1"));
            }
            SubmissionWrite::Create(_) => panic!("expected a revise"),
        }
    }

    #[test]
    fn test_grade_happy_path() {
        let a = assignment(true);
        let s = submission(SubmissionStatus::Submitted);
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();

        let draft = build_grade(&a, &s, 85, Some("Good work".to_string()), now).unwrap();
        assert_eq!(draft.points_earned, 85);
        assert_eq!(draft.feedback.as_deref(), Some("Good work"));
        assert_eq!(draft.graded_at, now);
    }

    #[test]
    fn test_grade_rejects_second_pass() {
        let a = assignment(true);
        let s = graded_submission();
        assert_eq!(
            build_grade(&a, &s, 90, None, after_due()),
            Err(GradeRejection::AlreadyGraded)
        );
        // 原有批改结果不受影响（纯函数，入参未被改动）
        assert_eq!(s.points_earned, Some(85));
        assert_eq!(s.feedback.as_deref(), Some("Good work"));
    }

    #[test]
    fn test_grade_rejects_out_of_range_score() {
        let a = assignment(true);
        let s = submission(SubmissionStatus::Submitted);
        assert_eq!(
            build_grade(&a, &s, 150, None, after_due()),
            Err(GradeRejection::ScoreOutOfRange { total_points: 100 })
        );
        assert_eq!(
            build_grade(&a, &s, -1, None, after_due()),
            Err(GradeRejection::ScoreOutOfRange { total_points: 100 })
        );
        // 边界值本身合法
        assert!(build_grade(&a, &s, 0, None, after_due()).is_ok());
        assert!(build_grade(&a, &s, 100, None, after_due()).is_ok());
    }
}
