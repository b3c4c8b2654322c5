use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::submissions::requests::SubmitAssignmentRequest;

static AUDIENCE_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]*$").expect("Invalid class label regex"));

const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 64 * 1024;

/// 校验班级标签格式
pub fn validate_audience_class(label: &str) -> Result<(), &'static str> {
    // 长度校验：1 <= x <= 64
    if label.is_empty() || label.len() > 64 {
        return Err("Class label length must be between 1 and 64 characters");
    }
    // 格式校验：字母数字开头，只允许字母、数字、空格、下划线、连字符
    if !AUDIENCE_CLASS_RE.is_match(label) {
        return Err("Class label must contain only letters, numbers, spaces, underscores or hyphens");
    }
    Ok(())
}

/// 校验创建作业请求
pub fn validate_create_assignment(req: &CreateAssignmentRequest) -> Result<(), String> {
    validate_audience_class(&req.audience_class).map_err(|e| e.to_string())?;

    if req.title.trim().is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if req.title.len() > MAX_TITLE_LEN {
        return Err(format!("Title must not exceed {MAX_TITLE_LEN} characters"));
    }
    if req.subject.trim().is_empty() {
        return Err("Subject must not be empty".to_string());
    }
    if req.total_points <= 0 {
        return Err("Total points must be a positive integer".to_string());
    }

    Ok(())
}

/// 校验提交作业请求
///
/// 文本与附件引用至少要有一个；空白文本视同缺失。
pub fn validate_submit_payload(req: &SubmitAssignmentRequest) -> Result<(), String> {
    let has_content = req
        .content
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    let has_attachment = req
        .attachment_ref
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());

    if !has_content && !has_attachment {
        return Err("Either answer text or an attachment is required".to_string());
    }
    if let Some(content) = &req.content
        && content.len() > MAX_CONTENT_LEN
    {
        return Err(format!(
            "Answer text must not exceed {MAX_CONTENT_LEN} bytes"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::Difficulty;
    use chrono::{TimeZone, Utc};

    fn create_request() -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            audience_class: "Grade 8".to_string(),
            subject: "Mathematics".to_string(),
            title: "Quadratic equations".to_string(),
            description: None,
            instructions: None,
            total_points: 100,
            difficulty: Difficulty::Medium,
            due_at: Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap(),
            allow_late: None,
        }
    }

    #[test]
    fn test_valid_audience_class() {
        assert!(validate_audience_class("Grade 8").is_ok());
        assert!(validate_audience_class("IGCSE-2").is_ok());
        assert!(validate_audience_class("year_10").is_ok());
    }

    #[test]
    fn test_invalid_audience_class() {
        assert!(validate_audience_class("").is_err());
        assert!(validate_audience_class(" leading-space").is_err());
        assert!(validate_audience_class("八年级@").is_err());
        assert!(validate_audience_class(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_create_assignment_requires_positive_points() {
        let mut req = create_request();
        req.total_points = 0;
        assert!(validate_create_assignment(&req).is_err());

        req.total_points = -5;
        assert!(validate_create_assignment(&req).is_err());

        req.total_points = 1;
        assert!(validate_create_assignment(&req).is_ok());
    }

    #[test]
    fn test_create_assignment_requires_title() {
        let mut req = create_request();
        req.title = "   ".to_string();
        assert!(validate_create_assignment(&req).is_err());
    }

    #[test]
    fn test_submit_payload_needs_content_or_attachment() {
        assert!(
            validate_submit_payload(&SubmitAssignmentRequest {
                content: None,
                attachment_ref: None,
            })
            .is_err()
        );
        assert!(
            validate_submit_payload(&SubmitAssignmentRequest {
                content: Some("  ".to_string()),
                attachment_ref: None,
            })
            .is_err()
        );
        assert!(
            validate_submit_payload(&SubmitAssignmentRequest {
                content: Some("my answer".to_string()),
                attachment_ref: None,
            })
            .is_ok()
        );
        assert!(
            validate_submit_payload(&SubmitAssignmentRequest {
                content: None,
                attachment_ref: Some("file-ref-1".to_string()),
            })
            .is_ok()
        );
    }
}
