use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Forbidden("test".into()), 403, "FORBIDDEN")]
#[case(AppError::NotFound("test".into()), 404, "NOT_FOUND")]
#[case(AppError::Validation("test".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::BusinessRule("test".into()), 422, "BUSINESS_RULE_VIOLATION")]
#[case(AppError::Conflict("test".into()), 409, "CONFLICT")]
#[case(AppError::Database("test".into()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal("test".into()), 500, "INTERNAL_ERROR")]
fn test_app_error_mapping(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_only_conflict_is_retryable() {
    assert!(AppError::Conflict("numbering".into()).is_retryable());
    assert!(!AppError::Validation("bad".into()).is_retryable());
    assert!(!AppError::BusinessRule("stock".into()).is_retryable());
    assert!(!AppError::Forbidden("role".into()).is_retryable());
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        AppError::Forbidden("msg".into()).to_string(),
        "Access denied: msg"
    );
    assert_eq!(
        AppError::BusinessRule("msg".into()).to_string(),
        "Business rule violation: msg"
    );
    assert_eq!(
        AppError::Conflict("msg".into()).to_string(),
        "Conflict: msg"
    );
}
