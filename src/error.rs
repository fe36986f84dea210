//! Structured error types for store and engine operations.

use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidTransition,
    IneligibleAssignee,
    AssigneeRequired,
    DuplicateUsername,
    UnknownBlockTarget,
    InvalidCredentials,

    // Not found errors
    TaskNotFound,
    UserNotFound,
    AssigneeNotFound,
    ParentNotFound,

    // Conflict errors (retryable)
    NumberConflict,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Conflicts are the only failures worth retrying; everything else is
    /// a deterministic rejection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::NumberConflict)
    }
}

/// Structured error carrying a code and a caller-facing reason.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct TrackerError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl TrackerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn invalid_transition(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTransition,
            format!("invalid status transition from {} to {}", from, to),
        )
        .with_field("status")
    }

    pub fn ineligible_assignee(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::IneligibleAssignee, reason).with_field("assignee_id")
    }

    pub fn assignee_required() -> Self {
        Self::new(
            ErrorCode::AssigneeRequired,
            "assignee is required for in_progress status",
        )
        .with_field("assignee_id")
    }

    pub fn duplicate_username(username: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateUsername,
            format!("username already registered: {}", username),
        )
        .with_field("username")
    }

    pub fn unknown_block_targets(ids: &[i64]) -> Self {
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        Self::new(
            ErrorCode::UnknownBlockTarget,
            format!("blocks list references unknown tasks: {}", ids.join(", ")),
        )
        .with_field("blocks")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "incorrect username or password")
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("task not found: {}", task_id))
    }

    pub fn user_not_found(user_id: i64) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("user not found: {}", user_id))
    }

    pub fn assignee_not_found(user_id: i64) -> Self {
        Self::new(
            ErrorCode::AssigneeNotFound,
            format!("assignee not found: {}", user_id),
        )
        .with_field("assignee_id")
    }

    pub fn parent_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::ParentNotFound,
            format!("parent task not found: {}", task_id),
        )
        .with_field("parent_id")
    }

    pub fn number_conflict(number: &str) -> Self {
        Self::new(
            ErrorCode::NumberConflict,
            format!(
                "task number {} was claimed by a concurrent creation; retry the request",
                number
            ),
        )
        .with_field("number")
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// The store layer works in anyhow::Result; anything that is not already a
// TrackerError surfaces as an internal error at the boundary.
impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TrackerError>() {
            Ok(tracker_err) => tracker_err,
            Err(err) => TrackerError::internal(err),
        }
    }
}

/// Result type for engine-facing operations.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

/// Downcast helper for tests and callers holding an anyhow error.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.downcast_ref::<TrackerError>().map(|e| e.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_roundtrip_preserves_code() {
        let err: anyhow::Error = TrackerError::task_not_found(7).into();
        assert_eq!(error_code(&err), Some(ErrorCode::TaskNotFound));

        let back: TrackerError = err.into();
        assert_eq!(back.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn foreign_errors_become_internal() {
        let err = anyhow::anyhow!("disk on fire");
        let tracker: TrackerError = err.into();
        assert_eq!(tracker.code, ErrorCode::InternalError);
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(ErrorCode::NumberConflict.is_retryable());
        assert!(!ErrorCode::InvalidTransition.is_retryable());
        assert!(!ErrorCode::TaskNotFound.is_retryable());
    }

    #[test]
    fn serializes_code_as_screaming_snake() {
        let err = TrackerError::assignee_required();
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("ASSIGNEE_REQUIRED"));
        assert!(json.contains("assignee_id"));
    }
}
