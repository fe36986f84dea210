//! The task rule engine: number generation, status transition validation,
//! and role-based assignee eligibility.
//!
//! Everything here is pure; the store layer composes these checks with its
//! lookups before committing a change.

use crate::types::{TaskStatus, UserRole};

/// Zero-pad width for the numeric suffix of task numbers. Numbers above
/// 999 simply grow wider (`PROJ-1000`).
const NUMBER_PAD: usize = 3;

/// Compute the next display number from the most recently created task's
/// number (ordered by internal id, not by display number).
///
/// Parses the digits after the final `-` and increments. No prior task, or
/// an unparsable suffix, restarts the sequence at `{key}-001`.
pub fn next_task_number(last_number: Option<&str>, project_key: &str) -> String {
    if let Some(last) = last_number {
        if let Some(suffix) = last.rsplit('-').next() {
            if let Ok(n) = suffix.parse::<u64>() {
                return format_task_number(project_key, n + 1);
            }
        }
    }
    format_task_number(project_key, 1)
}

fn format_task_number(project_key: &str, seq: u64) -> String {
    format!("{}-{:0width$}", project_key, seq, width = NUMBER_PAD)
}

/// Whether a task may move from `from` to `to`.
///
/// The reset targets (`to_do`, `wontfix`) are reachable from every status,
/// including themselves. All other moves must be forward (or lateral) along
/// the ranked progression. `Wontfix` carries no rank, so once a task is
/// there the reset targets are its only exits.
pub fn transition_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    if matches!(to, TaskStatus::ToDo | TaskStatus::Wontfix) {
        return true;
    }

    match (from.progress_rank(), to.progress_rank()) {
        (Some(from_rank), Some(to_rank)) => to_rank >= from_rank,
        _ => false,
    }
}

/// Role-based assignee eligibility for a task in the given status.
///
/// Evaluated first match wins:
/// 1. `manager` is never a valid assignee.
/// 2. `team_lead` is valid for every status.
/// 3. `tester` is invalid while the task is in developer-owned stages
///    (`in_progress`, `code_review`, `dev_test`).
/// 4. `developer` is invalid during `testing`.
/// 5. Everything else is valid.
///
/// The caller is responsible for resolving the assignee id to a role;
/// see [`crate::db::Database::validate_assignee`] for the full check
/// including the "assignee required for in_progress" rule.
pub fn assignee_role_allowed(role: UserRole, status: TaskStatus) -> Result<(), String> {
    match role {
        UserRole::Manager => Err("manager cannot be assigned to tasks".to_string()),
        UserRole::TeamLead => Ok(()),
        UserRole::Tester
            if matches!(
                status,
                TaskStatus::InProgress | TaskStatus::CodeReview | TaskStatus::DevTest
            ) =>
        {
            Err(format!(
                "tester cannot be assignee while task is {}",
                status.as_str()
            ))
        }
        UserRole::Developer if status == TaskStatus::Testing => {
            Err("developer cannot be assignee while task is testing".to_string())
        }
        _ => Ok(()),
    }
}

/// Whether a status admits an unassigned task. Only `in_progress` demands
/// an assignee.
pub fn status_requires_assignee(status: TaskStatus) -> bool {
    status == TaskStatus::InProgress
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [TaskStatus; 7] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::CodeReview,
        TaskStatus::DevTest,
        TaskStatus::Testing,
        TaskStatus::Done,
        TaskStatus::Wontfix,
    ];

    #[test]
    fn next_number_increments_suffix() {
        assert_eq!(next_task_number(Some("PROJ-001"), "PROJ"), "PROJ-002");
        assert_eq!(next_task_number(Some("PROJ-041"), "PROJ"), "PROJ-042");
        assert_eq!(next_task_number(Some("PROJ-099"), "PROJ"), "PROJ-100");
    }

    #[test]
    fn next_number_starts_at_one() {
        assert_eq!(next_task_number(None, "PROJ"), "PROJ-001");
    }

    #[test]
    fn next_number_recovers_from_garbage_suffix() {
        assert_eq!(next_task_number(Some("PROJ-abc"), "PROJ"), "PROJ-001");
        assert_eq!(next_task_number(Some("garbage"), "PROJ"), "PROJ-001");
        assert_eq!(next_task_number(Some(""), "PROJ"), "PROJ-001");
    }

    #[test]
    fn next_number_grows_past_padding() {
        assert_eq!(next_task_number(Some("PROJ-999"), "PROJ"), "PROJ-1000");
        assert_eq!(next_task_number(Some("PROJ-1000"), "PROJ"), "PROJ-1001");
    }

    #[test]
    fn next_number_uses_configured_key() {
        assert_eq!(next_task_number(None, "CORE"), "CORE-001");
        assert_eq!(next_task_number(Some("CORE-007"), "CORE"), "CORE-008");
    }

    #[test]
    fn transitions_are_reflexive() {
        for status in ALL_STATUSES {
            assert!(
                transition_allowed(status, status),
                "{} -> itself should be allowed",
                status.as_str()
            );
        }
    }

    #[test]
    fn reset_targets_reachable_from_anywhere() {
        for from in ALL_STATUSES {
            assert!(transition_allowed(from, TaskStatus::ToDo));
            assert!(transition_allowed(from, TaskStatus::Wontfix));
        }
    }

    #[test]
    fn forward_moves_allowed_backward_rejected() {
        assert!(transition_allowed(TaskStatus::ToDo, TaskStatus::InProgress));
        assert!(transition_allowed(TaskStatus::InProgress, TaskStatus::Done));
        assert!(transition_allowed(TaskStatus::CodeReview, TaskStatus::Testing));

        assert!(!transition_allowed(TaskStatus::Done, TaskStatus::Testing));
        assert!(!transition_allowed(TaskStatus::Testing, TaskStatus::CodeReview));
        assert!(!transition_allowed(TaskStatus::DevTest, TaskStatus::InProgress));
    }

    #[test]
    fn wontfix_traps_everything_except_resets() {
        for to in ALL_STATUSES {
            let allowed = transition_allowed(TaskStatus::Wontfix, to);
            let is_reset = matches!(to, TaskStatus::ToDo | TaskStatus::Wontfix);
            assert_eq!(allowed, is_reset, "wontfix -> {}", to.as_str());
        }
    }

    #[test]
    fn manager_never_eligible() {
        for status in ALL_STATUSES {
            assert!(assignee_role_allowed(UserRole::Manager, status).is_err());
        }
    }

    #[test]
    fn team_lead_always_eligible() {
        for status in ALL_STATUSES {
            assert!(assignee_role_allowed(UserRole::TeamLead, status).is_ok());
        }
    }

    #[test]
    fn tester_excluded_from_dev_stages() {
        for status in ALL_STATUSES {
            let expected_err = matches!(
                status,
                TaskStatus::InProgress | TaskStatus::CodeReview | TaskStatus::DevTest
            );
            assert_eq!(
                assignee_role_allowed(UserRole::Tester, status).is_err(),
                expected_err,
                "tester in {}",
                status.as_str()
            );
        }
    }

    #[test]
    fn developer_excluded_from_testing_only() {
        for status in ALL_STATUSES {
            let expected_err = status == TaskStatus::Testing;
            assert_eq!(
                assignee_role_allowed(UserRole::Developer, status).is_err(),
                expected_err,
                "developer in {}",
                status.as_str()
            );
        }
    }

    #[test]
    fn only_in_progress_requires_assignee() {
        for status in ALL_STATUSES {
            assert_eq!(
                status_requires_assignee(status),
                status == TaskStatus::InProgress
            );
        }
    }
}
