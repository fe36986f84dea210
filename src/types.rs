//! Core types for the bugtrack backend.

use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Manager,
    TeamLead,
    Developer,
    Tester,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Manager => "manager",
            UserRole::TeamLead => "team_lead",
            UserRole::Developer => "developer",
            UserRole::Tester => "tester",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manager" => Some(UserRole::Manager),
            "team_lead" => Some(UserRole::TeamLead),
            "developer" => Some(UserRole::Developer),
            "tester" => Some(UserRole::Tester),
            _ => None,
        }
    }
}

/// Classification of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Bug,
    Task,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Bug => "bug",
            TaskKind::Task => "task",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bug" => Some(TaskKind::Bug),
            "task" => Some(TaskKind::Task),
            _ => None,
        }
    }
}

/// Task priority. Default is medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Critical => "critical",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(TaskPriority::Critical),
            "high" => Some(TaskPriority::High),
            "medium" => Some(TaskPriority::Medium),
            "low" => Some(TaskPriority::Low),
            _ => None,
        }
    }
}

/// Workflow status of a task.
///
/// The normal flow runs `ToDo -> InProgress -> CodeReview -> DevTest ->
/// Testing -> Done`. `Wontfix` sits outside the flow; the transition rules
/// live in [`crate::rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    CodeReview,
    DevTest,
    Testing,
    Done,
    Wontfix,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to_do",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::CodeReview => "code_review",
            TaskStatus::DevTest => "dev_test",
            TaskStatus::Testing => "testing",
            TaskStatus::Done => "done",
            TaskStatus::Wontfix => "wontfix",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "to_do" => Some(TaskStatus::ToDo),
            "in_progress" => Some(TaskStatus::InProgress),
            "code_review" => Some(TaskStatus::CodeReview),
            "dev_test" => Some(TaskStatus::DevTest),
            "testing" => Some(TaskStatus::Testing),
            "done" => Some(TaskStatus::Done),
            "wontfix" => Some(TaskStatus::Wontfix),
            _ => None,
        }
    }

    /// Position in the forward progression, or `None` for statuses outside
    /// it (`Wontfix`). A status without a rank cannot be the source of a
    /// forward transition.
    pub fn progress_rank(&self) -> Option<u8> {
        match self {
            TaskStatus::ToDo => Some(0),
            TaskStatus::InProgress => Some(1),
            TaskStatus::CodeReview => Some(2),
            TaskStatus::DevTest => Some(3),
            TaskStatus::Testing => Some(4),
            TaskStatus::Done => Some(5),
            TaskStatus::Wontfix => None,
        }
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque salted hash; never the plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
}

/// A tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Display identifier, e.g. `PROJ-042`. Unique, assigned at creation.
    pub number: String,
    pub kind: TaskKind,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task with its relations resolved for detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub creator: Option<User>,
    pub assignee: Option<User>,
    pub subtasks: Vec<Task>,
    /// Tasks this task blocks (outgoing edges).
    pub blocks: Vec<Task>,
    /// Tasks blocking this task (incoming edges).
    pub blocked_by: Vec<Task>,
}

/// Input for creating a task. Status always starts at `to_do`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub kind: TaskKind,
    #[serde(default)]
    pub priority: TaskPriority,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
}

/// Sparse patch for updating a task.
///
/// `None` leaves a field untouched; the nested options distinguish
/// "clear the field" from "leave it alone".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub kind: Option<TaskKind>,
    pub priority: Option<TaskPriority>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Option<i64>>,
    /// Replaces the entire outgoing blocking set when present.
    pub blocks: Option<Vec<i64>>,
}

impl TaskPatch {
    /// True if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.priority.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignee_id.is_none()
            && self.blocks.is_none()
    }
}

/// Sparse patch for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}
