//! Task CRUD: creation with numbered-identifier retry, partial updates,
//! validated status changes, and deletion.

use super::users::get_user_internal;
use super::{Database, now_ms};
use crate::error::TrackerError;
use crate::rules;
use crate::types::{NewTask, Task, TaskDetail, TaskKind, TaskPatch, TaskPriority, TaskStatus};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

/// Attempts before a persistent number collision is surfaced as a conflict.
const NUMBER_RETRIES: u32 = 3;

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let kind: String = row.get("kind")?;
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;

    Ok(Task {
        id: row.get("id")?,
        number: row.get("number")?,
        kind: TaskKind::from_str(&kind).unwrap_or(TaskKind::Task),
        priority: TaskPriority::from_str(&priority).unwrap_or_default(),
        status: TaskStatus::from_str(&status).unwrap_or_default(),
        title: row.get("title")?,
        description: row.get("description")?,
        creator_id: row.get("creator_id")?,
        assignee_id: row.get("assignee_id")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The display number of the most recently created task (by internal id).
fn last_task_number(conn: &Connection) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT number FROM tasks ORDER BY id DESC LIMIT 1",
        [],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(number) => Ok(Some(number)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether an insert failed on the UNIQUE constraint over tasks.number.
fn is_number_collision(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(msg)) => {
            code.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("tasks.number")
        }
        _ => false,
    }
}

impl Database {
    /// Create a new task. The display number is derived from the latest
    /// row, so a concurrent creation can claim the same candidate; the
    /// UNIQUE constraint catches that and the insert retries with a fresh
    /// number before giving up with a retryable conflict.
    pub fn create_task(&self, input: NewTask, creator_id: i64) -> Result<Task> {
        self.create_task_with_parent(input, creator_id, None)
    }

    /// Create a subtask under an existing parent.
    pub fn create_subtask(&self, parent_id: i64, input: NewTask, creator_id: i64) -> Result<Task> {
        self.with_conn(|conn| {
            get_task_internal(conn, parent_id)?
                .ok_or_else(|| TrackerError::parent_not_found(parent_id))?;
            Ok(())
        })?;

        self.create_task_with_parent(input, creator_id, Some(parent_id))
    }

    fn create_task_with_parent(
        &self,
        input: NewTask,
        creator_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Task> {
        // New tasks always start in the backlog; the assignee still has to
        // satisfy the eligibility rules for that status.
        let status = TaskStatus::ToDo;
        self.validate_assignee(status, input.assignee_id)?;

        let mut last_collision: Option<String> = None;

        for _ in 0..NUMBER_RETRIES {
            let now = now_ms();

            let attempt = self.with_conn_mut(|conn| {
                let tx = conn.transaction()?;

                get_user_internal(&tx, creator_id)?
                    .ok_or_else(|| TrackerError::user_not_found(creator_id))?;

                let number = rules::next_task_number(
                    last_task_number(&tx)?.as_deref(),
                    &self.project_key,
                );

                let inserted = tx.execute(
                    "INSERT INTO tasks (
                        number, kind, priority, status, title, description,
                        creator_id, assignee_id, parent_id, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        &number,
                        input.kind.as_str(),
                        input.priority.as_str(),
                        status.as_str(),
                        &input.title,
                        &input.description,
                        creator_id,
                        input.assignee_id,
                        parent_id,
                        now,
                        now,
                    ],
                );

                match inserted {
                    Ok(_) => {
                        let id = tx.last_insert_rowid();
                        tx.commit()?;
                        Ok(Some(Task {
                            id,
                            number,
                            kind: input.kind,
                            priority: input.priority,
                            status,
                            title: input.title.clone(),
                            description: input.description.clone(),
                            creator_id,
                            assignee_id: input.assignee_id,
                            parent_id,
                            created_at: now,
                            updated_at: now,
                        }))
                    }
                    Err(ref e) if is_number_collision(e) => {
                        // Lost the race for this number; roll back and
                        // regenerate from the fresh latest row.
                        tracing::debug!(number = %number, "task number collision, retrying");
                        Ok(None)
                    }
                    Err(e) => Err(e.into()),
                }
            })?;

            match attempt {
                Some(task) => return Ok(task),
                None => {
                    last_collision =
                        self.with_conn(|conn| last_task_number(conn))?;
                }
            }
        }

        let number = rules::next_task_number(last_collision.as_deref(), &self.project_key);
        Err(TrackerError::number_conflict(&number).into())
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task by display number.
    pub fn get_task_by_number(&self, number: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE number = ?1")?;

            let result = stmt.query_row(params![number], parse_task_row);

            match result {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// List tasks most recently updated first, with pagination.
    pub fn list_tasks(&self, offset: i64, limit: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks ORDER BY updated_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            )?;

            let tasks = stmt
                .query_map(params![limit, offset], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }

    /// Direct subtasks of a task.
    pub fn get_subtasks(&self, parent_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE parent_id = ?1 ORDER BY id")?;

            let tasks = stmt
                .query_map(params![parent_id], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }

    /// A task with creator, assignee, subtasks, and both blocking views.
    pub fn get_task_detail(&self, task_id: i64) -> Result<Option<TaskDetail>> {
        let Some(task) = self.get_task(task_id)? else {
            return Ok(None);
        };

        let creator = self.get_user(task.creator_id)?;
        let assignee = match task.assignee_id {
            Some(id) => self.get_user(id)?,
            None => None,
        };
        let subtasks = self.get_subtasks(task_id)?;
        let blocks = self.blocks_of(task_id)?;
        let blocked_by = self.blocked_by(task_id)?;

        Ok(Some(TaskDetail {
            task,
            creator,
            assignee,
            subtasks,
            blocks,
            blocked_by,
        }))
    }

    /// Apply a sparse patch to a task.
    ///
    /// Only fields present in the patch change; `updated_at` advances on
    /// every successful apply regardless. A `blocks` list replaces the
    /// whole outgoing edge set, and every referenced task must exist.
    ///
    /// This is the raw applier: it trusts its input and does not run the
    /// transition or assignee validators. Use [`Database::change_status`]
    /// for validated status moves.
    pub fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| TrackerError::task_not_found(task_id))?;

            if let Some(ref blocks) = patch.blocks {
                super::blocking::replace_blocks_internal(&tx, task_id, blocks)?;
            }

            let new_kind = patch.kind.unwrap_or(task.kind);
            let new_priority = patch.priority.unwrap_or(task.priority);
            let new_title = patch.title.unwrap_or(task.title);
            let new_description = patch.description.unwrap_or(task.description);
            let new_status = patch.status.unwrap_or(task.status);
            let new_assignee = patch.assignee_id.unwrap_or(task.assignee_id);

            tx.execute(
                "UPDATE tasks SET
                    kind = ?1, priority = ?2, title = ?3, description = ?4,
                    status = ?5, assignee_id = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    new_kind.as_str(),
                    new_priority.as_str(),
                    new_title,
                    new_description,
                    new_status.as_str(),
                    new_assignee,
                    now,
                    task_id,
                ],
            )?;

            tx.commit()?;

            Ok(Task {
                id: task_id,
                kind: new_kind,
                priority: new_priority,
                title: new_title,
                description: new_description,
                status: new_status,
                assignee_id: new_assignee,
                updated_at: now,
                ..task
            })
        })
    }

    /// Check an assignee against the eligibility rules for a status.
    ///
    /// A missing assignee is fine everywhere except `in_progress`; a
    /// present one must exist and pass the role rules in [`crate::rules`].
    pub fn validate_assignee(
        &self,
        status: TaskStatus,
        assignee_id: Option<i64>,
    ) -> Result<()> {
        let Some(assignee_id) = assignee_id else {
            if rules::status_requires_assignee(status) {
                return Err(TrackerError::assignee_required().into());
            }
            return Ok(());
        };

        let assignee = self
            .get_user(assignee_id)?
            .ok_or_else(|| TrackerError::assignee_not_found(assignee_id))?;

        rules::assignee_role_allowed(assignee.role, status)
            .map_err(|reason| TrackerError::ineligible_assignee(reason).into())
    }

    /// Move a task to a new status, replacing its assignee.
    ///
    /// Validates the transition and the assignee against the *new* status,
    /// then applies both fields. Passing `None` clears the assignee.
    pub fn change_status(
        &self,
        task_id: i64,
        new_status: TaskStatus,
        assignee_id: Option<i64>,
    ) -> Result<Task> {
        let task = self
            .get_task(task_id)?
            .ok_or_else(|| TrackerError::task_not_found(task_id))?;

        if !rules::transition_allowed(task.status, new_status) {
            return Err(TrackerError::invalid_transition(
                task.status.as_str(),
                new_status.as_str(),
            )
            .into());
        }

        self.validate_assignee(new_status, assignee_id)?;

        self.update_task(
            task_id,
            TaskPatch {
                status: Some(new_status),
                assignee_id: Some(assignee_id),
                ..TaskPatch::default()
            },
        )
    }

    /// Delete a task permanently. Blocking edges touching it are removed
    /// by the schema's cascades; subtask parent references go dangling.
    pub fn delete_task(&self, task_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            if deleted == 0 {
                return Err(TrackerError::task_not_found(task_id).into());
            }

            Ok(())
        })
    }
}
