//! Task search: text match, exact filters, sorting, and pagination.

use super::Database;
use super::tasks::parse_task_row;
use crate::types::{Task, TaskKind, TaskStatus};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Hard cap on page size regardless of what the caller asks for.
const MAX_LIMIT: i64 = 500;

/// A task search request. All filters are optional and combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSearch {
    /// Case-insensitive substring match over title OR description.
    pub text: Option<String>,
    /// Exact display number match.
    pub number: Option<String>,
    pub kind: Option<TaskKind>,
    pub status: Option<TaskStatus>,
    pub creator_id: Option<i64>,
    pub assignee_id: Option<i64>,
    /// Sort field; unknown fields fall back to `updated_at`.
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default).
    pub sort_order: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

/// Build an ORDER BY clause from sort_by and sort_order parameters.
/// Unknown sort fields fall back to updated_at; the field list is fixed,
/// so the clause is safe to splice into SQL.
fn build_order_clause(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let field = match sort_by {
        Some("number") => "number",
        Some("kind") => "kind",
        Some("priority") => "priority",
        Some("status") => "status",
        Some("title") => "title",
        Some("created_at") => "created_at",
        Some("updated_at") => "updated_at",
        _ => "updated_at", // default
    };

    let order = match sort_order {
        Some("asc") => "ASC",
        _ => "DESC",
    };

    format!("{} {}", field, order)
}

impl Database {
    /// Run a search over tasks.
    pub fn search_tasks(&self, search: &TaskSearch, default_limit: i64) -> Result<Vec<Task>> {
        let limit = search.limit.unwrap_or(default_limit).min(MAX_LIMIT);

        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE 1=1");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(ref text) = search.text {
                sql.push_str(
                    " AND (lower(title) LIKE '%' || lower(?) || '%'
                       OR lower(coalesce(description, '')) LIKE '%' || lower(?) || '%')",
                );
                params_vec.push(Box::new(text.clone()));
                params_vec.push(Box::new(text.clone()));
            }

            if let Some(ref number) = search.number {
                sql.push_str(" AND number = ?");
                params_vec.push(Box::new(number.clone()));
            }

            if let Some(kind) = search.kind {
                sql.push_str(" AND kind = ?");
                params_vec.push(Box::new(kind.as_str().to_string()));
            }

            if let Some(status) = search.status {
                sql.push_str(" AND status = ?");
                params_vec.push(Box::new(status.as_str().to_string()));
            }

            if let Some(creator_id) = search.creator_id {
                sql.push_str(" AND creator_id = ?");
                params_vec.push(Box::new(creator_id));
            }

            if let Some(assignee_id) = search.assignee_id {
                sql.push_str(" AND assignee_id = ?");
                params_vec.push(Box::new(assignee_id));
            }

            sql.push_str(&format!(
                " ORDER BY {} LIMIT ? OFFSET ?",
                build_order_clause(search.sort_by.as_deref(), search.sort_order.as_deref())
            ));
            params_vec.push(Box::new(limit));
            params_vec.push(Box::new(search.offset));

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }
}
