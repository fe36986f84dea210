//! Directed blocking edges between tasks.
//!
//! An edge `(a, b)` means task `a` blocks task `b`. The set of outgoing
//! edges is only ever replaced wholesale (see `TaskPatch::blocks`); there
//! is deliberately no cycle check, so self-edges and cycles are stored
//! as given.

use super::Database;
use super::tasks::parse_task_row;
use crate::error::TrackerError;
use crate::types::Task;
use anyhow::Result;
use rusqlite::{Connection, params};

/// Replace every outgoing edge of `task_id` with edges to `targets`.
///
/// All targets must exist; unknown ids fail the whole replacement rather
/// than being dropped. Duplicate ids in the list collapse to one edge.
pub(crate) fn replace_blocks_internal(
    conn: &Connection,
    task_id: i64,
    targets: &[i64],
) -> Result<()> {
    let mut missing: Vec<i64> = Vec::new();
    for target in targets {
        let exists: bool = conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![target], |_| {
                Ok(true)
            })
            .unwrap_or(false);
        if !exists {
            missing.push(*target);
        }
    }

    if !missing.is_empty() {
        return Err(TrackerError::unknown_block_targets(&missing).into());
    }

    conn.execute(
        "DELETE FROM task_blocking WHERE blocking_task_id = ?1",
        params![task_id],
    )?;

    for target in targets {
        conn.execute(
            "INSERT OR IGNORE INTO task_blocking (blocking_task_id, blocked_task_id)
             VALUES (?1, ?2)",
            params![task_id, target],
        )?;
    }

    Ok(())
}

impl Database {
    /// Tasks that `task_id` blocks (outgoing edges), ordered by target id.
    pub fn blocks_of(&self, task_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.* FROM tasks t
                 INNER JOIN task_blocking b ON t.id = b.blocked_task_id
                 WHERE b.blocking_task_id = ?1
                 ORDER BY t.id",
            )?;

            let tasks = stmt
                .query_map(params![task_id], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }

    /// Tasks blocking `task_id` (incoming edges), ordered by source id.
    pub fn blocked_by(&self, task_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.* FROM tasks t
                 INNER JOIN task_blocking b ON t.id = b.blocking_task_id
                 WHERE b.blocked_task_id = ?1
                 ORDER BY t.id",
            )?;

            let tasks = stmt
                .query_map(params![task_id], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }
}
