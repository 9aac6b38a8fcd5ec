//! Task CRUD and completion scheduling.

use super::Database;
use crate::repeat::next_interval;
use crate::types::{NewTask, Task, TaskStatus};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, Row, params};

/// Initial interval (days) for directly-created tasks.
const INITIAL_INTERVAL: i64 = 1;

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let due_ms: i64 = row.get("due_date")?;
    let status: String = row.get("status")?;
    let repeat_interval: i64 = row.get("repeat_interval")?;

    let due_date = DateTime::from_timestamp_millis(due_ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            format!("due_date out of range: {due_ms}").into(),
        )
    })?;

    let status = TaskStatus::from_str(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown task status: {status}").into(),
        )
    })?;

    Ok(Task {
        id,
        title,
        description,
        due_date,
        status,
        repeat_interval,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn insert_task(
    conn: &Connection,
    title: &str,
    description: Option<&str>,
    due_date: DateTime<Utc>,
    repeat_interval: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO tasks (title, description, due_date, status, repeat_interval)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            title,
            description,
            due_date.timestamp_millis(),
            TaskStatus::Pending.as_str(),
            repeat_interval,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Create a new pending task with the initial repeat interval.
    /// Returns the stored row with its assigned id.
    pub fn create_task(&self, new: &NewTask) -> Result<Task> {
        self.with_conn(|conn| {
            let id = insert_task(
                conn,
                &new.title,
                new.description.as_deref(),
                new.due_date,
                INITIAL_INTERVAL,
            )?;
            get_task_internal(conn, id)?.ok_or_else(|| anyhow!("task {} missing after insert", id))
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List every task in store order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks")?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// List tasks whose due date falls in the half-open window `[start, end)`.
    pub fn list_tasks_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE due_date >= ?1 AND due_date < ?2")?;
            let tasks = stmt
                .query_map(
                    params![start.timestamp_millis(), end.timestamp_millis()],
                    parse_task_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Mark a task completed and schedule its next occurrence, if the
    /// interval progression has one. The status update and the successor
    /// insert commit atomically together or not at all.
    ///
    /// Returns the completed original, or `None` if the id is unknown.
    pub fn complete_task(&self, task_id: i64, now: DateTime<Utc>) -> Result<Option<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(task) = get_task_internal(&tx, task_id)? else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![TaskStatus::Completed.as_str(), task_id],
            )?;

            if let Some(interval) = next_interval(task.repeat_interval) {
                insert_task(
                    &tx,
                    &task.title,
                    task.description.as_deref(),
                    now + Duration::days(interval),
                    interval,
                )?;
            }

            let completed = get_task_internal(&tx, task_id)?;
            tx.commit()?;
            Ok(completed)
        })
    }

    /// Delete a task by id. Returns true if a row was removed.
    pub fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(removed > 0)
        })
    }
}
