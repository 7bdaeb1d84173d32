//! Task rows.

use cardlink_core::{
  Error as CoreError,
  contact::Category,
  history::{ModificationType, NewModification},
  task::{NewTask, Task, TaskCompletion, TaskList, TaskStats, TaskType, TaskUpdate},
  workflow::Role,
};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawTask, TASK_COLUMNS, encode_date, encode_dt, encode_uuid, opt_date, opt_str},
  history,
};

pub fn fetch(conn: &Connection, task_id: Uuid) -> Result<Option<Task>> {
  let raw = conn
    .query_row(
      &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1"),
      rusqlite::params![encode_uuid(task_id)],
      RawTask::from_row,
    )
    .optional()?;
  raw.map(RawTask::into_task).transpose()
}

fn require(conn: &Connection, task_id: Uuid) -> Result<Task> {
  fetch(conn, task_id)?.ok_or_else(|| CoreError::TaskNotFound(task_id).into())
}

/// Fields of a task row about to be written.
pub struct TaskRow<'a> {
  pub title:       &'a str,
  pub description: Option<&'a str>,
  pub deadline:    NaiveDate,
  pub category:    Option<Category>,
  pub task_type:   TaskType,
  pub contact_id:  Option<Uuid>,
}

pub fn insert(conn: &Connection, row: TaskRow<'_>) -> Result<Task> {
  let task_id = Uuid::new_v4();
  conn.execute(
    "INSERT INTO tasks (
       task_id, task_title, task_description, task_deadline, task_assigned_category,
       task_type, task_completion, contact_id, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
    rusqlite::params![
      encode_uuid(task_id),
      row.title,
      row.description,
      encode_date(row.deadline),
      opt_str(row.category),
      row.task_type.as_ref(),
      row.contact_id.map(encode_uuid),
      encode_dt(Utc::now()),
    ],
  )?;
  require(conn, task_id)
}

pub fn create(conn: &Connection, input: &NewTask) -> Result<Task> {
  let (title, deadline, category) = input.validate()?;
  insert(
    conn,
    TaskRow {
      title,
      description: input.task_description.as_deref(),
      deadline,
      category: Some(category),
      task_type: TaskType::Assigned,
      contact_id: input.contact_id,
    },
  )
}

/// Is there an open automated task with this title for this contact and
/// category? Category is compared null-safely.
pub fn open_automated_exists(
  conn: &Connection,
  contact_id: Uuid,
  category: Option<Category>,
  title: &str,
) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM tasks
         WHERE contact_id = ?1
           AND task_assigned_category IS ?2
           AND task_title = ?3
           AND task_type = 'automated'
           AND task_completion = 0
         LIMIT 1",
        rusqlite::params![encode_uuid(contact_id), opt_str(category), title],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

pub fn list(conn: &Connection, role: Role, category: Option<Category>) -> Result<TaskList> {
  let filter = if role == Role::Admin {
    None
  } else {
    match category {
      Some(c) => Some(c),
      None => return Err(CoreError::validation("category is required").into()),
    }
  };
  let mut stmt = conn.prepare(&format!(
    "SELECT {TASK_COLUMNS} FROM tasks
     WHERE (?1 IS NULL OR task_assigned_category = ?1)
     ORDER BY task_completion, task_deadline, created_at"
  ))?;
  let tasks = stmt
    .query_map(rusqlite::params![opt_str(filter)], RawTask::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawTask::into_task)
    .collect::<Result<Vec<_>>>()?;
  let stats = TaskStats::from_tasks(&tasks);
  Ok(TaskList { tasks, stats })
}

fn require_open(conn: &Connection, task_id: Uuid, action: &str) -> Result<Task> {
  let task = require(conn, task_id)?;
  if task.task_completion {
    return Err(CoreError::Validation(format!("cannot {action} a completed task")).into());
  }
  Ok(task)
}

pub fn update(conn: &Connection, task_id: Uuid, update: &TaskUpdate) -> Result<Task> {
  require_open(conn, task_id, "update")?;
  conn.execute(
    "UPDATE tasks SET
       task_title             = COALESCE(?2, task_title),
       task_description       = COALESCE(?3, task_description),
       task_deadline          = COALESCE(?4, task_deadline),
       task_assigned_category = COALESCE(?5, task_assigned_category),
       updated_at             = ?6
     WHERE task_id = ?1",
    rusqlite::params![
      encode_uuid(task_id),
      update.task_title.as_deref().map(str::trim).filter(|s| !s.is_empty()),
      update.task_description,
      opt_date(update.task_deadline),
      opt_str(update.task_assigned_category),
      encode_dt(Utc::now()),
    ],
  )?;
  require(conn, task_id)
}

pub fn delete(conn: &Connection, task_id: Uuid) -> Result<()> {
  require_open(conn, task_id, "delete")?;
  conn.execute(
    "DELETE FROM tasks WHERE task_id = ?1",
    rusqlite::params![encode_uuid(task_id)],
  )?;
  Ok(())
}

/// Set completion. Completing a contact task with a known actor records that
/// the contact was reached.
pub fn complete(conn: &Connection, task_id: Uuid, completion: TaskCompletion) -> Result<Task> {
  require(conn, task_id)?;
  conn.execute(
    "UPDATE tasks SET task_completion = ?2, updated_at = ?3 WHERE task_id = ?1",
    rusqlite::params![encode_uuid(task_id), completion.completed, encode_dt(Utc::now())],
  )?;
  let task = require(conn, task_id)?;

  if let (true, Some(contact_id), Some(actor)) =
    (completion.completed, task.contact_id, completion.modified_by)
  {
    history::log_modification(
      conn,
      NewModification::new(contact_id, actor, ModificationType::Contact)
        .with_description(format!("Task completed: {}", task.task_title)),
    )
    .ok();
  }
  Ok(task)
}
