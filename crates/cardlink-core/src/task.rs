//! Follow-up tasks, manual and automated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, actor::Actor, contact::Category};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskType {
  /// Created by an admin.
  Assigned,
  /// Emitted by the staleness scan.
  Automated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub task_id:                Uuid,
  pub task_title:             String,
  pub task_description:       Option<String>,
  pub task_deadline:          NaiveDate,
  pub task_assigned_category: Option<Category>,
  pub task_type:              TaskType,
  pub task_completion:        bool,
  pub contact_id:             Option<Uuid>,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             Option<DateTime<Utc>>,
}

/// Input for a manually created task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
  pub task_title:             Option<String>,
  pub task_description:       Option<String>,
  pub task_deadline:          Option<NaiveDate>,
  pub task_assigned_category: Option<Category>,
  pub contact_id:             Option<Uuid>,
}

impl NewTask {
  /// Title, deadline and category are mandatory for manual tasks.
  pub fn validate(&self) -> Result<(&str, NaiveDate, Category)> {
    let title = self
      .task_title
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty());
    match (title, self.task_deadline, self.task_assigned_category) {
      (Some(t), Some(d), Some(c)) => Ok((t, d, c)),
      _ => Err(Error::validation(
        "task_title, task_deadline and task_assigned_category are required",
      )),
    }
  }
}

/// Partial update of an open task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
  pub task_title:             Option<String>,
  pub task_description:       Option<String>,
  pub task_deadline:          Option<NaiveDate>,
  pub task_assigned_category: Option<Category>,
}

/// Marks a task done (or reopens it).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskCompletion {
  pub completed:   bool,
  /// When set on completion of a task tied to a contact, a `CONTACT`
  /// audit record is written for that contact.
  pub modified_by: Option<Actor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
  pub total:     usize,
  pub completed: usize,
  pub pending:   usize,
}

impl TaskCounts {
  fn add(&mut self, task: &Task) {
    self.total += 1;
    if task.task_completion {
      self.completed += 1;
    } else {
      self.pending += 1;
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
  #[serde(flatten)]
  pub overall:   TaskCounts,
  pub assigned:  TaskCounts,
  pub automated: TaskCounts,
}

impl TaskStats {
  pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
    let mut stats = Self::default();
    for task in tasks {
      stats.overall.add(task);
      match task.task_type {
        TaskType::Assigned => stats.assigned.add(task),
        TaskType::Automated => stats.automated.add(task),
      }
    }
    stats
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
  pub tasks: Vec<Task>,
  pub stats: TaskStats,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn task(kind: TaskType, done: bool) -> Task {
    Task {
      task_id: Uuid::new_v4(),
      task_title: "t".into(),
      task_description: None,
      task_deadline: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      task_assigned_category: Some(Category::A),
      task_type: kind,
      task_completion: done,
      contact_id: None,
      created_at: Utc::now(),
      updated_at: None,
    }
  }

  #[test]
  fn stats_break_down_by_type() {
    let tasks = [
      task(TaskType::Assigned, true),
      task(TaskType::Assigned, false),
      task(TaskType::Automated, false),
    ];
    let stats = TaskStats::from_tasks(&tasks);
    assert_eq!(stats.overall, TaskCounts { total: 3, completed: 1, pending: 2 });
    assert_eq!(stats.assigned, TaskCounts { total: 2, completed: 1, pending: 1 });
    assert_eq!(stats.automated, TaskCounts { total: 1, completed: 0, pending: 1 });
  }

  #[test]
  fn manual_task_requires_title_deadline_category() {
    let missing = NewTask {
      task_title: Some("Call".into()),
      ..Default::default()
    };
    assert!(missing.validate().is_err());

    let ok = NewTask {
      task_title: Some(" Call ".into()),
      task_deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
      task_assigned_category: Some(Category::B),
      ..Default::default()
    };
    let (title, _, category) = ok.validate().unwrap();
    assert_eq!(title, "Call");
    assert_eq!(category, Category::B);
  }
}
