//! Task list.
//!
//! A flat list persisted as one blob. New tasks go to the front; removal is
//! array filtering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::{self, keys, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Which tasks a listing shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn accepts(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!("unknown filter '{other}' (all, active, completed)")),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Rounded percentage of completed tasks; 0 for an empty list.
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn load(store: &impl Store) -> Self {
        Self::new(storage::load(store, keys::TASKS).unwrap_or_default())
    }

    pub fn save(&self, store: &impl Store) {
        storage::persist(store, keys::TASKS, &self.tasks);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filtered(&self, filter: TaskFilter) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| filter.accepts(t))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Task, ValidationError> {
        let wanted = id.trim();
        self.tasks
            .iter_mut()
            .find(|t| t.id.to_string() == wanted)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "task",
                id: wanted.to_string(),
            })
    }

    pub fn add(&mut self, text: &str) -> Result<&Task, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("task text"));
        }
        self.tasks.insert(
            0,
            Task {
                id: Uuid::new_v4(),
                text: text.to_string(),
                completed: false,
                created_at: Utc::now(),
            },
        );
        self.tasks.first().ok_or(ValidationError::Empty("task list"))
    }

    /// Flip `completed`; returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ValidationError> {
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn edit(&mut self, id: &str, text: &str) -> Result<(), ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("task text"));
        }
        self.find_mut(id)?.text = text.to_string();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, ValidationError> {
        let wanted = id.trim();
        let position = self
            .tasks
            .iter()
            .position(|t| t.id.to_string() == wanted)
            .ok_or_else(|| ValidationError::NotFound {
                kind: "task",
                id: wanted.to_string(),
            })?;
        Ok(self.tasks.remove(position))
    }

    /// Drop completed tasks; returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before - self.tasks.len()
    }

    pub fn stats(&self) -> TaskStats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            // Round half up in integer arithmetic.
            u32::try_from((completed * 200 + total) / (total * 2)).unwrap_or(100)
        };
        TaskStats {
            total,
            completed,
            active: total - completed,
            completion_rate,
        }
    }
}
