use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Task record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(v) = &self.name {
            task.name = v.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
    }
}

/// Substring predicates for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, t: &Task) -> bool {
        self.name.as_deref().map_or(true, |n| t.name.contains(n))
            && self
                .description
                .as_deref()
                .map_or(true, |d| t.description.contains(d))
    }
}
