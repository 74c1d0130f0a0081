use serde::Serialize;
use sqlx::FromRow;
use time::{Date, Duration, OffsetDateTime};

use crate::formats;

/// One row of `user_tasks`. `end_time` is NULL while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TimeEntry {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    #[serde(with = "formats::date")]
    pub event_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A session about to be opened.
#[derive(Debug, Clone, Copy)]
pub struct NewTimeEntry {
    pub user_id: i64,
    pub task_id: i64,
    pub event_date: Date,
    pub start_time: OffsetDateTime,
}

/// Accumulated time for one task over a query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
    pub task_id: i64,
    pub total_time: Duration,
}
