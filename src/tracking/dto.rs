use serde::{Deserialize, Serialize};
use time::Date;

use super::repo_types::TaskSummary;
use super::services::format_duration;
use crate::formats;

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub task_id: i64,
}

/// Summary request. `user_id` defaults to the caller and must match it.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(with = "formats::date")]
    pub start_date: Date,
    #[serde(with = "formats::date")]
    pub end_date: Date,
}

#[derive(Debug, Serialize)]
pub struct SummaryItem {
    pub task_id: i64,
    pub total_seconds: i64,
    pub total_time: String,
}

impl From<TaskSummary> for SummaryItem {
    fn from(s: TaskSummary) -> Self {
        Self {
            task_id: s.task_id,
            total_seconds: s.total_time.whole_seconds(),
            total_time: format_duration(s.total_time),
        }
    }
}
