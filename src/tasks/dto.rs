use serde::Deserialize;

use super::repo_types::TaskFilter;
use crate::repository::Pagination;

/// Query string of `GET /tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub name: Option<String>,
    pub description: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl TaskListQuery {
    pub fn split(self) -> (TaskFilter, Pagination) {
        let defaults = Pagination::default();
        let page = Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        };
        let filter = TaskFilter {
            name: self.name,
            description: self.description,
        };
        (filter, page)
    }
}
