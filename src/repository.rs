//! In-memory mirror of users and tasks, written through to the [`Keeper`].
//!
//! Every mutation runs the durable write first, while holding the write lock
//! of the affected map, and touches the mirror only after the store has
//! accepted the change. A failure therefore leaves the mirror as it was:
//! the cache may lag the store, it is never ahead of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use time::{Date, Time};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::db::Keeper;
use crate::error::{LedgerError, LedgerResult};
use crate::tasks::repo_types::{NewTask, Task, TaskFilter, TaskPatch};
use crate::tracking::repo_types::{NewTimeEntry, TaskSummary, TimeEntry};
use crate::tracking::services::summarize;
use crate::tz::UserZone;
use crate::users::repo_types::{ExtUserData, NewUser, PassportKey, User, UserFilter, UserPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

pub struct Repository {
    users: RwLock<BTreeMap<i64, User>>,
    tasks: RwLock<BTreeMap<i64, Task>>,
    keeper: Arc<dyn Keeper>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Builds the mirror from the store.
    pub async fn load(keeper: Arc<dyn Keeper>, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        let users: BTreeMap<i64, User> = keeper
            .load_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let tasks: BTreeMap<i64, Task> = keeper
            .load_tasks()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        info!(users = users.len(), tasks = tasks.len(), "cache loaded");
        Ok(Self {
            users: RwLock::new(users),
            tasks: RwLock::new(tasks),
            keeper,
            clock,
        })
    }

    // ---- users ----

    #[instrument(skip(self, user), fields(key = %user.key))]
    pub async fn insert_user(&self, user: NewUser) -> LedgerResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.key() == user.key) {
            return Err(LedgerError::Conflict(format!("user {} already exists", user.key)));
        }
        let saved = self.keeper.save_user(&user).await?;
        users.insert(saved.id, saved.clone());
        Ok(saved)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> LedgerResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(LedgerError::NotFound(format!("user {id}")));
        }
        let updated = self.keeper.update_user(id, &patch).await?;
        users.insert(id, updated.clone());
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> LedgerResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(LedgerError::NotFound(format!("user {id}")));
        }
        self.keeper.delete_user(id).await?;
        users.remove(&id);
        Ok(())
    }

    /// Filtered window over the mirror, in id order.
    pub async fn get_users(&self, filter: &UserFilter, page: Pagination) -> Vec<User> {
        let users = self.users.read().await;
        users
            .values()
            .filter(|u| filter.matches(u))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    /// Looks a user up by natural key, falling back to the store on a miss.
    pub async fn get_user(&self, key: PassportKey) -> LedgerResult<User> {
        {
            let users = self.users.read().await;
            if let Some(u) = users.values().find(|u| u.key() == key) {
                return Ok(u.clone());
            }
        }
        let mut users = self.users.write().await;
        if let Some(u) = users.values().find(|u| u.key() == key) {
            return Ok(u.clone());
        }
        let user = self
            .keeper
            .find_user(key)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {key}")))?;
        debug!(user_id = user.id, "user backfilled from store");
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: i64) -> LedgerResult<User> {
        if let Some(u) = self.users.read().await.get(&id) {
            return Ok(u.clone());
        }
        let mut users = self.users.write().await;
        if let Some(u) = users.get(&id) {
            return Ok(u.clone());
        }
        let user = self
            .keeper
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {id}")))?;
        debug!(user_id = id, "user backfilled from store");
        users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn get_non_update_users(&self) -> LedgerResult<Vec<ExtUserData>> {
        self.keeper.non_updated_users().await
    }

    /// Applies directory data. Only rows the store actually refreshed are
    /// copied into the mirror.
    #[instrument(skip(self, batch), fields(batch = batch.len()))]
    pub async fn update_users_info(&self, batch: &[ExtUserData]) -> LedgerResult<usize> {
        let mut users = self.users.write().await;
        let updated = self.keeper.update_users_info(batch).await?;
        let n = updated.len();
        for u in updated {
            users.insert(u.id, u);
        }
        Ok(n)
    }

    // ---- tasks ----

    #[instrument(skip(self, task), fields(name = %task.name))]
    pub async fn insert_task(&self, task: NewTask) -> LedgerResult<Task> {
        let mut tasks = self.tasks.write().await;
        let saved = self.keeper.save_task(&task).await?;
        tasks.insert(saved.id, saved.clone());
        Ok(saved)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> LedgerResult<Task> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&id) {
            return Err(LedgerError::NotFound(format!("task {id}")));
        }
        let updated = self.keeper.update_task(id, &patch).await?;
        tasks.insert(id, updated.clone());
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: i64) -> LedgerResult<()> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&id) {
            return Err(LedgerError::NotFound(format!("task {id}")));
        }
        self.keeper.delete_task(id).await?;
        tasks.remove(&id);
        Ok(())
    }

    pub async fn get_tasks(&self, filter: &TaskFilter, page: Pagination) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        tasks
            .values()
            .filter(|t| filter.matches(t))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    /// Checks the mirror, then the store, backfilling a task found only there.
    async fn ensure_task(&self, id: i64) -> LedgerResult<()> {
        if self.tasks.read().await.contains_key(&id) {
            return Ok(());
        }
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&id) {
            return Ok(());
        }
        let task = self
            .keeper
            .find_task(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("task {id}")))?;
        debug!(task_id = id, "task backfilled from store");
        tasks.insert(id, task);
        Ok(())
    }

    // ---- ledger ----

    /// Opens a session for today in the user's time zone.
    #[instrument(skip(self))]
    pub async fn start_task_tracking(&self, user_id: i64, task_id: i64) -> LedgerResult<TimeEntry> {
        let user = self.get_user_by_id(user_id).await?;
        self.ensure_task(task_id).await?;
        let zone = UserZone::parse(&user.timezone)?;
        let now = zone.localize(self.clock.now_utc())?;
        let entry = NewTimeEntry {
            user_id,
            task_id,
            event_date: now.date(),
            start_time: now,
        };
        let started = self.keeper.start_tracking(&entry).await?;
        in_zone(started, &zone)
    }

    /// Closes today's open session. A session left open past its day is not
    /// found here; the summary resolves it instead.
    #[instrument(skip(self))]
    pub async fn stop_task_tracking(&self, user_id: i64, task_id: i64) -> LedgerResult<TimeEntry> {
        let user = self.get_user_by_id(user_id).await?;
        self.ensure_task(task_id).await?;
        let zone = UserZone::parse(&user.timezone)?;
        let now = zone.localize(self.clock.now_utc())?;
        let stopped = self
            .keeper
            .stop_tracking(user_id, task_id, now.date(), now)
            .await?;
        in_zone(stopped, &zone)
    }

    #[instrument(skip(self))]
    pub async fn get_user_task_summary(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
        timezone: &str,
        default_end_time: Option<Time>,
    ) -> LedgerResult<Vec<TaskSummary>> {
        if start > end {
            return Err(LedgerError::BadRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let zone = UserZone::parse(timezone)?;
        let entries = self.keeper.entries_in_range(user_id, start, end).await?;
        summarize(&entries, &zone, default_end_time)
    }

    /// Summary using the user's own time zone and default end time.
    pub async fn summary_for_user(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
    ) -> LedgerResult<Vec<TaskSummary>> {
        let user = self.get_user_by_id(user_id).await?;
        self.get_user_task_summary(user.id, start, end, &user.timezone, user.default_end_time)
            .await
    }

    pub async fn get_base_connection(&self) -> bool {
        self.keeper.ping().await
    }
}

/// Re-expresses the stored instants at the user's local offset.
fn in_zone(mut entry: TimeEntry, zone: &UserZone) -> LedgerResult<TimeEntry> {
    entry.start_time = zone.localize(entry.start_time)?;
    entry.end_time = entry.end_time.map(|t| zone.localize(t)).transpose()?;
    Ok(entry)
}
