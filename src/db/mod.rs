//! Persistence gateway: the durable, transactional side of the ledger.
//!
//! [`Keeper`] is the seam between the in-memory [`Repository`] and the
//! relational store. The production implementation is [`pg::PgKeeper`]; the
//! test suite swaps in an in-memory keeper with identical semantics.
//!
//! [`Repository`]: crate::repository::Repository

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::error::LedgerResult;
use crate::tasks::repo_types::{NewTask, Task, TaskPatch};
use crate::tracking::repo_types::{NewTimeEntry, TimeEntry};
use crate::users::repo_types::{ExtUserData, NewUser, PassportKey, User, UserPatch};

#[cfg(test)]
pub mod memory;
pub mod patch;
pub mod pg;

#[async_trait]
pub trait Keeper: Send + Sync {
    async fn load_users(&self) -> LedgerResult<Vec<User>>;
    /// Fails with `Conflict` when the passport key is taken.
    async fn save_user(&self, user: &NewUser) -> LedgerResult<User>;
    async fn update_user(&self, id: i64, patch: &UserPatch) -> LedgerResult<User>;
    async fn delete_user(&self, id: i64) -> LedgerResult<()>;
    async fn find_user(&self, key: PassportKey) -> LedgerResult<Option<User>>;
    async fn find_user_by_id(&self, id: i64) -> LedgerResult<Option<User>>;

    /// Users whose freshness marker is missing or older than the configured
    /// interval, bounded by the configured batch size.
    async fn non_updated_users(&self) -> LedgerResult<Vec<ExtUserData>>;
    /// Applies directory data to rows that are still stale, refreshing their
    /// freshness marker, and returns exactly the rows it changed.
    async fn update_users_info(&self, batch: &[ExtUserData]) -> LedgerResult<Vec<User>>;

    async fn load_tasks(&self) -> LedgerResult<Vec<Task>>;
    async fn find_task(&self, id: i64) -> LedgerResult<Option<Task>>;
    async fn save_task(&self, task: &NewTask) -> LedgerResult<Task>;
    async fn update_task(&self, id: i64, patch: &TaskPatch) -> LedgerResult<Task>;
    async fn delete_task(&self, id: i64) -> LedgerResult<()>;

    /// Opens a session. Fails with `AlreadyTracking` if one is open for the
    /// same user, task and day.
    async fn start_tracking(&self, entry: &NewTimeEntry) -> LedgerResult<TimeEntry>;
    /// Closes the open session for the user, task and day, or fails with
    /// `NotTracking`.
    async fn stop_tracking(
        &self,
        user_id: i64,
        task_id: i64,
        event_date: Date,
        end_time: OffsetDateTime,
    ) -> LedgerResult<TimeEntry>;
    /// All entries of a user whose event date lies in `[start, end]`.
    async fn entries_in_range(&self, user_id: i64, start: Date, end: Date)
        -> LedgerResult<Vec<TimeEntry>>;

    async fn ping(&self) -> bool;
}
