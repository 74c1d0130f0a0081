//! In-memory [`Keeper`] for tests. Mirrors the Postgres constraints: unique
//! passport key, one open entry per user/task/day, restricted task delete.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use super::Keeper;
use crate::error::{LedgerError, LedgerResult};
use crate::tasks::repo_types::{NewTask, Task, TaskPatch};
use crate::tracking::repo_types::{NewTimeEntry, TimeEntry};
use crate::users::repo_types::{ExtUserData, NewUser, PassportKey, User, UserPatch};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    entries: Vec<TimeEntry>,
    next_id: i64,
}

impl Tables {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryKeeper {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    user_update_interval: time::Duration,
    stale_batch: usize,
}

impl Default for MemoryKeeper {
    fn default() -> Self {
        Self {
            tables: Mutex::default(),
            failing: AtomicBool::new(false),
            user_update_interval: time::Duration::days(1),
            stale_batch: 100,
        }
    }
}

impl MemoryKeeper {
    /// Makes every subsequent call fail as if the database were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes a user straight into the store, bypassing any cache.
    pub fn seed_user(&self, new: &NewUser) -> User {
        let mut t = self.tables.lock().unwrap();
        let user = Self::row_for(&mut t, new);
        t.users.insert(user.id, user.clone());
        user
    }

    /// Inserts a task straight into the store, bypassing any cache above it.
    pub fn seed_task(&self, new: &NewTask) -> Task {
        let mut t = self.tables.lock().unwrap();
        let task = Task {
            id: t.next(),
            name: new.name.clone(),
            description: new.description.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.tasks.insert(task.id, task.clone());
        task
    }

    pub fn set_last_checked(&self, id: i64, at: Option<OffsetDateTime>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.get_mut(&id) {
            u.last_checked_at = at;
        }
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        self.tables.lock().unwrap().entries.clone()
    }

    fn check(&self) -> LedgerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn row_for(t: &mut Tables, new: &NewUser) -> User {
        User {
            id: t.next(),
            passport_serie: new.key.serie,
            passport_number: new.key.number,
            surname: new.surname.clone(),
            name: new.name.clone(),
            patronymic: new.patronymic.clone(),
            address: new.address.clone(),
            timezone: new.timezone.clone(),
            default_end_time: new.default_end_time,
            password_hash: new.password_hash.clone(),
            last_checked_at: None,
        }
    }

    fn is_stale(&self, u: &User, now: OffsetDateTime) -> bool {
        u.last_checked_at
            .map_or(true, |at| at <= now - self.user_update_interval)
    }
}

#[async_trait]
impl Keeper for MemoryKeeper {
    async fn load_users(&self) -> LedgerResult<Vec<User>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().users.values().cloned().collect())
    }

    async fn save_user(&self, new: &NewUser) -> LedgerResult<User> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.users.values().any(|u| u.key() == new.key) {
            return Err(LedgerError::Conflict(format!("user {} already exists", new.key)));
        }
        let user = Self::row_for(&mut t, new);
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> LedgerResult<User> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let user = t
            .users
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {id}")))?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> LedgerResult<()> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.users.remove(&id).is_none() {
            return Err(LedgerError::NotFound(format!("user {id}")));
        }
        t.entries.retain(|e| e.user_id != id);
        Ok(())
    }

    async fn find_user(&self, key: PassportKey) -> LedgerResult<Option<User>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        Ok(t.users.values().find(|u| u.key() == key).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> LedgerResult<Option<User>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn non_updated_users(&self) -> LedgerResult<Vec<ExtUserData>> {
        self.check()?;
        let now = OffsetDateTime::now_utc();
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .values()
            .filter(|u| self.is_stale(u, now))
            .take(self.stale_batch)
            .map(|u| ExtUserData {
                passport_serie: u.passport_serie,
                passport_number: u.passport_number,
                surname: u.surname.clone(),
                name: u.name.clone(),
                address: u.address.clone(),
            })
            .collect())
    }

    async fn update_users_info(&self, batch: &[ExtUserData]) -> LedgerResult<Vec<User>> {
        self.check()?;
        let now = OffsetDateTime::now_utc();
        let mut t = self.tables.lock().unwrap();
        let mut updated = Vec::new();
        for data in batch {
            let Some(user) = t.users.values_mut().find(|u| u.key() == data.key()) else {
                continue;
            };
            if !self.is_stale(user, now) {
                continue;
            }
            user.surname = data.surname.clone();
            user.name = data.name.clone();
            user.address = data.address.clone();
            user.last_checked_at = Some(now);
            updated.push(user.clone());
        }
        Ok(updated)
    }

    async fn load_tasks(&self) -> LedgerResult<Vec<Task>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().tasks.values().cloned().collect())
    }

    async fn find_task(&self, id: i64) -> LedgerResult<Option<Task>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().tasks.get(&id).cloned())
    }

    async fn save_task(&self, new: &NewTask) -> LedgerResult<Task> {
        self.check()?;
        Ok(self.seed_task(new))
    }

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> LedgerResult<Task> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let task = t
            .tasks
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("task {id}")))?;
        patch.apply(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: i64) -> LedgerResult<()> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        if t.entries.iter().any(|e| e.task_id == id) {
            return Err(LedgerError::Conflict(format!("task {id} has tracked time")));
        }
        if t.tasks.remove(&id).is_none() {
            return Err(LedgerError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    async fn start_tracking(&self, entry: &NewTimeEntry) -> LedgerResult<TimeEntry> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let open = t.entries.iter().any(|e| {
            e.user_id == entry.user_id
                && e.task_id == entry.task_id
                && e.event_date == entry.event_date
                && e.is_open()
        });
        if open {
            return Err(LedgerError::AlreadyTracking {
                user_id: entry.user_id,
                task_id: entry.task_id,
                date: entry.event_date,
            });
        }
        let row = TimeEntry {
            id: t.next(),
            user_id: entry.user_id,
            task_id: entry.task_id,
            event_date: entry.event_date,
            start_time: entry.start_time,
            end_time: None,
        };
        t.entries.push(row.clone());
        Ok(row)
    }

    async fn stop_tracking(
        &self,
        user_id: i64,
        task_id: i64,
        event_date: Date,
        end_time: OffsetDateTime,
    ) -> LedgerResult<TimeEntry> {
        self.check()?;
        let mut t = self.tables.lock().unwrap();
        let entry = t
            .entries
            .iter_mut()
            .find(|e| {
                e.user_id == user_id && e.task_id == task_id && e.event_date == event_date && e.is_open()
            })
            .ok_or(LedgerError::NotTracking {
                user_id,
                task_id,
                date: event_date,
            })?;
        entry.end_time = Some(end_time);
        Ok(entry.clone())
    }

    async fn entries_in_range(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
    ) -> LedgerResult<Vec<TimeEntry>> {
        self.check()?;
        let t = self.tables.lock().unwrap();
        Ok(t.entries
            .iter()
            .filter(|e| e.user_id == user_id && e.event_date >= start && e.event_date <= end)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}
