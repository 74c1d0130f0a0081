//! `UPDATE … SET` statements built from patch values: one assignment per
//! present field, nothing else.

use sqlx::{Postgres, QueryBuilder};

use crate::tasks::repo_types::TaskPatch;
use crate::users::repo_types::UserPatch;

pub const USER_COLUMNS: &str = "id, passport_serie, passport_number, surname, name, patronymic, \
     address, timezone, default_end_time, password_hash, last_checked_at";

pub const TASK_COLUMNS: &str = "id, name, description, created_at";

/// Returns `None` for an empty patch.
pub fn user_update(id: i64, patch: &UserPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }
    let mut qb = QueryBuilder::new("UPDATE users SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(v) = &patch.surname {
            set.push("surname = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.name {
            set.push("name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.patronymic {
            set.push("patronymic = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.address {
            set.push("address = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.timezone {
            set.push("timezone = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.default_end_time {
            set.push("default_end_time = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.password_hash {
            set.push("password_hash = ").push_bind_unseparated(v.clone());
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(USER_COLUMNS);
    Some(qb)
}

/// Returns `None` for an empty patch.
pub fn task_update(id: i64, patch: &TaskPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }
    let mut qb = QueryBuilder::new("UPDATE tasks SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(v) = &patch.name {
            set.push("name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.description {
            set.push("description = ").push_bind_unseparated(v.clone());
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(TASK_COLUMNS);
    Some(qb)
}
