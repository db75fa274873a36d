//! Sqlite database operations for users and roles
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`] struct instead.
//!
//! [`AuthManagement`]: crate::traits::AuthManagement
//! [`SqliteDatabase`]: crate::SqliteDatabase
use std::collections::HashMap;

use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUser, Role, User},
    traits::AuthApiError,
};

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let email = user.email.clone();
    let result = sqlx::query_as("INSERT INTO users (email, name) VALUES ($1, $2) RETURNING *")
        .bind(user.email)
        .bind(user.name)
        .fetch_one(conn)
        .await;
    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthApiError::DuplicateEmail(email)),
        Err(e) => Err(e.into()),
    }
}

pub async fn roles_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let roles: Vec<Role> = sqlx::query_scalar(
        r#"SELECT name FROM
            role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id
            WHERE user_id = $1
            ORDER BY roles.id"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(roles)
}

pub async fn user_has_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::new(
        "SELECT count(DISTINCT name) FROM role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id \
         WHERE user_id = ",
    );
    qb.push_bind(user_id);
    qb.push(" AND name IN (");
    let mut names = qb.separated(", ");
    for role in roles {
        names.push_bind(*role);
    }
    qb.push(")");
    let num_matching_roles: i64 = qb.build_query_scalar().fetch_one(conn).await?;
    let mut required = roles.to_vec();
    required.sort_by_key(|r| r.to_string());
    required.dedup();
    let missing = required.len().saturating_sub(usize::try_from(num_matching_roles).unwrap_or(0));
    if missing == 0 {
        Ok(())
    } else {
        debug!("🗃️ User #{user_id} is missing {missing} of the roles {roles:?}");
        Err(AuthApiError::RoleNotAllowed(missing))
    }
}

async fn fetch_role_ids(conn: &mut SqliteConnection) -> Result<HashMap<Role, i64>, AuthApiError> {
    let rows: Vec<(i64, Role)> = sqlx::query_as("SELECT id, name FROM roles").fetch_all(conn).await?;
    let roles = rows.into_iter().map(|(id, role)| (role, id)).collect::<HashMap<_, _>>();
    trace!("🗃️ Fetched current roles table: {roles:?}");
    Ok(roles)
}

fn role_ids(roles: &[Role], all_roles: &HashMap<Role, i64>) -> Result<Vec<i64>, AuthApiError> {
    roles
        .iter()
        .map(|r| {
            all_roles
                .get(r)
                .copied()
                .ok_or_else(|| AuthApiError::DatabaseError(format!("Role {r} is missing from the roles table")))
        })
        .collect()
}

pub async fn assign_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let all_roles = fetch_role_ids(&mut *conn).await?;
    let ids = role_ids(roles, &all_roles)?;
    let mut qb = QueryBuilder::new("INSERT INTO role_assignments (user_id, role_id) VALUES ");
    let mut values = qb.separated(", ");
    for role_id in ids {
        values.push("(");
        values.push_bind_unseparated(user_id);
        values.push_unseparated(", ");
        values.push_bind_unseparated(role_id);
        values.push_unseparated(")");
    }
    qb.push(" ON CONFLICT DO NOTHING");
    let res = qb.build().execute(conn).await?;
    debug!("🗃️ Assigned {} new roles to user #{user_id}", res.rows_affected());
    Ok(())
}

pub async fn remove_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    if roles.is_empty() {
        return Ok(0);
    }
    let all_roles = fetch_role_ids(&mut *conn).await?;
    let ids = role_ids(roles, &all_roles)?;
    let mut qb = QueryBuilder::new("DELETE FROM role_assignments WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND role_id IN (");
    let mut values = qb.separated(", ");
    for id in ids {
        values.push_bind(id);
    }
    qb.push(")");
    let res = qb.build().execute(conn).await?;
    Ok(res.rows_affected())
}
