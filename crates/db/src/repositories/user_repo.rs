//! Repository for the `users` table.

use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

const COLUMNS: &str = "\
    id, email, name, password_hash, role, is_active, current_org_id, \
    last_login_at, created_at, updated_at";

/// Provides account lookups and updates.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user. The first account ever created becomes `admin`.
    pub async fn create(
        pool: &PgPool,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name, password_hash, role) \
             VALUES ($1, $2, $3, \
                     CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'member' ELSE 'admin' END) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Set (or clear) the organisation the user works in.
    pub async fn set_current_org(
        pool: &PgPool,
        id: DbId,
        org_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET current_org_id = $2 WHERE id = $1")
            .bind(id)
            .bind(org_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// All accounts, oldest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Change a user's platform role and/or active flag. `None` keeps the
    /// current value.
    pub async fn update_access(
        pool: &PgPool,
        id: DbId,
        role: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET role = COALESCE($2, role), is_active = COALESCE($3, is_active) \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(role)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }
}
