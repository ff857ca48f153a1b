//! Repository for the `organisations` and `organisation_members` tables.

use llmscope_core::organisations::MemberRole;
use llmscope_core::types::DbId;
use sqlx::PgPool;

use crate::models::organisation::{Organisation, OrganisationMember, OrganisationWithRole};

const COLUMNS: &str = "id, name, created_by, created_at, updated_at";

const WITH_ROLE_COLUMNS: &str = "\
    o.id, o.name, o.created_by, m.role, o.created_at, o.updated_at";

const MEMBER_COLUMNS: &str = "\
    m.id, m.organisation_id, m.user_id, u.email, u.name, m.role, m.created_at";

/// Provides organisation and membership operations.
pub struct OrganisationRepo;

impl OrganisationRepo {
    /// Create an organisation and make `user_id` its owner, atomically.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        user_id: DbId,
    ) -> Result<Organisation, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO organisations (name, created_by) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let org = sqlx::query_as::<_, Organisation>(&query)
            .bind(name)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO organisation_members (organisation_id, user_id, role) VALUES ($1, $2, $3)",
        )
        .bind(org.id)
        .bind(user_id)
        .bind(MemberRole::Owner.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(org)
    }

    /// Organisations the user belongs to, with their role in each.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<OrganisationWithRole>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_ROLE_COLUMNS} FROM organisations o \
             JOIN organisation_members m ON m.organisation_id = o.id \
             WHERE m.user_id = $1 ORDER BY o.name"
        );
        sqlx::query_as::<_, OrganisationWithRole>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find an organisation the user belongs to. `None` when it does not
    /// exist or the user is not a member.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<OrganisationWithRole>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_ROLE_COLUMNS} FROM organisations o \
             JOIN organisation_members m ON m.organisation_id = o.id \
             WHERE o.id = $1 AND m.user_id = $2"
        );
        sqlx::query_as::<_, OrganisationWithRole>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<Organisation>, sqlx::Error> {
        let query =
            format!("UPDATE organisations SET name = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Organisation>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete an organisation and, by cascade, everything scoped to it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organisations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_members(
        pool: &PgPool,
        org_id: DbId,
    ) -> Result<Vec<OrganisationMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM organisation_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.organisation_id = $1 ORDER BY m.created_at"
        );
        sqlx::query_as::<_, OrganisationMember>(&query)
            .bind(org_id)
            .fetch_all(pool)
            .await
    }

    /// Add a member. A duplicate raises `uq_organisation_members_org_user`.
    pub async fn add_member(
        pool: &PgPool,
        org_id: DbId,
        user_id: DbId,
        role: MemberRole,
    ) -> Result<OrganisationMember, sqlx::Error> {
        let query = format!(
            "WITH m AS ( \
                 INSERT INTO organisation_members (organisation_id, user_id, role) \
                 VALUES ($1, $2, $3) RETURNING * \
             ) \
             SELECT {MEMBER_COLUMNS} FROM m JOIN users u ON u.id = m.user_id"
        );
        sqlx::query_as::<_, OrganisationMember>(&query)
            .bind(org_id)
            .bind(user_id)
            .bind(role.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn remove_member(
        pool: &PgPool,
        org_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM organisation_members WHERE organisation_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The member's role, or `None` if `user_id` is not a member.
    pub async fn member_role(
        pool: &PgPool,
        org_id: DbId,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM organisation_members WHERE organisation_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_owners(pool: &PgPool, org_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM organisation_members WHERE organisation_id = $1 AND role = 'owner'",
        )
        .bind(org_id)
        .fetch_one(pool)
        .await
    }
}
