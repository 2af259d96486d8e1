use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::user::PUBLIC_USER_COLUMNS;
use crate::database::models::{PublicUser, Role, UserRecord};
use crate::database::repository::Repository;
use crate::filter::FilterData;

pub const USERS_TABLE: &str = "users";

/// Validated field changes for a user update. The password arrives here
/// already hashed.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Persistence operations for user accounts.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
    repo: Repository<PublicUser>,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        let repo = Repository::new(USERS_TABLE, pool.clone());
        Self { pool, repo }
    }

    /// Insert a new user. A duplicate email surfaces as a conflict.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<PublicUser, DatabaseError> {
        sqlx::query_as::<_, PublicUser>(
            "INSERT INTO users (id, name, email, password_hash, role, last_login, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             RETURNING id, name, email, role, last_login, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    /// The only read that returns the password hash; used by login.
    pub async fn find_by_email_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PublicUser>, DatabaseError> {
        let user = sqlx::query_as::<_, PublicUser>(
            "SELECT id, name, email, role, last_login, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<PublicUser>, DatabaseError> {
        self.repo
            .select_any(FilterData {
                select: Some(
                    PUBLIC_USER_COLUMNS
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                ),
                order: Some(json!("created_at asc")),
                ..Default::default()
            })
            .await
    }

    /// Apply a partial update, returning the updated user or None for an
    /// unknown id.
    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<PublicUser>, DatabaseError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("UPDATE users SET ");
        let mut fields = qb.separated(", ");
        if let Some(name) = changes.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(email) = changes.email {
            fields.push("email = ").push_bind_unseparated(email);
        }
        if let Some(hash) = changes.password_hash {
            fields.push("password_hash = ").push_bind_unseparated(hash);
        }
        if let Some(role) = changes.role {
            fields.push("role = ").push_bind_unseparated(role.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING id, name, email, role, last_login, created_at");

        qb.build_query_as::<PublicUser>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    /// Returns true when a row was actually removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-delete Student accounts by last-login range; other roles are
    /// never touched.
    pub async fn delete_students_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM users WHERE role = $1 AND last_login >= $2 AND last_login <= $3",
        )
        .bind(Role::Student.as_str())
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bulk role reassignment: everyone created in the range becomes Teacher.
    pub async fn promote_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET role = $1 WHERE created_at >= $2 AND created_at <= $3",
        )
        .bind(Role::Teacher.as_str())
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Retention sweep: remove Students idle since before the cutoff.
    pub async fn delete_inactive_students(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE role = $1 AND last_login <= $2")
            .bind(Role::Student.as_str())
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn map_unique_violation(err: sqlx::Error) -> DatabaseError {
    let is_unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        DatabaseError::Conflict("Email is already registered".to_string())
    } else {
        DatabaseError::Sqlx(err)
    }
}
