use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use warden_core::{
    Role, StoreError, User, UserLookup, UserStore,
    store::{NewUser, UserChanges, UserCredentials},
};

const USER_COLUMNS: &str =
    "id, email, firstname, lastname, hashed_password, role, created_at, updated_at";

/// PostgreSQL-backed implementation of the `UserStore` port.
#[derive(Clone, Debug)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    firstname: String,
    lastname: String,
    hashed_password: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_credentials(self) -> Result<UserCredentials, StoreError> {
        let role: Role = self.role.parse().map_err(|err| {
            StoreError::Backend(format!("user {} has {err}", self.id))
        })?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                firstname: self.firstname,
                lastname: self.lastname,
                role,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.hashed_password,
        })
    }

    fn into_user(self) -> Result<User, StoreError> {
        self.into_credentials().map(|credentials| credentials.user)
    }
}

fn backend(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if let Some(db_err) = err.as_database_error()
            && db_err.is_unique_violation()
        {
            return StoreError::Conflict("Email already exists".to_string());
        }
        error!(error = %err, "{context}");
        StoreError::Backend(format!("{context}: {err}"))
    }
}

#[async_trait]
impl UserLookup for PostgresUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(backend("failed to get user by id"))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_login_name(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(backend("failed to get user by email"))?;

        row.map(UserRow::into_credentials).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, firstname, lastname, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(backend("failed to create user"))?;

        let user = row.into_user()?;
        info!(user_id = user.id, "created user row");
        Ok(user)
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(i64::from(skip))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(backend("failed to list users"))?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn update(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                firstname = COALESCE($3, firstname),
                lastname = COALESCE($4, lastname),
                hashed_password = COALESCE($5, hashed_password),
                role = COALESCE($6, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.firstname)
        .bind(changes.lastname)
        .bind(changes.password_hash)
        .bind(changes.role.map(|role| role.as_str()))
        .fetch_optional(self.pool())
        .await
        .map_err(backend("failed to update user"))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(backend("failed to delete user"))?;

        Ok(result.rows_affected() > 0)
    }
}
