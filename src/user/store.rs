//! User persistence.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};

use crate::crypto::{self, PasswordManager};
use crate::error::{Result, ServerError};
use crate::user::User;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "identa";
pub const DEFAULT_POOL_SIZE: u32 = 10;

const USER_COLUMNS: &str =
    "id, username, email, password, security_stamp, created_at";

/// Fields of a [`User`] decided by the caller; the store assigns the
/// identifier and hashes the password.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub security_stamp: String,
}

/// Capability interface over persisted user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist a new user, hashing `password` on the way in.
    ///
    /// Fails with [`ServerError::InvalidRequest`] when the password breaks
    /// the account policy, and with [`ServerError::Conflict`] when a unique
    /// index rejects the row.
    async fn create(&self, new_user: NewUser, password: &str) -> Result<User>;

    /// Check a password against a user's stored hash.
    async fn verify_password(&self, user: &User, password: &str)
    -> Result<bool>;

    /// All users, in store-defined order.
    async fn list(&self) -> Result<Vec<User>>;
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: Pool<Postgres>,
    pwd: PasswordManager,
}

impl PostgresUserStore {
    /// Create a new [`PostgresUserStore`] from an existing pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            pwd: PasswordManager,
        }
    }

    /// Connect to PostgreSQL and wrap the pool.
    pub async fn connect(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
    ) -> std::result::Result<Self, sqlx::Error> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let pool = PgPoolOptions::new().max_connections(pool);
        let postgres = pool.connect(&addr).await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(Self::new(postgres))
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser, password: &str) -> Result<User> {
        let failures = self.pwd.check_policy(password);
        if !failures.is_empty() {
            return Err(ServerError::InvalidRequest {
                username: new_user.username,
                details: failures.join(", "),
            });
        }

        let password = self.pwd.hash_password(password)?;
        let query = format!(
            "INSERT INTO users (id, username, email, password, security_stamp, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(crypto::random_hex())
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&password)
            .bind(&new_user.security_stamp)
            .bind(chrono::Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                // Losing the pre-insert existence race lands here.
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ServerError::Conflict {
                        email: new_user.email.clone(),
                        username: new_user.username.clone(),
                    }
                },
                _ => ServerError::Sql(err),
            })?;

        Ok(user)
    }

    async fn verify_password(
        &self,
        user: &User,
        password: &str,
    ) -> Result<bool> {
        Ok(self.pwd.verify_password(password, &user.password))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
