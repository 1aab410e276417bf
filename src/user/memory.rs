//! In-memory [`UserStore`] used by tests instead of PostgreSQL.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::crypto::{self, PasswordManager};
use crate::error::{Result, ServerError};
use crate::user::{NewUser, User, UserStore};

/// Insertion-ordered store with the same policy and hashing path as the
/// PostgreSQL adapter.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    pwd: PasswordManager,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.iter().find(|user| user.email == email).cloned())
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
        let mut users = self.users.lock().expect("user store lock poisoned");

        // Same uniqueness guarantee the relational indexes provide.
        if users.iter().any(|user| {
            user.username == new_user.username || user.email == new_user.email
        }) {
            return Err(ServerError::Conflict {
                email: new_user.email,
                username: new_user.username,
            });
        }

        let user = User {
            id: crypto::random_hex(),
            username: new_user.username,
            email: new_user.email,
            password,
            security_stamp: new_user.security_stamp,
            created_at: chrono::Utc::now(),
        };
        users.push(user.clone());

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
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.clone())
    }
}
