#[cfg(test)]
pub mod memory;
mod service;
mod store;

pub use service::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// User as saved on database.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub security_stamp: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Project into the public [`UserView`].
    ///
    /// Blank username or email fields project as the empty string; callers
    /// rely on both fields always being present.
    pub fn view(&self) -> UserView {
        UserView {
            username: coalesce_blank(&self.username),
            email: coalesce_blank(&self.email),
        }
    }
}

fn coalesce_blank(value: &str) -> String {
    if value.trim().is_empty() {
        String::default()
    } else {
        value.to_owned()
    }
}

/// Public projection of a [`User`]: no password material, no identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
}

/// Body of a registration call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Body of a login call.
///
/// `username` also accepts the account email.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}
