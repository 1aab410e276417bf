//! Account orchestration: register, login and the public read operations.

use std::sync::Arc;

use crate::crypto;
use crate::error::{Result, ServerError};
use crate::token::TokenIssuer;
use crate::user::{
    LoginRequest, NewUser, RegisterRequest, UserStore, UserView,
};

/// User manager.
///
/// The only component with decision logic; everything else is persistence
/// and token plumbing.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    token: TokenIssuer,
}

impl IdentityService {
    /// Create a new [`IdentityService`].
    pub fn new(store: Arc<dyn UserStore>, token: TokenIssuer) -> Self {
        Self { store, token }
    }

    /// Create an account and log it in, returning a bearer token.
    ///
    /// The post-creation login deliberately carries the *email* in the
    /// username field; [`Self::login`] resolves it through its email
    /// fallback.
    pub async fn register(&self, request: RegisterRequest) -> Result<String> {
        let by_email = self.store.find_by_email(&request.email).await?;
        let by_username =
            self.store.find_by_username(&request.username).await?;
        if by_email.is_some() || by_username.is_some() {
            return Err(ServerError::Conflict {
                email: request.email,
                username: request.username,
            });
        }

        let user = self
            .store
            .create(
                NewUser {
                    username: request.username,
                    email: request.email.clone(),
                    security_stamp: crypto::random_hex(),
                },
                &request.password,
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            "user registered"
        );

        self.login(LoginRequest {
            username: request.email,
            password: request.password,
        })
        .await
    }

    /// Authenticate by username or email and return a fresh bearer token.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        let user = match self.store.find_by_username(&request.username).await?
        {
            Some(user) => Some(user),
            None => self.store.find_by_email(&request.username).await?,
        };

        let Some(user) = user else {
            return Err(ServerError::AuthenticationFailed {
                name: request.username,
            });
        };

        if !self.store.verify_password(&user, &request.password).await? {
            return Err(ServerError::AuthenticationFailed {
                name: request.username,
            });
        }

        self.token.issue(&user.username, &user.email)
    }

    /// All users projected to their public view, in store-defined order.
    pub async fn list_users(&self) -> Result<Vec<UserView>> {
        let users = self.store.list().await?;
        Ok(users.iter().map(|user| user.view()).collect())
    }

    /// Public view of one user, by exact username.
    pub async fn get_user(&self, username: &str) -> Result<UserView> {
        match self.store.find_by_username(username).await? {
            Some(user) => Ok(user.view()),
            None => Err(ServerError::NotFound {
                username: username.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::config::Jwt;
    use crate::token::EXPIRATION_TIME;
    use crate::user::memory::MemoryUserStore;

    const PASSWORD: &str = "Secret123!";

    fn service() -> IdentityService {
        let token = TokenIssuer::new(&Jwt {
            secret: "an-unguessable-test-secret".into(),
            valid_issuer: "identa.test".into(),
            valid_audience: "identa.test.audience".into(),
        });
        IdentityService::new(Arc::new(MemoryUserStore::default()), token)
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: PASSWORD.into(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_decodable_token() {
        let service = service();
        let token = service.register(alice()).await.unwrap();

        let claims = service.token.decode(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let service = service();
        service.register(alice()).await.unwrap();

        let err = service
            .register(RegisterRequest {
                username: "alice2".into(),
                ..alice()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Conflict { .. }));
        assert_eq!(
            err.to_string(),
            "a user with email alice@x.com or username alice2 already exists"
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let service = service();
        service.register(alice()).await.unwrap();

        let err = service
            .register(RegisterRequest {
                email: "alice+other@x.com".into(),
                ..alice()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Conflict { .. }));

        // No partial mutation: still exactly one user.
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_weak_password_lists_failures() {
        let service = service();
        let err = service
            .register(RegisterRequest {
                password: "abc".into(),
                ..alice()
            })
            .await
            .unwrap_err();

        let ServerError::InvalidRequest { username, details } = err else {
            panic!("expected InvalidRequest, got {err}");
        };
        assert_eq!(username, "alice");
        assert!(details.contains("at least 6 characters"));
        assert!(details.contains(", "));

        assert!(service.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_by_username_and_by_email() {
        let service = service();
        service.register(alice()).await.unwrap();

        let by_username = service
            .login(LoginRequest {
                username: "alice".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();
        let by_email = service
            .login(LoginRequest {
                username: "alice@x.com".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();

        // Both paths resolve the same account.
        let first = service.token.decode(&by_username).unwrap();
        let second = service.token.decode(&by_email).unwrap();
        assert_eq!(first.sub, "alice");
        assert_eq!(second.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = service();
        service.register(alice()).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                username: "alice".into(),
                password: "Wrong123!".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            wrong_password.to_string(),
            "unable to authenticate user alice"
        );

        let unknown = service
            .login(LoginRequest {
                username: "nobody".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            unknown,
            ServerError::AuthenticationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_repeated_login_issues_distinct_tokens() {
        let service = service();
        service.register(alice()).await.unwrap();

        let request = LoginRequest {
            username: "alice".into(),
            password: PASSWORD.into(),
        };
        let first = service.login(request.clone()).await.unwrap();
        let second = service.login(request).await.unwrap();
        assert_ne!(first, second);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        for token in [first, second] {
            let claims = service.token.decode(&token).unwrap();
            assert!(claims.exp.abs_diff(now + EXPIRATION_TIME) <= 5);
        }
    }

    #[tokio::test]
    async fn test_list_users_projections() {
        let service = service();
        assert!(service.list_users().await.unwrap().is_empty());

        for i in 0..3 {
            service
                .register(RegisterRequest {
                    username: format!("user{i}"),
                    email: format!("user{i}@x.com"),
                    password: PASSWORD.into(),
                })
                .await
                .unwrap();
        }

        let views = service.list_users().await.unwrap();
        assert_eq!(views.len(), 3);
        for (i, view) in views.iter().enumerate() {
            assert_eq!(view.username, format!("user{i}"));
            assert_eq!(view.email, format!("user{i}@x.com"));
        }
    }

    #[tokio::test]
    async fn test_get_user() {
        let service = service();
        service.register(alice()).await.unwrap();

        let view = service.get_user("alice").await.unwrap();
        assert_eq!(
            view,
            UserView {
                username: "alice".into(),
                email: "alice@x.com".into(),
            }
        );

        let err = service.get_user("bob").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "user with username 'bob' does not exist"
        );
    }
}
