//! Authentication hook: turning a bearer credential into a [`UserId`].
//!
//! Stagematch doesn't issue or verify credentials itself. Whatever does
//! (a JWT verifier, a session table, an auth service) implements
//! [`Authenticator`], and the request handler calls it before anything
//! reaches a room. Rooms only ever see `UserId`s.

use std::collections::HashMap;
use std::future::Future;

use stagematch_protocol::UserId;

/// Why a credential was rejected.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("authentication failed: missing token")]
    MissingToken,

    /// The credential is not recognized.
    #[error("authentication failed: unknown token")]
    UnknownToken,

    /// The authenticator itself failed (expired key set, unreachable
    /// service, ...).
    #[error("authentication failed: {0}")]
    Rejected(String),
}

/// Validates a bearer token and returns the user it belongs to.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// request for the lifetime of the engine.
///
/// # Example
///
/// ```rust
/// use stagematch::{AuthError, Authenticator};
/// use stagematch_protocol::UserId;
///
/// /// Treats the token as the user id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
///         token.parse().map(UserId).map_err(|_| AuthError::UnknownToken)
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, token: &str) -> impl Future<Output = Result<UserId, AuthError>> + Send;
}

/// A fixed token → user map.
///
/// Accepts tokens with or without a `Bearer ` prefix.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, UserId>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token for `user`.
    pub fn with(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl FromIterator<(String, UserId)> for TokenTable {
    fn from_iter<I: IntoIterator<Item = (String, UserId)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl Authenticator for TokenTable {
    async fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens.get(token).copied().ok_or(AuthError::UnknownToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TokenTable {
        TokenTable::new().with("alice-token", UserId(1)).with("bob-token", UserId(2))
    }

    #[tokio::test]
    async fn test_known_token() {
        assert_eq!(table().authenticate("alice-token").await.unwrap(), UserId(1));
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_stripped() {
        assert_eq!(table().authenticate("Bearer bob-token").await.unwrap(), UserId(2));
    }

    #[tokio::test]
    async fn test_missing_token() {
        assert!(matches!(table().authenticate("").await, Err(AuthError::MissingToken)));
        assert!(matches!(table().authenticate("Bearer  ").await, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        assert!(matches!(table().authenticate("mallory").await, Err(AuthError::UnknownToken)));
    }

    #[tokio::test]
    async fn test_from_iterator() {
        let table: TokenTable = vec![("t".to_string(), UserId(9))].into_iter().collect();
        assert_eq!(table.authenticate("t").await.unwrap(), UserId(9));
    }
}
