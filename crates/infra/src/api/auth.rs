//! Access tokens for the attendance API

use async_trait::async_trait;
use parking_lot::RwLock;
use timeclock_domain::SubmissionError;

/// Trait for providing access tokens
///
/// Login and refresh live outside this crate; the API client only asks for
/// the current token before each request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current bearer token, or `None` to send the request unauthenticated
    async fn access_token(&self) -> Result<Option<String>, SubmissionError>;
}

/// Token held in memory and replaced by the session layer on login/logout.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|token| !token.trim().is_empty())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<Option<String>, SubmissionError> {
        Ok(self.token.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_tokens_are_ignored() {
        let provider = StaticTokenProvider::new(Some("  ".into()));
        assert_eq!(provider.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_can_be_replaced_and_cleared() {
        let provider = StaticTokenProvider::new(None);
        provider.set_token("abc");
        assert_eq!(provider.access_token().await.unwrap().as_deref(), Some("abc"));

        provider.clear();
        assert_eq!(provider.access_token().await.unwrap(), None);
    }
}
