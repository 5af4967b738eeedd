use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{CurrentUser, Credentials, IdentityError, IdentityProvider};

/// Session-token to user map held in process.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    sessions: RwLock<HashMap<String, CurrentUser>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// User signed in through `identity.dev_token`.
    pub fn dev_user() -> CurrentUser {
        CurrentUser {
            id: "dev-user".to_string(),
            account_id: "dev-account".to_string(),
            full_name: "Developer".to_string(),
            email: "dev@storeit.local".to_string(),
            avatar: None,
        }
    }

    pub fn insert(&self, token: impl Into<String>, user: CurrentUser) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
    }

    pub fn revoke(&self, token: &str) -> Option<CurrentUser> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn current_user(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<CurrentUser>, IdentityError> {
        let Some(token) = credentials.session_token.as_deref() else {
            return Ok(None);
        };
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_and_revoke() {
        let provider = MemoryIdentity::new();
        provider.insert("tok", MemoryIdentity::dev_user());

        let creds = Credentials {
            session_token: Some("tok".to_string()),
        };
        assert_eq!(
            provider.current_user(&creds).await.unwrap(),
            Some(MemoryIdentity::dev_user())
        );

        provider.revoke("tok");
        assert_eq!(provider.current_user(&creds).await.unwrap(), None);
    }
}
