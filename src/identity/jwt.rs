use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use super::{CurrentUser, Credentials, IdentityError, IdentityProvider};

/// Claims carried by a StoreIt session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: String, // User ID (Subject)
    pub account_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub exp: usize, // Expiration time (UNIX timestamp)
}

impl From<UserClaims> for CurrentUser {
    fn from(claims: UserClaims) -> Self {
        Self {
            id: claims.sub,
            account_id: claims.account_id,
            full_name: claims.name,
            email: claims.email,
            avatar: claims.avatar,
        }
    }
}

/// Verifies HS256 session tokens locally.
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentity").finish_non_exhaustive()
    }
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Result<Self, IdentityError> {
        if secret.is_empty() {
            return Err(IdentityError::Config(
                "identity.jwt_secret must be set for the jwt provider".to_string(),
            ));
        }
        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn current_user(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<CurrentUser>, IdentityError> {
        let Some(token) = credentials.session_token.as_deref() else {
            return Ok(None);
        };

        match decode::<UserClaims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(Some(data.claims.into())),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, exp: usize) -> String {
        let claims = UserClaims {
            sub: "user-1".to_string(),
            account_id: "acct-1".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            avatar: None,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let provider = JwtIdentity::new("s3cret").unwrap();
        let creds = Credentials {
            session_token: Some(token("s3cret", far_future())),
        };

        let user = provider.current_user(&creds).await.unwrap().unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.account_id, "acct-1");
        assert_eq!(user.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_bad_signature_and_expiry_mean_no_user() {
        let provider = JwtIdentity::new("s3cret").unwrap();

        let forged = Credentials {
            session_token: Some(token("other", far_future())),
        };
        assert!(provider.current_user(&forged).await.unwrap().is_none());

        let expired = Credentials {
            session_token: Some(token("s3cret", 1_000)),
        };
        assert!(provider.current_user(&expired).await.unwrap().is_none());

        assert!(
            provider
                .current_user(&Credentials::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            JwtIdentity::new(""),
            Err(IdentityError::Config(_))
        ));
    }
}
