use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Session;
use crate::{
    error::{AppError, AppResult},
    ids::UserId,
    models::{Identity, Role},
};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Denormalized role copied from the user's metadata at sign-in.
    pub role: Option<String>,
    pub exp: usize,
}

pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Signs and checks HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    /// Lifetimes chrono can't represent fall back to [`DEFAULT_TTL_HOURS`].
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        let ttl = Duration::try_hours(ttl_hours).unwrap_or_else(|| {
            tracing::warn!(ttl_hours, "session lifetime out of range, using the default");
            Duration::hours(DEFAULT_TTL_HOURS)
        });
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> AppResult<Session> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role_claim.map(|role| role.as_str().to_string()),
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

        Ok(Session {
            access_token: token,
            identity: identity.clone(),
            expires_at,
        })
    }

    /// Decode a token back into the session it was issued for.
    /// Bad signatures and expired tokens are both [`AppError::Unauthorized`].
    pub fn verify(&self, token: &str) -> AppResult<Session> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            AppError::Unauthorized
        })?;
        let claims = decoded.claims;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or(AppError::Unauthorized)?;

        Ok(Session {
            access_token: token.to_string(),
            identity: Identity {
                id: UserId::from_uuid(id),
                email: claims.email,
                name: claims.name,
                role_claim: claims.role.as_deref().and_then(Role::parse),
            },
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Option<Role>) -> Identity {
        Identity {
            id: UserId::new(),
            email: "asha@example.com".into(),
            name: "Asha".into(),
            role_claim: role,
        }
    }

    #[test]
    fn issued_tokens_verify_to_the_same_identity() {
        let issuer = TokenIssuer::new("test-secret", 1);
        let who = identity(Some(Role::Chef));
        let session = issuer.issue(&who).unwrap();

        let restored = issuer.verify(&session.access_token).unwrap();
        assert_eq!(restored.identity, who);
        assert_eq!(restored.expires_at.timestamp(), session.expires_at.timestamp());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let session = TokenIssuer::new("one", 1).issue(&identity(None)).unwrap();
        let err = TokenIssuer::new("two", 1)
            .verify(&session.access_token)
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let session = TokenIssuer::new("secret", -2).issue(&identity(None)).unwrap();
        let err = TokenIssuer::new("secret", 1)
            .verify(&session.access_token)
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn unrepresentable_lifetimes_use_the_default() {
        let issuer = TokenIssuer::new("secret", i64::MAX);
        assert_eq!(issuer.ttl, Duration::hours(DEFAULT_TTL_HOURS));

        let session = issuer.issue(&identity(None)).unwrap();
        let left = session.expires_at - Utc::now();
        assert!(left > Duration::hours(DEFAULT_TTL_HOURS - 1));
        assert!(left <= Duration::hours(DEFAULT_TTL_HOURS));
    }
}
