use std::sync::{PoisonError, RwLock};

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{AuthEvent, AuthProvider, Session, TokenIssuer};
use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    ids::UserId,
    models::{Identity, Role},
};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Also grant the chef role and put `chef` in the role claim.
    pub become_chef: bool,
}

/// Email/password accounts in `auth_users`, sessions as signed tokens.
///
/// One instance holds at most one session, the way a browser client does.
/// The HTTP layer builds one per request from the bearer token.
pub struct PasswordAuth {
    pool: DbPool,
    issuer: TokenIssuer,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl PasswordAuth {
    pub fn new(pool: DbPool, issuer: TokenIssuer) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pool,
            issuer,
            current: RwLock::new(None),
            events,
        }
    }

    /// A provider already holding the session `token` was issued for.
    pub fn restore(pool: DbPool, issuer: TokenIssuer, token: &str) -> AppResult<Self> {
        let session = issuer.verify(token)?;
        let auth = Self::new(pool, issuer);
        auth.replace_session(Some(session));
        Ok(auth)
    }

    fn replace_session(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn emit(&self, event: AuthEvent) {
        // No live subscribers is fine.
        let _ = self.events.send(event);
    }

    fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn sign_up(&self, input: SignUp) -> AppResult<Session> {
        let email = normalize_email(&input.email);
        let name = input.name.trim().to_string();
        if !email.contains('@') {
            return Err(AppError::validation("Please enter a valid email"));
        }
        if input.password.len() < 6 {
            return Err(AppError::validation("Password must be at least 6 characters"));
        }
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }

        let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM auth_users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if exist.is_some() {
            return Err(AppError::validation("Email is already taken"));
        }

        let role_claim = if input.become_chef {
            Role::Chef
        } else {
            Role::Customer
        };
        let password_hash = hash_password(&input.password)?;
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO auth_users (id, email, password_hash, role_claim) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role_claim.as_str())
        .execute(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO profiles (id, email, name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(email.as_str())
            .bind(name.as_str())
            .execute(&mut *tx)
            .await?;

        let mut roles = vec![Role::Customer];
        if input.become_chef {
            roles.push(Role::Chef);
        }
        for role in roles {
            sqlx::query("INSERT INTO user_roles (id, user_id, role) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(user_id = %id, role = role_claim.as_str(), "account created");

        let identity = Identity {
            id: UserId::from_uuid(id),
            email,
            name,
            role_claim: Some(role_claim),
        };
        let session = self.issuer.issue(&identity)?;
        self.replace_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = normalize_email(email);
        let row: Option<(Uuid, String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT u.id, u.email, u.password_hash, u.role_claim, p.name \
             FROM auth_users u JOIN profiles p ON p.id = u.id WHERE u.email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, email, password_hash, role_claim, name)) = row else {
            return Err(AppError::validation("Invalid email or password"));
        };

        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Err(AppError::validation("Invalid email or password"));
        }

        let identity = Identity {
            id: UserId::from_uuid(id),
            email,
            name,
            role_claim: role_claim.as_deref().and_then(Role::parse),
        };
        let session = self.issuer.issue(&identity)?;
        tracing::info!(user_id = %id, "signed in");
        self.replace_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Re-read name and role claim and issue a fresh token for the held session.
    pub async fn refresh_session(&self) -> AppResult<Session> {
        let current = self.current().ok_or(AppError::Unauthorized)?;
        let user_id = current.identity.id.as_uuid();

        let row: Option<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT u.email, u.role_claim, p.name \
             FROM auth_users u JOIN profiles p ON p.id = u.id WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((email, role_claim, name)) = row else {
            self.replace_session(None);
            self.emit(AuthEvent::SignedOut);
            return Err(AppError::Unauthorized);
        };

        let identity = Identity {
            id: current.identity.id,
            email,
            name,
            role_claim: role_claim.as_deref().and_then(Role::parse),
        };
        let session = self.issuer.issue(&identity)?;
        self.replace_session(Some(session.clone()));
        self.emit(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    /// Record the chef role claim for a user who just became a chef.
    pub async fn set_role_claim(&self, user_id: UserId, role: Role) -> AppResult<()> {
        sqlx::query("UPDATE auth_users SET role_claim = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl AuthProvider for PasswordAuth {
    async fn get_session(&self) -> AppResult<Option<Session>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if session.expires_at <= chrono::Utc::now() {
            self.replace_session(None);
            return Ok(None);
        }
        Ok(Some(session))
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.replace_session(None);
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn hashes_verify_against_the_original_password() {
        let hash = hash_password("hunter22").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"hunter22", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"hunter23", &parsed).is_err());
    }
}
