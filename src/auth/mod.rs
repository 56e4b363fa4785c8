//! The authentication provider contract and its password-backed implementation.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::{error::AppResult, models::Identity};

pub mod password;
pub mod token;

pub use password::{PasswordAuth, SignUp};
pub use token::{Claims, TokenIssuer};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    /// The identity the event leaves behind; `None` after sign-out.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                Some(&session.identity)
            }
            AuthEvent::SignedOut => None,
        }
    }
}

pub trait AuthProvider: Send + Sync + 'static {
    /// The session the provider currently holds, if any.
    fn get_session(&self) -> impl Future<Output = AppResult<Option<Session>>> + Send;

    /// A fresh receiver for sign-in, refresh and sign-out events.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;

    fn sign_out(&self) -> impl Future<Output = AppResult<()>> + Send;
}
