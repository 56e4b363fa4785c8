use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::screens::RedirectBody;
use crate::{
    auth::{Session, SignUp},
    models::Identity,
    view::Route,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub become_chef: bool,
}

impl From<RegisterRequest> for SignUp {
    fn from(req: RegisterRequest) -> Self {
        SignUp {
            email: req.email,
            password: req.password,
            name: req.name,
            become_chef: req.become_chef,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// The `next` route from the login redirect that sent the visitor here.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "/orders")]
    pub next: Option<Route>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
    /// Where to go now. Only set by login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectBody>,
}

impl SessionResponse {
    pub fn landing_on(self, redirect: RedirectBody) -> Self {
        Self {
            redirect: Some(redirect),
            ..self
        }
    }
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.access_token,
            expires_at: session.expires_at,
            identity: session.identity,
            redirect: None,
        }
    }
}
