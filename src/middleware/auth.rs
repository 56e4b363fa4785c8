use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header};

use crate::{
    auth::PasswordAuth,
    error::AppError,
    models::Identity,
    session::SessionStore,
    state::AppState,
};

/// The per-request session: anonymous without a bearer token, otherwise the
/// token's identity with a provider behind it for sign-out and refresh.
pub struct Viewer {
    pub session: SessionStore,
    pub provider: Option<Arc<PasswordAuth>>,
}

impl Viewer {
    pub fn identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    /// The provider of a signed-in viewer, or `Unauthorized`.
    pub fn signed_in(&self) -> Result<&Arc<PasswordAuth>, AppError> {
        self.provider.as_ref().ok_or(AppError::Unauthorized)
    }
}

fn bearer_token(parts: &axum::http::request::Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::validation("Invalid Authorization header"))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::validation("Invalid Authorization scheme"))?
        .trim();
    Ok(Some(token))
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(Viewer {
                session: SessionStore::with_identity(None),
                provider: None,
            });
        };

        let provider = Arc::new(PasswordAuth::restore(
            state.pool.clone(),
            state.issuer.clone(),
            token,
        )?);
        let session = SessionStore::start(Arc::clone(&provider)).await;
        Ok(Viewer {
            session,
            provider: Some(provider),
        })
    }
}
