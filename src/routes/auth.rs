use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    auth::PasswordAuth,
    dto::auth::{LoginRequest, RegisterRequest, SessionResponse},
    dto::screens::RedirectBody,
    error::{AppError, AppResult},
    middleware::auth::Viewer,
    models::Role,
    response::{ApiResponse, Meta},
    screens::Screens,
    session::SessionStore,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/become-chef", post(become_chef))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Invalid sign-up details")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    let auth = PasswordAuth::new(state.pool.clone(), state.issuer.clone());
    let session = auth.sign_up(payload.into()).await?;
    let body = ApiResponse::success("Account created", SessionResponse::from(session), Some(Meta::empty()));
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, with the route to land on", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let auth = PasswordAuth::new(state.pool.clone(), state.issuer.clone());
    let session = auth
        .sign_in_with_password(&payload.email, &payload.password)
        .await?;

    let signed_in = SessionStore::with_identity(Some(session.identity.clone()));
    if let Some(next) = payload.next {
        signed_in.remember_redirect(next);
    }
    let landing = Screens::new(state.fetch(), &signed_in).after_sign_in();
    tracing::debug!(to = %landing.to, "signed in");

    Ok(Json(ApiResponse::success(
        "Signed in",
        SessionResponse::from(session).landing_on(RedirectBody::from(landing)),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Fresh token for the current session", body = ApiResponse<SessionResponse>),
        (status = 401, description = "No valid session")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh(viewer: Viewer) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let session = viewer.signed_in()?.refresh_session().await?;
    Ok(Json(ApiResponse::success(
        "Session refreshed",
        SessionResponse::from(session),
        Some(Meta::empty()),
    )))
}

/// Grant the chef role, open a pending chef profile and reissue the token
/// with the new role claim.
#[utoipa::path(
    post,
    path = "/api/auth/become-chef",
    responses(
        (status = 200, description = "Chef role granted", body = ApiResponse<SessionResponse>),
        (status = 401, description = "No valid session")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn become_chef(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let provider = viewer.signed_in()?;
    let identity = viewer.identity().ok_or(AppError::Unauthorized)?;

    let fetch = state.fetch();
    fetch.grant_role(identity.id, Role::Chef).await?;
    fetch.ensure_chef_profile(identity.id).await?;
    provider.set_role_claim(identity.id, Role::Chef).await?;
    let session = provider.refresh_session().await?;

    Ok(Json(ApiResponse::success(
        "You're now a chef partner",
        SessionResponse::from(session),
        Some(Meta::empty()),
    )))
}
