use axum::Router;

use crate::state::AppState;

pub mod actions;
pub mod auth;
pub mod doc;
pub mod health;
pub mod screens;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/screens", screens::router())
        .nest("/actions", actions::router())
}
