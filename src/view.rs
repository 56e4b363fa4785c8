//! Navigation targets, user-visible notices and the mount lifecycle every screen shares.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, ErrorKind},
    ids::{ChefId, MealId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Meals,
    MealDetail(MealId),
    Chefs,
    ChefProfile(ChefId),
    Orders,
    Subscriptions,
    Partner,
    Admin,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Meals => "/meals".to_string(),
            Route::MealDetail(id) => format!("/meals/{id}"),
            Route::Chefs => "/chefs".to_string(),
            Route::ChefProfile(id) => format!("/chefs/{id}"),
            Route::Orders => "/orders".to_string(),
            Route::Subscriptions => "/subscriptions".to_string(),
            Route::Partner => "/partner".to_string(),
            Route::Admin => "/admin".to_string(),
        }
    }

    /// The route a path names, if any. Unknown paths and malformed ids give `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim().trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            [""] => Route::Home,
            ["login"] => Route::Login,
            ["meals"] => Route::Meals,
            ["meals", id] => Route::MealDetail(MealId::from_uuid(Uuid::parse_str(id).ok()?)),
            ["chefs"] => Route::Chefs,
            ["chefs", id] => Route::ChefProfile(ChefId::from_uuid(Uuid::parse_str(id).ok()?)),
            ["orders"] => Route::Orders,
            ["subscriptions"] => Route::Subscriptions,
            ["partner"] => Route::Partner,
            ["admin"] => Route::Admin,
            _ => return None,
        };
        Some(route)
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Route::parse(&path)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown route `{path}`")))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient toast-style message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// The notice shown when an action fails: validation and authorization
    /// messages are shown as-is, everything else gets `fallback`.
    pub fn failure(err: &AppError, fallback: &str) -> Self {
        match err.kind() {
            ErrorKind::Validation | ErrorKind::Authorization => Self::error(err.to_string()),
            ErrorKind::NotFound | ErrorKind::Transport => Self::error(fallback),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Redirect {
    #[schema(value_type = String, example = "/login")]
    pub to: Route,
    pub notice: Option<Notice>,
}

impl Redirect {
    pub fn to(route: Route) -> Self {
        Self {
            to: route,
            notice: None,
        }
    }

    pub fn with_notice(route: Route, notice: Notice) -> Self {
        Self {
            to: route,
            notice: Some(notice),
        }
    }
}

/// What mounting a screen produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen<T> {
    Ready(T),
    Redirect(Redirect),
}

impl<T> Screen<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Screen::Ready(view) => Some(view),
            Screen::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Screen::Ready(_) => None,
            Screen::Redirect(redirect) => Some(redirect),
        }
    }
}

/// Tracks whether a mounted screen is still on display.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    mounted: Arc<AtomicBool>,
}

impl ScreenScope {
    pub fn mount() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn state<T>(&self) -> ScreenState<T> {
        ScreenState {
            scope: self.clone(),
            value: Arc::new(Mutex::new(None)),
        }
    }
}

/// A screen's last-good view model. Writes after unmount are dropped.
#[derive(Debug)]
pub struct ScreenState<T> {
    scope: ScreenScope,
    value: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for ScreenState<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: Clone> ScreenState<T> {
    /// Store `value` if the screen is still mounted. Returns whether it was stored.
    pub fn commit(&self, value: T) -> bool {
        if !self.scope.is_mounted() {
            tracing::debug!("screen unmounted, dropping late result");
            return false;
        }
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        true
    }

    pub fn get(&self) -> Option<T> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
