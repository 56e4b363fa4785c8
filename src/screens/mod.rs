//! Screen view models: mount, gate, fetch, aggregate.
//!
//! Every screen follows the same shape. Mounting reads the session, applies
//! its role gate (possibly producing a [`Redirect`]), loads its data and
//! commits the result into a [`ScreenState`]. A failed load keeps whatever
//! the state last held and attaches an error [`Notice`]. Actions perform one
//! mutation and then mount the screen again so the view reflects the store.

use std::future::Future;

use chrono::{FixedOffset, Offset, Utc};

use crate::{
    error::{AppError, AppResult},
    fetchers::Fetch,
    models::Identity,
    roles::RoleResolver,
    session::SessionStore,
    store::DataService,
    view::{Notice, Redirect, Route, Screen, ScreenState},
};

pub mod admin;
pub mod chef_profile;
pub mod chefs;
pub mod home;
pub mod meal_detail;
pub mod meals;
pub mod nav;
pub mod orders;
pub mod partner;
pub mod subscriptions;

pub use admin::{AdminFilter, AdminView};
pub use chef_profile::ChefProfileView;
pub use chefs::ChefsView;
pub use home::HomeView;
pub use meal_detail::MealDetailView;
pub use meals::MealsView;
pub use nav::{NavLink, NavView};
pub use orders::{OrderRow, OrdersView};
pub use partner::PartnerView;
pub use subscriptions::SubscriptionsView;

/// A view model that can carry a transient notice.
pub trait View: Clone + Default + Send + Sync {
    fn notice_mut(&mut self) -> &mut Option<Notice>;

    fn with_notice(mut self, notice: Notice) -> Self {
        *self.notice_mut() = Some(notice);
        self
    }
}

macro_rules! impl_view {
    ($($view:ty),* $(,)?) => {
        $(
            impl $crate::screens::View for $view {
                fn notice_mut(&mut self) -> &mut Option<$crate::view::Notice> {
                    &mut self.notice
                }
            }
        )*
    };
}
pub(crate) use impl_view;

/// Everything a screen needs from its surroundings.
pub struct Screens<'a, S> {
    fetch: Fetch<'a, S>,
    session: &'a SessionStore,
    offset: FixedOffset,
}

impl<'a, S: DataService> Screens<'a, S> {
    pub fn new(fetch: Fetch<'a, S>, session: &'a SessionStore) -> Self {
        Self {
            fetch,
            session,
            offset: Utc.fix(),
        }
    }

    /// The zone whose calendar dates earnings are grouped by.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn fetch(&self) -> Fetch<'a, S> {
        self.fetch
    }

    pub fn session(&self) -> &'a SessionStore {
        self.session
    }

    fn identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    fn roles(&self) -> RoleResolver<'a, S> {
        RoleResolver::new(self.fetch.store())
    }

    /// Send an anonymous visitor to login, remembering where they were going.
    fn login_first(&self, from: Route, message: &str) -> Redirect {
        self.session.remember_redirect(from);
        Redirect::with_notice(Route::Login, Notice::error(message))
    }
}

/// Commit a load result, keeping the last-good view when it failed.
pub(crate) fn settle<V: View>(state: &ScreenState<V>, loaded: AppResult<V>, failure: &str) -> Screen<V> {
    let view = match loaded {
        Ok(view) => view,
        Err(err) => {
            tracing::error!(error = %err, kind = ?err.kind(), "{failure}");
            state
                .get()
                .unwrap_or_default()
                .with_notice(Notice::failure(&err, failure))
        }
    };
    state.commit(view.clone());
    Screen::Ready(view)
}

/// Finish an action: on success re-mount via `reload` and attach `success`,
/// on failure keep the last-good view and explain what went wrong.
pub(crate) async fn after_action<V, T, F>(
    state: &ScreenState<V>,
    outcome: AppResult<T>,
    success: impl Into<String>,
    failure: &str,
    reload: F,
) -> Screen<V>
where
    V: View,
    F: Future<Output = Screen<V>>,
{
    match outcome {
        Ok(_) => match reload.await {
            Screen::Ready(view) => {
                let view = view.with_notice(Notice::success(success));
                state.commit(view.clone());
                Screen::Ready(view)
            }
            redirect => redirect,
        },
        Err(err) => stay_with_failure(state, &err, failure),
    }
}

/// Keep the last-good view and explain why the action did not happen.
pub(crate) fn stay_with_failure<V: View>(state: &ScreenState<V>, err: &AppError, failure: &str) -> Screen<V> {
    tracing::warn!(error = %err, kind = ?err.kind(), "{failure}");
    let view = state
        .get()
        .unwrap_or_default()
        .with_notice(Notice::failure(err, failure));
    state.commit(view.clone());
    Screen::Ready(view)
}
