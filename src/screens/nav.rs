use serde::Serialize;
use utoipa::ToSchema;

use super::Screens;
use crate::{
    roles::{NavRole, resolve_role},
    store::DataService,
    view::{Notice, Redirect, Route},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NavLink {
    #[schema(value_type = String)]
    pub label: &'static str,
    #[schema(value_type = String)]
    pub to: Route,
}

pub const WELCOME_BACK: &str = "Welcome back!";

fn link(label: &'static str, to: Route) -> NavLink {
    NavLink { label, to }
}

/// The navbar. Built from the role claim alone, so it never shows admin.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NavView {
    pub role: NavRole,
    pub name: Option<String>,
    pub links: Vec<NavLink>,
}

pub fn nav_links(role: NavRole) -> Vec<NavLink> {
    let mut links = vec![link("Meals", Route::Meals), link("Chefs", Route::Chefs)];
    match role {
        NavRole::Anonymous => links.push(link("Login", Route::Login)),
        NavRole::Customer => {
            links.push(link("My Orders", Route::Orders));
            links.push(link("Subscriptions", Route::Subscriptions));
        }
        NavRole::Chef => {
            links.push(link("Partner Dashboard", Route::Partner));
            links.push(link("My Orders", Route::Orders));
            links.push(link("Subscriptions", Route::Subscriptions));
        }
    }
    links
}

impl<S: DataService> Screens<'_, S> {
    pub fn nav(&self) -> NavView {
        let identity = self.identity();
        let role = resolve_role(identity.as_ref());
        NavView {
            role,
            name: identity.map(|i| i.name),
            links: nav_links(role),
        }
    }

    /// Where a fresh sign-in lands: the remembered destination, once, and home otherwise.
    pub fn after_sign_in(&self) -> Redirect {
        let to = self.session().take_redirect().unwrap_or(Route::Home);
        Redirect::with_notice(to, Notice::success(WELCOME_BACK))
    }

    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&self) -> Redirect {
        match self.session().sign_out().await {
            Ok(()) => Redirect::with_notice(Route::Home, Notice::success("Logged out successfully")),
            Err(err) => {
                tracing::warn!(error = %err, "sign out failed");
                Redirect::with_notice(Route::Home, Notice::failure(&err, "Failed to log out"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_follow_the_claimed_role() {
        let labels = |role| nav_links(role).into_iter().map(|l| l.label).collect::<Vec<_>>();
        assert!(labels(NavRole::Anonymous).contains(&"Login"));
        assert!(labels(NavRole::Chef).contains(&"Partner Dashboard"));
        assert!(!labels(NavRole::Customer).contains(&"Partner Dashboard"));
    }
}
