//! Two role signals with a fixed rule for which one decides what.
//!
//! The role claim in the session token only picks navigation entries.
//! Access to the admin and partner back offices is decided by a `user_roles`
//! lookup on every mount, and any doubt (no row, lookup failure) denies.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    ids::UserId,
    models::{Identity, Role, RoleAssignment},
    store::{DataService, Query},
    view::{Notice, Redirect, Route},
};

pub const NO_ADMIN_ACCESS: &str = "You don't have admin access";
pub const NO_CHEF_ACCESS: &str = "You don't have chef access";
pub const SIGN_IN_REQUIRED: &str = "Please sign in to continue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavRole {
    Anonymous,
    Customer,
    Chef,
}

/// Navigation role from the claim alone. Never use this for access decisions.
pub fn resolve_role(identity: Option<&Identity>) -> NavRole {
    match identity {
        None => NavRole::Anonymous,
        Some(identity) => match identity.role_claim {
            Some(Role::Chef) => NavRole::Chef,
            Some(Role::Customer) | Some(Role::Admin) | None => NavRole::Customer,
        },
    }
}

/// Gate for screens that only need someone signed in.
pub fn require_session(identity: Option<&Identity>) -> Result<&Identity, Redirect> {
    identity.ok_or_else(|| Redirect::with_notice(Route::Login, Notice::error(SIGN_IN_REQUIRED)))
}

/// Proof that the `user_roles` table granted admin to this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGrant {
    user_id: UserId,
}

impl AdminGrant {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Proof that the `user_roles` table granted chef to this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChefGrant {
    user_id: UserId,
}

impl ChefGrant {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

pub struct RoleResolver<'a, S> {
    store: &'a S,
}

impl<'a, S: DataService> RoleResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn has_role(&self, user_id: UserId, role: Role) -> AppResult<bool> {
        let row = self
            .store
            .select_one(
                Query::<RoleAssignment>::new()
                    .eq("user_id", user_id)
                    .eq("role", role),
            )
            .await?;
        Ok(row.is_some())
    }

    async fn require(
        &self,
        identity: Option<&Identity>,
        role: Role,
        denied: &str,
    ) -> Result<UserId, Redirect> {
        let Some(identity) = identity else {
            return Err(Redirect::to(Route::Login));
        };
        match self.has_role(identity.id, role).await {
            Ok(true) => Ok(identity.id),
            Ok(false) => {
                tracing::info!(user_id = %identity.id, role = role.as_str(), "role check denied");
                Err(Redirect::with_notice(Route::Home, Notice::error(denied)))
            }
            Err(err) => {
                tracing::warn!(user_id = %identity.id, role = role.as_str(), error = %err, "role lookup failed, denying");
                Err(Redirect::with_notice(Route::Home, Notice::error(denied)))
            }
        }
    }

    pub async fn require_admin(&self, identity: Option<&Identity>) -> Result<AdminGrant, Redirect> {
        let user_id = self.require(identity, Role::Admin, NO_ADMIN_ACCESS).await?;
        Ok(AdminGrant { user_id })
    }

    pub async fn require_chef(&self, identity: Option<&Identity>) -> Result<ChefGrant, Redirect> {
        let user_id = self.require(identity, Role::Chef, NO_CHEF_ACCESS).await?;
        Ok(ChefGrant { user_id })
    }
}
