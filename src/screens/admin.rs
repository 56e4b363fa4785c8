use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Screens, after_action, settle};
use crate::{
    aggregate::{AdminStats, admin_counts},
    error::{AppError, AppResult},
    fetchers::{ChefRow, OrderLine},
    ids::{ChefId, OrderId},
    models::{Actor, OrderStatus, VerificationStatus},
    roles::AdminGrant,
    store::DataService,
    view::{Notice, Screen, ScreenState},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AdminView {
    pub stats: AdminStats,
    pub chefs: Vec<ChefRow>,
    pub orders: Vec<OrderLine>,
    pub notice: Option<Notice>,
}

super::impl_view!(AdminView);

/// Narrows the admin lists. Stats always cover everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AdminFilter {
    pub order_status: Option<OrderStatus>,
    pub chef_status: Option<VerificationStatus>,
}

impl AdminFilter {
    pub fn apply(&self, mut view: AdminView) -> AdminView {
        if let Some(status) = self.order_status {
            view.orders.retain(|line| line.order.status == status);
        }
        if let Some(status) = self.chef_status {
            view.chefs.retain(|row| row.chef.verification_status == status);
        }
        view
    }
}

impl<S: DataService> Screens<'_, S> {
    async fn admin_gate(&self) -> Result<AdminGrant, Screen<AdminView>> {
        self.roles()
            .require_admin(self.identity().as_ref())
            .await
            .map_err(Screen::Redirect)
    }

    async fn load_admin(&self) -> AppResult<AdminView> {
        let fetch = self.fetch();
        let (stats, chefs, orders) = tokio::join!(
            admin_counts(fetch.store()),
            fetch.all_chefs(),
            fetch.all_orders(),
        );
        Ok(AdminView {
            stats: stats?,
            chefs: chefs?,
            orders: orders?,
            notice: None,
        })
    }

    /// Only a `user_roles` admin row gets past the gate; the role claim is ignored.
    #[tracing::instrument(skip(self, state), name = "screen.admin")]
    pub async fn admin(&self, state: &ScreenState<AdminView>, filter: AdminFilter) -> Screen<AdminView> {
        if let Err(screen) = self.admin_gate().await {
            return screen;
        }
        let loaded = self.load_admin().await.map(|view| filter.apply(view));
        settle(state, loaded, "Failed to load admin dashboard")
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn verify_chef(
        &self,
        state: &ScreenState<AdminView>,
        chef: ChefId,
        status: VerificationStatus,
    ) -> Screen<AdminView> {
        if let Err(screen) = self.admin_gate().await {
            return screen;
        }
        let outcome = self.fetch().set_verification(chef, status).await;
        let success = format!("Chef {}", status.as_str());
        let reload = self.admin(state, AdminFilter::default());
        after_action(state, outcome, success, "Failed to update status", reload).await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn toggle_featured(&self, state: &ScreenState<AdminView>, chef: ChefId) -> Screen<AdminView> {
        if let Err(screen) = self.admin_gate().await {
            return screen;
        }
        let fetch = self.fetch();
        let outcome = match fetch.chef(chef).await {
            Ok(current) => fetch.set_featured(chef, !current.is_featured).await,
            Err(err) => Err(err),
        };
        let success = match &outcome {
            Ok(updated) if updated.is_featured => "Added to featured",
            _ => "Removed from featured",
        };
        let reload = self.admin(state, AdminFilter::default());
        after_action(state, outcome, success, "Failed to update", reload).await
    }

    /// Hand an order to a delivery partner and send it out.
    #[tracing::instrument(skip(self, state))]
    pub async fn assign_delivery(&self, state: &ScreenState<AdminView>, order: OrderId, partner: &str) -> Screen<AdminView> {
        if let Err(screen) = self.admin_gate().await {
            return screen;
        }
        let outcome = if partner.trim().is_empty() {
            Err(AppError::validation("Please enter a delivery partner ID"))
        } else {
            self.fetch().assign_delivery(order, partner).await
        };
        after_action(
            state,
            outcome,
            "Delivery partner assigned",
            "Failed to assign delivery",
            self.admin(state, AdminFilter::default()),
        )
        .await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn admin_cancel_order(&self, state: &ScreenState<AdminView>, order: OrderId) -> Screen<AdminView> {
        let grant = match self.admin_gate().await {
            Ok(grant) => grant,
            Err(screen) => return screen,
        };
        let outcome = self
            .fetch()
            .transition_order(order, OrderStatus::Cancelled, Actor::Admin, grant.user_id())
            .await;
        let reload = self.admin(state, AdminFilter::default());
        after_action(state, outcome, "Order cancelled", "Failed to cancel order", reload).await
    }
}
