use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, after_action, settle};
use crate::{
    fetchers::SubscriptionLine,
    ids::SubscriptionId,
    models::SubscriptionStatus,
    store::DataService,
    view::{Notice, Route, Screen, ScreenState},
};

pub const SIGN_IN_FOR_SUBSCRIPTIONS: &str = "Please sign in to view your subscriptions";

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SubscriptionsView {
    pub subscriptions: Vec<SubscriptionLine>,
    pub notice: Option<Notice>,
}

super::impl_view!(SubscriptionsView);

fn changed_message(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "Subscription resumed",
        SubscriptionStatus::Paused => "Subscription paused",
        SubscriptionStatus::Cancelled => "Subscription cancelled",
        SubscriptionStatus::Completed => "Subscription completed",
    }
}

impl<S: DataService> Screens<'_, S> {
    #[tracing::instrument(skip_all, name = "screen.subscriptions")]
    pub async fn subscriptions(&self, state: &ScreenState<SubscriptionsView>) -> Screen<SubscriptionsView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::Subscriptions, SIGN_IN_FOR_SUBSCRIPTIONS));
        };
        let loaded = self
            .fetch()
            .customer_subscriptions(identity.id)
            .await
            .map(|subscriptions| SubscriptionsView {
                subscriptions,
                notice: None,
            });
        settle(state, loaded, "Failed to load subscriptions")
    }

    /// Pause, resume or cancel a plan.
    #[tracing::instrument(skip(self, state))]
    pub async fn change_subscription(
        &self,
        state: &ScreenState<SubscriptionsView>,
        id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Screen<SubscriptionsView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::Subscriptions, SIGN_IN_FOR_SUBSCRIPTIONS));
        };
        let outcome = self
            .fetch()
            .set_subscription_status(identity.id, id, status)
            .await;
        after_action(
            state,
            outcome,
            changed_message(status),
            "Failed to update subscription",
            self.subscriptions(state),
        )
        .await
    }
}
