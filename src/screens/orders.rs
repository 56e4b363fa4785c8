use std::collections::HashSet;

use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, after_action, settle};
use crate::{
    aggregate::{CustomerSummary, customer_summary},
    error::AppResult,
    fetchers::{OrderLine, ReviewDraft},
    ids::{OrderId, UserId},
    models::{Actor, OrderStatus},
    store::DataService,
    view::{Notice, Route, Screen, ScreenState},
};

pub const SIGN_IN_FOR_ORDERS: &str = "Please sign in to view your orders";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderRow {
    #[serde(flatten)]
    pub line: OrderLine,
    pub reviewed: bool,
    pub can_review: bool,
    pub can_cancel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct OrdersView {
    pub orders: Vec<OrderRow>,
    pub summary: CustomerSummary,
    pub notice: Option<Notice>,
}

super::impl_view!(OrdersView);

impl<S: DataService> Screens<'_, S> {
    async fn load_orders(&self, customer: UserId) -> AppResult<OrdersView> {
        let fetch = self.fetch();
        let (lines, reviews) = tokio::join!(
            fetch.customer_orders(customer),
            fetch.customer_reviews(customer),
        );
        let lines = lines?;
        let reviewed: HashSet<OrderId> = reviews
            .inspect_err(|err| tracing::warn!(error = %err, "reviews unavailable"))
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.order_id)
            .collect();

        let orders: Vec<_> = lines.iter().map(|l| l.order.clone()).collect();
        Ok(OrdersView {
            summary: customer_summary(&orders),
            orders: lines
                .into_iter()
                .map(|line| {
                    let done = reviewed.contains(&line.order.id);
                    OrderRow {
                        reviewed: done,
                        can_review: !done && line.order.status == OrderStatus::Delivered,
                        can_cancel: line
                            .order
                            .status
                            .allows(OrderStatus::Cancelled, Actor::Customer),
                        line,
                    }
                })
                .collect(),
            notice: None,
        })
    }

    #[tracing::instrument(skip_all, name = "screen.orders")]
    pub async fn orders(&self, state: &ScreenState<OrdersView>) -> Screen<OrdersView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::Orders, SIGN_IN_FOR_ORDERS));
        };
        let loaded = self.load_orders(identity.id).await;
        settle(state, loaded, "Failed to load orders")
    }

    #[tracing::instrument(skip(self, state, draft))]
    pub async fn review_order(
        &self,
        state: &ScreenState<OrdersView>,
        order: OrderId,
        draft: ReviewDraft,
    ) -> Screen<OrdersView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::Orders, SIGN_IN_FOR_ORDERS));
        };
        let outcome = self.fetch().submit_review(identity.id, order, draft).await;
        after_action(
            state,
            outcome,
            "Review submitted successfully!",
            "Failed to submit review",
            self.orders(state),
        )
        .await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn cancel_order(&self, state: &ScreenState<OrdersView>, order: OrderId) -> Screen<OrdersView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::Orders, SIGN_IN_FOR_ORDERS));
        };
        let outcome = self
            .fetch()
            .transition_order(order, OrderStatus::Cancelled, Actor::Customer, identity.id)
            .await;
        after_action(state, outcome, "Order cancelled", "Failed to cancel order", self.orders(state)).await
    }
}
