use serde::Serialize;
use utoipa::ToSchema;

use super::earnings::chef_earnings;
use crate::{
    error::AppResult,
    ids::UserId,
    models::{Chef, Meal, Order, OrderStatus, VerificationStatus},
    store::{DataService, Query},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminStats {
    pub total_chefs: u64,
    pub pending_chefs: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct PartnerStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub active_dishes: u64,
    pub total_earnings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CustomerSummary {
    pub total_orders: usize,
    /// One entry per status, in lifecycle order.
    pub by_status: Vec<StatusCount>,
    pub total_spent: f64,
}

/// Four count-only queries, issued together.
pub async fn admin_counts<S: DataService>(store: &S) -> AppResult<AdminStats> {
    let (total_chefs, pending_chefs, total_orders, pending_orders) = tokio::try_join!(
        store.count(Query::<Chef>::new()),
        store.count(Query::<Chef>::new().eq("verification_status", VerificationStatus::Pending)),
        store.count(Query::<Order>::new()),
        store.count(Query::<Order>::new().eq("status", OrderStatus::Pending)),
    )
    .inspect_err(|err| tracing::error!(error = %err, "admin counts failed"))?;

    Ok(AdminStats {
        total_chefs,
        pending_chefs,
        total_orders,
        pending_orders,
    })
}

/// Counts for a chef's back office plus what they have earned so far.
pub async fn partner_stats<S: DataService>(store: &S, chef: UserId) -> AppResult<PartnerStats> {
    let (total_orders, pending_orders, active_dishes, delivered) = tokio::try_join!(
        store.count(Query::<Order>::new().eq("chef_id", chef)),
        store.count(
            Query::<Order>::new()
                .eq("chef_id", chef)
                .eq("status", OrderStatus::Pending)
        ),
        store.count(Query::<Meal>::new().eq("chef_id", chef).eq("available", true)),
        store.select(
            Query::<Order>::new()
                .eq("chef_id", chef)
                .eq("status", OrderStatus::Delivered)
        ),
    )
    .inspect_err(|err| tracing::error!(%chef, error = %err, "partner stats failed"))?;

    Ok(PartnerStats {
        total_orders,
        pending_orders,
        active_dishes,
        total_earnings: chef_earnings(delivered.iter().map(|o| o.total_price).sum()),
    })
}

/// Order counts per status and what the customer actually spent.
pub fn customer_summary(orders: &[Order]) -> CustomerSummary {
    let by_status = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: orders.iter().filter(|o| o.status == status).count(),
        })
        .collect();
    let total_spent = orders
        .iter()
        .filter(|o| !matches!(o.status, OrderStatus::Cancelled | OrderStatus::Rejected))
        .map(|o| o.total_price)
        .sum();

    CustomerSummary {
        total_orders: orders.len(),
        by_status,
        total_spent,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        ids::{MealId, OrderId},
        store::{MemoryStore, Table},
    };

    fn order(chef: UserId, total: f64, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(),
            meal_id: MealId::new(),
            customer_id: UserId::new(),
            chef_id: chef,
            quantity: 1,
            total_price: total,
            status,
            delivery_partner_id: None,
            delivery_instructions: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn admin_counts_are_four_separate_queries() {
        let store = MemoryStore::new();
        store.seed(&Chef::pending_for(UserId::new())).unwrap();
        store
            .seed(&Chef {
                verification_status: VerificationStatus::Approved,
                ..Chef::pending_for(UserId::new())
            })
            .unwrap();
        let chef = UserId::new();
        store.seed(&order(chef, 100.0, OrderStatus::Pending)).unwrap();
        store.seed(&order(chef, 100.0, OrderStatus::Delivered)).unwrap();
        store.seed(&order(chef, 100.0, OrderStatus::Delivered)).unwrap();

        let before = store.requests(Table::Chefs) + store.requests(Table::Orders);
        let stats = admin_counts(&store).await.unwrap();
        let after = store.requests(Table::Chefs) + store.requests(Table::Orders);

        assert_eq!(
            stats,
            AdminStats {
                total_chefs: 2,
                pending_chefs: 1,
                total_orders: 3,
                pending_orders: 1,
            }
        );
        assert_eq!(after - before, 4);
    }

    #[tokio::test]
    async fn admin_counts_fail_as_a_whole() {
        let store = MemoryStore::new();
        store.fail_table(Table::Orders).unwrap();
        assert!(admin_counts(&store).await.is_err());
    }

    #[tokio::test]
    async fn partner_earnings_only_count_delivered_orders() {
        let store = MemoryStore::new();
        let chef = UserId::new();
        store.seed(&order(chef, 200.0, OrderStatus::Delivered)).unwrap();
        store.seed(&order(chef, 500.0, OrderStatus::Pending)).unwrap();
        store.seed(&order(UserId::new(), 900.0, OrderStatus::Delivered)).unwrap();

        let stats = partner_stats(&store, chef).await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.active_dishes, 0);
        assert!((stats.total_earnings - 170.0).abs() < 1e-9);
    }

    #[test]
    fn customer_spend_skips_cancelled_and_rejected() {
        let chef = UserId::new();
        let orders = [
            order(chef, 100.0, OrderStatus::Delivered),
            order(chef, 50.0, OrderStatus::Pending),
            order(chef, 70.0, OrderStatus::Cancelled),
            order(chef, 30.0, OrderStatus::Rejected),
        ];
        let summary = customer_summary(&orders);
        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.total_spent, 150.0);
        let pending = summary
            .by_status
            .iter()
            .find(|s| s.status == OrderStatus::Pending)
            .unwrap();
        assert_eq!(pending.count, 1);
        assert_eq!(summary.by_status.len(), OrderStatus::ALL.len());
    }
}
