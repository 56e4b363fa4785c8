use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, OrderStatus};

/// The chef's share of every delivered order. The rest is platform commission.
pub const CHEF_SHARE: f64 = 0.85;

pub fn chef_earnings(revenue: f64) -> f64 {
    revenue * CHEF_SHARE
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EarningsDay {
    pub date: NaiveDate,
    pub orders: usize,
    pub revenue: f64,
    pub earnings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EarningsReport {
    /// Newest date first.
    pub days: Vec<EarningsDay>,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub total_earnings: f64,
    /// Chef earnings per delivered order; zero with no deliveries.
    pub average_per_order: f64,
}

/// Group delivered orders by the local calendar date of `created_at`.
///
/// Orders in any other status are ignored entirely.
pub fn earnings_by_date(orders: &[Order], offset: FixedOffset) -> EarningsReport {
    let mut by_date: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.status == OrderStatus::Delivered) {
        let date = order.created_at.with_timezone(&offset).date_naive();
        let entry = by_date.entry(date).or_default();
        entry.0 += 1;
        entry.1 += order.total_price;
    }

    let days: Vec<EarningsDay> = by_date
        .into_iter()
        .rev()
        .map(|(date, (orders, revenue))| EarningsDay {
            date,
            orders,
            revenue,
            earnings: chef_earnings(revenue),
        })
        .collect();

    let total_orders: usize = days.iter().map(|d| d.orders).sum();
    let total_earnings: f64 = days.iter().map(|d| d.earnings).sum();
    let average_per_order = if total_orders == 0 {
        0.0
    } else {
        total_earnings / total_orders as f64
    };
    EarningsReport {
        total_orders,
        total_revenue: days.iter().map(|d| d.revenue).sum(),
        total_earnings,
        average_per_order,
        days,
    }
}
