//! Dashboard statistics derived from fetched rows or count-only queries.
//!
//! Everything here is recomputed on demand and is a pure function of what the
//! store returns.

pub mod counts;
pub mod earnings;

pub use counts::{
    AdminStats, CustomerSummary, PartnerStats, StatusCount, admin_counts, customer_summary,
    partner_stats,
};
pub use earnings::{CHEF_SHARE, EarningsDay, EarningsReport, chef_earnings, earnings_by_date};
