use chrono::{Duration, FixedOffset, TimeZone, Utc};
use homeplate::{
    aggregate::{CHEF_SHARE, earnings_by_date},
    fetchers::{Fetch, JoinStrategy, fallback},
    ids::{MealId, OrderId, RoleAssignmentId, UserId},
    models::{Identity, Meal, Order, OrderStatus, Profile, Role, RoleAssignment},
    roles::RoleResolver,
    store::{MemoryStore, Table},
};
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn status(index: usize) -> OrderStatus {
    OrderStatus::ALL[index % OrderStatus::ALL.len()]
}

/// Users (some without a profile row), meals owned by them and orders between them.
#[derive(Debug, Clone)]
struct Market {
    has_profile: Vec<bool>,
    meals: Vec<(usize, bool)>,
    orders: Vec<(usize, usize, u32, usize)>,
}

fn market() -> impl Strategy<Value = Market> {
    prop::collection::vec(any::<bool>(), 1..6).prop_flat_map(|has_profile| {
        let users = has_profile.len();
        let meals = prop::collection::vec((0..users, any::<bool>()), 1..6);
        (Just(has_profile), meals).prop_flat_map(move |(has_profile, meals)| {
            let orders = prop::collection::vec((0..meals.len(), 0..users, 1u32..5000, 0usize..7), 0..10);
            (Just(has_profile), Just(meals), orders).prop_map(|(has_profile, meals, orders)| Market {
                has_profile,
                meals,
                orders,
            })
        })
    })
}

fn build(market: &Market) -> MemoryStore {
    let store = MemoryStore::new();
    let base = Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap();
    let users: Vec<UserId> = market.has_profile.iter().map(|_| UserId::new()).collect();
    for (i, (user, has_profile)) in users.iter().zip(&market.has_profile).enumerate() {
        if *has_profile {
            store
                .seed(&Profile {
                    id: *user,
                    email: format!("user{i}@example.com"),
                    name: format!("User {i}"),
                    created_at: base,
                })
                .unwrap();
        }
    }
    let meals: Vec<Meal> = market
        .meals
        .iter()
        .enumerate()
        .map(|(i, (owner, available))| Meal {
            id: MealId::new(),
            chef_id: users[*owner],
            title: format!("Dish {i}"),
            description: String::new(),
            price: 50.0 + i as f64,
            category: "main course".into(),
            available: *available,
            image_url: None,
            spice_levels: Vec::new(),
            oil_options: Vec::new(),
            min_quantity: None,
            max_quantity: None,
            created_at: base + Duration::minutes(i as i64),
        })
        .collect();
    for meal in &meals {
        store.seed(meal).unwrap();
    }
    for (i, (meal, customer, cents, state)) in market.orders.iter().enumerate() {
        let meal = &meals[*meal];
        let at = base + Duration::hours(i as i64);
        store
            .seed(&Order {
                id: OrderId::new(),
                meal_id: meal.id,
                customer_id: users[*customer],
                chef_id: meal.chef_id,
                quantity: 1,
                total_price: f64::from(*cents) / 100.0,
                status: status(*state),
                delivery_partner_id: None,
                delivery_instructions: None,
                created_at: at,
                updated_at: at,
            })
            .unwrap();
    }
    store
}

proptest! {
    #[test]
    fn batched_joins_render_the_same_rows_as_per_row_joins(market in market()) {
        let store = build(&market);
        let (batched_orders, per_row_orders, batched_meals, per_row_meals) = block_on(async {
            let batched = Fetch::new(&store, JoinStrategy::Batched);
            let per_row = Fetch::new(&store, JoinStrategy::PerRow);
            (
                batched.all_orders().await.unwrap(),
                per_row.all_orders().await.unwrap(),
                batched.available_meals(None, fallback::UNKNOWN_CHEF).await.unwrap(),
                per_row.available_meals(None, fallback::UNKNOWN_CHEF).await.unwrap(),
            )
        });
        prop_assert_eq!(batched_orders, per_row_orders);
        prop_assert_eq!(batched_meals, per_row_meals);
    }

    #[test]
    fn earnings_are_always_the_chef_share_of_delivered_revenue(
        orders in prop::collection::vec((1u32..100_000, 0usize..7, 0i64..240), 0..40),
        offset_hours in -12i32..=14,
    ) {
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let orders: Vec<Order> = orders
            .iter()
            .map(|(cents, state, hours)| Order {
                id: OrderId::new(),
                meal_id: MealId::new(),
                customer_id: UserId::new(),
                chef_id: UserId::new(),
                quantity: 1,
                total_price: f64::from(*cents) / 100.0,
                status: status(*state),
                delivery_partner_id: None,
                delivery_instructions: None,
                created_at: base + Duration::hours(*hours),
                updated_at: base + Duration::hours(*hours),
            })
            .collect();
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let report = earnings_by_date(&orders, offset);

        let delivered: Vec<&Order> = orders.iter().filter(|o| o.status == OrderStatus::Delivered).collect();
        let revenue: f64 = delivered.iter().map(|o| o.total_price).sum();
        prop_assert_eq!(report.total_orders, delivered.len());
        prop_assert_eq!(report.days.iter().map(|d| d.orders).sum::<usize>(), delivered.len());
        prop_assert!((report.total_revenue - revenue).abs() < 1e-6);
        prop_assert!((report.total_earnings - revenue * CHEF_SHARE).abs() < 1e-6);
        for day in &report.days {
            prop_assert!((day.earnings - day.revenue * CHEF_SHARE).abs() < 1e-6);
        }
        prop_assert!(report.days.windows(2).all(|pair| pair[0].date > pair[1].date));
    }

    #[test]
    fn admin_access_needs_an_admin_row_whatever_the_claim_says(
        claim in prop::option::of(prop_oneof![Just(Role::Admin), Just(Role::Chef), Just(Role::Customer)]),
        rows in prop::collection::vec(prop_oneof![Just(Role::Chef), Just(Role::Customer)], 0..3),
        unreachable in any::<bool>(),
    ) {
        let store = MemoryStore::new();
        let identity = Identity {
            id: UserId::new(),
            email: "someone@example.com".into(),
            name: "Someone".into(),
            role_claim: claim,
        };
        for role in rows {
            store
                .seed(&RoleAssignment {
                    id: RoleAssignmentId::new(),
                    user_id: identity.id,
                    role,
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        if unreachable {
            store.fail_table(Table::UserRoles).unwrap();
        }
        let granted = block_on(RoleResolver::new(&store).require_admin(Some(&identity)));
        prop_assert!(granted.is_err());
    }
}
