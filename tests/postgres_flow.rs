use std::sync::Arc;

use homeplate::{
    auth::{PasswordAuth, SignUp},
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    fetchers::{JoinStrategy, MealDraft, OrderRequest},
    models::{OrderStatus, PlanType, VerificationStatus},
    screens::{Screens, meal_detail::ORDER_PLACED},
    session::SessionStore,
    state::AppState,
    store::OrmStore,
    view::{Notice, Redirect, Route, ScreenScope},
};
use sea_orm::{ConnectionTrait, Statement};

// Full flow against Postgres: a chef lists a dish, a customer orders it, the
// chef moves it along until delivery and the earnings show up.
#[tokio::test]
async fn order_to_earnings_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: set TEST_DATABASE_URL to run the Postgres flow test.");
        return Ok(());
    };

    let state = setup_state(&database_url).await?;
    let fetch = state.fetch();

    let chef_auth = Arc::new(PasswordAuth::new(state.pool.clone(), state.issuer.clone()));
    let chef = chef_auth
        .sign_up(SignUp {
            email: "asha@example.com".into(),
            password: "chef123".into(),
            name: "Asha".into(),
            become_chef: true,
        })
        .await?;
    let profile = fetch.ensure_chef_profile(chef.identity.id).await?;
    fetch
        .set_verification(profile.id, VerificationStatus::Approved)
        .await?;
    let meal = fetch
        .create_meal(
            chef.identity.id,
            MealDraft {
                title: "Gujarati Thali".into(),
                description: "Dal, kadhi, rotli and rice".into(),
                price: 200.0,
                category: Some("thali".into()),
                available: true,
                image_url: None,
                spice_levels: Vec::new(),
                oil_options: Vec::new(),
                min_quantity: None,
                max_quantity: None,
            },
        )
        .await?;

    let customer_auth = Arc::new(PasswordAuth::new(state.pool.clone(), state.issuer.clone()));
    customer_auth
        .sign_up(SignUp {
            email: "meera@example.com".into(),
            password: "customer123".into(),
            name: "Meera".into(),
            become_chef: false,
        })
        .await?;
    let customer_session = SessionStore::start(customer_auth).await;
    let customer = Screens::new(fetch, &customer_session);

    let scope = ScreenScope::mount();
    let placed = customer
        .order_meal(
            &scope.state(),
            meal.id,
            OrderRequest {
                quantity: 2,
                spice_level: None,
                oil_preference: None,
                delivery_instructions: None,
            },
        )
        .await;
    assert_eq!(
        placed.redirect(),
        Some(&Redirect::with_notice(Route::Orders, Notice::success(ORDER_PLACED)))
    );

    let orders = customer.orders(&scope.state()).await.ready().unwrap();
    assert_eq!(orders.orders.len(), 1);
    let order_id = orders.orders[0].line.order.id;
    assert_eq!(orders.orders[0].line.order.status, OrderStatus::Pending);

    let chef_session = SessionStore::start(chef_auth).await;
    let kitchen = Screens::new(fetch, &chef_session);
    for next in [OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::OutForDelivery] {
        let view = kitchen
            .advance_order(&scope.state(), order_id, next)
            .await
            .ready()
            .unwrap();
        assert_eq!(view.notice.map(|n| n.message), Some(format!("Order {}", next.as_str().replace('_', " "))));
    }
    fetch.mark_delivered(order_id).await?;

    let partner = kitchen.partner(&scope.state()).await.ready().unwrap();
    assert_eq!(partner.earnings.total_orders, 1);
    assert!((partner.earnings.total_earnings - 340.0).abs() < 1e-9);

    let subscribed = customer
        .subscribe_to_chef(&scope.state(), profile.id, PlanType::Weekly)
        .await;
    assert_eq!(subscribed.redirect().map(|r| r.to), Some(Route::Subscriptions));
    let plans = customer.subscriptions(&scope.state()).await.ready().unwrap();
    assert_eq!(plans.subscriptions.len(), 1);
    assert_eq!(plans.subscriptions[0].subscription.meals_count, 7);
    assert_eq!(plans.subscriptions[0].chef_name, "Asha");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE subscriptions, reviews, order_items, orders, chef_specialties, meals, chefs, user_roles, profiles, auth_users CASCADE",
    ))
    .await?;

    let pool = create_pool(database_url).await?;
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        session_ttl_hours: 1,
        join_strategy: JoinStrategy::Batched,
        dashboard_utc_offset_minutes: 0,
    };
    Ok(AppState::new(OrmStore::new(orm), pool, config))
}
