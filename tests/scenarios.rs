use std::pin::pin;

use chrono::{DateTime, TimeZone, Utc};
use homeplate::{
    dto::screens::RedirectBody,
    error::{AppError, AppResult},
    fetchers::{Fetch, JoinStrategy, OrderRequest, fallback},
    ids::{ChefId, MealId, OrderId, RoleAssignmentId, UserId},
    models::{Chef, Identity, Meal, Order, OrderStatus, Profile, Role, RoleAssignment, VerificationStatus},
    roles::NO_ADMIN_ACCESS,
    screens::{
        AdminFilter, Screens,
        meal_detail::{ORDER_PLACED, SIGN_IN_TO_ORDER},
        nav::WELCOME_BACK,
    },
    session::SessionStore,
    store::{Changes, DataService, MemoryStore, Query, Record, Table},
    view::{Notice, Redirect, Route, ScreenScope},
};
use tokio::sync::Semaphore;
use uuid::Uuid;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
}

fn person(store: &MemoryStore, name: &str, claim: Option<Role>) -> Identity {
    let identity = Identity {
        id: UserId::new(),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.into(),
        role_claim: claim,
    };
    store
        .seed(&Profile {
            id: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            created_at: at(1, 9),
        })
        .unwrap();
    identity
}

fn grant(store: &MemoryStore, user_id: UserId, role: Role) {
    store
        .seed(&RoleAssignment {
            id: RoleAssignmentId::new(),
            user_id,
            role,
            created_at: at(1, 9),
        })
        .unwrap();
}

fn approved_chef(store: &MemoryStore, user_id: UserId) -> Chef {
    let chef = Chef {
        id: ChefId::new(),
        verification_status: VerificationStatus::Approved,
        ..Chef::pending_for(user_id)
    };
    store.seed(&chef).unwrap();
    chef
}

fn dish(store: &MemoryStore, chef: UserId, title: &str, price: f64) -> Meal {
    let meal = Meal {
        id: MealId::new(),
        chef_id: chef,
        title: title.into(),
        description: "Fresh from a home kitchen".into(),
        price,
        category: "main course".into(),
        available: true,
        image_url: None,
        spice_levels: vec!["mild".into(), "spicy".into()],
        oil_options: Vec::new(),
        min_quantity: None,
        max_quantity: None,
        created_at: at(2, 9),
    };
    store.seed(&meal).unwrap();
    meal
}

fn order(store: &MemoryStore, meal: &Meal, customer: UserId, total: f64, status: OrderStatus) -> Order {
    let order = Order {
        id: OrderId::new(),
        meal_id: meal.id,
        customer_id: customer,
        chef_id: meal.chef_id,
        quantity: 1,
        total_price: total,
        status,
        delivery_partner_id: None,
        delivery_instructions: None,
        created_at: at(10, 12),
        updated_at: at(10, 12),
    };
    store.seed(&order).unwrap();
    order
}

/// A chef with the role row, an approved profile, one dish and three
/// delivered orders of 100, 200 and 300 placed on the same day.
struct Kitchen {
    store: MemoryStore,
    chef: Identity,
    meal: Meal,
    customer: Identity,
}

fn kitchen() -> Kitchen {
    let store = MemoryStore::new();
    let chef = person(&store, "Asha", Some(Role::Chef));
    grant(&store, chef.id, Role::Chef);
    approved_chef(&store, chef.id);
    let meal = dish(&store, chef.id, "Gujarati Thali", 100.0);
    let customer = person(&store, "Meera", Some(Role::Customer));
    for total in [100.0, 200.0, 300.0] {
        order(&store, &meal, customer.id, total, OrderStatus::Delivered);
    }
    Kitchen {
        store,
        chef,
        meal,
        customer,
    }
}

#[tokio::test]
async fn chef_claim_without_admin_row_is_sent_home() {
    let store = MemoryStore::new();
    let chef = person(&store, "Asha", Some(Role::Chef));
    grant(&store, chef.id, Role::Chef);
    let session = SessionStore::with_identity(Some(chef));
    let screens = Screens::new(Fetch::new(&store, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let screen = screens.admin(&scope.state(), AdminFilter::default()).await;

    assert_eq!(
        screen.redirect(),
        Some(&Redirect::with_notice(Route::Home, Notice::error(NO_ADMIN_ACCESS)))
    );
    assert_eq!(store.requests(Table::Orders), 0);
}

#[tokio::test]
async fn same_day_deliveries_collapse_into_one_earnings_row() {
    let Kitchen { store, chef, .. } = kitchen();
    let session = SessionStore::with_identity(Some(chef));
    let screens = Screens::new(Fetch::new(&store, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let view = screens.partner(&scope.state()).await.ready().unwrap();

    assert_eq!(view.notice, None);
    assert_eq!(view.earnings.days.len(), 1);
    let day = &view.earnings.days[0];
    assert_eq!(day.orders, 3);
    assert!((day.revenue - 600.0).abs() < 1e-9);
    assert!((day.earnings - 510.0).abs() < 1e-9);
    assert!((view.stats.total_earnings - 510.0).abs() < 1e-9);
    assert!((view.earnings.average_per_order - 170.0).abs() < 1e-9);
}

#[tokio::test]
async fn pending_orders_stay_out_of_earnings() {
    let Kitchen {
        store,
        chef,
        meal,
        customer,
    } = kitchen();
    order(&store, &meal, customer.id, 400.0, OrderStatus::Pending);
    let session = SessionStore::with_identity(Some(chef));
    let screens = Screens::new(Fetch::new(&store, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let view = screens.partner(&scope.state()).await.ready().unwrap();

    assert_eq!(view.earnings.total_orders, 3);
    assert!((view.earnings.total_revenue - 600.0).abs() < 1e-9);
    assert_eq!(view.stats.pending_orders, 1);
    assert_eq!(view.orders.len(), 4);
}

#[tokio::test]
async fn meals_render_with_fallback_chef_names_when_profiles_fail() {
    for joins in [JoinStrategy::Batched, JoinStrategy::PerRow] {
        let Kitchen { store, .. } = kitchen();
        store.fail_table(Table::Profiles).unwrap();
        let session = SessionStore::with_identity(None);
        let screens = Screens::new(Fetch::new(&store, joins), &session);

        let scope = ScreenScope::mount();
        let view = screens.meals(&scope.state(), None).await.ready().unwrap();

        assert_eq!(view.notice, None);
        assert_eq!(view.meals.len(), 1);
        assert_eq!(view.meals[0].meal.title, "Gujarati Thali");
        assert_eq!(view.meals[0].chef_name, fallback::UNKNOWN_CHEF);
    }
}

/// Holds every request until the gate opens, so a screen can be caught mid-load.
struct GatedStore<'a> {
    inner: &'a MemoryStore,
    gate: Semaphore,
}

impl<'a> GatedStore<'a> {
    fn closed(inner: &'a MemoryStore) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    fn open(&self) {
        self.gate.add_permits(1);
    }

    async fn pass(&self) -> AppResult<()> {
        self.gate
            .acquire()
            .await
            .map(drop)
            .map_err(|_| AppError::Transport("gate closed".into()))
    }
}

impl DataService for GatedStore<'_> {
    async fn select<T: Record>(&self, query: Query<T>) -> AppResult<Vec<T>> {
        self.pass().await?;
        self.inner.select(query).await
    }

    async fn count<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        self.pass().await?;
        self.inner.count(query).await
    }

    async fn insert<T: Record>(&self, record: T) -> AppResult<T> {
        self.pass().await?;
        self.inner.insert(record).await
    }

    async fn update<T: Record>(&self, id: Uuid, changes: Changes) -> AppResult<T> {
        self.pass().await?;
        self.inner.update(id, changes).await
    }

    async fn delete<T: Record>(&self, id: Uuid) -> AppResult<()> {
        self.pass().await?;
        self.inner.delete::<T>(id).await
    }

    async fn delete_where<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        self.pass().await?;
        self.inner.delete_where(query).await
    }
}

#[tokio::test]
async fn unmounting_before_the_dashboard_resolves_drops_the_result() {
    let Kitchen { store, chef, .. } = kitchen();
    let gated = GatedStore::closed(&store);
    let session = SessionStore::with_identity(Some(chef));
    let screens = Screens::new(Fetch::new(&gated, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let state = scope.state();
    let mut pending = pin!(screens.partner(&state));
    assert!(futures::poll!(pending.as_mut()).is_pending());
    assert_eq!(store.requests(Table::Orders), 0);

    scope.unmount();
    gated.open();
    let screen = pending.await;

    assert!(store.requests(Table::Orders) > 0);
    assert!(screen.ready().is_some());
    assert_eq!(state.get(), None);
    assert!(!scope.is_mounted());
}

#[tokio::test]
async fn anonymous_order_goes_to_login_and_remembers_the_meal() {
    let Kitchen { store, meal, .. } = kitchen();
    let session = SessionStore::with_identity(None);
    let screens = Screens::new(Fetch::new(&store, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let request = OrderRequest {
        quantity: 1,
        spice_level: None,
        oil_preference: None,
        delivery_instructions: None,
    };
    let screen = screens.order_meal(&scope.state(), meal.id, request).await;

    assert_eq!(
        screen.redirect(),
        Some(&Redirect::with_notice(Route::Login, Notice::error(SIGN_IN_TO_ORDER)))
    );
    assert_eq!(session.take_redirect(), Some(Route::MealDetail(meal.id)));
    assert_eq!(session.take_redirect(), None);
    assert_eq!(store.rows::<Order>().unwrap().len(), 3);
}

#[tokio::test]
async fn signing_in_after_an_anonymous_order_returns_to_the_meal_once() {
    let Kitchen {
        store,
        meal,
        customer,
        ..
    } = kitchen();
    let fetch = Fetch::new(&store, JoinStrategy::Batched);

    // First request: anonymous order, answered with a login redirect.
    let anonymous = SessionStore::with_identity(None);
    let scope = ScreenScope::mount();
    let request = OrderRequest {
        quantity: 1,
        spice_level: None,
        oil_preference: None,
        delivery_instructions: None,
    };
    let screen = Screens::new(fetch, &anonymous)
        .order_meal(&scope.state(), meal.id, request)
        .await;
    let Some(redirect) = screen.redirect().cloned() else {
        panic!("anonymous order should redirect");
    };
    let body = RedirectBody::handing_off(redirect, &anonymous);
    assert_eq!(body.redirect, Route::Login);
    let next = body.next.expect("login redirect carries the meal");
    assert_eq!(serde_json::to_value(next).unwrap(), format!("/meals/{}", meal.id));

    // Second request: the client signs in and sends `next` back.
    let signed_in = SessionStore::with_identity(Some(customer));
    let next: Route = serde_json::from_value(serde_json::to_value(next).unwrap()).unwrap();
    signed_in.remember_redirect(next);
    let screens = Screens::new(fetch, &signed_in);

    assert_eq!(
        screens.after_sign_in(),
        Redirect::with_notice(Route::MealDetail(meal.id), Notice::success(WELCOME_BACK))
    );
    assert_eq!(screens.after_sign_in().to, Route::Home);
}

#[tokio::test]
async fn signed_in_order_lands_on_orders_and_shows_up_there() {
    let Kitchen {
        store,
        meal,
        customer,
        ..
    } = kitchen();
    let session = SessionStore::with_identity(Some(customer));
    let screens = Screens::new(Fetch::new(&store, JoinStrategy::Batched), &session);

    let scope = ScreenScope::mount();
    let request = OrderRequest {
        quantity: 2,
        spice_level: Some("spicy".into()),
        oil_preference: None,
        delivery_instructions: Some("Ring twice".into()),
    };
    let screen = screens.order_meal(&scope.state(), meal.id, request).await;
    assert_eq!(
        screen.redirect(),
        Some(&Redirect::with_notice(Route::Orders, Notice::success(ORDER_PLACED)))
    );

    let orders = screens.orders(&scope.state()).await.ready().unwrap();
    assert_eq!(orders.orders.len(), 4);
    assert_eq!(orders.summary.total_orders, 4);
    let placed = orders
        .orders
        .iter()
        .find(|row| row.line.order.status == OrderStatus::Pending)
        .unwrap();
    assert!((placed.line.order.total_price - 200.0).abs() < 1e-9);
    assert!(placed.can_cancel);
}
