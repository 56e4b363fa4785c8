use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::screens::{ChefSearch, MealSearch, ScreenBody},
    ids::{ChefId, MealId},
    middleware::auth::Viewer,
    models::{OrderStatus, VerificationStatus},
    response::{ApiResponse, Meta},
    screens::{
        AdminFilter, AdminView, ChefProfileView, ChefsView, HomeView, MealDetailView, MealsView, NavView,
        OrdersView, PartnerView, Screens, SubscriptionsView,
    },
    state::AppState,
    store::OrmStore,
    view::{Screen, ScreenScope},
};

pub type ScreenResponse<T> = Json<ApiResponse<ScreenBody<T>>>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/meals", get(meals))
        .route("/meals/{id}", get(meal_detail))
        .route("/chefs", get(chefs))
        .route("/chefs/{id}", get(chef_profile))
        .route("/orders", get(orders))
        .route("/subscriptions", get(subscriptions))
        .route("/partner", get(partner))
        .route("/admin", get(admin))
        .route("/nav", get(nav))
}

/// The screens as seen by this request's viewer.
pub(crate) fn screens_for<'a>(state: &'a AppState, viewer: &'a Viewer) -> Screens<'a, OrmStore> {
    Screens::new(state.fetch(), &viewer.session).with_offset(state.config.dashboard_offset())
}

/// Wrap a mounted screen. A redirect to login hands the viewer's remembered
/// destination to the client, since the session store does not outlive the request.
pub(crate) fn respond<T: serde::Serialize>(
    viewer: &Viewer,
    message: &str,
    screen: Screen<T>,
) -> ScreenResponse<T> {
    let body = ScreenBody::handing_off(screen, &viewer.session);
    Json(ApiResponse::success(message, body, Some(Meta::empty())))
}

#[utoipa::path(
    get,
    path = "/api/screens/home",
    responses((status = 200, description = "Featured chefs and popular meals", body = ApiResponse<HomeView>)),
    tag = "Screens"
)]
pub async fn home(State(state): State<AppState>, viewer: Viewer) -> ScreenResponse<HomeView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer).home(&scope.state()).await;
    respond(&viewer, "Home", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/meals",
    params(
        ("q" = Option<String>, Query, description = "Matched against title, description and category"),
    ),
    responses((status = 200, description = "Available meals matching the search", body = ApiResponse<MealsView>)),
    tag = "Screens"
)]
pub async fn meals(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(search): Query<MealSearch>,
) -> ScreenResponse<MealsView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .meals(&scope.state(), search.q.as_deref())
        .await;
    respond(&viewer, "Meals", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/meals/{id}",
    params(("id" = Uuid, Path, description = "Meal id")),
    responses((status = 200, description = "One meal, or a redirect back to the menu", body = ApiResponse<MealDetailView>)),
    tag = "Screens"
)]
pub async fn meal_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<MealDetailView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .meal_detail(&scope.state(), MealId::from_uuid(id))
        .await;
    respond(&viewer, "Meal", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/chefs",
    params(
        ("q" = Option<String>, Query, description = "Matched against the chef's name and specialties"),
    ),
    responses((status = 200, description = "Approved chefs matching the search", body = ApiResponse<ChefsView>)),
    tag = "Screens"
)]
pub async fn chefs(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(search): Query<ChefSearch>,
) -> ScreenResponse<ChefsView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .chefs(&scope.state(), search.q.as_deref())
        .await;
    respond(&viewer, "Chefs", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/chefs/{id}",
    params(("id" = Uuid, Path, description = "Chef profile id")),
    responses((status = 200, description = "Chef profile with dishes and reviews", body = ApiResponse<ChefProfileView>)),
    tag = "Screens"
)]
pub async fn chef_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<ChefProfileView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .chef_profile(&scope.state(), ChefId::from_uuid(id))
        .await;
    respond(&viewer, "Chef", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/orders",
    responses((status = 200, description = "The viewer's orders, or a redirect to login", body = ApiResponse<OrdersView>)),
    security(("bearer_auth" = [])),
    tag = "Screens"
)]
pub async fn orders(State(state): State<AppState>, viewer: Viewer) -> ScreenResponse<OrdersView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer).orders(&scope.state()).await;
    respond(&viewer, "Orders", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/subscriptions",
    responses((status = 200, description = "The viewer's meal plans, or a redirect to login", body = ApiResponse<SubscriptionsView>)),
    security(("bearer_auth" = [])),
    tag = "Screens"
)]
pub async fn subscriptions(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ScreenResponse<SubscriptionsView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .subscriptions(&scope.state())
        .await;
    respond(&viewer, "Subscriptions", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/partner",
    responses((status = 200, description = "Chef back office, or a redirect when not a chef", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Screens"
)]
pub async fn partner(State(state): State<AppState>, viewer: Viewer) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer).partner(&scope.state()).await;
    respond(&viewer, "Partner dashboard", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/admin",
    params(
        ("order_status" = Option<OrderStatus>, Query, description = "Only orders in this status"),
        ("chef_status" = Option<VerificationStatus>, Query, description = "Only chefs with this verification status"),
    ),
    responses((status = 200, description = "Admin dashboard, or a redirect when not an admin", body = ApiResponse<AdminView>)),
    security(("bearer_auth" = [])),
    tag = "Screens"
)]
pub async fn admin(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(filter): Query<AdminFilter>,
) -> ScreenResponse<AdminView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .admin(&scope.state(), filter)
        .await;
    respond(&viewer, "Admin dashboard", screen)
}

#[utoipa::path(
    get,
    path = "/api/screens/nav",
    responses((status = 200, description = "Navigation entries for the viewer", body = ApiResponse<NavView>)),
    tag = "Screens"
)]
pub async fn nav(State(state): State<AppState>, viewer: Viewer) -> Json<ApiResponse<NavView>> {
    let view = screens_for(&state, &viewer).nav();
    Json(ApiResponse::success("Navigation", view, Some(Meta::empty())))
}
