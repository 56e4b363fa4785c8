//! Screen actions over HTTP. Each call mounts a fresh screen, runs the action
//! and answers with what the screen would show next: the reloaded view with a
//! notice, or a redirect.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post, put},
};
use uuid::Uuid;

use crate::{
    dto::screens::{
        DeliveryRequest, OrderStatusRequest, RedirectBody, SpecialtyRequest, SubscribeRequest,
        SubscriptionStatusRequest, VerificationRequest,
    },
    fetchers::{ChefProfileUpdate, MealDraft, OrderRequest, ReviewDraft},
    ids::{ChefId, MealId, OrderId, SubscriptionId},
    middleware::auth::Viewer,
    response::{ApiResponse, Meta},
    routes::screens::{ScreenResponse, respond, screens_for},
    screens::{AdminView, ChefProfileView, MealDetailView, OrdersView, PartnerView, SubscriptionsView},
    state::AppState,
    view::ScreenScope,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meals/{id}/order", post(order_meal))
        .route("/chefs/{id}/subscribe", post(subscribe_to_chef))
        .route("/orders/{id}/review", post(review_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/subscriptions/{id}/status", put(change_subscription))
        .route("/partner/dishes", post(add_dish))
        .route("/partner/dishes/{id}", put(edit_dish).delete(remove_dish))
        .route("/partner/dishes/{id}/toggle", post(toggle_dish))
        .route("/partner/orders/{id}/status", put(advance_order))
        .route("/partner/kitchen", put(update_kitchen))
        .route("/partner/specialties", post(add_specialty))
        .route("/partner/specialties/{name}", delete(remove_specialty))
        .route("/admin/chefs/{id}/verification", put(verify_chef))
        .route("/admin/chefs/{id}/featured", post(toggle_featured))
        .route("/admin/orders/{id}/delivery", put(assign_delivery))
        .route("/admin/orders/{id}/cancel", post(admin_cancel_order))
        .route("/sign-out", post(sign_out))
}

#[utoipa::path(
    post,
    path = "/api/actions/meals/{id}/order",
    params(("id" = Uuid, Path, description = "Meal id")),
    request_body = OrderRequest,
    responses((status = 200, description = "Redirect to orders, or the meal with a failure notice", body = ApiResponse<MealDetailView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn order_meal(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderRequest>,
) -> ScreenResponse<MealDetailView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .order_meal(&scope.state(), MealId::from_uuid(id), payload)
        .await;
    respond(&viewer, "Order", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/chefs/{id}/subscribe",
    params(("id" = Uuid, Path, description = "Chef profile id")),
    request_body = SubscribeRequest,
    responses((status = 200, description = "Redirect to subscriptions, or the chef with a failure notice", body = ApiResponse<ChefProfileView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn subscribe_to_chef(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscribeRequest>,
) -> ScreenResponse<ChefProfileView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .subscribe_to_chef(&scope.state(), ChefId::from_uuid(id), payload.plan_type)
        .await;
    respond(&viewer, "Subscribe", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/orders/{id}/review",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ReviewDraft,
    responses((status = 200, description = "Orders screen after the review", body = ApiResponse<OrdersView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn review_order(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewDraft>,
) -> ScreenResponse<OrdersView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .review_order(&scope.state(), OrderId::from_uuid(id), payload)
        .await;
    respond(&viewer, "Review", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Orders screen after cancelling", body = ApiResponse<OrdersView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<OrdersView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .cancel_order(&scope.state(), OrderId::from_uuid(id))
        .await;
    respond(&viewer, "Cancel order", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/subscriptions/{id}/status",
    params(("id" = Uuid, Path, description = "Subscription id")),
    request_body = SubscriptionStatusRequest,
    responses((status = 200, description = "Subscriptions screen after the change", body = ApiResponse<SubscriptionsView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn change_subscription(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscriptionStatusRequest>,
) -> ScreenResponse<SubscriptionsView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .change_subscription(&scope.state(), SubscriptionId::from_uuid(id), payload.status)
        .await;
    respond(&viewer, "Subscription", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/partner/dishes",
    request_body = MealDraft,
    responses((status = 200, description = "Partner dashboard after adding the dish", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn add_dish(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<MealDraft>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .add_dish(&scope.state(), payload)
        .await;
    respond(&viewer, "Add dish", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/partner/dishes/{id}",
    params(("id" = Uuid, Path, description = "Meal id")),
    request_body = MealDraft,
    responses((status = 200, description = "Partner dashboard after the edit", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn edit_dish(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<MealDraft>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .edit_dish(&scope.state(), MealId::from_uuid(id), payload)
        .await;
    respond(&viewer, "Edit dish", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/partner/dishes/{id}/toggle",
    params(("id" = Uuid, Path, description = "Meal id")),
    responses((status = 200, description = "Partner dashboard after flipping availability", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn toggle_dish(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .toggle_dish(&scope.state(), MealId::from_uuid(id))
        .await;
    respond(&viewer, "Toggle dish", screen)
}

#[utoipa::path(
    delete,
    path = "/api/actions/partner/dishes/{id}",
    params(("id" = Uuid, Path, description = "Meal id")),
    responses((status = 200, description = "Partner dashboard after removing the dish", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn remove_dish(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .remove_dish(&scope.state(), MealId::from_uuid(id))
        .await;
    respond(&viewer, "Remove dish", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/partner/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = OrderStatusRequest,
    responses((status = 200, description = "Partner dashboard after moving the order", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn advance_order(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderStatusRequest>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .advance_order(&scope.state(), OrderId::from_uuid(id), payload.status)
        .await;
    respond(&viewer, "Order status", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/partner/kitchen",
    request_body = ChefProfileUpdate,
    responses((status = 200, description = "Partner dashboard after the profile update", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn update_kitchen(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<ChefProfileUpdate>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .update_kitchen(&scope.state(), payload)
        .await;
    respond(&viewer, "Kitchen profile", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/partner/specialties",
    request_body = SpecialtyRequest,
    responses((status = 200, description = "Partner dashboard after adding the specialty", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn add_specialty(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<SpecialtyRequest>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .add_specialty(&scope.state(), &payload.specialty)
        .await;
    respond(&viewer, "Add specialty", screen)
}

#[utoipa::path(
    delete,
    path = "/api/actions/partner/specialties/{name}",
    params(("name" = String, Path, description = "Specialty to remove")),
    responses((status = 200, description = "Partner dashboard after removing the specialty", body = ApiResponse<PartnerView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn remove_specialty(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(name): Path<String>,
) -> ScreenResponse<PartnerView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .remove_specialty(&scope.state(), &name)
        .await;
    respond(&viewer, "Remove specialty", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/admin/chefs/{id}/verification",
    params(("id" = Uuid, Path, description = "Chef profile id")),
    request_body = VerificationRequest,
    responses((status = 200, description = "Admin dashboard after the decision", body = ApiResponse<AdminView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn verify_chef(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerificationRequest>,
) -> ScreenResponse<AdminView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .verify_chef(&scope.state(), ChefId::from_uuid(id), payload.status)
        .await;
    respond(&viewer, "Chef verification", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/admin/chefs/{id}/featured",
    params(("id" = Uuid, Path, description = "Chef profile id")),
    responses((status = 200, description = "Admin dashboard after flipping the featured flag", body = ApiResponse<AdminView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn toggle_featured(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<AdminView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .toggle_featured(&scope.state(), ChefId::from_uuid(id))
        .await;
    respond(&viewer, "Featured chef", screen)
}

#[utoipa::path(
    put,
    path = "/api/actions/admin/orders/{id}/delivery",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = DeliveryRequest,
    responses((status = 200, description = "Admin dashboard after assigning delivery", body = ApiResponse<AdminView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn assign_delivery(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeliveryRequest>,
) -> ScreenResponse<AdminView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .assign_delivery(&scope.state(), OrderId::from_uuid(id), &payload.delivery_partner_id)
        .await;
    respond(&viewer, "Delivery", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/admin/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Admin dashboard after cancelling", body = ApiResponse<AdminView>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn admin_cancel_order(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> ScreenResponse<AdminView> {
    let scope = ScreenScope::mount();
    let screen = screens_for(&state, &viewer)
        .admin_cancel_order(&scope.state(), OrderId::from_uuid(id))
        .await;
    respond(&viewer, "Cancel order", screen)
}

#[utoipa::path(
    post,
    path = "/api/actions/sign-out",
    responses((status = 200, description = "Where to go after signing out", body = ApiResponse<RedirectBody>)),
    security(("bearer_auth" = [])),
    tag = "Actions"
)]
pub async fn sign_out(State(state): State<AppState>, viewer: Viewer) -> Json<ApiResponse<RedirectBody>> {
    let redirect = screens_for(&state, &viewer).sign_out().await;
    Json(ApiResponse::success(
        "Sign out",
        RedirectBody::from(redirect),
        Some(Meta::empty()),
    ))
}
