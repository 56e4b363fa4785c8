use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    aggregate::{AdminStats, CustomerSummary, EarningsDay, EarningsReport, PartnerStats, StatusCount},
    dto::{
        auth::{LoginRequest, RegisterRequest, SessionResponse},
        screens::{
            ChefSearch, DeliveryRequest, MealSearch, OrderStatusRequest, RedirectBody, SpecialtyRequest,
            SubscribeRequest, SubscriptionStatusRequest, VerificationRequest,
        },
    },
    fetchers::{
        ChefCard, ChefProfileUpdate, ChefRow, FeaturedChef, MealCard, MealDraft, OrderLine,
        OrderRequest, ReviewDraft, ReviewLine, SubscriptionLine,
    },
    models::{
        Chef, Identity, Meal, Order, OrderStatus, PlanType, Review, Role, Subscription,
        SubscriptionStatus, VerificationStatus,
    },
    response::{ApiResponse, Meta},
    roles::NavRole,
    routes::{actions, auth, health, screens},
    screens::{
        AdminFilter, AdminView, ChefProfileView, ChefsView, HomeView, MealDetailView, MealsView, NavLink,
        NavView, OrderRow, OrdersView, PartnerView, SubscriptionsView,
    },
    view::{Notice, NoticeLevel},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::refresh,
        auth::become_chef,
        screens::home,
        screens::meals,
        screens::meal_detail,
        screens::chefs,
        screens::chef_profile,
        screens::orders,
        screens::subscriptions,
        screens::partner,
        screens::admin,
        screens::nav,
        actions::order_meal,
        actions::subscribe_to_chef,
        actions::review_order,
        actions::cancel_order,
        actions::change_subscription,
        actions::add_dish,
        actions::edit_dish,
        actions::toggle_dish,
        actions::remove_dish,
        actions::advance_order,
        actions::update_kitchen,
        actions::add_specialty,
        actions::remove_specialty,
        actions::verify_chef,
        actions::toggle_featured,
        actions::assign_delivery,
        actions::admin_cancel_order,
        actions::sign_out
    ),
    components(
        schemas(
            Identity,
            Role,
            NavRole,
            Chef,
            Meal,
            Order,
            Review,
            Subscription,
            OrderStatus,
            VerificationStatus,
            PlanType,
            SubscriptionStatus,
            ChefCard,
            FeaturedChef,
            ChefRow,
            MealCard,
            OrderLine,
            ReviewLine,
            SubscriptionLine,
            AdminStats,
            PartnerStats,
            StatusCount,
            CustomerSummary,
            EarningsDay,
            EarningsReport,
            Notice,
            NoticeLevel,
            NavLink,
            OrderRow,
            RegisterRequest,
            LoginRequest,
            SessionResponse,
            MealSearch,
            ChefSearch,
            AdminFilter,
            OrderRequest,
            ReviewDraft,
            MealDraft,
            ChefProfileUpdate,
            SubscribeRequest,
            OrderStatusRequest,
            SubscriptionStatusRequest,
            VerificationRequest,
            SpecialtyRequest,
            DeliveryRequest,
            RedirectBody,
            Meta,
            ApiResponse<SessionResponse>,
            ApiResponse<HomeView>,
            ApiResponse<MealsView>,
            ApiResponse<MealDetailView>,
            ApiResponse<ChefsView>,
            ApiResponse<ChefProfileView>,
            ApiResponse<OrdersView>,
            ApiResponse<SubscriptionsView>,
            ApiResponse<PartnerView>,
            ApiResponse<AdminView>,
            ApiResponse<NavView>,
            ApiResponse<RedirectBody>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Sign up, sign in and session refresh"),
        (name = "Screens", description = "Mounted screen view models; a screen answers with its view or a redirect"),
        (name = "Actions", description = "Screen actions; each answers with what the screen shows next"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
