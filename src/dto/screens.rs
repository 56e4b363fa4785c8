use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{OrderStatus, PlanType, SubscriptionStatus, VerificationStatus},
    session::SessionStore,
    view::{Notice, Redirect, Route, Screen},
};

/// A mounted screen on the wire: the view model itself, or where to go instead.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ScreenBody<T> {
    Ready(T),
    Redirect(RedirectBody),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedirectBody {
    #[schema(value_type = String, example = "/login")]
    pub redirect: Route,
    pub notice: Option<Notice>,
    /// Set on redirects to login: where the visitor was headed. Send it back
    /// as `next` when signing in.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "/meals/2b1e6c0a-5f9e-4d4c-9a57-0d6f1d1b2c3e")]
    pub next: Option<Route>,
}

impl RedirectBody {
    /// Like `From<Redirect>`, but a redirect to login takes the destination
    /// remembered in `session` along with it.
    pub fn handing_off(redirect: Redirect, session: &SessionStore) -> Self {
        let next = if redirect.to == Route::Login {
            session.take_redirect()
        } else {
            None
        };
        Self {
            next,
            ..redirect.into()
        }
    }
}

impl From<Redirect> for RedirectBody {
    fn from(redirect: Redirect) -> Self {
        Self {
            redirect: redirect.to,
            notice: redirect.notice,
            next: None,
        }
    }
}

impl<T> ScreenBody<T> {
    pub fn handing_off(screen: Screen<T>, session: &SessionStore) -> Self {
        match screen {
            Screen::Ready(view) => ScreenBody::Ready(view),
            Screen::Redirect(redirect) => ScreenBody::Redirect(RedirectBody::handing_off(redirect, session)),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MealSearch {
    /// Matched against title, description and category.
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChefSearch {
    /// Matched against the chef's name and specialties.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub plan_type: PlanType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionStatusRequest {
    pub status: SubscriptionStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerificationRequest {
    pub status: VerificationStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SpecialtyRequest {
    pub specialty: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliveryRequest {
    pub delivery_partner_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MealId;

    #[test]
    fn login_redirects_carry_the_remembered_destination_once() {
        let session = SessionStore::with_identity(None);
        let meal = MealId::new();
        session.remember_redirect(Route::MealDetail(meal));

        let to_login = || Redirect::with_notice(Route::Login, Notice::error("Please sign in"));
        let body = RedirectBody::handing_off(to_login(), &session);
        assert_eq!(body.next, Some(Route::MealDetail(meal)));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["next"], format!("/meals/{meal}"));

        let again = RedirectBody::handing_off(to_login(), &session);
        assert_eq!(again.next, None);
        assert!(serde_json::to_value(&again).unwrap().get("next").is_none());
    }

    #[test]
    fn other_redirects_leave_the_slot_alone() {
        let session = SessionStore::with_identity(None);
        session.remember_redirect(Route::Orders);

        let body = RedirectBody::handing_off(Redirect::to(Route::Home), &session);
        assert_eq!(body.next, None);
        assert_eq!(session.take_redirect(), Some(Route::Orders));
    }
}
