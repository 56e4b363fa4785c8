use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Fetch, fallback, join::lookup_one, optional, required};
use crate::{
    error::{AppError, AppResult},
    ids::{MealId, OrderId, OrderItemId, UserId},
    models::{Actor, Meal, Order, OrderItem, OrderStatus},
    store::{Changes, DataService, Query},
};

/// An order with the display fields its screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderLine {
    #[serde(flatten)]
    pub order: Order,
    pub meal_title: String,
    pub meal_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chef_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderRequest {
    pub quantity: i32,
    pub spice_level: Option<String>,
    pub oil_preference: Option<String>,
    pub delivery_instructions: Option<String>,
}

/// Which names a list joins in, and what to show when a lookup comes back empty.
struct LineNames<'n> {
    meal: &'n str,
    customer: Option<&'n str>,
    chef: Option<&'n str>,
}

fn check_choice(choice: &Option<String>, offered: &[String], what: &str) -> AppResult<()> {
    match choice {
        Some(choice) if !offered.is_empty() && !offered.iter().any(|o| o == choice) => Err(
            AppError::validation(format!("{choice} is not a {what} this dish offers")),
        ),
        _ => Ok(()),
    }
}

impl<S: DataService> Fetch<'_, S> {
    async fn order_lines(&self, orders: Vec<Order>, names: LineNames<'_>) -> Vec<OrderLine> {
        let people = orders.iter().flat_map(|o| {
            let customer = names.customer.map(|_| o.customer_id);
            let chef = names.chef.map(|_| o.chef_id);
            customer.into_iter().chain(chef)
        });
        let (meals, profiles) = tokio::join!(
            lookup_one(
                self.store,
                self.joins,
                "id",
                orders.iter().map(|o| o.meal_id),
                |m: &Meal| m.id,
            ),
            self.names(people),
        );

        orders
            .into_iter()
            .map(|order| {
                let meal = meals.get(&order.meal_id);
                let name_of = |id: &UserId, fallback: &str| {
                    profiles
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| fallback.to_string())
                };
                OrderLine {
                    meal_title: meal
                        .map(|m| m.title.clone())
                        .unwrap_or_else(|| names.meal.to_string()),
                    meal_image_url: meal.and_then(|m| m.image_url.clone()),
                    customer_name: names.customer.map(|f| name_of(&order.customer_id, f)),
                    chef_name: names.chef.map(|f| name_of(&order.chef_id, f)),
                    order,
                }
            })
            .collect()
    }

    pub async fn order(&self, id: OrderId) -> AppResult<Order> {
        self.store.find(id.as_uuid()).await
    }

    /// A customer's orders, newest first, with meal and chef names.
    pub async fn customer_orders(&self, customer: UserId) -> AppResult<Vec<OrderLine>> {
        let orders = self
            .store
            .select(Query::<Order>::new().eq("customer_id", customer).newest_first())
            .await?;
        Ok(self
            .order_lines(
                orders,
                LineNames {
                    meal: fallback::UNKNOWN_MEAL,
                    customer: None,
                    chef: Some(fallback::UNKNOWN_CHEF),
                },
            )
            .await)
    }

    /// Orders placed with a chef, newest first, with meal and customer names.
    pub async fn chef_orders(&self, chef: UserId) -> AppResult<Vec<OrderLine>> {
        let orders = self
            .store
            .select(Query::<Order>::new().eq("chef_id", chef).newest_first())
            .await?;
        Ok(self
            .order_lines(
                orders,
                LineNames {
                    meal: fallback::UNKNOWN_MEAL,
                    customer: Some(fallback::CUSTOMER),
                    chef: None,
                },
            )
            .await)
    }

    /// Every order on the platform, newest first.
    pub async fn all_orders(&self) -> AppResult<Vec<OrderLine>> {
        let orders = self
            .store
            .select(Query::<Order>::new().newest_first())
            .await?;
        Ok(self
            .order_lines(
                orders,
                LineNames {
                    meal: fallback::UNKNOWN,
                    customer: Some(fallback::CUSTOMER),
                    chef: Some(fallback::CHEF),
                },
            )
            .await)
    }

    /// Write a pending order and its single line item.
    pub async fn place_order(&self, customer: UserId, meal_id: MealId, request: OrderRequest) -> AppResult<Order> {
        if request.quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        let meal = self.meal(meal_id).await?;
        if !meal.available {
            return Err(AppError::validation("This dish is not available right now"));
        }
        if !meal.accepts_quantity(request.quantity) {
            return Err(AppError::validation("Quantity is outside what this dish allows"));
        }
        let spice_level = optional(request.spice_level);
        let oil_preference = optional(request.oil_preference);
        check_choice(&spice_level, &meal.spice_levels, "spice level")?;
        check_choice(&oil_preference, &meal.oil_options, "oil option")?;

        let now = Utc::now();
        let total_price = meal.price * f64::from(request.quantity);
        let order = self
            .store
            .insert(Order {
                id: OrderId::new(),
                meal_id: meal.id,
                customer_id: customer,
                chef_id: meal.chef_id,
                quantity: request.quantity,
                total_price,
                status: OrderStatus::Pending,
                delivery_partner_id: None,
                delivery_instructions: optional(request.delivery_instructions),
                created_at: now,
                updated_at: now,
            })
            .await?;

        let item = OrderItem {
            id: OrderItemId::new(),
            order_id: order.id,
            meal_id: meal.id,
            quantity: request.quantity,
            price_per_unit: meal.price,
            subtotal: total_price,
            spice_level,
            oil_preference,
            created_at: now,
        };
        if let Err(err) = self.store.insert(item).await {
            tracing::error!(order_id = %order.id, error = %err, "order item write failed, withdrawing order");
            if let Err(cleanup) = self.store.delete::<Order>(order.id.as_uuid()).await {
                tracing::warn!(order_id = %order.id, error = %cleanup, "could not withdraw order");
            }
            return Err(err);
        }

        tracing::info!(order_id = %order.id, %customer, total_price, "order placed");
        Ok(order)
    }

    /// Move an order one step, if `actor` may make that step on this order.
    pub async fn transition_order(
        &self,
        id: OrderId,
        next: OrderStatus,
        actor: Actor,
        by: UserId,
    ) -> AppResult<Order> {
        let order = self.order(id).await?;
        let owns = match actor {
            Actor::Customer => order.customer_id == by,
            Actor::Chef => order.chef_id == by,
            Actor::Admin | Actor::System => true,
        };
        if !owns {
            return Err(AppError::Forbidden("This order belongs to someone else".into()));
        }
        self.apply_transition(order, next, actor, Changes::new()).await
    }

    /// Delivery completion, reported from outside any screen.
    pub async fn mark_delivered(&self, id: OrderId) -> AppResult<Order> {
        let order = self.order(id).await?;
        self.apply_transition(order, OrderStatus::Delivered, Actor::System, Changes::new())
            .await
    }

    /// Admin hand-off to a delivery partner; moves the order out for delivery.
    pub async fn assign_delivery(&self, id: OrderId, partner: &str) -> AppResult<Order> {
        let partner = required(partner, "Delivery partner")?;
        let order = self.order(id).await?;
        self.apply_transition(
            order,
            OrderStatus::OutForDelivery,
            Actor::Admin,
            Changes::new().set("delivery_partner_id", partner),
        )
        .await
    }

    async fn apply_transition(
        &self,
        order: Order,
        next: OrderStatus,
        actor: Actor,
        extra: Changes,
    ) -> AppResult<Order> {
        if !order.status.allows(next, actor) {
            return Err(AppError::validation(format!(
                "Can't move an order from {} to {}",
                order.status.as_str(),
                next.as_str()
            )));
        }
        let changes = extra
            .set("status", next.as_str())
            .set("updated_at", Utc::now().to_rfc3339());
        let updated: Order = self.store.update(order.id.as_uuid(), changes).await?;
        tracing::info!(
            order_id = %order.id,
            from = order.status.as_str(),
            to = next.as_str(),
            ?actor,
            "order status changed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fetchers::{JoinStrategy, MealDraft},
        store::{MemoryStore, Table},
    };

    async fn setup(store: &MemoryStore) -> (UserId, Meal) {
        let chef = UserId::new();
        let meal = Fetch::new(store, JoinStrategy::Batched)
            .create_meal(
                chef,
                MealDraft {
                    title: "Paneer Tikka".into(),
                    description: String::new(),
                    price: 180.0,
                    category: None,
                    available: true,
                    image_url: None,
                    spice_levels: vec!["mild".into(), "hot".into()],
                    oil_options: vec![],
                    min_quantity: None,
                    max_quantity: Some(5),
                },
            )
            .await
            .unwrap();
        (chef, meal)
    }

    fn request(quantity: i32) -> OrderRequest {
        OrderRequest {
            quantity,
            spice_level: Some("hot".into()),
            oil_preference: None,
            delivery_instructions: Some("Ring twice".into()),
        }
    }

    #[tokio::test]
    async fn placing_an_order_writes_order_and_item() {
        let store = MemoryStore::new();
        let (chef, meal) = setup(&store).await;
        let customer = UserId::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);

        let order = fetch.place_order(customer, meal.id, request(2)).await.unwrap();
        assert_eq!(order.chef_id, chef);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, 360.0);

        let items = store.rows::<OrderItem>().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal, 360.0);
        assert_eq!(items[0].spice_level.as_deref(), Some("hot"));
    }

    #[tokio::test]
    async fn bad_quantities_and_choices_never_reach_the_store() {
        let store = MemoryStore::new();
        let (_, meal) = setup(&store).await;
        let fetch = Fetch::new(&store, JoinStrategy::Batched);

        for bad in [request(0), request(6)] {
            let err = fetch.place_order(UserId::new(), meal.id, bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        let mut spicy = request(1);
        spicy.spice_level = Some("volcanic".into());
        assert!(fetch.place_order(UserId::new(), meal.id, spicy).await.is_err());
        assert_eq!(store.requests(Table::Orders), 0);
    }

    #[tokio::test]
    async fn failed_item_write_withdraws_the_order() {
        let store = MemoryStore::new();
        let (_, meal) = setup(&store).await;
        store.fail_table(Table::OrderItems).unwrap();

        let err = Fetch::new(&store, JoinStrategy::Batched)
            .place_order(UserId::new(), meal.id, request(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(store.rows::<Order>().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transitions_respect_owner_and_state_machine() {
        let store = MemoryStore::new();
        let (chef, meal) = setup(&store).await;
        let customer = UserId::new();
        let fetch = Fetch::new(&store, JoinStrategy::Batched);
        let order = fetch.place_order(customer, meal.id, request(1)).await.unwrap();

        let err = fetch
            .transition_order(order.id, OrderStatus::Accepted, Actor::Chef, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = fetch
            .transition_order(order.id, OrderStatus::Preparing, Actor::Chef, chef)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        fetch
            .transition_order(order.id, OrderStatus::Accepted, Actor::Chef, chef)
            .await
            .unwrap();
        fetch
            .transition_order(order.id, OrderStatus::Preparing, Actor::Chef, chef)
            .await
            .unwrap();
        let out = fetch.assign_delivery(order.id, "DP-42").await.unwrap();
        assert_eq!(out.status, OrderStatus::OutForDelivery);
        assert_eq!(out.delivery_partner_id.as_deref(), Some("DP-42"));

        let done = fetch.mark_delivered(order.id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn blank_delivery_partner_is_rejected() {
        let store = MemoryStore::new();
        let err = Fetch::new(&store, JoinStrategy::Batched)
            .assign_delivery(OrderId::new(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn lists_keep_rows_whose_names_are_missing() {
        let store = MemoryStore::new();
        let (_, meal) = setup(&store).await;
        let fetch = Fetch::new(&store, JoinStrategy::PerRow);
        let customer = UserId::new();
        fetch.place_order(customer, meal.id, request(1)).await.unwrap();

        let lines = fetch.all_orders().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].meal_title, "Paneer Tikka");
        assert_eq!(lines[0].customer_name.as_deref(), Some(fallback::CUSTOMER));
        assert_eq!(lines[0].chef_name.as_deref(), Some(fallback::CHEF));

        let mine = fetch.customer_orders(customer).await.unwrap();
        assert_eq!(mine[0].chef_name.as_deref(), Some(fallback::UNKNOWN_CHEF));
        assert_eq!(mine[0].customer_name, None);
    }
}
