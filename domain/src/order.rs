use crate::error::Error;
use crate::rfc3339;
use async_trait::async_trait;
use entity::orders;
use entity_api::order;
use events::{BoxError, ViewProjection};
use mongodb::Database;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

pub const PENDING_ORDERS_EVENT: &str = "pending_orders";
pub const PENDING_ORDERS_CHANNEL: &str = "orders:pending";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    #[serde(rename = "_id")]
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub items: Vec<OrderItemView>,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub quantity: i32,
}

impl From<&orders::Model> for PendingOrder {
    fn from(order: &orders::Model) -> Self {
        Self {
            id: order.id.to_hex(),
            order_number: order.order_number.clone(),
            user_id: order.user_id.to_hex(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            total: order.total,
            payment_method: order.payment_method.map(|method| method.to_string()),
            created_at: rfc3339(&order.created_at),
        }
    }
}

/// Orders still awaiting completion, newest first.
pub async fn find_pending(db: &Database) -> Result<Vec<PendingOrder>, Error> {
    let orders = order::find_pending(db).await?;
    Ok(orders.iter().map(PendingOrder::from).collect())
}

/// Recomputes [`find_pending`] for the `orders` watcher.
pub struct PendingOrdersProjection {
    db: Database,
}

impl PendingOrdersProjection {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ViewProjection for PendingOrdersProjection {
    fn event_type(&self) -> &'static str {
        PENDING_ORDERS_EVENT
    }

    fn channel(&self) -> &'static str {
        PENDING_ORDERS_CHANNEL
    }

    async fn project(&self) -> Result<Value, BoxError> {
        let orders = find_pending(&self.db).await?;
        Ok(serde_json::to_value(orders)?)
    }
}
