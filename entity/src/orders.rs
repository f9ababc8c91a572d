use crate::order_status::OrderStatus;
use crate::payment_method::PaymentMethod;
use crate::Id;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "orders";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Id,

    pub user_id: Id,

    pub order_number: String,

    #[serde(default)]
    pub items: Vec<OrderItem>,

    #[serde(default)]
    pub total: f64,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,

    pub created_at: DateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub title: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}
