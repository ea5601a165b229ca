use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::order::{LineItem, Order, Product};

/// A field that could not be resolved. Its value is `null` in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Partial-result envelope: `data` is always present, failed nested fields
/// are reported in `errors`.
#[derive(Debug, Serialize)]
pub struct GatewayResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> GatewayResponse<T> {
    pub fn complete(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountNode {
    pub id: String,
    pub name: String,
    /// Absent when not requested, `null` when resolution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<OrderNode>>)]
    pub orders: Option<Option<Vec<OrderNode>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderNode {
    pub id: String,
    pub created_at: String,
    pub total_price: String,
    pub products: Vec<OrderedProductNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderedProductNode {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductNode {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderProductInput {
    pub id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderInput {
    pub account_id: String,
    pub products: Vec<OrderProductInput>,
}

impl From<&LineItem> for OrderedProductNode {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.product_id.clone(),
            name: item.display_name().to_string(),
            description: item.display_description().to_string(),
            price: item.current_price().to_string(),
            quantity: item.quantity,
        }
    }
}

impl From<&Order> for OrderNode {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            created_at: order.created_at.to_rfc3339(),
            total_price: order.total_price.to_string(),
            products: order.line_items.iter().map(OrderedProductNode::from).collect(),
        }
    }
}

impl From<Product> for ProductNode {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.to_string(),
        }
    }
}
