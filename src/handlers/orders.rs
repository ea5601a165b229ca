use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::order_service::OrderService;
use crate::domain::order::{LineItem, Order, RequestedItem};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderedProductRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub account_id: String,
    pub products: Vec<OrderedProductRequest>,
}

/// Current catalog data for a line item, when the catalog still has it.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentProductResponse {
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    pub product_id: String,
    pub quantity: i32,
    /// Decimal string, e.g. "9.99". This is the price the order was billed at.
    pub price_at_order_time: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentProductResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub account_id: String,
    pub created_at: String,
    pub total_price: String,
    pub products: Vec<LineItemResponse>,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            price_at_order_time: item.price_at_order_time.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            current: item.live.as_ref().map(|p| CurrentProductResponse {
                name: p.name.clone(),
                description: p.description.clone(),
                price: p.price.to_string(),
            }),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            account_id: order.account_id.clone(),
            created_at: order.created_at.to_rfc3339(),
            total_price: order.total_price.to_string(),
            products: order.line_items.iter().map(LineItemResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates an order for an existing account. Product names, descriptions and
/// prices are taken from the catalog at this moment and stored with the order.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Missing account, no products, or non-positive quantity"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "One or more products are not in the catalog"),
        (status = 503, description = "Account service, catalog or order store unavailable"),
        (status = 504, description = "Request deadline exceeded"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = body
        .products
        .into_iter()
        .map(|p| RequestedItem::new(p.product_id, p.quantity))
        .collect();

    let order = service.create_order(&body.account_id, items).await?;

    Ok(HttpResponse::Created().json(OrderResponse::from(&order)))
}

/// GET /accounts/{account_id}/orders
///
/// Returns every order of the account, oldest first, with its line items.
#[utoipa::path(
    get,
    path = "/accounts/{account_id}/orders",
    params(
        ("account_id" = String, Path, description = "Account identifier"),
    ),
    responses(
        (status = 200, description = "Orders of the account", body = [OrderResponse]),
        (status = 503, description = "Order store unavailable"),
    ),
    tag = "orders"
)]
pub async fn list_account_orders(
    service: web::Data<OrderService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let account_id = path.into_inner();

    let orders = service.get_orders_for_account(&account_id).await?;

    let body: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
