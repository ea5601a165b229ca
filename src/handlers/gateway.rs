use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::AppError;
use crate::gateway::nodes::{AccountNode, OrderInput, OrderNode, ProductNode};
use crate::gateway::Gateway;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccountParams {
    /// Comma-separated nested fields to resolve, e.g. `orders`.
    #[serde(default)]
    pub fields: Option<String>,
}

impl AccountParams {
    fn wants(&self, field: &str) -> bool {
        self.fields
            .as_deref()
            .map_or(false, |f| f.split(',').any(|s| s.trim() == field))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductParams {
    pub id: Option<String>,
    pub query: Option<String>,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub take: u64,
}

/// GET /gateway/accounts/{id}
///
/// Account with optional nested orders. A nested field that fails or times
/// out is returned as `null` and described in `errors`.
#[utoipa::path(
    get,
    path = "/gateway/accounts/{id}",
    params(
        ("id" = String, Path, description = "Account identifier"),
        AccountParams,
    ),
    responses(
        (status = 200, description = "Account, possibly with field errors", body = AccountNode),
        (status = 404, description = "Account not found"),
        (status = 504, description = "Account lookup timed out"),
    ),
    tag = "gateway"
)]
pub async fn account(
    gateway: web::Data<Gateway>,
    path: web::Path<String>,
    params: web::Query<AccountParams>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let response = gateway.account(&id, params.wants("orders")).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /gateway/products
///
/// One product by `id`, or a page of the catalog filtered by `query`.
#[utoipa::path(
    get,
    path = "/gateway/products",
    params(ProductParams),
    responses(
        (status = 200, description = "Matching products", body = [ProductNode]),
        (status = 404, description = "Product not found"),
    ),
    tag = "gateway"
)]
pub async fn products(
    gateway: web::Data<Gateway>,
    params: web::Query<ProductParams>,
) -> Result<HttpResponse, AppError> {
    let ProductParams {
        id,
        query,
        skip,
        take,
    } = params.into_inner();
    let products = gateway.products(id, query, skip, take).await?;
    Ok(HttpResponse::Ok().json(products))
}

/// POST /gateway/orders
#[utoipa::path(
    post,
    path = "/gateway/orders",
    request_body = OrderInput,
    responses(
        (status = 201, description = "Order created", body = OrderNode),
        (status = 400, description = "Invalid parameter"),
        (status = 504, description = "Order service timed out"),
    ),
    tag = "gateway"
)]
pub async fn create_order(
    gateway: web::Data<Gateway>,
    body: web::Json<OrderInput>,
) -> Result<HttpResponse, AppError> {
    let order = gateway.create_order(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}
