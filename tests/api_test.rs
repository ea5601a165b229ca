//! HTTP-level tests against the in-memory adapters.
//!
//! The Postgres repository has its own container-backed tests in
//! `src/infrastructure/order_repo.rs`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use order_service::domain::order::Product;
use order_service::infrastructure::memory::{
    InMemoryAccounts, InMemoryCatalog, InMemoryOrderRepository,
};
use order_service::{configure, Gateway, OrderService};
use serde_json::{json, Value};

fn product(id: &str, name: &str, price: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        price: BigDecimal::from_str(price).unwrap(),
    }
}

struct Harness {
    repo: Arc<InMemoryOrderRepository>,
    catalog: Arc<InMemoryCatalog>,
    service: OrderService,
}

fn harness() -> Harness {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let accounts = Arc::new(InMemoryAccounts::new().with_account("A1", "Alice"));
    let catalog = Arc::new(
        InMemoryCatalog::new()
            .with_product(product("P1", "Kettle", "10.00"))
            .with_product(product("P2", "Mug", "5.00")),
    );
    let service = OrderService::new(repo.clone(), accounts, catalog.clone());
    Harness {
        repo,
        catalog,
        service,
    }
}

macro_rules! app {
    ($service:expr, $gateway:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service))
                .app_data(web::Data::new($gateway))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn create_order_returns_201_with_snapshot_and_total() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [
                { "product_id": "P1", "quantity": 2 },
                { "product_id": "P2", "quantity": 1 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["account_id"], "A1");
    assert_eq!(body["total_price"], "25.00");
    assert_eq!(body["products"][0]["name"], "Kettle");
    assert_eq!(body["products"][0]["price_at_order_time"], "10.00");
    assert_eq!(body["products"][1]["quantity"], 1);
    assert_eq!(h.repo.write_count(), 1);
}

#[actix_web::test]
async fn history_keeps_billed_prices_after_catalog_changes() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let create = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [{ "product_id": "P1", "quantity": 3 }]
        }))
        .to_request();
    assert_eq!(test::call_service(&app, create).await.status(), StatusCode::CREATED);

    h.catalog.upsert(product("P1", "Kettle Pro", "12.50"));

    let req = test::TestRequest::get()
        .uri("/accounts/A1/orders")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["total_price"], "30.00");
    let line = &orders[0]["products"][0];
    assert_eq!(line["price_at_order_time"], "10.00");
    assert_eq!(line["name"], "Kettle");
    assert_eq!(line["current"]["name"], "Kettle Pro");
    assert_eq!(line["current"]["price"], "12.50");
}

#[actix_web::test]
async fn history_of_unknown_account_is_empty() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::get()
        .uri("/accounts/nobody/orders")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn unknown_account_returns_404() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A9",
            "products": [{ "product_id": "P1", "quantity": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(h.repo.write_count(), 0);
}

#[actix_web::test]
async fn unknown_product_returns_422_with_missing_ids() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [
                { "product_id": "P1", "quantity": 1 },
                { "product_id": "P404", "quantity": 1 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["missing_product_ids"], json!(["P404"]));
    assert_eq!(h.repo.write_count(), 0);
}

#[actix_web::test]
async fn non_positive_quantity_returns_400() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [{ "product_id": "P1", "quantity": 0 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn catalog_outage_on_create_returns_503() {
    let h = harness();
    h.catalog.set_unavailable(true);
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [{ "product_id": "P1", "quantity": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Internal server error");
}

#[actix_web::test]
async fn gateway_account_includes_orders_only_when_asked() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let create = test::TestRequest::post()
        .uri("/gateway/orders")
        .set_json(json!({
            "account_id": "A1",
            "products": [{ "id": "P2", "quantity": 4 }]
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, create).await;
    assert_eq!(created["total_price"], "20.00");

    let bare = test::TestRequest::get().uri("/gateway/accounts/A1").to_request();
    let bare: Value = test::call_and_read_body_json(&app, bare).await;
    assert_eq!(bare["data"]["name"], "Alice");
    assert!(bare["data"].get("orders").is_none());
    assert!(bare.get("errors").is_none());

    let nested = test::TestRequest::get()
        .uri("/gateway/accounts/A1?fields=orders")
        .to_request();
    let nested: Value = test::call_and_read_body_json(&app, nested).await;
    let orders = nested["data"]["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["products"][0]["id"], "P2");
    assert_eq!(orders[0]["products"][0]["quantity"], 4);
}

#[actix_web::test]
async fn gateway_reports_failed_orders_field_next_to_account_data() {
    let h = harness();
    h.repo.set_fail_reads(true);
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let req = test::TestRequest::get()
        .uri("/gateway/accounts/A1?fields=orders")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["id"], "A1");
    assert!(body["data"]["orders"].is_null());
    assert_eq!(body["errors"][0]["path"], "account.orders");
}

#[actix_web::test]
async fn gateway_product_search_and_lookup() {
    let h = harness();
    let gateway = Gateway::over(h.service.clone());
    let app = app!(h.service, gateway);

    let search = test::TestRequest::get()
        .uri("/gateway/products?query=mug")
        .to_request();
    let found: Value = test::call_and_read_body_json(&app, search).await;
    assert_eq!(found, json!([{
        "id": "P2",
        "name": "Mug",
        "description": "Mug description",
        "price": "5.00"
    }]));

    let missing = test::TestRequest::get()
        .uri("/gateway/products?id=P404")
        .to_request();
    assert_eq!(
        test::call_service(&app, missing).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn slow_catalog_on_gateway_returns_504() {
    let h = harness();
    h.catalog.set_delay(Some(Duration::from_millis(300)));
    let gateway = Gateway::over(h.service.clone()).with_field_timeout(Duration::from_millis(50));
    let app = app!(h.service, gateway);

    let req = test::TestRequest::get()
        .uri("/gateway/products?query=kettle")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
}
