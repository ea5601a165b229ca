pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::order_service::OrderService;
pub use db::{create_pool, DbPool};
pub use gateway::Gateway;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migration(s)", applied.len());
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_account_orders,
        handlers::gateway::account,
        handlers::gateway::products,
        handlers::gateway::create_order,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::OrderedProductRequest,
        handlers::orders::OrderResponse,
        handlers::orders::LineItemResponse,
        handlers::orders::CurrentProductResponse,
        gateway::nodes::AccountNode,
        gateway::nodes::OrderNode,
        gateway::nodes::OrderedProductNode,
        gateway::nodes::ProductNode,
        gateway::nodes::OrderInput,
        gateway::nodes::OrderProductInput,
        gateway::nodes::FieldError,
    )),
    tags(
        (name = "orders", description = "Order creation and account order history"),
        (name = "gateway", description = "Aggregated account, catalog and order view"),
    )
)]
pub struct ApiDoc;

/// Registers every route. Callers provide `web::Data<OrderService>` and
/// `web::Data<Gateway>` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/orders").route("", web::post().to(handlers::orders::create_order)))
        .route(
            "/accounts/{account_id}/orders",
            web::get().to(handlers::orders::list_account_orders),
        )
        .service(
            web::scope("/gateway")
                .route("/accounts/{id}", web::get().to(handlers::gateway::account))
                .route("/products", web::get().to(handlers::gateway::products))
                .route("/orders", web::post().to(handlers::gateway::create_order)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: OrderService,
    gateway: Gateway,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);
    let gateway = web::Data::new(gateway);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(gateway.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
