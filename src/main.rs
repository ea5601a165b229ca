use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use order_service::config::Config;
use order_service::infrastructure::http_clients::{HttpAccountClient, HttpCatalogClient};
use order_service::infrastructure::order_repo::DieselOrderRepository;
use order_service::{build_server, create_pool, run_migrations, Gateway, OrderService};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(|e| startup_error("failed to create database pool", e))?;
    run_migrations(&pool).map_err(|e| startup_error("failed to run database migrations", e))?;

    let accounts = HttpAccountClient::new(&config.account_service_url, config.lookup_timeout)
        .map_err(|e| startup_error("account service client", e))?;
    let catalog = HttpCatalogClient::new(&config.catalog_service_url, config.lookup_timeout)
        .map_err(|e| startup_error("catalog service client", e))?;

    let service = OrderService::new(
        Arc::new(DieselOrderRepository::new(pool)),
        Arc::new(accounts),
        Arc::new(catalog),
    )
    .with_timeouts(config.service_timeouts());
    let gateway = Gateway::over(service.clone()).with_field_timeout(config.gateway_field_timeout);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(service, gateway, &config.host, config.port)?.await
}
