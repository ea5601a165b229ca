use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Products not found")]
    UnknownProducts(Vec<String>),

    #[error("Upstream timed out: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidArgument(msg) => AppError::BadRequest(msg),
            DomainError::AccountNotFound(id) => AppError::NotFound(format!("Account {id} not found")),
            DomainError::ProductNotFound(ids) => AppError::UnknownProducts(ids),
            DomainError::DeadlineExceeded(stage) => AppError::Timeout(stage.to_string()),
            e @ (DomainError::LookupUnavailable { .. } | DomainError::StoreUnavailable(_)) => {
                AppError::Unavailable(e.to_string())
            }
            e @ DomainError::StoreWriteFailed(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidParameter(msg) => AppError::BadRequest(msg),
            GatewayError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            e @ GatewayError::Timeout { .. } => AppError::Timeout(e.to_string()),
            e @ GatewayError::Upstream(_) => AppError::Unavailable(e.to_string()),
            GatewayError::Order(inner) => inner.into(),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnknownProducts(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::BadRequest(_) | AppError::NotFound(_) => serde_json::json!({
                "error": self.to_string()
            }),
            AppError::UnknownProducts(ids) => serde_json::json!({
                "error": self.to_string(),
                "missing_product_ids": ids
            }),
            AppError::Timeout(_) | AppError::Unavailable(_) | AppError::Internal(_) => {
                log::error!("request failed: {}", self);
                serde_json::json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
