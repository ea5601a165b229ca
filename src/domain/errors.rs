use std::fmt;

use thiserror::Error;

/// Remote dependency a lookup was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Account,
    Catalog,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Account => f.write_str("account service"),
            Dependency::Catalog => f.write_str("catalog service"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Products not found: {}", .0.join(", "))]
    ProductNotFound(Vec<String>),
    #[error("{dependency} unavailable: {reason}")]
    LookupUnavailable {
        dependency: Dependency,
        reason: String,
    },
    #[error("Order store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Order store write failed: {0}")]
    StoreWriteFailed(String),
    #[error("Deadline exceeded before {0}")]
    DeadlineExceeded(&'static str),
}

impl DomainError {
    pub fn lookup(dependency: Dependency, err: LookupError) -> Self {
        DomainError::LookupUnavailable {
            dependency,
            reason: err.to_string(),
        }
    }
}

/// Failure talking to a remote lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("timed out after {0} ms")]
    Timeout(u128),
}

/// Failure reported by an `OrderRepository`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    WriteFailed(String),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => DomainError::StoreUnavailable(msg),
            StoreError::WriteFailed(msg) => DomainError::StoreWriteFailed(msg),
        }
    }
}
