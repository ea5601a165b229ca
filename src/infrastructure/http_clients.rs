//! JSON-over-HTTP clients for the account and catalog services.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::errors::LookupError;
use crate::domain::order::{Account, Product, ProductQuery};
use crate::domain::ports::{AccountLookup, ProductLookup};

fn build_client(timeout: Duration) -> Result<Client, LookupError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LookupError::Transport(e.to_string()))
}

fn parse_base(base_url: &str) -> Result<Url, LookupError> {
    let url = Url::parse(base_url).map_err(|e| LookupError::Transport(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(LookupError::Transport(format!("{base_url} cannot be a base URL")));
    }
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn transport(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Transport(format!("request timed out: {e}"))
    } else {
        LookupError::Transport(e.to_string())
    }
}

async fn unexpected(resp: reqwest::Response) -> LookupError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    LookupError::Status { status, body }
}

// ── Account service ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AccountPayload {
    id: String,
    name: String,
}

/// `GET {base}/accounts/{id}`; a 404 means the account does not exist.
#[derive(Debug, Clone)]
pub struct HttpAccountClient {
    http: Client,
    base: Url,
}

impl HttpAccountClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            http: build_client(timeout)?,
            base: parse_base(base_url)?,
        })
    }
}

#[async_trait]
impl AccountLookup for HttpAccountClient {
    async fn get_account(&self, id: &str) -> Result<Option<Account>, LookupError> {
        let resp = self
            .http
            .get(endpoint(&self.base, &["accounts", id]))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let payload: AccountPayload = resp
                    .json()
                    .await
                    .map_err(|e| LookupError::Decode(e.to_string()))?;
                Ok(Some(Account {
                    id: payload.id,
                    name: payload.name,
                }))
            }
            _ => Err(unexpected(resp).await),
        }
    }
}

// ── Catalog service ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    skip: u64,
    take: u64,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    products: Vec<ProductPayload>,
}

/// The catalog may send prices as JSON numbers or as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePrice {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    price: WirePrice,
}

impl TryFrom<ProductPayload> for Product {
    type Error = LookupError;

    fn try_from(p: ProductPayload) -> Result<Self, Self::Error> {
        let raw = match &p.price {
            WirePrice::Text(s) => s.trim().to_string(),
            WirePrice::Number(n) => n.to_string(),
        };
        let price = BigDecimal::from_str(&raw)
            .map_err(|e| LookupError::Decode(format!("price {raw:?} of product {}: {e}", p.id)))?;
        Ok(Product {
            id: p.id,
            name: p.name,
            description: p.description,
            price,
        })
    }
}

/// `POST {base}/products/lookup` with the query as JSON.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: Client,
    base: Url,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        Ok(Self {
            http: build_client(timeout)?,
            base: parse_base(base_url)?,
        })
    }
}

#[async_trait]
impl ProductLookup for HttpCatalogClient {
    async fn get_products(&self, query: ProductQuery) -> Result<Vec<Product>, LookupError> {
        let body = LookupRequest {
            ids: &query.ids,
            query: query.query.as_deref(),
            skip: query.skip,
            take: if query.ids.is_empty() {
                query.effective_take()
            } else {
                query.ids.len() as u64
            },
        };
        let resp = self
            .http
            .post(endpoint(&self.base, &["products", "lookup"]))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(unexpected(resp).await);
        }
        let payload: LookupResponse = resp
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        payload.products.into_iter().map(Product::try_from).collect()
    }
}
