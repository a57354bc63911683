//! HTTP client for the Shopaholic backend.
//!
//! # Architecture
//!
//! - JSON over `reqwest`; the backend is the source of truth for the catalog
//! - Catalog reads are cached in memory via `moka` (TTL from configuration)
//! - Admin writes invalidate the whole catalog cache
//!
//! # Endpoints
//!
//! - `GET /products[?category=C]`, `GET /products/{id}`
//! - `POST /login`, `POST /signup`
//! - `POST /payment`
//! - `POST /products`, `PUT /products/{id}`, `DELETE /products/{id}`
//!
//! # Example
//!
//! ```rust,ignore
//! use shopaholic_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let drinks = client.list_products(Some("Cool Drinks")).await?;
//! ```

mod cache;
mod types;

pub use types::{
    AccountDetails, PaymentItem, PaymentReceipt, PaymentRequest, SignupForm, items_subtotal,
};

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use shopaholic_core::{Email, Product, ProductDraft, ProductId, User};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};
use types::{Envelope, ErrorBody, LoginResponse};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The configured base URL cannot have endpoint paths appended.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Longest slice of a response body copied into logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot take endpoint paths or the
    /// HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.to_string()));
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Append `segments` to the base URL. Each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(
                message.unwrap_or_else(|| "resource not found".to_string()),
            ));
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %truncate(&body),
                "Backend returned server error"
            );
        } else {
            tracing::warn!(status = %status, message = ?message, "Backend rejected request");
        }

        Err(ApiError::Rejected(
            message.unwrap_or_else(|| format!("HTTP {status}")),
        ))
    }

    /// Send a request and parse the JSON body of a successful response.
    async fn execute_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List products, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let cache_key = CacheKey::Products {
            category: category.map(str::to_owned),
        };

        // Check cache
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }

        let products: Vec<Product> = self.execute_json(self.inner.client.get(url)).await?;
        debug!(count = products.len(), "Fetched products");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        let cache_key = CacheKey::Product(id.clone());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let product: Product = self
            .execute_json(self.inner.client.get(url))
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound(format!("Product not found: {id}")),
                other => other,
            })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
        debug!("Catalog cache invalidated");
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Exchange credentials for the shopper's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the backend's message (e.g.
    /// "Invalid credentials"), or an error if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User> {
        let url = self.endpoint(&["login"])?;
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let response: LoginResponse = self
            .execute_json(self.inner.client.post(url).json(&body))
            .await?;
        debug!("Login accepted");
        Ok(response.user)
    }

    /// Register a new shopper.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected("User already exists")` for a duplicate
    /// email, or an error if the request fails.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn signup(&self, form: &SignupForm) -> Result<()> {
        let url = self.endpoint(&["signup"])?;
        self.execute(self.inner.client.post(url).json(&form.to_payload()))
            .await?;
        debug!("Signup accepted");
        Ok(())
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Submit a payment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` carrying the backend's message when the
    /// payment is refused, or an error if the request fails.
    #[instrument(
        skip(self, request),
        fields(
            method = %request.method,
            items = request.items.len(),
            subtotal = %items_subtotal(&request.items),
            discount = request.discount(),
        )
    )]
    pub async fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        let url = self.endpoint(&["payment"])?;
        let receipt: PaymentReceipt = self
            .execute_json(self.inner.client.post(url).json(&request.to_payload()))
            .await?;

        if !receipt.is_accepted() {
            let message = receipt
                .error
                .clone()
                .unwrap_or_else(|| "Payment failed".to_string());
            tracing::warn!(message = %message, "Payment declined");
            return Err(ApiError::Rejected(message));
        }

        debug!(session_id = ?receipt.session_id, "Payment accepted");
        Ok(receipt)
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================

    /// Create a product. Blank image URLs are dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the draft or the request
    /// fails.
    #[instrument(skip(self, draft), fields(category = %draft.category, brand = %draft.brand))]
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        let url = self.endpoint(&["products"])?;
        let draft = draft.cleaned();
        let envelope: Envelope<Product> = self
            .execute_json(self.inner.client.post(url).json(&draft))
            .await?;
        let product = accepted(envelope, "created product")?;
        self.invalidate_cache();
        tracing::info!(id = %product.id, "Created product");
        Ok(product)
    }

    /// Replace a product's fields. Blank image URLs are dropped first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or an error if the
    /// backend refuses the draft or the request fails.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update_product(&self, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let draft = draft.cleaned();
        let envelope: Envelope<Product> = self
            .execute_json(self.inner.client.put(url).json(&draft))
            .await?;
        let product = accepted(envelope, "updated product")?;
        self.invalidate_cache();
        tracing::info!(id = %product.id, "Updated product");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or an error if the
    /// request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let envelope: Envelope<IgnoredAny> =
            self.execute_json(self.inner.client.delete(url)).await?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| "delete failed".to_string()),
            ));
        }
        self.invalidate_cache();
        tracing::info!("Deleted product");
        Ok(())
    }
}

/// Unwrap a `{success, data, error}` envelope.
fn accepted(envelope: Envelope<Product>, what: &str) -> Result<Product> {
    match envelope {
        Envelope {
            success: true,
            data: Some(product),
            ..
        } => Ok(product),
        Envelope { error: Some(e), .. } => Err(ApiError::Rejected(e)),
        Envelope { .. } => Err(ApiError::Rejected(format!("backend returned no {what}"))),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
