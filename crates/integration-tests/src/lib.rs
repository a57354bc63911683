//! Integration tests for Shopaholic.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopaholic-integration-tests
//! ```
//!
//! No external services are needed: [`StubBackend`] serves the backend API
//! from an in-process `axum` server bound to `127.0.0.1:0`.
//!
//! # Test Categories
//!
//! - `api_client` - HTTP client against the stub backend
//! - `cross_tab` - Several sessions sharing one storage
//! - `scenarios` - End-to-end shopping flows
//! - `checkout` - Payment success and failure handling

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopaholic_core::{Email, Price, Product, ProductDraft, ProductId, User};
use shopaholic_storefront::api::ApiClient;
use shopaholic_storefront::config::ApiConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Password every seeded account accepts.
pub const PASSWORD: &str = "correct horse";

/// A catalog product with no optional fields.
#[must_use]
pub fn product(id: &str, category: &str, brand: &str, price: u32) -> Product {
    Product {
        id: ProductId::new(id),
        category: category.to_owned(),
        brand: brand.to_owned(),
        price: Price::from_whole(price),
        name: None,
        description: None,
        images: Vec::new(),
        new_arrival: false,
        best_seller: false,
    }
}

/// A shopper profile.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn user(name: &str, email: &str) -> User {
    User {
        name: name.to_owned(),
        email: Email::parse(email).unwrap(),
        joined: None,
        phone: None,
        date_of_birth: None,
    }
}

/// In-memory stand-in for the backend.
#[derive(Default)]
pub struct StubBackend {
    products: Mutex<Vec<Product>>,
    users: Mutex<Vec<User>>,
    payments: Mutex<Vec<Value>>,
    decline_payments: AtomicBool,
    product_list_hits: AtomicUsize,
    next_id: AtomicUsize,
}

impl StubBackend {
    /// Backend serving `products` with no accounts.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(products),
            ..Self::default()
        })
    }

    /// Register an account that logs in with [`PASSWORD`].
    pub fn add_user(&self, user: User) {
        lock(&self.users).push(user);
    }

    /// Make subsequent payments fail with "Card declined".
    pub fn decline_payments(&self, decline: bool) {
        self.decline_payments.store(decline, Ordering::SeqCst);
    }

    /// Payment payloads received so far.
    #[must_use]
    pub fn payments(&self) -> Vec<Value> {
        lock(&self.payments).clone()
    }

    /// Number of `GET /products` requests served.
    #[must_use]
    pub fn product_list_hits(&self) -> usize {
        self.product_list_hits.load(Ordering::SeqCst)
    }

    fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/products", get(list_products).post(create_product))
            .route(
                "/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/login", post(login))
            .route("/signup", post(signup))
            .route("/payment", post(payment))
            .with_state(self)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running stub server.
pub struct StubServer {
    pub addr: SocketAddr,
    pub backend: Arc<StubBackend>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl StubServer {
    /// Serve `backend` on an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound.
    pub async fn start(backend: Arc<StubBackend>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Arc::clone(&backend).router();
        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(Self {
            addr,
            backend,
            handle,
        })
    }

    /// Base URL of the stub API.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a valid URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// Client configured for this server with the given cache lifetime.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn client_with_ttl(&self, ttl: Duration) -> ApiClient {
        let mut config = ApiConfig::new(self.base_url());
        config.catalog_cache_ttl = ttl;
        config.request_timeout = Duration::from_secs(5);
        ApiClient::new(&config).unwrap()
    }

    /// Client configured for this server.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.client_with_ttl(Duration::from_secs(300))
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

type Backend = State<Arc<StubBackend>>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

async fn list_products(
    State(backend): Backend,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Product>> {
    backend.product_list_hits.fetch_add(1, Ordering::SeqCst);
    let products = lock(&backend.products);
    let listed = products
        .iter()
        .filter(|p| params.get("category").is_none_or(|c| &p.category == c))
        .cloned()
        .collect();
    Json(listed)
}

async fn get_product(State(backend): Backend, Path(id): Path<String>) -> Response {
    let products = lock(&backend.products);
    products.iter().find(|p| p.id.as_str() == id).map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p.clone()).into_response(),
    )
}

fn from_draft(id: ProductId, draft: ProductDraft) -> Product {
    Product {
        id,
        category: draft.category,
        brand: draft.brand,
        price: draft.price,
        name: None,
        description: draft.description,
        images: draft.images,
        new_arrival: draft.new_arrival,
        best_seller: draft.best_seller,
    }
}

async fn create_product(State(backend): Backend, Json(draft): Json<ProductDraft>) -> Response {
    if draft.brand.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "brand is required");
    }
    let n = backend.next_id.fetch_add(1, Ordering::SeqCst);
    let product = from_draft(ProductId::new(format!("new{n}")), draft);
    lock(&backend.products).push(product.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": product })),
    )
        .into_response()
}

async fn update_product(
    State(backend): Backend,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Response {
    let mut products = lock(&backend.products);
    let Some(slot) = products.iter_mut().find(|p| p.id.as_str() == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    *slot = from_draft(ProductId::new(id), draft);
    Json(json!({ "success": true, "data": slot.clone() })).into_response()
}

async fn delete_product(State(backend): Backend, Path(id): Path<String>) -> Response {
    let mut products = lock(&backend.products);
    let before = products.len();
    products.retain(|p| p.id.as_str() != id);
    if products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "success": true, "message": "Product deleted successfully" })).into_response()
}

async fn login(State(backend): Backend, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let users = lock(&backend.users);
    match users.iter().find(|u| u.email.as_str() == email) {
        Some(user) if password == PASSWORD => Json(json!({ "user": user })).into_response(),
        _ => error(StatusCode::BAD_REQUEST, "Invalid credentials"),
    }
}

async fn signup(State(backend): Backend, Json(body): Json<Value>) -> Response {
    let Ok(email) = Email::parse(body["email"].as_str().unwrap_or_default()) else {
        return error(StatusCode::BAD_REQUEST, "Server error");
    };
    let mut users = lock(&backend.users);
    if users.iter().any(|u| u.email == email) {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }
    users.push(User {
        name: body["name"].as_str().unwrap_or_default().to_owned(),
        email,
        joined: None,
        phone: body["phone"].as_str().map(str::to_owned),
        date_of_birth: None,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    )
        .into_response()
}

async fn payment(State(backend): Backend, Json(body): Json<Value>) -> Response {
    lock(&backend.payments).push(body);
    if backend.decline_payments.load(Ordering::SeqCst) {
        return error(StatusCode::BAD_REQUEST, "Card declined");
    }
    Json(json!({ "success": true })).into_response()
}
