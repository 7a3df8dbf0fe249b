use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shopsearch_core::lenient;
use shopsearch_core::loader::load_products;
use shopsearch_core::{CacheConfig, IndexStats, SearchEngine, SearchResponse};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod catalog;
pub mod error;

use catalog::{Catalog, MetadataUpdate, ProductDraft};
use error::ApiError;

/// Tokens shown by the admin stats endpoint.
const STATS_TOP_TOKENS: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Optional `.json` / `.jsonl` file or directory seeded into the catalog at startup.
    pub catalog_path: Option<PathBuf>,
    pub cache: CacheConfig,
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Deserialize)]
pub struct MetadataRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub metadata: MetadataUpdate,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub catalog: Arc<Catalog>,
    pub admin_token: Option<String>,
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let catalog = Arc::new(Catalog::new());
    if let Some(path) = &config.catalog_path {
        let products = load_products(path)?;
        tracing::info!(path = %path.display(), products = products.len(), "seeding catalog");
        catalog.seed(products);
    }
    let engine = Arc::new(SearchEngine::new(config.cache));
    engine.load_catalog(&catalog.all());
    let app_state = AppState { engine, catalog, admin_token: config.admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/api/v1/search/product", get(search_handler))
        .route("/api/v1/product", post(add_product))
        .route("/api/v1/product/meta-data", put(update_product_metadata))
        .route("/api/v1/product/:product_id", get(get_product))
        .route("/admin/cache/config", post(cache_config))
        .route("/admin/cache/invalidate", post(cache_invalidate))
        .route("/admin/index/rebuild", post(index_rebuild))
        .route("/admin/index/stats", get(index_stats))
        .fallback(|| async { ApiError::NotFound("Not Found".into()) })
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<Arc<SearchResponse>> {
    let start = std::time::Instant::now();
    let response = state.engine.search(&params.query);
    tracing::debug!(hits = response.data.len(), took_us = start.elapsed().as_micros() as u64, "search");
    Json(response)
}

async fn add_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(draft) = payload?;
    let product = state.catalog.add(draft)?;
    state.engine.upsert_product(&product);
    Ok((StatusCode::CREATED, Json(json!({ "data": product }))))
}

async fn update_product_metadata(
    State(state): State<AppState>,
    payload: Result<Json<MetadataRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let id = req.id.as_deref().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Invalid id".into()));
    }
    let product = state.catalog.update_metadata(id, req.metadata)?;
    state.engine.upsert_product(&product);
    Ok(Json(json!({ "data": product })))
}

async fn get_product(State(state): State<AppState>, Path(product_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let product = state
        .catalog
        .get(&product_id)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(json!({ "data": product })))
}

// --- Admin endpoints ---
async fn cache_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CacheConfig>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let Json(config) = payload?;
    state.engine.configure_cache(config);
    Ok(Json(json!({ "status": "ok" })))
}

async fn cache_invalidate(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    state.engine.invalidate_cache();
    Ok(Json(json!({ "status": "ok" })))
}

async fn index_rebuild(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let products = state.catalog.all();
    state.engine.load_catalog(&products);
    Ok(Json(json!({ "status": "ok", "products": products.len() })))
}

async fn index_stats(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<IndexStats>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.engine.stats(STATS_TOP_TOKENS)))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
