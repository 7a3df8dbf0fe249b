use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shopsearch_core::CacheConfig;
use shopsearch_server::{build_app, ServerConfig};
use std::fs;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

fn build_tiny_catalog() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let products = json!([
        { "id": "p1", "name": "Apple iPhone 16", "brand": "Apple", "model": "iPhone 16", "salePrice": 79900.0,
          "averageRating": 4.6, "ratingCount": 900, "salesCount": 1200, "stock": 30, "isAvailable": true },
        { "id": "p2", "name": "Apple iPhone 15", "brand": "Apple", "model": "iPhone 15", "salePrice": 69900.0,
          "averageRating": 4.5, "ratingCount": 1500, "salesCount": 3000, "stock": 10, "isAvailable": true },
        { "id": "p3", "name": "Samsung Galaxy A15", "brand": "Samsung", "model": "Galaxy A15", "salePrice": 14999.0,
          "averageRating": 4.1, "ratingCount": 400, "salesCount": 5000, "stock": 80, "isAvailable": true }
    ]);
    let path = dir.path().join("catalog.json");
    fs::write(&path, products.to_string()).unwrap();
    let config = ServerConfig {
        catalog_path: Some(path),
        cache: CacheConfig::new(50, 60_000),
        admin_token: Some(TOKEN.into()),
    };
    let app = build_app(config).unwrap();
    (dir, app)
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", token)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (_dir, app) = build_tiny_catalog();
    let (status, json) = call(&app, get("/api/v1/search/product?query=ifone%2016")).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["data"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], "p1");
    assert_eq!(arr[1]["id"], "p2");
    assert!(arr[0]["_score"].as_f64().unwrap() >= arr[1]["_score"].as_f64().unwrap());
    assert_eq!(json["meta"]["tokens"], json!(["iphone", "16"]));
    assert_eq!(json["meta"]["correctionsApplied"][0]["from"], "ifone");
}

#[tokio::test]
async fn empty_query_short_circuits() {
    let (_dir, app) = build_tiny_catalog();
    let (status, json) = call(&app, get("/api/v1/search/product?query=%20%20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
    assert_eq!(json["meta"]["message"], "empty query");
}

#[tokio::test]
async fn created_products_become_searchable() {
    let (_dir, app) = build_tiny_catalog();
    // warm the cache first so the create has to invalidate it
    let (_, before) = call(&app, get("/api/v1/search/product?query=pixel")).await;
    assert!(before["data"].as_array().unwrap().iter().all(|p| p["id"] != "px"));

    let draft = json!({
        "id": "px", "name": "Google Pixel 9", "brand": "Google", "category": "electronics",
        "currency": "INR", "sku": "GOO-PX9", "listPrice": 70000, "discountPercent": 10, "stock": 4
    });
    let (status, created) = call(&app, send_json("POST", "/api/v1/product", draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["salePrice"], 63000.0);
    assert_eq!(created["data"]["isAvailable"], true);

    let (_, json) = call(&app, get("/api/v1/search/product?query=pixel")).await;
    assert_eq!(json["data"][0]["id"], "px");
}

#[tokio::test]
async fn invalid_drafts_are_rejected() {
    let (_dir, app) = build_tiny_catalog();
    let (status, json) = call(&app, send_json("POST", "/api/v1/product", json!({ "name": "No brand" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid brand");
}

#[tokio::test]
async fn mistyped_draft_fields_get_field_errors() {
    let (_dir, app) = build_tiny_catalog();
    let mut draft = json!({
        "name": "Nokia G42", "brand": "Nokia", "category": "electronics",
        "currency": "INR", "sku": "NOK-G42", "listPrice": "abc", "stock": 3
    });
    let (status, json) = call(&app, send_json("POST", "/api/v1/product", draft.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid listPrice");

    draft["listPrice"] = json!(12999);
    draft["name"] = json!(42);
    let (status, json) = call(&app, send_json("POST", "/api/v1/product", draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid name");

    let req = Request::post("/api/v1/product")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"].is_string());
}

#[tokio::test]
async fn metadata_update_and_lookup() {
    let (_dir, app) = build_tiny_catalog();
    let body = json!({ "id": "p3", "metadata": { "color": "Neela", "salePrice": 1 } });
    let (status, json) = call(&app, send_json("PUT", "/api/v1/product/meta-data", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["color"], "Neela");
    assert_eq!(json["data"]["salePrice"], 14999.0);

    let (status, json) = call(&app, get("/api/v1/product/p3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["color"], "Neela");

    let (status, _) = call(&app, get("/api/v1/product/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, send_json("PUT", "/api/v1/product/meta-data", json!({ "id": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, json) = call(&app, send_json("PUT", "/api/v1/product/meta-data", json!({ "id": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid id");
}

#[tokio::test]
async fn cache_config_applies_valid_fields_only() {
    let (_dir, app) = build_tiny_catalog();
    let body = json!({ "maxEntries": 10.5, "ttlMs": "soon" });
    let (status, _) = call(&app, admin_post("/admin/cache/config", TOKEN, body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, first) = call(&app, get("/api/v1/search/product?query=galaxy")).await;
    let (_, second) = call(&app, get("/api/v1/search/product?query=galaxy")).await;
    assert_eq!(first, second);
    assert_eq!(second["data"][0]["id"], "p3");
}

#[tokio::test]
async fn admin_endpoints_require_token() {
    let (_dir, app) = build_tiny_catalog();
    let (status, _) = call(&app, admin_post("/admin/cache/invalidate", "wrong", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, admin_post("/admin/cache/config", TOKEN, json!({ "maxEntries": 5, "ttlMs": -1 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = call(&app, admin_post("/admin/index/rebuild", TOKEN, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"], 3);

    let req = Request::get("/admin/index/stats").header("X-ADMIN-TOKEN", TOKEN).body(Body::empty()).unwrap();
    let (status, json) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"], 3);
    assert_eq!(json["top_tokens"][0]["token"], "apple");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let (_dir, app) = build_tiny_catalog();
    let (status, json) = call(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Not Found");
}

#[tokio::test]
async fn sparse_seed_records_still_start_the_server() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let products = json!([
        { "id": "a", "name": "Nokia G42", "stock": null, "model": null, "salesCount": 12.0 },
        { "id": "b", "name": "Nokia 105", "averageRating": "n/a" }
    ]);
    fs::write(&path, products.to_string()).unwrap();
    let config = ServerConfig { catalog_path: Some(path), ..Default::default() };
    let app = build_app(config).unwrap();

    let (status, json) = call(&app, get("/api/v1/search/product?query=nokia")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    let (_, json) = call(&app, get("/api/v1/product/a")).await;
    assert_eq!(json["data"]["salesCount"], 12);
    assert_eq!(json["data"]["model"], "");
}
