//! HTTP surface for the trade subsystem: list shops and vendors, read a
//! vendor's resolved stock, spawn vendors and force restocks.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::shop::{ConfigSnapshot, ShopRegistry, StockResolver};
use crate::vendor::VendorManager;

#[derive(Clone)]
pub struct AppState {
    pub shops: Arc<RwLock<ShopRegistry>>,
    pub vendors: Arc<VendorManager>,
    pub resolver: Arc<StockResolver>,
    pub snapshot: Arc<ConfigSnapshot>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/shops", get(list_shops))
        .route("/vendors", get(list_vendors).post(spawn_vendor))
        .route("/vendors/:id", delete(remove_vendor))
        .route("/vendors/:id/stock", get(vendor_stock))
        .route("/vendors/:id/restock", post(restock_vendor))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis()
    }))
}

#[derive(Serialize)]
struct ShopSummary {
    id: String,
    display_name: String,
    buy_offers: usize,
    sell_offers: usize,
}

async fn list_shops(State(state): State<AppState>) -> impl IntoResponse {
    let shops = state.shops.read().await.sorted();
    let summaries: Vec<ShopSummary> = shops
        .iter()
        .map(|shop| ShopSummary {
            id: shop.id.clone(),
            display_name: shop.display_name.clone(),
            buy_offers: shop.buy_offers.len(),
            sell_offers: shop.sell_offers.len(),
        })
        .collect();
    Json(summaries)
}

async fn list_vendors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.vendors.summaries())
}

#[derive(Deserialize)]
struct SpawnRequest {
    shop_id: String,
}

#[derive(Serialize)]
struct SpawnResponse {
    vendor_id: String,
}

async fn spawn_vendor(
    State(state): State<AppState>,
    Json(req): Json<SpawnRequest>,
) -> Response {
    let definition = match state.shops.read().await.get(&req.shop_id) {
        Some(def) => def,
        None => {
            warn!("Spawn requested for unknown shop '{}'", req.shop_id);
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Shop '{}' not found", req.shop_id),
            );
        }
    };

    let vendor_id = state
        .vendors
        .spawn(&definition, &state.resolver, &state.snapshot);
    (StatusCode::CREATED, Json(SpawnResponse { vendor_id })).into_response()
}

async fn remove_vendor(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.vendors.remove(&id) {
        info!("Removed vendor {}", id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Vendor '{}' not found", id))
    }
}

async fn vendor_stock(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.vendors.stock(&id) {
        Some(stock) => Json(stock).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Vendor '{}' not found", id)),
    }
}

async fn restock_vendor(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let shops = state.shops.read().await;
    match state
        .vendors
        .restock(&id, &shops, &state.resolver, &state.snapshot)
    {
        Some(stock) => {
            info!("Manual restock of vendor {}", id);
            Json(stock).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Vendor '{}' not found", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::definition::tests::test_items;
    use crate::shop::{RawShopDefinition, ShopDefinition};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> AppState {
        let raw: RawShopDefinition = serde_json::from_str(
            r#"{ "id": "healer", "display_name": "Healer",
                 "buy":  [ {"item":"bandage","price":{"fixed":3},"qty":{"range":[10,60]}} ],
                 "sell": [ {"item":"bandage","price":{"fixed":1}} ] }"#,
        )
        .unwrap();
        let mut shops = ShopRegistry::new();
        shops.insert(ShopDefinition::from_raw("healer", &raw, &test_items()).unwrap());

        AppState {
            shops: Arc::new(RwLock::new(shops)),
            vendors: Arc::new(VendorManager::new(Some(5))),
            resolver: Arc::new(StockResolver::default()),
            snapshot: Arc::new(ConfigSnapshot::default()),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn spawn_request(shop_id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/vendors")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"shop_id":"{}"}}"#, shop_id)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_spawn_and_read_stock() {
        let state = state();
        let app = router(state.clone());

        let response = app.clone().oneshot(spawn_request("healer")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let vendor_id = body_json(response).await["vendor_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/vendors/{}/stock", vendor_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stock = body_json(response).await;
        assert_eq!(stock["for_sale"][0]["item"]["id"], "bandage");
        assert_eq!(stock["for_sale"][0]["item"]["display_name"], "Bandage");
        assert_eq!(stock["for_sale"][0]["unit_price"], 3);
        assert_eq!(stock["will_buy"][0]["unit_price"], 1);
        assert_eq!(stock["will_buy"][0]["quantity"], 999);
    }

    #[tokio::test]
    async fn test_unknown_shop_and_vendor() {
        let app = router(state());

        let response = app.clone().oneshot(spawn_request("armorer")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/vendors/vendor_missing/restock")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_remove_vendor() {
        let state = state();
        let app = router(state.clone());

        let response = app.clone().oneshot(spawn_request("healer")).await.unwrap();
        let vendor_id = body_json(response).await["vendor_id"]
            .as_str()
            .unwrap()
            .to_string();

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/vendors/{}", vendor_id))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.vendors.is_empty());

        let response = app.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_shops() {
        let response = router(state())
            .oneshot(Request::builder().uri("/shops").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let shops = body_json(response).await;
        assert_eq!(shops[0]["id"], "healer");
        assert_eq!(shops[0]["buy_offers"], 1);
    }
}
