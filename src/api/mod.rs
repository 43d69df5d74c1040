//! # REST API
//!
//! Thin HTTP surface over the codec, the verifier and the ledger.

pub mod handlers;

use crate::state::ApiState;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/status", get(handlers::get_status))
        .route("/api/v1/bridge/encode", post(handlers::encode_recipient))
        .route("/api/v1/bridge/decode/:field", get(handlers::decode_recipient))
        .route("/api/v1/bridge/deposit", post(handlers::prepare_deposit))
        .route(
            "/api/v1/access/:buyer/:content_id",
            get(handlers::check_access),
        )
        .route(
            "/api/v1/content",
            get(handlers::list_content).post(handlers::create_content),
        )
        .route("/api/v1/content/:id", get(handlers::get_content))
        .route("/api/v1/payments", post(handlers::record_payment))
        .route("/api/v1/payments/:buyer", get(handlers::get_payments))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
