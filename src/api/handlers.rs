use crate::access::AccessOutcome;
use crate::bridge::BridgeDeposit;
use crate::chain::{NewContent, PaymentRecord};
use crate::error::Error;
use crate::state::ApiState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidAddress(_)
            | Error::InvalidField(_)
            | Error::InvalidContractId(_)
            | Error::InvalidValue(_) => StatusCode::BAD_REQUEST,
            Error::QueryUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::Storage(e) => {
                log::error!("Storage error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub api_url: String,
    pub paywall_contract: String,
    pub remote_domain: u32,
}

pub async fn get_status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "paywall-node".to_string(),
        api_url: state.settings.api_url.clone(),
        paywall_contract: state.verifier.config().contract.to_string(),
        remote_domain: state.settings.remote_domain,
    })
}

#[derive(Deserialize)]
pub struct EncodeRequest {
    pub address: String,
}

pub async fn encode_recipient(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<EncodeRequest>,
) -> ApiResult<serde_json::Value> {
    let field = state.coder.encode(&payload.address)?;
    Ok(Json(serde_json::json!({
        "address": payload.address,
        "recipient": field.to_hex(),
    })))
}

pub async fn decode_recipient(
    State(state): State<Arc<ApiState>>,
    Path(field): Path<String>,
) -> ApiResult<serde_json::Value> {
    let address = state.coder.decode_hex(&field)?;
    Ok(Json(serde_json::json!({
        "recipient": field,
        "address": address,
    })))
}

#[derive(Deserialize)]
pub struct DepositRequest {
    pub address: String,
    /// Decimal string, smallest unit
    pub amount: String,
    #[serde(default)]
    pub sender: Option<String>,
}

pub async fn prepare_deposit(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<DepositRequest>,
) -> ApiResult<serde_json::Value> {
    let amount = payload
        .amount
        .parse::<u128>()
        .map_err(|e| Error::InvalidValue(format!("amount: {}", e)))?;
    let mut deposit = BridgeDeposit::for_native_recipient(
        &state.coder,
        &payload.address,
        amount,
        state.settings.remote_domain,
    )?;
    if let Some(sender) = payload.sender {
        deposit = deposit.with_sender(sender);
    }

    Ok(Json(serde_json::json!({
        "deposit": deposit,
        "call_args": deposit.remote_call_args(),
    })))
}

#[derive(Serialize)]
pub struct AccessResponse {
    pub buyer: String,
    pub content_id: u64,
    pub has_access: bool,
    pub outcome: AccessOutcome,
}

/// Always 200: the answer is a decision, never an error
pub async fn check_access(
    State(state): State<Arc<ApiState>>,
    Path((buyer, content_id)): Path<(String, u64)>,
) -> Json<AccessResponse> {
    let outcome = state.verifier.check_access_detailed(&buyer, content_id).await;
    Json(AccessResponse {
        buyer,
        content_id,
        has_access: outcome.is_granted(),
        outcome,
    })
}

pub async fn list_content(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.storage.list_content() {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn create_content(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<NewContent>,
) -> Result<(StatusCode, Json<crate::chain::ContentListing>), ApiError> {
    // Creator must be a real account so buyers can pay it directly
    state.coder.encode(&payload.creator)?;
    if payload.price == 0 {
        return Err(Error::InvalidValue("price must be positive".to_string()).into());
    }
    let listing = state.storage.create_content(payload)?;
    log::info!("Listed content #{} by {}", listing.id, listing.creator);
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn get_content(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.storage.get_content(id) {
        Ok(Some(listing)) => Json(listing).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Content not found").into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

pub async fn record_payment(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<PaymentRecord>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.storage.record_payment(&payload)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "status": "recorded" })),
    ))
}

pub async fn get_payments(
    State(state): State<Arc<ApiState>>,
    Path(buyer): Path<String>,
) -> ApiResult<Vec<PaymentRecord>> {
    Ok(Json(state.storage.payments_for_buyer(&buyer)?))
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::state::{ApiState, Settings};
    use crate::storage::Storage;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(name: &str) -> axum::Router {
        let path = std::env::temp_dir().join(format!(
            "paywall-api-{}-{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let settings = Settings {
            // Nothing listens here, so every chain query fails fast
            api_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Settings::default()
        };
        let storage = Arc::new(Storage::open(&path).unwrap());
        router(Arc::new(ApiState::new(settings, storage).unwrap()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_encode_endpoint() {
        let response = app("encode")
            .oneshot(
                Request::post("/api/v1/bridge/encode")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"address":"ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["recipient"],
            "0x00000000000000000000001a2242e7aaf77f83a98a21936bb45ebb9863a1e311"
        );
    }

    #[tokio::test]
    async fn test_decode_endpoint_rejects_short_field() {
        let response = app("decode")
            .oneshot(
                Request::get("/api/v1/bridge/decode/0x1a2242e7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_access_endpoint_fails_closed() {
        let response = app("access")
            .oneshot(
                Request::get("/api/v1/access/ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["has_access"], false);
        assert_eq!(json["outcome"]["decision"], "denied");
    }

    #[tokio::test]
    async fn test_create_and_fetch_content() {
        let app = app("content");
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/content")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"title":"Intro","creator":"ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM","price":1000000,"blob_cid":"bafy"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["id"], 1);

        let response = app
            .oneshot(Request::get("/api/v1/content/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["title"], "Intro");
    }

    #[tokio::test]
    async fn test_create_content_rejects_bad_creator() {
        let response = app("bad-creator")
            .oneshot(
                Request::post("/api/v1/content")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"title":"Intro","creator":"alice","price":10,"blob_cid":"bafy"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
