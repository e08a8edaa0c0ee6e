use crate::{
    api::{error::ApiError, response::ApiResponse},
    models::{CurrentBlockResponse, SubscribeResponse, TransactionsResponse},
    state::AppState,
    validation::validate_eth_address,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};
use tracing::info;

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/current_block", get(current_block))
        .route("/subscribe/{address}", post(subscribe))
        .route("/transactions/{address}", get(get_transactions))
        .with_state(app_state);

    with_middleware(routes, request_timeout)
}

/// Requests still running after `request_timeout` are answered with 408.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
}

// GET /current_block handler
async fn current_block(State(state): State<Arc<AppState>>) -> ApiResponse<CurrentBlockResponse> {
    ApiResponse::ok(CurrentBlockResponse {
        current_block: state.parser.current_block(),
    })
}

// POST /subscribe/{address} handler
async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<SubscribeResponse>, ApiError> {
    validate_eth_address(&address)?;

    let result = state.parser.subscribe(&address);
    if result {
        info!("Subscribed address {}", address);
    } else {
        info!("Address {} was already subscribed", address);
    }

    Ok(ApiResponse::created(SubscribeResponse { result }))
}

// GET /transactions/{address} handler
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<TransactionsResponse>, ApiError> {
    validate_eth_address(&address)?;

    let transactions = state.parser.transactions(&address);
    info!("Fetched {} transactions for address {}", transactions.len(), address);

    Ok(ApiResponse::ok(TransactionsResponse { transactions }))
}
