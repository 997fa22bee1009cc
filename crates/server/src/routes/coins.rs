use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::ApiError;
use crate::routes::ServerState;

/// Response body shared by all three coin operations.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CoinsResponse {
    pub coins: Vec<String>,
}

/// Accept only arrays whose elements are all strings.
fn parse_coin_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

#[utoipa::path(
    get, path = "/{user_id}/coins", tag = "coins",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 200, description = "Current collection", body = CoinsResponse),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn get_coins(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<CoinsResponse>, ApiError> {
    let coins = state.coins.get(&user_id).await?;
    Ok(Json(CoinsResponse { coins }))
}

#[utoipa::path(
    post, path = "/{user_id}/coins", tag = "coins",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = crate::openapi::AddCoinInput,
    responses(
        (status = 201, description = "Coin appended", body = CoinsResponse),
        (status = 400, description = "Coin data is required"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn add_coin(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    body: Option<Json<serde_json::Value>>,
) -> Result<(StatusCode, Json<CoinsResponse>), ApiError> {
    // The coin must be present, a string, and non-empty; anything else is the
    // caller's fault and never reaches the store.
    let coin = body
        .as_ref()
        .and_then(|Json(v)| v.get("coin"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::validation("Coin data is required"))?;

    let coins = state.coins.append(&user_id, coin).await?;
    info!(%user_id, count = coins.len(), "coin appended");
    Ok((StatusCode::CREATED, Json(CoinsResponse { coins })))
}

#[utoipa::path(
    put, path = "/{user_id}/coins", tag = "coins",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = crate::openapi::ReplaceCoinsInput,
    responses(
        (status = 200, description = "Collection replaced", body = CoinsResponse),
        (status = 400, description = "Coins data must be an array"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn replace_coins(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    body: Option<Json<serde_json::Value>>,
) -> Result<Json<CoinsResponse>, ApiError> {
    let coins = body
        .as_ref()
        .and_then(|Json(v)| v.get("coins"))
        .and_then(parse_coin_list)
        .ok_or_else(|| ApiError::validation("Coins data must be an array"))?;

    let coins = state.coins.replace(&user_id, coins).await?;
    info!(%user_id, count = coins.len(), "collection replaced");
    Ok(Json(CoinsResponse { coins }))
}
