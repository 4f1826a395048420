//! Checkout session handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::OrderId;

use crate::dto::payment::CheckoutSessionResponse;
use crate::{error::ApiError, AppState};

/// Starts a deposit checkout session for a new order
pub async fn start_deposit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let session = state.checkout.start_deposit(OrderId::from(id)).await?;

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Starts a balance checkout session for a deposit-paid order
pub async fn start_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let session = state.checkout.start_full_payment(OrderId::from(id)).await?;

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}
