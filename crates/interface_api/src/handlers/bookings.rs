//! Booking intake handlers

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use domain_booking::BookingSubmission;

use crate::dto::booking::BookingCreatedResponse;
use crate::{error::ApiError, AppState};

/// Creates a booking from a public site submission
///
/// Validation failures surface as 400 with the intake error message; a
/// failed confirmation email never fails the request.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), ApiError> {
    let confirmation = state.intake.create_booking(submission).await?;

    info!(
        order_number = %confirmation.order_number,
        notification = ?confirmation.notification,
        "Booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            success: true,
            order_id: confirmation.order_id,
            order_number: confirmation.order_number,
            party_id: confirmation.party_id,
        }),
    ))
}
