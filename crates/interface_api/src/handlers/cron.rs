//! Cron trigger handlers

use axum::{extract::State, http::HeaderMap, Json};
use tracing::{info, warn};

use domain_booking::SchedulerReport;

use crate::{error::ApiError, AppState};

/// Runs the three notification scans
///
/// Guarded by a bearer secret so only the platform cron can trigger it.
/// An unconfigured secret keeps the endpoint closed rather than open.
pub async fn run_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SchedulerReport>, ApiError> {
    let secret = state
        .config
        .cron_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Internal("Cron secret not configured".to_string()))?;

    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            warn!("Missing or invalid Authorization header");
            return Err(ApiError::Unauthorized);
        }
    };

    if token != secret {
        warn!("Cron token mismatch");
        return Err(ApiError::Unauthorized);
    }

    let report = state.scheduler.run_all().await?;

    info!(
        party_reminders = report.party_reminders.sent,
        feedback_requests = report.feedback_requests.sent,
        payment_due = report.payment_due.sent,
        "Reminder scans complete"
    );

    Ok(Json(report))
}
