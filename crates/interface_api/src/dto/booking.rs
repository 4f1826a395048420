//! Booking DTOs

use core_kernel::{OrderId, PartyId};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
    pub party_id: PartyId,
}
