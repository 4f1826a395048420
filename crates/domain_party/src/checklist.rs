//! Safety checklist snapshot
//!
//! Captured once at booking time and never modified. Staff pull this up on
//! the day of the event, so it deliberately duplicates fields from the party
//! rather than referencing them: the snapshot must reflect what the parent
//! acknowledged at booking, even if the party record is later edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ChecklistId, OrderId, PartyId};

/// Immutable safety acknowledgment captured at booking time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyChecklist {
    /// Unique checklist identifier
    pub id: ChecklistId,
    /// The order this checklist was captured with
    pub order_id: OrderId,
    /// The party this checklist covers
    pub party_id: PartyId,
    /// Whether the parent acknowledged the venue safety terms
    pub safety_acknowledged: bool,
    /// Allergies as stated at booking
    pub allergies: Option<String>,
    /// Emergency contact as stated at booking
    pub emergency_contact: String,
    /// Supervision or accessibility needs as stated at booking
    pub special_needs: Option<String>,
    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl SafetyChecklist {
    pub fn capture(
        order_id: OrderId,
        party_id: PartyId,
        safety_acknowledged: bool,
        allergies: Option<String>,
        emergency_contact: impl Into<String>,
        special_needs: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ChecklistId::new(),
            order_id,
            party_id,
            safety_acknowledged,
            allergies,
            emergency_contact: emergency_contact.into(),
            special_needs,
            captured_at: now,
        }
    }
}
