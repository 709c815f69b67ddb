#![allow(missing_docs)]

//! Single-flight guard for claim submissions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CardColor, TrackColor};

/// Claim sent to the authoritative peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Assigned by the gate when the claim is submitted.
    pub claim_id: u64,
    pub route_length: usize,
    pub route_index: usize,
    pub segment_index: usize,
    pub selected_card_color: CardColor,
    pub route_color: TrackColor,
}

#[derive(Debug, Clone)]
struct InFlight {
    request: ClaimRequest,
    submitted_at: DateTime<Utc>,
}

/// At most one claim may await acknowledgment at a time.
#[derive(Debug, Clone, Default)]
pub struct ActionGate {
    in_flight: Option<InFlight>,
    last_claim_id: u64,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is awaiting acknowledgment.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Claim currently awaiting acknowledgment.
    pub fn in_flight(&self) -> Option<&ClaimRequest> {
        self.in_flight.as_ref().map(|pending| &pending.request)
    }

    /// Take the gate for `request`, stamping a fresh claim id.
    /// Returns `None` without side effects while another claim is in flight.
    pub fn try_submit(
        &mut self,
        mut request: ClaimRequest,
        now: DateTime<Utc>,
    ) -> Option<ClaimRequest> {
        if self.is_busy() {
            return None;
        }
        self.last_claim_id += 1;
        request.claim_id = self.last_claim_id;
        self.in_flight = Some(InFlight {
            request: request.clone(),
            submitted_at: now,
        });
        Some(request)
    }

    /// Release the gate if `claim_id` is the claim in flight.
    pub fn release(&mut self, claim_id: u64) -> Option<ClaimRequest> {
        match &self.in_flight {
            Some(pending) if pending.request.claim_id == claim_id => self.force_release(),
            _ => None,
        }
    }

    /// Release the gate regardless of which claim holds it.
    pub fn force_release(&mut self) -> Option<ClaimRequest> {
        self.in_flight.take().map(|pending| pending.request)
    }

    /// Whether the in-flight claim has waited longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.in_flight
            .as_ref()
            .map(|pending| now - pending.submitted_at >= timeout)
            .unwrap_or(false)
    }
}
