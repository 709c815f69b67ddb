//! Route-claim state: selection, rule table and submission gate.

pub mod action;
/// Single-flight submission guard.
pub mod gate;
/// Pin legality rules.
pub mod rules;

pub use action::{ClaimAction, Cursor, Phase, SelectedCard};
pub use gate::{ActionGate, ClaimRequest};
pub use rules::{hand_covers_route, matching_cards, validate_pin, PinAttempt, Rejection};
