#![warn(clippy::all, missing_docs)]

//! Core engine for the railhand train-card client.
//!
//! This crate keeps the local hand in step with the authoritative card list,
//! lays it out, and runs the route-claim interaction: lifting a card,
//! validating pins against the turn context, and gating submissions to the
//! server. Frontends drive it through [`session::Session`] or the async
//! [`session::SessionDriver`].

pub mod claim;
pub mod config;
pub mod error;
pub mod hand;
pub mod models;
pub mod session;

pub use config::AppConfig;
pub use error::EngineError;
pub use hand::{Hand, LayoutConfig};
pub use models::{Board, CardColor, TrackColor, TurnContext};
pub use session::{
    ClaimAck, ClaimPeer, LocalReferee, Notifier, Outcome, RefereeError, Session, SessionDriver,
    SessionEvent, Transition,
};
