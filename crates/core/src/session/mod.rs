//! Hand and claim orchestration.
//!
//! [`Session`] is the synchronous state machine: every entry point takes the
//! current [`TurnContext`](crate::models::TurnContext) and hands back the one
//! that should be shown next. [`SessionDriver`] wires it to an event channel
//! and a [`ClaimPeer`], and [`LocalReferee`] is an in-process peer.

mod driver;
mod engine;
mod referee;

pub use driver::{ClaimAck, ClaimPeer, Notifier, SessionDriver, SessionEvent, DROPPED_MESSAGE};
pub use engine::{GuardReason, Outcome, Session, Transition, TIMEOUT_MESSAGE};
pub use referee::{LocalReferee, RefereeError};
