//! Shared domain models.

/// Cards held in a hand.
pub mod card;
/// Card and track colors.
pub mod color;
/// Turn and action context.
pub mod context;
/// Routes and the board.
pub mod route;

pub use card::{Card, CardRef, Position, ZoneId};
pub use color::{parse_colors, sort_hand, CardColor, TrackColor};
pub use context::{ActionName, ClaimPlacement, PlayerState, TurnContext};
pub use route::{Board, Route, RouteLookup, Segment, SegmentRef};
