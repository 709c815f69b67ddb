//! Structural failures raised when collaborators hand the engine inconsistent data.

use thiserror::Error;

/// Contract violations that must not be swallowed.
///
/// User-level validation problems are reported as
/// [`Rejection`](crate::claim::Rejection) values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A card or track color token outside the known palette.
    #[error("unknown color token '{0}'")]
    UnknownColor(String),
    /// A route lookup with an index the board does not have.
    #[error("route index {index} out of range ({len} routes)")]
    RouteOutOfRange {
        /// Requested route.
        index: usize,
        /// Number of routes on the board.
        len: usize,
    },
    /// A segment index beyond the end of its route.
    #[error("segment {segment} out of range for route {route} ({len} segments)")]
    SegmentOutOfRange {
        /// Route the segment was looked up on.
        route: usize,
        /// Requested segment.
        segment: usize,
        /// Number of segments on the route.
        len: usize,
    },
    /// A card reference past the end of the hand.
    #[error("card index {index} out of range ({len} cards in hand)")]
    CardOutOfRange {
        /// Requested card.
        index: usize,
        /// Current hand length.
        len: usize,
    },
    /// A route without segments.
    #[error("route has no segments")]
    EmptyRoute,
    /// The context says a card is lifted but the engine holds no selection.
    #[error("action count {0} is odd but no card is selected")]
    MissingSelection(u32),
    /// The context does not contain the local player.
    #[error("player index {index} out of range ({len} players)")]
    PlayerOutOfRange {
        /// Requested player.
        index: usize,
        /// Number of players in the context.
        len: usize,
    },
}
