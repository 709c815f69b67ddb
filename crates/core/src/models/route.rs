//! Routes on the board, as seen by the claim engine.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::color::TrackColor;
use crate::error::EngineError;

/// One claimable unit of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Color printed on the segment.
    pub color: TrackColor,
    /// Color of the marker placed on it, if already claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_color: Option<String>,
}

impl Segment {
    /// Whether a marker is already placed.
    pub fn is_claimed(&self) -> bool {
        self.coin_color.is_some()
    }
}

/// Ordered, non-empty sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRoute")]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    segments: Vec<Segment>,
}

impl Route {
    /// Build a route from its segments.
    pub fn new(segments: Vec<Segment>) -> Result<Self, EngineError> {
        if segments.is_empty() {
            return Err(EngineError::EmptyRoute);
        }
        Ok(Self {
            name: None,
            segments,
        })
    }

    /// Build an unclaimed route of `length` segments of one color.
    pub fn uniform(color: TrackColor, length: usize) -> Result<Self, EngineError> {
        Self::new(
            (0..length)
                .map(|_| Segment {
                    color,
                    coin_color: None,
                })
                .collect(),
        )
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Route color, taken from its first segment.
    pub fn color(&self) -> TrackColor {
        self.segments[0].color
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; routes have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment at `index`, if it exists.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Whether every segment carries the given marker color.
    pub fn is_completed_by(&self, coin_color: &str) -> bool {
        self.segments
            .iter()
            .all(|segment| segment.coin_color.as_deref() == Some(coin_color))
    }
}

#[derive(Deserialize)]
struct RawRoute {
    #[serde(default)]
    name: Option<String>,
    segments: Vec<Segment>,
}

impl TryFrom<RawRoute> for Route {
    type Error = EngineError;

    fn try_from(raw: RawRoute) -> Result<Self, Self::Error> {
        let route = Route::new(raw.segments)?;
        Ok(match raw.name {
            Some(name) => route.with_name(name),
            None => route,
        })
    }
}

/// Address of a segment on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentRef {
    /// Route on the board.
    pub route_index: usize,
    /// Segment within the route.
    pub segment_index: usize,
}

impl SegmentRef {
    /// Create a segment reference.
    pub fn new(route_index: usize, segment_index: usize) -> Self {
        Self {
            route_index,
            segment_index,
        }
    }
}

/// Read-only access to routes by index.
pub trait RouteLookup {
    /// Route at `index`, or `None` when the board has no such route.
    fn route(&self, index: usize) -> Option<&Route>;

    /// Number of routes available.
    fn route_count(&self) -> usize;

    /// Route at `index`, failing with a structural error when out of range.
    fn require_route(&self, index: usize) -> Result<&Route, EngineError> {
        self.route(index).ok_or(EngineError::RouteOutOfRange {
            index,
            len: self.route_count(),
        })
    }
}

/// All routes on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    routes: Vec<Route>,
}

impl Board {
    /// Build a board from its routes.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Load a board definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read board {}", path.display()))?;
        let board = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse board {}", path.display()))?;
        Ok(board)
    }

    /// All routes in index order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Place a marker on a segment.
    pub fn place_marker(
        &mut self,
        at: SegmentRef,
        coin_color: impl Into<String>,
    ) -> Result<(), EngineError> {
        let len = self.routes.len();
        let route = self
            .routes
            .get_mut(at.route_index)
            .ok_or(EngineError::RouteOutOfRange {
                index: at.route_index,
                len,
            })?;
        let segments = route.segments.len();
        let segment =
            route
                .segments
                .get_mut(at.segment_index)
                .ok_or(EngineError::SegmentOutOfRange {
                    route: at.route_index,
                    segment: at.segment_index,
                    len: segments,
                })?;
        segment.coin_color = Some(coin_color.into());
        Ok(())
    }
}

impl RouteLookup for Board {
    fn route(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    fn route_count(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardColor;
    use tempfile::tempdir;

    #[test]
    fn empty_routes_are_rejected() {
        assert_eq!(Route::new(Vec::new()), Err(EngineError::EmptyRoute));
        assert!(serde_json::from_str::<Route>(r#"{"segments": []}"#).is_err());
    }

    #[test]
    fn route_color_comes_from_first_segment() -> Result<()> {
        let route = Route::uniform(TrackColor::Fixed(CardColor::Orange), 3)?;
        assert_eq!(route.color(), TrackColor::Fixed(CardColor::Orange));
        assert_eq!(route.len(), 3);
        Ok(())
    }

    #[test]
    fn place_marker_checks_bounds() -> Result<()> {
        let mut board = Board::new(vec![Route::uniform(TrackColor::Gray, 2)?]);
        board.place_marker(SegmentRef::new(0, 1), "red")?;
        assert!(board.routes()[0].segments()[1].is_claimed());
        assert_eq!(
            board.place_marker(SegmentRef::new(0, 2), "red"),
            Err(EngineError::SegmentOutOfRange {
                route: 0,
                segment: 2,
                len: 2
            })
        );
        assert_eq!(
            board.require_route(4).map(|_| ()),
            Err(EngineError::RouteOutOfRange { index: 4, len: 1 })
        );
        Ok(())
    }

    #[test]
    fn loads_board_from_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("board.json");
        fs::write(
            &path,
            r#"{
  "routes": [
    { "name": "Lisboa - Madrid", "segments": [ { "color": "gray" }, { "color": "gray" } ] },
    { "segments": [ { "color": "blue", "coin_color": "green" } ] }
  ]
}"#,
        )?;

        let board = Board::load(&path)?;
        assert_eq!(board.route_count(), 2);
        assert_eq!(board.routes()[0].name(), Some("Lisboa - Madrid"));
        assert!(board.routes()[0].color().is_gray());
        assert!(board.routes()[1].segments()[0].is_claimed());
        Ok(())
    }
}
