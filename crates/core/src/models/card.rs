#![allow(missing_docs)]

//! Train cards held in a hand.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::color::CardColor;

/// Identifier of the area a card is laid out in.
///
/// Several hands can be on screen at once (the local player's, opponents'),
/// so events carry the zone of the card they were raised on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(String);

impl ZoneId {
    /// Zone of the local player's train cards.
    pub const PLAYER_TRAIN: &'static str = "playertrain";

    /// Create a zone identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Zone name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new(Self::PLAYER_TRAIN)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Screen position assigned by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

/// A single card in the hand.
///
/// Cards have no server-issued identity. Two cards of the same color are
/// interchangeable; `generation` only records which reconcile pass created
/// the visual so callers can see whether a slot was kept or rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    color: CardColor,
    present: bool,
    interactive: bool,
    generation: u64,
    position: Option<Position>,
    zone: Option<ZoneId>,
    lifted: bool,
    highlighted: bool,
}

impl Card {
    /// Create a present, clickable card.
    pub fn new(color: CardColor, generation: u64) -> Self {
        Self {
            color,
            present: true,
            interactive: true,
            generation,
            position: None,
            zone: None,
            lifted: false,
            highlighted: false,
        }
    }

    pub fn color(&self) -> CardColor {
        self.color
    }

    /// Whether the card still has a renderable form.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Zone stamped by the last layout pass.
    pub fn zone(&self) -> Option<&ZoneId> {
        self.zone.as_ref()
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Drop the renderable form. The card stops receiving input.
    pub fn destroy(&mut self) {
        self.present = false;
        self.interactive = false;
        self.position = None;
        self.lifted = false;
        self.highlighted = false;
    }

    pub(crate) fn place(&mut self, position: Position, zone: &ZoneId) {
        self.position = Some(position);
        self.zone = Some(zone.clone());
    }

    pub(crate) fn lift(&mut self, offset: i32) {
        if self.lifted {
            return;
        }
        self.lifted = true;
        if let Some(position) = self.position.as_mut() {
            position.y -= offset;
        }
    }

    pub(crate) fn lower(&mut self, offset: i32) {
        if !self.lifted {
            return;
        }
        self.lifted = false;
        if let Some(position) = self.position.as_mut() {
            position.y += offset;
        }
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }
}

/// Reference to a card carried by an input event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRef {
    /// Zone the event was raised in.
    pub zone: ZoneId,
    /// Index of the card within that zone's hand.
    pub index: usize,
}

impl CardRef {
    pub fn new(zone: ZoneId, index: usize) -> Self {
        Self { zone, index }
    }
}
