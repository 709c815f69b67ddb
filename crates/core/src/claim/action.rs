#![allow(missing_docs)]

//! Selection state of an in-progress route claim.

use serde::{Deserialize, Serialize};

use crate::models::CardColor;

/// Claim phase, derived from whether a card is lifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    CardSelected,
}

/// Pointer affordance shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cursor {
    #[default]
    Default,
    /// Targeting a route segment.
    Crosshair,
}

/// The card lifted for the pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCard {
    /// Slot in the hand.
    pub index: usize,
    pub color: CardColor,
}

/// Engine-local part of the claim state. Counters and route pins live in the
/// turn context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimAction {
    selected: Option<SelectedCard>,
    cursor: Cursor,
}

impl ClaimAction {
    pub fn phase(&self) -> Phase {
        match self.selected {
            Some(_) => Phase::CardSelected,
            None => Phase::Idle,
        }
    }

    pub fn selected(&self) -> Option<SelectedCard> {
        self.selected
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(crate) fn select(&mut self, card: SelectedCard) {
        self.selected = Some(card);
        self.cursor = Cursor::Crosshair;
    }

    /// Back to idle; returns the card that was lifted, if any.
    pub(crate) fn reset(&mut self) -> Option<SelectedCard> {
        self.cursor = Cursor::Default;
        self.selected.take()
    }
}
