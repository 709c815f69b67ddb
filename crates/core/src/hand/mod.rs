//! The local player's hand of train cards.

/// Positions, color counts and scrolling.
pub mod layout;
/// Index-aligned diff against the authoritative card list.
pub mod reconcile;

pub use layout::{ArrowVisibility, ColorCounter, HandViewport, LayoutConfig, LayoutOutcome};
pub use reconcile::ReconcileReport;

use crate::{
    error::EngineError,
    models::{Card, CardColor, ZoneId},
};

/// Ordered cards (hand order: by color name, wildcard last) living in one zone.
#[derive(Debug, Clone)]
pub struct Hand {
    zone: ZoneId,
    cards: Vec<Card>,
    counter: ColorCounter,
    next_generation: u64,
}

impl Hand {
    /// Empty hand for the given zone.
    pub fn new(zone: ZoneId) -> Self {
        Self {
            zone,
            cards: Vec::new(),
            counter: ColorCounter::default(),
            next_generation: 0,
        }
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card colors in hand order.
    pub fn colors(&self) -> Vec<CardColor> {
        self.cards.iter().map(Card::color).collect()
    }

    /// Counts from the last layout pass.
    pub fn counter(&self) -> &ColorCounter {
        &self.counter
    }

    /// Card at `index`, or a structural error.
    pub fn card(&self, index: usize) -> Result<&Card, EngineError> {
        self.cards.get(index).ok_or(EngineError::CardOutOfRange {
            index,
            len: self.cards.len(),
        })
    }

    pub(crate) fn card_mut(&mut self, index: usize) -> Result<&mut Card, EngineError> {
        let len = self.cards.len();
        self.cards
            .get_mut(index)
            .ok_or(EngineError::CardOutOfRange { index, len })
    }

    /// Destroy every card and empty the hand.
    pub fn clear(&mut self) {
        for card in self.cards.iter_mut().filter(|card| card.is_present()) {
            card.destroy();
        }
        self.cards.clear();
        self.counter = ColorCounter::default();
    }

    fn spawn(&mut self, color: CardColor) -> Card {
        let card = Card::new(color, self.next_generation);
        self.next_generation += 1;
        card
    }
}
