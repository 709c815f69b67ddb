//! Hand layout: single row, colors grouped by gutter width.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Hand;
use crate::models::{CardColor, Position};

/// Geometry of the hand section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left origin of the first card.
    pub left: i32,
    /// Row every card sits on.
    pub top: i32,
    /// Step between consecutive cards of the same color.
    pub gutter_small: i32,
    /// Step across a color change.
    pub gutter_big: i32,
    /// How far a selected card is raised.
    pub lift: i32,
    pub card_width: i32,
    /// Visible width of the section before it scrolls.
    pub section_width: i32,
    pub scroll_step: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left: 20,
            top: 940,
            gutter_small: 20,
            gutter_big: 70,
            lift: 10,
            card_width: 60,
            section_width: 920,
            scroll_step: 50,
        }
    }
}

/// Number of cards of each color in the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorCounter([u32; 9]);

impl ColorCounter {
    /// Count the given colors.
    pub fn from_colors(colors: impl IntoIterator<Item = CardColor>) -> Self {
        let mut counter = Self::default();
        for color in colors {
            counter.increment(color);
        }
        counter
    }

    pub fn get(&self, color: CardColor) -> u32 {
        self.0[color.index()]
    }

    fn increment(&mut self, color: CardColor) {
        self.0[color.index()] += 1;
    }

    /// Number of wildcards.
    pub fn wildcards(&self) -> u32 {
        self.get(CardColor::Rainbow)
    }

    /// Largest count among the non-wildcard colors.
    pub fn max_single_color(&self) -> u32 {
        CardColor::ALL
            .into_iter()
            .filter(|color| !color.is_wildcard())
            .map(|color| self.get(color))
            .max()
            .unwrap_or(0)
    }

    /// Sum over all colors.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// `(color, count)` pairs in palette order.
    pub fn iter(&self) -> impl Iterator<Item = (CardColor, u32)> + '_ {
        CardColor::ALL
            .into_iter()
            .map(move |color| (color, self.get(color)))
    }
}

impl Index<CardColor> for ColorCounter {
    type Output = u32;

    fn index(&self, color: CardColor) -> &Self::Output {
        &self.0[color.index()]
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// The hand is empty; nothing was drawn.
    Empty,
    /// Cards were positioned.
    Rendered {
        /// Distance from the first card's left edge to the last card's right edge.
        content_width: i32,
    },
}

impl Hand {
    /// Position every card and recount colors.
    pub fn layout(&mut self, config: &LayoutConfig) -> LayoutOutcome {
        self.counter = ColorCounter::default();
        if self.cards.is_empty() {
            debug!(zone = %self.zone, "layout skipped; hand is empty");
            return LayoutOutcome::Empty;
        }

        let mut previous: Option<CardColor> = None;
        let mut x = config.left;
        for card in &mut self.cards {
            if let Some(prev) = previous {
                x += if prev == card.color() {
                    config.gutter_small
                } else {
                    config.gutter_big
                };
            }
            let mut y = config.top;
            if card.is_lifted() {
                y -= config.lift;
            }
            card.place(Position { x, y }, &self.zone);
            previous = Some(card.color());
            self.counter.increment(card.color());
        }

        let content_width = x + config.card_width - config.left;
        debug!(zone = %self.zone, cards = self.cards.len(), content_width, "hand laid out");
        LayoutOutcome::Rendered { content_width }
    }
}

/// Which scroll arrows should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowVisibility {
    pub left: bool,
    pub right: bool,
}

/// Horizontal scroll state of the hand section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandViewport {
    offset: i32,
}

impl HandViewport {
    /// Viewport scrolled to the start of the hand.
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            offset: config.left,
        }
    }

    /// Container x offset.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Shift by `delta`, clamped so the content never leaves the section.
    pub fn scroll(
        &mut self,
        delta: i32,
        content_width: i32,
        config: &LayoutConfig,
    ) -> ArrowVisibility {
        let max = config.left;
        let min = if content_width > config.section_width {
            config.left + config.section_width - content_width
        } else {
            config.left
        };
        self.offset = (self.offset + delta).clamp(min, max);
        ArrowVisibility {
            left: self.offset < max,
            right: self.offset > min,
        }
    }
}
