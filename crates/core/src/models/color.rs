//! Card and track colors.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One of the nine train-card colors. `Rainbow` is the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    /// Black cards.
    Black,
    /// White cards.
    White,
    /// Red cards.
    Red,
    /// Orange cards.
    Orange,
    /// Purple cards.
    Purple,
    /// Yellow cards.
    Yellow,
    /// Green cards.
    Green,
    /// Blue cards.
    Blue,
    /// Wildcard, usable as any color.
    Rainbow,
}

impl CardColor {
    /// Palette in counter order; the wildcard is always last.
    pub const ALL: [CardColor; 9] = [
        CardColor::Black,
        CardColor::White,
        CardColor::Red,
        CardColor::Orange,
        CardColor::Purple,
        CardColor::Yellow,
        CardColor::Green,
        CardColor::Blue,
        CardColor::Rainbow,
    ];

    /// Lowercase token used on the wire and in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            CardColor::Black => "black",
            CardColor::White => "white",
            CardColor::Red => "red",
            CardColor::Orange => "orange",
            CardColor::Purple => "purple",
            CardColor::Yellow => "yellow",
            CardColor::Green => "green",
            CardColor::Blue => "blue",
            CardColor::Rainbow => "rainbow",
        }
    }

    /// Whether this card stands in for any color.
    pub const fn is_wildcard(self) -> bool {
        matches!(self, CardColor::Rainbow)
    }

    /// Slot of this color in [`CardColor::ALL`].
    pub const fn index(self) -> usize {
        match self {
            CardColor::Black => 0,
            CardColor::White => 1,
            CardColor::Red => 2,
            CardColor::Orange => 3,
            CardColor::Purple => 4,
            CardColor::Yellow => 5,
            CardColor::Green => 6,
            CardColor::Blue => 7,
            CardColor::Rainbow => 8,
        }
    }
}

// Hand order: by name, except the wildcard sorts after everything.
impl Ord for CardColor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_wildcard(), other.is_wildcard()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.as_str().cmp(other.as_str()),
        }
    }
}

impl PartialOrd for CardColor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardColor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        CardColor::ALL
            .into_iter()
            .find(|color| color.as_str() == token)
            .ok_or_else(|| EngineError::UnknownColor(s.to_string()))
    }
}

/// Color printed on a route: a fixed card color or gray (any single color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TrackColor {
    /// Claimable with any one color plus wildcards.
    Gray,
    /// Claimable with this color plus wildcards.
    Fixed(CardColor),
}

impl TrackColor {
    /// Whether this is a gray route.
    pub const fn is_gray(self) -> bool {
        matches!(self, TrackColor::Gray)
    }

    /// Wire token for this track color.
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackColor::Gray => "gray",
            TrackColor::Fixed(color) => color.as_str(),
        }
    }
}

impl fmt::Display for TrackColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackColor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        if token == "gray" || token == "grey" {
            return Ok(TrackColor::Gray);
        }
        match token.parse::<CardColor>()? {
            CardColor::Rainbow => Err(EngineError::UnknownColor(s.to_string())),
            color => Ok(TrackColor::Fixed(color)),
        }
    }
}

impl TryFrom<String> for TrackColor {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackColor> for String {
    fn from(value: TrackColor) -> Self {
        value.as_str().to_string()
    }
}

/// Sort colors into hand order (by name, wildcard last).
pub fn sort_hand(colors: &mut [CardColor]) {
    colors.sort();
}

/// Parse a list of color tokens, failing on the first unknown one.
pub fn parse_colors<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<CardColor>, EngineError> {
    tokens.iter().map(|token| token.as_ref().parse()).collect()
}
