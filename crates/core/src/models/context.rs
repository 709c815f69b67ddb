#![allow(missing_docs)]

//! Turn and action context supplied by the authoritative peer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::color::CardColor;
use crate::error::EngineError;

/// Name of the action in progress during the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionName {
    /// Nothing has been done yet this turn.
    #[default]
    Start,
    /// A route claim is under way.
    ClaimRoute,
    /// Any other action (drawing cards, tickets, ...).
    Other(String),
}

impl ActionName {
    pub fn as_str(&self) -> &str {
        match self {
            ActionName::Start => "start",
            ActionName::ClaimRoute => "claim-route",
            ActionName::Other(name) => name,
        }
    }
}

impl From<String> for ActionName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => ActionName::Start,
            "claim-route" => ActionName::ClaimRoute,
            _ => ActionName::Other(value),
        }
    }
}

impl From<ActionName> for String {
    fn from(value: ActionName) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-player state visible to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    /// Marker color placed on claimed segments.
    pub color: String,
    pub coins: u32,
    /// Full hand for the local player; empty for opponents.
    #[serde(default)]
    pub cards: Vec<CardColor>,
}

/// Where the last confirmed marker went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPlacement {
    pub route_index: usize,
    pub segment_index: usize,
}

/// Turn/action context. Passed into every engine entry point and handed back
/// (possibly updated) with the resulting transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnContext {
    pub my_turn: bool,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub action_name: ActionName,
    /// Selection toggles this turn: even means ready to pick a card, odd means
    /// a card is lifted and awaiting a route pin.
    #[serde(default)]
    pub action_count: u32,
    pub current_player_index: usize,
    /// Index of the local player in `players`.
    pub me: usize,
    pub players: Vec<PlayerState>,
    /// Route pinned by the first accepted segment of this claim.
    #[serde(default)]
    pub selected_route_index: Option<usize>,
    /// Color locked in for a gray route claim.
    #[serde(default)]
    pub gray_route_color: Option<CardColor>,
    /// Placement confirmed by the last acknowledgment.
    #[serde(default)]
    pub action_data: Option<ClaimPlacement>,
}

impl TurnContext {
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Eligibility predicate gating every claim interaction.
    pub fn can_act(&self) -> bool {
        if self.is_game_over() || !self.my_turn {
            return false;
        }
        self.action_count == 0 || self.action_name == ActionName::ClaimRoute
    }

    /// Whether a card is currently lifted for a claim.
    pub fn card_lifted(&self) -> bool {
        self.action_count % 2 == 1
    }

    /// The local player.
    pub fn me(&self) -> Result<&PlayerState, EngineError> {
        self.players.get(self.me).ok_or(EngineError::PlayerOutOfRange {
            index: self.me,
            len: self.players.len(),
        })
    }

    pub fn me_mut(&mut self) -> Result<&mut PlayerState, EngineError> {
        let len = self.players.len();
        self.players
            .get_mut(self.me)
            .ok_or(EngineError::PlayerOutOfRange {
                index: self.me,
                len,
            })
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Result<&PlayerState, EngineError> {
        self.players
            .get(self.current_player_index)
            .ok_or(EngineError::PlayerOutOfRange {
                index: self.current_player_index,
                len: self.players.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TurnContext {
        TurnContext {
            my_turn: true,
            players: vec![PlayerState {
                name: "Ana".to_string(),
                color: "red".to_string(),
                coins: 45,
                cards: Vec::new(),
            }],
            ..TurnContext::default()
        }
    }

    #[test]
    fn eligibility_requires_turn_and_live_game() {
        let mut ctx = context();
        assert!(ctx.can_act());

        ctx.my_turn = false;
        assert!(!ctx.can_act());

        ctx.my_turn = true;
        ctx.game_over = true;
        assert!(!ctx.can_act());
    }

    #[test]
    fn eligibility_blocks_other_actions_in_progress() {
        let mut ctx = context();
        ctx.action_count = 1;
        ctx.action_name = ActionName::Other("draw-card".to_string());
        assert!(!ctx.can_act());

        ctx.action_name = ActionName::ClaimRoute;
        assert!(ctx.can_act());
    }

    #[test]
    fn context_round_trips_wire_names() {
        let json = r#"{
            "my_turn": true,
            "action_name": "claim-route",
            "action_count": 1,
            "current_player_index": 0,
            "me": 0,
            "players": [{ "name": "Ana", "color": "red", "coins": 3, "cards": ["red", "rainbow"] }],
            "gray_route_color": "green"
        }"#;
        let ctx: TurnContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.action_name, ActionName::ClaimRoute);
        assert_eq!(ctx.gray_route_color, Some(CardColor::Green));
        assert_eq!(ctx.selected_route_index, None);
        assert!(ctx.card_lifted());

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["action_name"], "claim-route");
    }

    #[test]
    fn missing_local_player_is_structural() {
        let mut ctx = context();
        ctx.me = 3;
        assert_eq!(
            ctx.me().map(|_| ()),
            Err(EngineError::PlayerOutOfRange { index: 3, len: 1 })
        );
    }
}
