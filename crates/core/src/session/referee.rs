//! In-process authoritative peer.
//!
//! Applies claims against its own copy of the board and the turn context and
//! answers the way a game server would. Used by the terminal client and tests.

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::driver::{ClaimAck, ClaimPeer};
use crate::{
    claim::{ClaimRequest, Rejection},
    error::EngineError,
    models::{ActionName, Board, CardColor, ClaimPlacement, RouteLookup, SegmentRef, TurnContext},
};

/// Why the referee refused an action. The message is what the player sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefereeError {
    #[error("Not your turn!")]
    NotYourTurn,
    #[error("Finish the current action first!")]
    ActionInProgress,
    #[error("No {0} card in hand")]
    MissingCard(CardColor),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Authoritative board and context for a local game.
#[derive(Debug, Clone)]
pub struct LocalReferee {
    board: Board,
    context: TurnContext,
    deal_cursor: usize,
}

impl LocalReferee {
    /// Referee starting from the given board and context.
    pub fn new(board: Board, context: TurnContext) -> Self {
        Self {
            board,
            context,
            deal_cursor: 0,
        }
    }

    /// Authoritative board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Authoritative context, as seen by the local player.
    pub fn context(&self) -> &TurnContext {
        &self.context
    }

    /// Apply a claim and produce the acknowledgment to send back.
    pub fn apply(&mut self, request: &ClaimRequest) -> ClaimAck {
        match self.try_apply(request) {
            Ok(()) => ClaimAck::Confirmed {
                claim_id: request.claim_id,
                context: self.context.clone(),
            },
            Err(reason) => {
                info!(claim_id = request.claim_id, %reason, "claim refused");
                ClaimAck::Rejected {
                    claim_id: request.claim_id,
                    reason: reason.to_string(),
                }
            }
        }
    }

    /// Deal `count` cards to the local player as a whole-turn action.
    pub fn draw_cards(&mut self, count: usize) -> Result<TurnContext, RefereeError> {
        if !self.context.my_turn || self.context.is_game_over() {
            return Err(RefereeError::NotYourTurn);
        }
        if self.context.action_count != 0 {
            return Err(RefereeError::ActionInProgress);
        }
        let dealt: Vec<CardColor> = (0..count).map(|_| self.next_card()).collect();
        let player = self.context.me_mut()?;
        player.cards.extend(dealt.iter().copied());
        info!(?dealt, "cards drawn");
        self.end_turn();
        Ok(self.context.clone())
    }

    fn try_apply(&mut self, request: &ClaimRequest) -> Result<(), RefereeError> {
        if !self.context.my_turn || self.context.is_game_over() {
            return Err(RefereeError::NotYourTurn);
        }
        let route = self.board.require_route(request.route_index)?;
        let segment = route
            .segment(request.segment_index)
            .ok_or(EngineError::SegmentOutOfRange {
                route: request.route_index,
                segment: request.segment_index,
                len: route.len(),
            })?;
        if segment.is_claimed() {
            return Err(Rejection::AlreadyClaimed.into());
        }
        if let Some(pinned) = self.context.selected_route_index {
            if pinned != request.route_index {
                return Err(Rejection::MultipleRoutes {
                    pinned,
                    requested: request.route_index,
                }
                .into());
            }
        }
        let is_gray = route.color().is_gray();
        let route_len = route.len();

        let player = self.context.me_mut()?;
        let slot = player
            .cards
            .iter()
            .position(|color| *color == request.selected_card_color)
            .ok_or(RefereeError::MissingCard(request.selected_card_color))?;
        if player.coins == 0 {
            return Err(Rejection::InsufficientCoins {
                needed: route_len,
                available: 0,
            }
            .into());
        }
        player.cards.remove(slot);
        player.coins -= 1;
        let coin_color = player.color.clone();

        let at = SegmentRef::new(request.route_index, request.segment_index);
        self.board.place_marker(at, coin_color.clone())?;

        let ctx = &mut self.context;
        ctx.selected_route_index = Some(request.route_index);
        let card = request.selected_card_color;
        if is_gray && !card.is_wildcard() && ctx.gray_route_color.is_none() {
            ctx.gray_route_color = Some(card);
        }
        // The client's lift and this pin are both selection toggles.
        ctx.action_count += 2;
        ctx.action_name = ActionName::ClaimRoute;
        ctx.action_data = Some(ClaimPlacement {
            route_index: request.route_index,
            segment_index: request.segment_index,
        });
        info!(
            claim_id = request.claim_id,
            route = request.route_index,
            segment = request.segment_index,
            coin = %coin_color,
            "claim applied"
        );

        let completed = self
            .board
            .route(request.route_index)
            .map(|route| route.is_completed_by(&coin_color))
            .unwrap_or(false);
        if completed {
            info!(route = request.route_index, "route completed");
            self.end_turn();
        }
        Ok(())
    }

    // Opponents have no agency here; they pass straight back.
    fn end_turn(&mut self) {
        let ctx = &mut self.context;
        ctx.action_count = 0;
        ctx.action_name = ActionName::Start;
        ctx.selected_route_index = None;
        ctx.gray_route_color = None;
        let players = ctx.players.len().max(1);
        for _ in 1..players {
            ctx.current_player_index = (ctx.current_player_index + 1) % players;
            debug!(player = ctx.current_player_index, "opponent passes");
        }
        ctx.current_player_index = (ctx.current_player_index + 1) % players;
        ctx.my_turn = ctx.current_player_index == ctx.me;
    }

    fn next_card(&mut self) -> CardColor {
        // 4 is coprime with 9, so the stride visits the whole palette.
        let color = CardColor::ALL[(self.deal_cursor * 4 + 1) % CardColor::ALL.len()];
        self.deal_cursor += 1;
        color
    }
}

impl ClaimPeer for LocalReferee {
    fn submit(&mut self, request: ClaimRequest) -> oneshot::Receiver<ClaimAck> {
        let (tx, rx) = oneshot::channel();
        let ack = self.apply(&request);
        let _ = tx.send(ack);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardColor::*, PlayerState, Route, TrackColor};

    fn referee(cards: &[CardColor]) -> LocalReferee {
        let board = Board::new(vec![
            Route::uniform(TrackColor::Gray, 2).unwrap(),
            Route::uniform(TrackColor::Fixed(Blue), 1).unwrap(),
        ]);
        let context = TurnContext {
            my_turn: true,
            players: vec![
                PlayerState {
                    name: "Ana".to_string(),
                    color: "red".to_string(),
                    coins: 10,
                    cards: cards.to_vec(),
                },
                PlayerState {
                    name: "Bruno".to_string(),
                    color: "yellow".to_string(),
                    coins: 10,
                    cards: Vec::new(),
                },
            ],
            ..TurnContext::default()
        };
        LocalReferee::new(board, context)
    }

    fn request(
        claim_id: u64,
        route_index: usize,
        segment_index: usize,
        card: CardColor,
    ) -> ClaimRequest {
        ClaimRequest {
            claim_id,
            route_length: 2,
            route_index,
            segment_index,
            selected_card_color: card,
            route_color: TrackColor::Gray,
        }
    }

    #[test]
    fn first_gray_pin_locks_color_and_consumes_card() {
        let mut referee = referee(&[Green, Green, Rainbow]);
        let ack = referee.apply(&request(1, 0, 0, Green));
        let ClaimAck::Confirmed { claim_id, context } = ack else {
            panic!("expected confirmation");
        };
        assert_eq!(claim_id, 1);
        assert_eq!(context.gray_route_color, Some(Green));
        assert_eq!(context.selected_route_index, Some(0));
        assert_eq!(context.action_count, 2);
        assert_eq!(context.players[0].cards, vec![Green, Rainbow]);
        assert_eq!(context.players[0].coins, 9);
        assert_eq!(
            context.action_data,
            Some(ClaimPlacement {
                route_index: 0,
                segment_index: 0
            })
        );
    }

    #[test]
    fn completing_route_ends_claim() {
        let mut referee = referee(&[Rainbow, Green]);
        referee.apply(&request(1, 0, 0, Rainbow));
        assert_eq!(referee.context().gray_route_color, None);

        let ClaimAck::Confirmed { context, .. } = referee.apply(&request(2, 0, 1, Green)) else {
            panic!("expected confirmation");
        };
        assert_eq!(context.action_count, 0);
        assert_eq!(context.action_name, ActionName::Start);
        assert_eq!(context.selected_route_index, None);
        assert!(context.my_turn);
        assert!(referee.board().routes()[0].is_completed_by("red"));
    }

    #[test]
    fn refuses_claimed_segments_and_missing_cards() {
        let mut referee = referee(&[Blue, Blue]);
        assert_eq!(
            referee.try_apply(&request(1, 0, 0, Red)),
            Err(RefereeError::MissingCard(Red))
        );
        assert!(matches!(
            referee.try_apply(&request(1, 0, 5, Blue)),
            Err(RefereeError::Engine(EngineError::SegmentOutOfRange { segment: 5, .. }))
        ));

        referee.apply(&request(2, 0, 0, Blue));
        let ack = referee.apply(&request(3, 0, 0, Blue));
        assert_eq!(
            ack,
            ClaimAck::Rejected {
                claim_id: 3,
                reason: "Coin already placed!".to_string()
            }
        );

        let ack = referee.apply(&request(4, 1, 0, Blue));
        assert_eq!(ack.claim_id(), 4);
        assert!(matches!(
            ack,
            ClaimAck::Rejected { ref reason, .. } if reason.contains("multiple routes")
        ));
    }

    #[test]
    fn drawing_cards_requires_idle_turn() {
        let mut referee = referee(&[]);
        let context = referee.draw_cards(2).expect("idle turn");
        assert_eq!(context.players[0].cards, vec![White, Yellow]);
        assert!(context.my_turn);

        referee.apply(&request(1, 0, 0, White));
        assert_eq!(referee.draw_cards(2), Err(RefereeError::ActionInProgress));
        assert_eq!(
            referee.draw_cards(2).map_err(|err| err.to_string()),
            Err("Finish the current action first!".to_string())
        );
    }

    #[test]
    fn drawing_cards_off_turn_is_refused() {
        let mut referee = referee(&[]);
        referee.draw_cards(1).expect("idle turn");
        referee.context.my_turn = false;
        assert_eq!(referee.draw_cards(1), Err(RefereeError::NotYourTurn));
    }
}
