//! Legality rules for pinning a route segment with the lifted card.

use thiserror::Error;

use crate::{
    hand::ColorCounter,
    models::{CardColor, Route, Segment, SegmentRef, TrackColor, TurnContext},
};

/// A pin attempt the player cannot make. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The segment already carries a marker.
    #[error("Coin already placed!")]
    AlreadyClaimed,
    /// The card color cannot pay for this route.
    #[error("Color mismatch {card} vs {route}")]
    ColorMismatch {
        /// Lifted card.
        card: CardColor,
        /// Route color.
        route: TrackColor,
    },
    /// The hand cannot cover the full route length.
    #[error("Insufficient matching cards to claim route!")]
    InsufficientCards {
        /// Route length.
        needed: usize,
        /// Best matching count the hand offers.
        available: u32,
    },
    /// The player has fewer coins than the route has segments.
    #[error("Not enough coins to claim route!")]
    InsufficientCoins {
        /// Route length.
        needed: usize,
        /// Coin balance.
        available: u32,
    },
    /// A different route is already pinned this turn.
    #[error("Cannot claim multiple routes in one turn!")]
    MultipleRoutes {
        /// Route pinned earlier this turn.
        pinned: usize,
        /// Route the player tried to pin.
        requested: usize,
    },
    /// The gray route already has another color locked in.
    #[error("Cannot mix colors in gray route")]
    GrayColorConflict {
        /// Color locked by the first pin.
        locked: CardColor,
        /// Lifted card.
        card: CardColor,
    },
}

/// Everything the rule table looks at for one pin.
#[derive(Debug, Clone, Copy)]
pub struct PinAttempt<'a> {
    /// Target segment address.
    pub at: SegmentRef,
    /// Route containing the segment.
    pub route: &'a Route,
    /// Target segment.
    pub segment: &'a Segment,
    /// Color of the lifted card.
    pub card: CardColor,
    /// The local player's coin balance.
    pub coins: u32,
}

/// Number of cards the hand can put towards `route`.
pub fn matching_cards(counter: &ColorCounter, route: &Route) -> u32 {
    match route.color() {
        TrackColor::Gray => counter.max_single_color() + counter.wildcards(),
        TrackColor::Fixed(color) => counter.get(color) + counter.wildcards(),
    }
}

/// Whether the hand holds enough matching cards for the whole route.
pub fn hand_covers_route(counter: &ColorCounter, route: &Route) -> bool {
    matching_cards(counter, route) as usize >= route.len()
}

/// Run the rule table in order and stop at the first failure.
pub fn validate_pin(
    ctx: &TurnContext,
    counter: &ColorCounter,
    attempt: &PinAttempt<'_>,
) -> Result<(), Rejection> {
    if attempt.segment.is_claimed() {
        return Err(Rejection::AlreadyClaimed);
    }

    let route_color = attempt.route.color();
    let card = attempt.card;

    let Some(pinned) = ctx.selected_route_index else {
        return validate_first_pin(counter, attempt);
    };

    if pinned != attempt.at.route_index {
        return Err(Rejection::MultipleRoutes {
            pinned,
            requested: attempt.at.route_index,
        });
    }
    if card.is_wildcard() {
        return Ok(());
    }
    match route_color {
        TrackColor::Fixed(color) if color != card => Err(Rejection::ColorMismatch {
            card,
            route: route_color,
        }),
        TrackColor::Fixed(_) => Ok(()),
        TrackColor::Gray => match ctx.gray_route_color {
            Some(locked) if locked != card => Err(Rejection::GrayColorConflict { locked, card }),
            _ => Ok(()),
        },
    }
}

fn validate_first_pin(counter: &ColorCounter, attempt: &PinAttempt<'_>) -> Result<(), Rejection> {
    let route = attempt.route;
    if let TrackColor::Fixed(color) = route.color() {
        if !attempt.card.is_wildcard() && color != attempt.card {
            return Err(Rejection::ColorMismatch {
                card: attempt.card,
                route: route.color(),
            });
        }
    }

    let available = matching_cards(counter, route);
    if (available as usize) < route.len() {
        return Err(Rejection::InsufficientCards {
            needed: route.len(),
            available,
        });
    }

    if route.len() > attempt.coins as usize {
        return Err(Rejection::InsufficientCoins {
            needed: route.len(),
            available: attempt.coins,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardColor::*;

    fn counter(colors: &[CardColor]) -> ColorCounter {
        ColorCounter::from_colors(colors.iter().copied())
    }

    fn route(color: TrackColor, len: usize) -> Route {
        Route::uniform(color, len).unwrap()
    }

    fn attempt<'a>(route: &'a Route, route_index: usize, card: CardColor) -> PinAttempt<'a> {
        PinAttempt {
            at: SegmentRef::new(route_index, 0),
            route,
            segment: &route.segments()[0],
            card,
            coins: 45,
        }
    }

    fn fresh_turn() -> TurnContext {
        TurnContext {
            my_turn: true,
            ..TurnContext::default()
        }
    }

    #[test]
    fn gray_sufficiency_uses_best_color_plus_wildcards() {
        let hand = counter(&[Red, Blue, Blue, Rainbow, Rainbow]);
        assert!(hand_covers_route(&hand, &route(TrackColor::Gray, 4)));
        assert!(!hand_covers_route(&hand, &route(TrackColor::Gray, 5)));
    }

    #[test]
    fn colored_sufficiency_uses_route_color_plus_wildcards() {
        let hand = counter(&[Red, Red, Blue, Blue, Blue, Rainbow]);
        assert!(hand_covers_route(&hand, &route(TrackColor::Fixed(Red), 3)));
        assert!(!hand_covers_route(&hand, &route(TrackColor::Fixed(Red), 4)));
        assert!(hand_covers_route(&hand, &route(TrackColor::Fixed(Blue), 4)));
    }

    #[test]
    fn claimed_segment_is_rejected_first() {
        let mut claimed = route(TrackColor::Fixed(Green), 2);
        let mut board = crate::models::Board::new(vec![claimed.clone()]);
        board.place_marker(SegmentRef::new(0, 0), "red").unwrap();
        claimed = board.routes()[0].clone();

        let hand = counter(&[]);
        let result = validate_pin(&fresh_turn(), &hand, &attempt(&claimed, 0, Red));
        assert_eq!(result, Err(Rejection::AlreadyClaimed));
    }

    #[test]
    fn first_pin_checks_color_cards_and_coins_in_order() {
        let green = route(TrackColor::Fixed(Green), 3);
        let ctx = fresh_turn();

        let hand = counter(&[Red, Green, Green, Green]);
        assert_eq!(
            validate_pin(&ctx, &hand, &attempt(&green, 0, Red)),
            Err(Rejection::ColorMismatch {
                card: Red,
                route: TrackColor::Fixed(Green)
            })
        );

        let short = counter(&[Green, Green]);
        assert_eq!(
            validate_pin(&ctx, &short, &attempt(&green, 0, Green)),
            Err(Rejection::InsufficientCards {
                needed: 3,
                available: 2
            })
        );

        let mut poor = attempt(&green, 0, Rainbow);
        poor.coins = 2;
        assert_eq!(
            validate_pin(&ctx, &hand, &poor),
            Err(Rejection::InsufficientCoins {
                needed: 3,
                available: 2
            })
        );

        assert_eq!(validate_pin(&ctx, &hand, &attempt(&green, 0, Green)), Ok(()));
    }

    #[test]
    fn first_pin_on_gray_accepts_any_color() {
        let gray = route(TrackColor::Gray, 2);
        let hand = counter(&[Purple, Purple]);
        assert_eq!(
            validate_pin(&fresh_turn(), &hand, &attempt(&gray, 0, Purple)),
            Ok(())
        );
    }

    #[test]
    fn second_route_in_same_turn_is_rejected() {
        let other = route(TrackColor::Gray, 2);
        let mut ctx = fresh_turn();
        ctx.selected_route_index = Some(3);

        let hand = counter(&[Red, Red]);
        assert_eq!(
            validate_pin(&ctx, &hand, &attempt(&other, 5, Red)),
            Err(Rejection::MultipleRoutes {
                pinned: 3,
                requested: 5
            })
        );
    }

    #[test]
    fn follow_up_pins_on_colored_route_must_match() {
        let blue = route(TrackColor::Fixed(Blue), 3);
        let mut ctx = fresh_turn();
        ctx.selected_route_index = Some(1);
        let hand = counter(&[]);

        assert_eq!(validate_pin(&ctx, &hand, &attempt(&blue, 1, Blue)), Ok(()));
        assert_eq!(
            validate_pin(&ctx, &hand, &attempt(&blue, 1, Rainbow)),
            Ok(())
        );
        assert!(matches!(
            validate_pin(&ctx, &hand, &attempt(&blue, 1, White)),
            Err(Rejection::ColorMismatch { .. })
        ));
    }

    #[test]
    fn gray_route_locks_first_color() {
        let gray = route(TrackColor::Gray, 4);
        let mut ctx = fresh_turn();
        ctx.selected_route_index = Some(2);
        ctx.gray_route_color = Some(Green);
        let hand = counter(&[]);

        assert_eq!(
            validate_pin(&ctx, &hand, &attempt(&gray, 2, Blue)),
            Err(Rejection::GrayColorConflict {
                locked: Green,
                card: Blue
            })
        );
        assert_eq!(
            validate_pin(&ctx, &hand, &attempt(&gray, 2, Rainbow)),
            Ok(())
        );
        assert_eq!(validate_pin(&ctx, &hand, &attempt(&gray, 2, Green)), Ok(()));
    }

    #[test]
    fn follow_up_pin_skips_sufficiency_and_coin_checks() {
        let gray = route(TrackColor::Gray, 4);
        let mut ctx = fresh_turn();
        ctx.selected_route_index = Some(0);
        let mut pin = attempt(&gray, 0, Yellow);
        pin.coins = 0;
        assert_eq!(validate_pin(&ctx, &counter(&[]), &pin), Ok(()));
    }

    #[test]
    fn messages_match_notifications() {
        assert_eq!(Rejection::AlreadyClaimed.to_string(), "Coin already placed!");
        assert_eq!(
            Rejection::ColorMismatch {
                card: Red,
                route: TrackColor::Fixed(Blue)
            }
            .to_string(),
            "Color mismatch red vs blue"
        );
        assert_eq!(
            Rejection::MultipleRoutes {
                pinned: 0,
                requested: 1
            }
            .to_string(),
            "Cannot claim multiple routes in one turn!"
        );
    }
}
