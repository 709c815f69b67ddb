//! Reconciles the hand against the authoritative card list.
//!
//! The list is re-sorted into hand order and then diffed slot by slot. A slot
//! whose card is still present and has the same color is left untouched, so
//! unchanged cards keep their on-screen identity. Every other slot is rebuilt.

use tracing::debug;

use super::Hand;
use crate::models::{sort_hand, CardColor};

/// What a reconcile pass did to the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Slots left untouched.
    pub kept: usize,
    /// Cards created (new slots and replacements).
    pub created: usize,
    /// Cards destroyed (surplus slots and replaced cards).
    pub destroyed: usize,
}

impl ReconcileReport {
    /// Whether the pass created or destroyed nothing.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.destroyed == 0
    }
}

impl Hand {
    /// Bring the hand in line with `colors`. The result has exactly
    /// `colors.len()` cards in hand order.
    pub fn reconcile(&mut self, colors: &[CardColor]) -> ReconcileReport {
        let mut sorted = colors.to_vec();
        sort_hand(&mut sorted);

        let old_len = self.cards.len();
        let new_len = sorted.len();
        let mut report = ReconcileReport::default();

        for (index, color) in sorted.iter().copied().enumerate() {
            if index < old_len {
                let existing = &mut self.cards[index];
                if existing.color() == color && existing.is_present() {
                    report.kept += 1;
                    continue;
                }
                existing.destroy();
                report.destroyed += 1;
                let card = self.spawn(color);
                self.cards[index] = card;
            } else {
                let card = self.spawn(color);
                self.cards.push(card);
            }
            report.created += 1;
        }

        if new_len < old_len {
            for surplus in &mut self.cards[new_len..] {
                surplus.destroy();
                report.destroyed += 1;
            }
            self.cards.truncate(new_len);
        }

        debug!(
            zone = %self.zone,
            old_len,
            new_len,
            kept = report.kept,
            created = report.created,
            destroyed = report.destroyed,
            "hand reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::EngineError,
        models::{CardColor::*, ZoneId},
    };

    fn hand_of(colors: &[CardColor]) -> Hand {
        let mut hand = Hand::new(ZoneId::default());
        hand.reconcile(colors);
        hand
    }

    fn generations(hand: &Hand) -> Vec<u64> {
        hand.cards().iter().map(|card| card.generation()).collect()
    }

    #[test]
    fn identical_list_touches_nothing() {
        let colors = [Black, Blue, Blue, Red, Rainbow];
        let mut hand = hand_of(&colors);
        let before = generations(&hand);

        let report = hand.reconcile(&colors);
        assert!(report.is_noop());
        assert_eq!(report.kept, 5);
        assert_eq!(generations(&hand), before);
    }

    #[test]
    fn unsorted_input_is_sorted_before_diffing() {
        let mut hand = hand_of(&[Blue, Rainbow, Black]);
        assert_eq!(hand.colors(), vec![Black, Blue, Rainbow]);

        let report = hand.reconcile(&[Rainbow, Black, Blue]);
        assert!(report.is_noop());
    }

    #[test]
    fn result_matches_sorted_input() {
        let cases: [(&[CardColor], &[CardColor]); 4] = [
            (&[], &[Red, Green]),
            (&[Red, Green, Green], &[]),
            (&[Blue, Red, Rainbow], &[Rainbow, White, Orange, Orange, Black]),
            (&[Yellow, Yellow, Yellow, Purple], &[Purple, Yellow]),
        ];
        for (current, next) in cases {
            let mut hand = hand_of(current);
            hand.reconcile(next);
            let mut expected = next.to_vec();
            sort_hand(&mut expected);
            assert_eq!(hand.colors(), expected);
            assert_eq!(hand.len(), next.len());
            assert!(hand.cards().iter().all(|card| card.is_present()));
        }
    }

    #[test]
    fn changed_slot_is_replaced_and_rest_kept() {
        let mut hand = hand_of(&[Black, Blue, Red]);
        let before = generations(&hand);

        let report = hand.reconcile(&[Black, Green, Red]);
        assert_eq!(hand.colors(), vec![Black, Green, Red]);
        assert_eq!(report.kept, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);

        let after = generations(&hand);
        assert_eq!(after[0], before[0]);
        assert_ne!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn shrinking_destroys_surplus() {
        let mut hand = hand_of(&[Black, Blue, Red, Rainbow]);
        let report = hand.reconcile(&[Black, Blue]);
        assert_eq!(hand.len(), 2);
        assert_eq!(report.kept, 2);
        assert_eq!(report.destroyed, 2);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn growing_creates_new_interactive_cards() {
        let mut hand = hand_of(&[Red]);
        let report = hand.reconcile(&[Red, Red, Rainbow]);
        assert_eq!(report.kept, 1);
        assert_eq!(report.created, 2);
        assert!(hand.cards().iter().all(|card| card.is_interactive()));
    }

    #[test]
    fn insertion_shifts_later_slots() {
        // Positional identity: inserting a color early rebuilds every slot whose
        // color changed, even though the multiset only grew by one.
        let mut hand = hand_of(&[Blue, Red]);
        let report = hand.reconcile(&[Black, Blue, Red]);
        assert_eq!(hand.colors(), vec![Black, Blue, Red]);
        assert_eq!(report.kept, 0);
        assert_eq!(report.created, 3);
        assert_eq!(report.destroyed, 2);
    }

    #[test]
    fn destroyed_card_of_same_color_is_rebuilt() -> Result<(), EngineError> {
        let colors = [Blue, Green, Red];
        let mut hand = hand_of(&colors);
        let before = generations(&hand);
        hand.card_mut(1)?.destroy();

        let report = hand.reconcile(&colors);
        assert_eq!(report.kept, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);
        assert_eq!(hand.colors(), vec![Blue, Green, Red]);
        assert!(hand.card(1)?.is_present());

        let after = generations(&hand);
        assert_eq!(after[0], before[0]);
        assert!(after[1] > before[1]);
        assert_eq!(after[2], before[2]);
        Ok(())
    }

    #[test]
    fn empty_list_empties_hand() {
        let mut hand = hand_of(&[Green, Green]);
        let report = hand.reconcile(&[]);
        assert!(hand.is_empty());
        assert_eq!(report.destroyed, 2);
    }
}
