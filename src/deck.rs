//! Deck and hand management
//!
//! Each side owns one `Deck`: a shuffled draw pile, a four-card hand, a
//! "next card" preview and a discard pile. Cards are never created or lost;
//! an empty draw pile is refilled from the discard pile and reshuffled.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::cards::{CardDef, CardId};
use crate::consts::HAND_SIZE;
use crate::error::DeckError;

/// Smallest deck that can fill the hand plus the preview
pub const MIN_DECK_SIZE: usize = HAND_SIZE + 1;

/// Whether `elixir` covers the cost of `id`
#[inline]
pub fn affordable(id: CardId, elixir: f32) -> bool {
    elixir >= f32::from(id.def().cost)
}

#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    draw_pile: Vec<CardId>,
    discard: Vec<CardId>,
    hand: [CardId; HAND_SIZE],
    next: CardId,
}

impl Deck {
    /// Shuffle a copy of `cards`, deal the hand, then the preview card
    pub fn new<R: Rng + ?Sized>(cards: &[CardId], rng: &mut R) -> Result<Self, DeckError> {
        if cards.len() < MIN_DECK_SIZE {
            return Err(DeckError::TooFewCards {
                have: cards.len(),
                need: MIN_DECK_SIZE,
            });
        }

        let mut draw_pile = cards.to_vec();
        draw_pile.shuffle(rng);

        // Deal from the top of the pile: four hand slots, then the preview
        let mut dealt = draw_pile.split_off(draw_pile.len() - MIN_DECK_SIZE);
        dealt.reverse();
        let hand: [CardId; HAND_SIZE] = std::array::from_fn(|i| dealt[i]);
        let next = dealt[HAND_SIZE];

        Ok(Self {
            draw_pile,
            discard: Vec::new(),
            hand,
            next,
        })
    }

    /// Pop the top of the draw pile, recycling the discard pile when empty.
    ///
    /// Returns `None` only if both piles are empty.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<CardId> {
        if self.draw_pile.is_empty() {
            self.draw_pile.append(&mut self.discard);
            self.draw_pile.shuffle(rng);
        }
        self.draw_pile.pop()
    }

    /// Whether the card at `index` costs no more than `elixir`.
    /// Out-of-range indices are never affordable.
    pub fn can_afford(&self, index: usize, elixir: f32) -> bool {
        self.hand
            .get(index)
            .is_some_and(|&id| affordable(id, elixir))
    }

    /// Play the card at `index`: discard it, slide the preview into its slot,
    /// and draw a new preview. Out-of-range indices are a no-op.
    ///
    /// The caller deducts the elixir cost.
    pub fn play<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Option<&'static CardDef> {
        if index >= HAND_SIZE {
            return None;
        }
        let played = std::mem::replace(&mut self.hand[index], self.next);
        self.discard.push(played);
        // The discard pile now holds at least `played`, so a draw always succeeds
        if let Some(next) = self.draw(rng) {
            self.next = next;
        }
        Some(played.def())
    }

    pub fn hand(&self) -> &[CardId; HAND_SIZE] {
        &self.hand
    }

    pub fn hand_cards(&self) -> [&'static CardDef; HAND_SIZE] {
        self.hand.map(CardId::def)
    }

    pub fn next_card(&self) -> &'static CardDef {
        self.next.def()
    }

    pub fn next_id(&self) -> CardId {
        self.next
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard.len()
    }

    /// Number of cards across every zone (always the original deck size)
    pub fn total_cards(&self) -> usize {
        self.draw_pile.len() + self.discard.len() + HAND_SIZE + 1
    }

    /// Every card currently held in any zone, sorted
    pub fn all_cards(&self) -> Vec<CardId> {
        let mut all: Vec<CardId> = self
            .draw_pile
            .iter()
            .chain(self.discard.iter())
            .chain(self.hand.iter())
            .copied()
            .collect();
        all.push(self.next);
        all.sort();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::default_deck;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn sorted(mut cards: Vec<CardId>) -> Vec<CardId> {
        cards.sort();
        cards
    }

    #[test]
    fn test_new_deals_hand_and_preview() {
        let mut rng = Pcg32::seed_from_u64(7);
        let deck = Deck::new(&default_deck(), &mut rng).unwrap();
        assert_eq!(deck.draw_pile_len(), 3);
        assert_eq!(deck.discard_len(), 0);
        assert_eq!(deck.total_cards(), 8);
        assert_eq!(deck.all_cards(), sorted(default_deck()));
    }

    #[test]
    fn test_card_defs_follow_hand_and_preview() {
        let mut rng = Pcg32::seed_from_u64(21);
        let mut deck = Deck::new(&default_deck(), &mut rng).unwrap();
        deck.play(1, &mut rng);

        let ids: Vec<CardId> = deck.hand_cards().iter().map(|def| def.id).collect();
        assert_eq!(ids, deck.hand().to_vec());
        assert_eq!(deck.next_card().id, deck.next_id());
    }

    #[test]
    fn test_too_few_cards() {
        let mut rng = Pcg32::seed_from_u64(7);
        let err = Deck::new(&[CardId::Runner; 4], &mut rng).unwrap_err();
        assert_eq!(err, DeckError::TooFewCards { have: 4, need: 5 });
    }

    #[test]
    fn test_play_replaces_slot_with_preview() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut deck = Deck::new(&default_deck(), &mut rng).unwrap();
        let before = *deck.hand();
        let preview = deck.next_id();

        let played = deck.play(2, &mut rng).unwrap();
        assert_eq!(played.id, before[2]);
        assert_eq!(deck.hand()[2], preview);
        assert_eq!(deck.discard_len(), 1);
        assert_eq!(deck.hand()[0], before[0]);
    }

    #[test]
    fn test_play_invalid_index_is_noop() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut deck = Deck::new(&default_deck(), &mut rng).unwrap();
        let hand = *deck.hand();
        let next = deck.next_id();
        assert!(deck.play(4, &mut rng).is_none());
        assert!(deck.play(usize::MAX, &mut rng).is_none());
        assert_eq!(*deck.hand(), hand);
        assert_eq!(deck.next_id(), next);
        assert_eq!(deck.discard_len(), 0);
    }

    #[test]
    fn test_reshuffle_when_draw_pile_empty() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut deck = Deck::new(&default_deck(), &mut rng).unwrap();

        // Drain the draw pile through plays so the discard pile fills up
        while deck.draw_pile_len() > 0 {
            deck.play(0, &mut rng);
        }
        assert!(deck.discard_len() > 0);

        let drawn = deck.draw(&mut rng);
        assert!(drawn.is_some());
        assert_eq!(deck.discard_len(), 0);
    }

    #[test]
    fn test_minimum_deck_cycles() {
        let mut rng = Pcg32::seed_from_u64(9);
        let cards = [
            CardId::Runner,
            CardId::Guardian,
            CardId::Slingbot,
            CardId::BomberBug,
            CardId::BarrierPad,
        ];
        let mut deck = Deck::new(&cards, &mut rng).unwrap();
        for i in 0..20 {
            assert!(deck.play(i % HAND_SIZE, &mut rng).is_some());
            assert_eq!(deck.total_cards(), 5);
        }
    }

    #[test]
    fn test_can_afford() {
        let mut rng = Pcg32::seed_from_u64(1);
        let deck = Deck::new(&default_deck(), &mut rng).unwrap();
        for (i, id) in deck.hand().iter().enumerate() {
            let cost = f32::from(id.def().cost);
            assert!(deck.can_afford(i, cost));
            assert!(!deck.can_afford(i, cost - 0.01));
        }
        assert!(!deck.can_afford(4, 10.0));
    }

    proptest! {
        #[test]
        fn prop_deck_conservation(seed in any::<u64>(), plays in prop::collection::vec(0usize..6, 0..64)) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let original = default_deck();
            let mut deck = Deck::new(&original, &mut rng).unwrap();
            for index in plays {
                deck.play(index, &mut rng);
                prop_assert_eq!(deck.total_cards(), original.len());
                prop_assert_eq!(deck.all_cards(), sorted(original.clone()));
            }
        }

        #[test]
        fn prop_affordability_gate(seed in any::<u64>(), index in 0usize..8, elixir in 0.0f32..12.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let deck = Deck::new(&default_deck(), &mut rng).unwrap();
            let expected = index < HAND_SIZE
                && elixir >= f32::from(deck.hand()[index].def().cost);
            prop_assert_eq!(deck.can_afford(index, elixir), expected);
        }
    }
}
