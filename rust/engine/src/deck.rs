use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};

/// A single 52-card deck consumed without replacement. The RNG lives with the
/// deck so consecutive hands at one table draw from one seeded stream.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::from_os_rng(),
        }
    }

    /// Restores all 52 cards and shuffles them.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    /// Shuffles a deck that no longer contains `known`. Used when a table is
    /// rebuilt around cards that are already visible.
    pub fn shuffle_excluding(&mut self, known: &[Card]) {
        self.cards = full_deck();
        self.cards.retain(|c| !known.contains(c));
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let c = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(c)
    }

    pub fn burn_card(&mut self) {
        let _ = self.deal_card();
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_order() {
        let mut a = Deck::new_with_seed(7);
        let mut b = Deck::new_with_seed(7);
        a.shuffle();
        b.shuffle();
        let da: Vec<_> = (0..52).filter_map(|_| a.deal_card()).collect();
        let db: Vec<_> = (0..52).filter_map(|_| b.deal_card()).collect();
        assert_eq!(da, db);
    }

    #[test]
    fn deals_without_replacement() {
        let mut d = Deck::new_with_seed(11);
        d.shuffle();
        let mut seen = HashSet::new();
        while let Some(c) = d.deal_card() {
            assert!(seen.insert(c), "duplicate card {c}");
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn excluded_cards_never_dealt() {
        let mut d = Deck::new_with_seed(3);
        let known = crate::cards::parse_cards("Ah Kd 2c").expect("cards");
        d.shuffle_excluding(&known);
        assert_eq!(d.remaining(), 49);
        while let Some(c) = d.deal_card() {
            assert!(!known.contains(&c));
        }
    }
}
