use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::OnePair => "One Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Best five-card hand found in a set of cards.
///
/// `kickers` holds rank values (2..=14) ordered by significance: the defining
/// group(s) first, then the remaining cards high to low, zero-padded. A wheel
/// straight reports 5 as its high card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EvaluatedHand {
    pub category: Category,
    pub kickers: [u8; 5],
}

impl EvaluatedHand {
    /// Single scalar ordering all hands: category in the top bits, then one
    /// nibble per kicker.
    pub fn value(&self) -> u32 {
        let mut v = self.category as u32;
        for k in self.kickers {
            v = (v << 4) | u32::from(k & 0x0f);
        }
        v
    }

    pub fn primary_rank(&self) -> u8 {
        self.kickers[0]
    }
}

impl Ord for EvaluatedHand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl PartialOrd for EvaluatedHand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scores 5 to 7 cards by ranking every five-card subset and keeping the best.
pub fn evaluate(cards: &[Card]) -> Result<EvaluatedHand, GameError> {
    let n = cards.len();
    if !(5..=7).contains(&n) {
        return Err(GameError::InvalidCardCount(n));
    }
    let mut best: Option<EvaluatedHand> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let hand = evaluate_five(&[cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.map_or(true, |current| hand > current) {
                            best = Some(hand);
                        }
                    }
                }
            }
        }
    }
    best.ok_or(GameError::InvalidCardCount(n))
}

pub fn compare_hands(a: &EvaluatedHand, b: &EvaluatedHand) -> Ordering {
    a.cmp(b)
}

/// Ranks exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> EvaluatedHand {
    let mut ranks: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high(&ranks);

    if let Some(high) = straight_high {
        let category = if flush {
            Category::StraightFlush
        } else {
            Category::Straight
        };
        return EvaluatedHand {
            category,
            kickers: [high, 0, 0, 0, 0],
        };
    }

    // Group ranks by multiplicity, larger groups first, then higher rank.
    let mut groups: Vec<(u8, u8)> = Vec::with_capacity(5);
    for &r in &ranks {
        match groups.iter_mut().find(|(rank, _)| *rank == r) {
            Some((_, count)) => *count += 1,
            None => groups.push((r, 1)),
        }
    }
    groups.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let mut kickers = [0u8; 5];
    for (slot, (rank, _)) in kickers.iter_mut().zip(groups.iter()) {
        *slot = *rank;
    }

    let category = match (groups[0].1, groups.get(1).map(|g| g.1)) {
        (4, _) => Category::FourOfAKind,
        (3, Some(2)) => Category::FullHouse,
        _ if flush => {
            kickers.copy_from_slice(&ranks);
            Category::Flush
        }
        (3, _) => Category::ThreeOfAKind,
        (2, Some(2)) => Category::TwoPair,
        (2, _) => Category::OnePair,
        _ => Category::HighCard,
    };

    EvaluatedHand { category, kickers }
}

/// `ranks` sorted descending. Returns the straight's top card, 5 for a wheel.
fn straight_high(ranks: &[u8]) -> Option<u8> {
    let distinct = ranks.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if ranks[0] - ranks[4] == 4 {
        return Some(ranks[0]);
    }
    if ranks == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn eval(s: &str) -> EvaluatedHand {
        evaluate(&parse_cards(s).expect("cards")).expect("evaluate")
    }

    #[test]
    fn value_agrees_with_category_order() {
        let pair = eval("As Ad 7c 5h 2d");
        let trips = eval("2s 2d 2c 5h 7d");
        assert!(trips.value() > pair.value());
        assert!(trips > pair);
    }

    #[test]
    fn wheel_is_lowest_straight() {
        let wheel = eval("Ah 2d 3c 4s 5h");
        let six_high = eval("2d 3c 4s 5h 6d");
        assert_eq!(wheel.category, Category::Straight);
        assert_eq!(wheel.kickers[0], 5);
        assert!(six_high > wheel);
    }

    #[test]
    fn rejects_bad_card_counts() {
        let four = parse_cards("Ah Kh Qh Jh").expect("cards");
        assert_eq!(evaluate(&four), Err(GameError::InvalidCardCount(4)));
    }
}
