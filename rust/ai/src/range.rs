//! Preflop hand classes, range notation and the static range tables.

use std::collections::{HashMap, HashSet};
use std::fmt;

use felt_engine::cards::{Card, Rank};
use felt_engine::snapshot::TableSnapshot;
use serde::{Deserialize, Serialize};

use crate::errors::DecisionError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Shape {
    Pair,
    Suited,
    Offsuit,
}

/// One of the 169 preflop hand classes, e.g. `AKs`, `T9o`, `77`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HandClass {
    pub high: Rank,
    pub low: Rank,
    pub shape: Shape,
}

impl HandClass {
    pub fn from_cards(a: Card, b: Card) -> Self {
        let (high, low) = if a.rank >= b.rank {
            (a.rank, b.rank)
        } else {
            (b.rank, a.rank)
        };
        let shape = if high == low {
            Shape::Pair
        } else if a.suit == b.suit {
            Shape::Suited
        } else {
            Shape::Offsuit
        };
        Self { high, low, shape }
    }

    fn from_values(high: u8, low: u8, shape: Shape) -> Option<Self> {
        Some(Self {
            high: Rank::from_value(high)?,
            low: Rank::from_value(low)?,
            shape,
        })
    }
}

impl fmt::Display for HandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.high.symbol(), self.low.symbol())?;
        match self.shape {
            Shape::Pair => Ok(()),
            Shape::Suited => f.write_str("s"),
            Shape::Offsuit => f.write_str("o"),
        }
    }
}

/// A set of hand classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    classes: HashSet<HandClass>,
}

impl Range {
    /// Parses comma or whitespace separated notation.
    ///
    /// Supported forms: `77`, `AKs`, `AKo`, `AK` (both shapes), `22+` (pairs
    /// upward), `A2s+` / `KTo+` (kicker upward to one below the top card),
    /// `TT-77`, `A5s-A2s` (kicker span) and `76s-54s` (connected span).
    ///
    /// ```
    /// use felt_ai::range::Range;
    ///
    /// let r = Range::parse("QQ+, A5s-A4s, 76s-54s").unwrap();
    /// assert_eq!(r.len(), 3 + 2 + 3);
    /// ```
    pub fn parse(notation: &str) -> Result<Self, DecisionError> {
        let mut classes = HashSet::new();
        for token in notation
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            classes.extend(parse_token(token)?);
        }
        Ok(Self { classes })
    }

    pub fn contains(&self, class: &HandClass) -> bool {
        self.classes.contains(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Base {
    high: u8,
    low: u8,
    shapes: &'static [Shape],
}

impl Base {
    fn is_pair(&self) -> bool {
        self.high == self.low
    }
}

fn parse_base(text: &str, token: &str) -> Result<Base, DecisionError> {
    let bad = || DecisionError::InvalidRange(token.to_string());
    let mut chars = text.chars();
    let a = chars.next().and_then(Rank::from_char).ok_or_else(bad)?;
    let b = chars.next().and_then(Rank::from_char).ok_or_else(bad)?;
    let suffix = chars.next();
    if chars.next().is_some() {
        return Err(bad());
    }
    let (high, low) = if a >= b { (a, b) } else { (b, a) };
    let shapes: &'static [Shape] = match (high == low, suffix) {
        (true, None) => &[Shape::Pair],
        (true, Some(_)) => return Err(bad()),
        (false, Some('s')) => &[Shape::Suited],
        (false, Some('o')) => &[Shape::Offsuit],
        (false, None) => &[Shape::Suited, Shape::Offsuit],
        (false, Some(_)) => return Err(bad()),
    };
    Ok(Base {
        high: high.value(),
        low: low.value(),
        shapes,
    })
}

fn expand(pairs: impl IntoIterator<Item = (u8, u8)>, shapes: &[Shape]) -> Vec<HandClass> {
    pairs
        .into_iter()
        .flat_map(|(h, l)| {
            shapes
                .iter()
                .filter_map(move |&shape| HandClass::from_values(h, l, shape))
        })
        .collect()
}

fn parse_token(token: &str) -> Result<Vec<HandClass>, DecisionError> {
    let bad = || DecisionError::InvalidRange(token.to_string());

    if let Some((from, to)) = token.split_once('-') {
        let a = parse_base(from, token)?;
        let b = parse_base(to, token)?;
        if a.shapes != b.shapes {
            return Err(bad());
        }
        if a.is_pair() && b.is_pair() {
            let (lo, hi) = (a.high.min(b.high), a.high.max(b.high));
            return Ok(expand((lo..=hi).map(|r| (r, r)), a.shapes));
        }
        if a.is_pair() || b.is_pair() {
            return Err(bad());
        }
        if a.high == b.high {
            let (lo, hi) = (a.low.min(b.low), a.low.max(b.low));
            return Ok(expand((lo..=hi).map(|l| (a.high, l)), a.shapes));
        }
        if a.high - a.low == b.high - b.low {
            let gap = a.high - a.low;
            let (lo, hi) = (a.high.min(b.high), a.high.max(b.high));
            return Ok(expand((lo..=hi).map(|h| (h, h - gap)), a.shapes));
        }
        return Err(bad());
    }

    let (body, plus) = match token.strip_suffix('+') {
        Some(body) => (body, true),
        None => (token, false),
    };
    let base = parse_base(body, token)?;
    let classes = match (plus, base.is_pair()) {
        (false, _) => expand([(base.high, base.low)], base.shapes),
        (true, true) => expand((base.high..=14).map(|r| (r, r)), base.shapes),
        (true, false) => expand((base.low..base.high).map(|l| (base.high, l)), base.shapes),
    };
    Ok(classes)
}

/// Preflop position. Declaration order is preflop action order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Position {
    EarlyPosition,
    MiddlePosition,
    Cutoff,
    Button,
    SmallBlind,
    BigBlind,
}

impl Position {
    pub fn abbreviation(self) -> &'static str {
        match self {
            Position::EarlyPosition => "EP",
            Position::MiddlePosition => "MP",
            Position::Cutoff => "CO",
            Position::Button => "BTN",
            Position::SmallBlind => "SB",
            Position::BigBlind => "BB",
        }
    }

    /// Position of `seat` among the seats dealt into the hand. Heads-up the
    /// dealer is the button and the other seat the big blind.
    pub fn of(snapshot: &TableSnapshot, seat: usize) -> Option<Position> {
        let order = snapshot.seats_from_dealer();
        let n = order.len();
        let idx = order.iter().position(|&s| s == seat)?;
        if n < 2 {
            return None;
        }
        if n == 2 {
            return Some(if Some(seat) == snapshot.dealer_seat {
                Position::Button
            } else {
                Position::BigBlind
            });
        }
        let position = match idx {
            0 => Position::SmallBlind,
            1 => Position::BigBlind,
            i if i == n - 1 => Position::Button,
            i => match n - 1 - i {
                1 => Position::Cutoff,
                2 => Position::MiddlePosition,
                3 if n >= 8 => Position::MiddlePosition,
                _ => Position::EarlyPosition,
            },
        };
        Some(position)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Preflop situation a range answers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Spot {
    Open,
    ThreeBet(Position),
    Flat(Position),
    /// Big blind calling an open from the given position.
    Defend(Position),
    FourBet,
    CallThreeBet,
    ColdFourBet,
    FiveBet,
    CallFourBet,
    ColdFiveBet,
}

const ALL_POSITIONS: [Position; 6] = [
    Position::EarlyPosition,
    Position::MiddlePosition,
    Position::Cutoff,
    Position::Button,
    Position::SmallBlind,
    Position::BigBlind,
];

const OPEN: [(Position, &str); 6] = [
    (Position::EarlyPosition, "22+, A2s+, KTs+, QTs+, JTs, T9s, 98s, AJo+, KQo"),
    (Position::MiddlePosition, "22+, A2s+, K9s+, Q9s+, J9s+, T9s, 98s, 87s, ATo+, KJo+"),
    (
        Position::Cutoff,
        "22+, A2s+, K7s+, Q8s+, J8s+, T8s+, 97s+, 87s, 76s, 65s, A8o+, KTo+, QTo+, JTo",
    ),
    (
        Position::Button,
        "22+, A2s+, K2s+, Q5s+, J7s+, T7s+, 96s+, 86s+, 75s+, 65s, 54s, A2o+, K8o+, Q9o+, J9o+, T9o",
    ),
    (
        Position::SmallBlind,
        "22+, A2s+, K5s+, Q8s+, J8s+, T8s+, 97s+, 87s, 76s, 65s, A7o+, KTo+, QJo",
    ),
    // Raising over limpers from the big blind.
    (Position::BigBlind, "99+, AJs+, KQs, AQo+"),
];

const THREE_BET: [(Position, &str); 5] = [
    (Position::EarlyPosition, "QQ+, AK"),
    (Position::MiddlePosition, "JJ+, AQs+, AKo"),
    (Position::Cutoff, "TT+, AJs+, KQs, A5s-A4s, AQo+"),
    (Position::Button, "99+, ATs+, KJs+, A5s-A2s, AJo+"),
    (Position::SmallBlind, "88+, A9s+, KTs+, QJs, A5s-A2s, ATo+, KQo"),
];

const FLAT: [(Position, &str); 5] = [
    (Position::EarlyPosition, "JJ-22, AQs-ATs, KQs, QJs, JTs, T9s, AQo"),
    (Position::MiddlePosition, "TT-22, AJs-ATs, KQs, KJs, QJs, JTs, T9s, 98s, AJo+"),
    (Position::Cutoff, "99-22, ATs-A6s, KJs, KTs, QJs, QTs, JTs, T9s, 98s, 87s, AJo, KQo"),
    (
        Position::Button,
        "88-22, A9s-A6s, KTs, QTs+, J9s+, T9s, 98s, 87s, 76s, ATo, KQo, KJo",
    ),
    (Position::SmallBlind, "77-22, A8s-A6s, K9s, QTs, JTs, T9s, 98s, A9o, KJo"),
];

const DEFEND: [(Position, &str); 5] = [
    (
        Position::EarlyPosition,
        "JJ-22, AQs-A2s, KTs+, QTs+, J9s+, T9s, 98s, 87s, 76s, AQo, AJo, KQo",
    ),
    (
        Position::MiddlePosition,
        "TT-22, AJs-A2s, K9s+, Q9s+, J9s+, T8s+, 98s, 87s, 76s, 65s, AQo-ATo, KJo+",
    ),
    (
        Position::Cutoff,
        "99-22, ATs-A2s, K6s+, Q8s+, J8s+, T8s+, 97s+, 86s+, 76s, 65s, 54s, AQo-A8o, KTo+, QTo+, JTo",
    ),
    (
        Position::Button,
        "88-22, A9s-A2s, K2s+, Q6s+, J7s+, T7s+, 96s+, 85s+, 75s+, 64s+, 54s, ATo-A2o, K8o+, Q9o+, J9o+, T9o, 98o",
    ),
    (
        Position::SmallBlind,
        "77-22, A8s-A2s, K2s+, Q5s+, J6s+, T6s+, 96s+, 85s+, 74s+, 64s+, 53s+, A9o-A2o, K7o+, Q8o+, J8o+, T8o+, 98o",
    ),
];

const FOUR_BET: &str = "QQ+, AKs, AKo, A5s";
const CALL_THREE_BET: &str = "JJ-77, AQs, AJs, KQs, QJs, JTs, AQo";
const COLD_FOUR_BET: &str = "KK+, AKs";
const FIVE_BET: &str = "KK+";
const CALL_FOUR_BET: &str = "QQ, AKs, AKo";
const COLD_FIVE_BET: &str = "AA";

/// Immutable `(position, spot) -> range` table. Built once per bot.
#[derive(Debug, Clone, Default)]
pub struct RangeBook {
    ranges: HashMap<(Position, Spot), Range>,
}

impl RangeBook {
    /// The built-in six-handed charts.
    pub fn standard() -> Result<Self, DecisionError> {
        let mut book = RangeBook::default();
        for (position, notation) in OPEN {
            book.insert(position, Spot::Open, notation)?;
        }
        for hero in ALL_POSITIONS {
            for (opener, notation) in THREE_BET {
                if hero >= opener {
                    book.insert(hero, Spot::ThreeBet(opener), notation)?;
                }
            }
            let calls = if hero == Position::BigBlind { DEFEND } else { FLAT };
            for (opener, notation) in calls {
                if hero < opener {
                    continue;
                }
                let spot = if hero == Position::BigBlind {
                    Spot::Defend(opener)
                } else {
                    Spot::Flat(opener)
                };
                book.insert(hero, spot, notation)?;
            }
            book.insert(hero, Spot::FourBet, FOUR_BET)?;
            book.insert(hero, Spot::CallThreeBet, CALL_THREE_BET)?;
            book.insert(hero, Spot::ColdFourBet, COLD_FOUR_BET)?;
            book.insert(hero, Spot::FiveBet, FIVE_BET)?;
            book.insert(hero, Spot::CallFourBet, CALL_FOUR_BET)?;
            book.insert(hero, Spot::ColdFiveBet, COLD_FIVE_BET)?;
        }
        Ok(book)
    }

    pub fn insert(&mut self, position: Position, spot: Spot, notation: &str) -> Result<(), DecisionError> {
        self.ranges.insert((position, spot), Range::parse(notation)?);
        Ok(())
    }

    pub fn get(&self, position: Position, spot: Spot) -> Option<&Range> {
        self.ranges.get(&(position, spot))
    }
}
