//! Scored postflop play: hand strength, board texture and position feed one
//! number that is compared against bet-size aware thresholds.

use felt_engine::cards::Card;
use felt_engine::hand::{evaluate, Category};
use felt_engine::player::Action;
use felt_engine::rules::BetContext;
use felt_engine::snapshot::TableSnapshot;
use felt_engine::table::BettingRound;
use rand::Rng;

use crate::config::DecisionConfig;
use crate::errors::DecisionError;
use crate::sizing::{pot_fraction, raise_by_multiple, wager};
use crate::DecisionRng;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PairKind {
    Overpair,
    Top,
    Middle,
    Bottom,
    Underpair,
    /// The only pair is on the board.
    Board,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Draws {
    pub flush: bool,
    pub open_ended: bool,
    pub gutshot: bool,
    pub overcards: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Strength {
    pub category: Category,
    pub pair: Option<PairKind>,
    pub draws: Draws,
    /// Raw strength in [0, 1] before texture and position.
    pub value: f64,
}

impl Strength {
    /// Top pair or better one-pair shapes get a lower value-bet bar.
    pub fn top_pair_shaped(&self) -> bool {
        matches!(self.pair, Some(PairKind::Top | PairKind::Overpair))
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Texture {
    pub draw_heavy: bool,
    pub low: bool,
    pub paired: bool,
}

impl Texture {
    pub fn read(board: &[Card], config: &DecisionConfig) -> Self {
        let mut ranks: Vec<u8> = board.iter().map(|c| c.rank.value()).collect();
        ranks.sort_unstable();
        let paired = ranks.windows(2).any(|w| w[0] == w[1]);
        ranks.dedup();

        let mut suits = [0u8; 4];
        for c in board {
            suits[c.suit.index()] += 1;
        }
        let max_suit = suits.iter().copied().max().unwrap_or(0);
        let suited = max_suit >= 3 || (board.len() == 3 && max_suit == 2);
        // Three distinct ranks inside any five-rank window.
        let connected = (1u8..=10).any(|lo| {
            ranks
                .iter()
                .filter(|&&r| (lo..lo + 5).contains(&r) || (lo == 1 && r == 14))
                .count()
                >= 3
        });

        Self {
            draw_heavy: suited || connected,
            low: ranks.last().is_some_and(|&r| r <= config.low_board_max_rank),
            paired,
        }
    }

    pub fn multiplier(&self, config: &DecisionConfig) -> f64 {
        let mut m = 1.0;
        if self.draw_heavy {
            m *= config.draw_heavy_multiplier;
        }
        if self.low {
            m *= config.low_board_multiplier;
        }
        if self.paired {
            m *= config.paired_board_multiplier;
        }
        m
    }
}

fn classify_pair(pair_rank: u8, hole: &[Card], board_ranks: &[u8]) -> PairKind {
    let board_max = board_ranks.iter().copied().max().unwrap_or(0);
    let board_min = board_ranks.iter().copied().min().unwrap_or(0);
    let hole_ranks: Vec<u8> = hole.iter().map(|c| c.rank.value()).collect();

    if hole_ranks.iter().all(|&r| r == pair_rank) {
        if pair_rank > board_max {
            PairKind::Overpair
        } else if pair_rank < board_min {
            PairKind::Underpair
        } else {
            PairKind::Middle
        }
    } else if hole_ranks.contains(&pair_rank) {
        if pair_rank == board_max {
            PairKind::Top
        } else if pair_rank == board_min {
            PairKind::Bottom
        } else {
            PairKind::Middle
        }
    } else {
        PairKind::Board
    }
}

fn find_draws(hole: &[Card], board: &[Card], category: Category) -> Draws {
    let mut draws = Draws::default();
    if board.len() >= 5 {
        return draws;
    }

    if category < Category::Flush {
        draws.flush = hole.iter().any(|h| {
            hole.iter().chain(board).filter(|c| c.suit == h.suit).count() >= 4
        });
    }

    if category < Category::Straight {
        let mut present = [false; 15];
        for c in hole.iter().chain(board) {
            let v = usize::from(c.rank.value());
            present[v] = true;
            if v == 14 {
                present[1] = true;
            }
        }
        let hole_ranks: Vec<usize> = hole.iter().map(|c| usize::from(c.rank.value())).collect();
        let uses_hole = |lo: usize, len: usize| {
            hole_ranks
                .iter()
                .any(|&r| (lo..lo + len).contains(&r) || (lo == 1 && r == 14))
        };

        // Four in a row with both ends live.
        draws.open_ended = (2..=10).any(|lo| {
            (lo..lo + 4).all(|r| present[r]) && uses_hole(lo, 4)
        });
        if !draws.open_ended {
            draws.gutshot = (1..=10).any(|lo| {
                (lo..lo + 5).filter(|&r| present[r]).count() == 4 && uses_hole(lo, 5)
            });
        }
    }

    if board.len() == 3 && category == Category::HighCard {
        let board_max = board.iter().map(|c| c.rank).max();
        draws.overcards = hole.iter().all(|h| Some(h.rank) > board_max);
    }
    draws
}

/// Blends made-hand category, pair quality and draws into [0, 1].
pub fn hand_strength(
    config: &DecisionConfig,
    hole: &[Card],
    board: &[Card],
) -> Result<Strength, DecisionError> {
    let mut cards = hole.to_vec();
    cards.extend_from_slice(board);
    let made = evaluate(&cards)?;
    let board_ranks: Vec<u8> = board.iter().map(|c| c.rank.value()).collect();

    let mut value = config.category_strength[made.category as usize];
    let pair = (made.category == Category::OnePair)
        .then(|| classify_pair(made.primary_rank(), hole, &board_ranks));
    match pair {
        Some(PairKind::Overpair) => value += config.overpair_bonus,
        Some(PairKind::Top) => {
            value += config.top_pair_bonus;
            let kicker = hole
                .iter()
                .map(|c| c.rank.value())
                .find(|&r| r != made.primary_rank())
                .unwrap_or(0);
            value += config.kicker_weight * f64::from(kicker) / 14.0;
        }
        Some(PairKind::Middle) => value += config.middle_pair_bonus,
        Some(PairKind::Bottom) => value += config.bottom_pair_bonus,
        Some(PairKind::Underpair) => value += config.underpair_bonus,
        Some(PairKind::Board) => value -= config.board_pair_penalty,
        None => {}
    }

    let draws = find_draws(hole, board, made.category);
    if draws.flush {
        value += config.flush_draw_bonus;
    }
    if draws.open_ended {
        value += config.open_ended_bonus;
    } else if draws.gutshot {
        value += config.gutshot_bonus;
    }
    if draws.overcards {
        value += config.overcards_bonus;
    }

    Ok(Strength {
        category: made.category,
        pair,
        draws,
        value: value.clamp(0.0, 1.0),
    })
}

fn street_index(round: BettingRound) -> f64 {
    match round {
        BettingRound::Flop => 1.0,
        BettingRound::Turn => 2.0,
        BettingRound::River => 3.0,
        _ => 0.0,
    }
}

/// Last to act among the players still in the hand.
fn in_position(snapshot: &TableSnapshot, seat: usize) -> bool {
    snapshot
        .seats_from_dealer()
        .into_iter()
        .filter(|&s| snapshot.player(s).is_some_and(|p| p.in_hand()))
        .last()
        == Some(seat)
}

fn position_multiplier(config: &DecisionConfig, snapshot: &TableSnapshot, seat: usize) -> f64 {
    let step = config.position_step * street_index(snapshot.round);
    if in_position(snapshot, seat) {
        1.0 + step
    } else {
        1.0 - step / 2.0
    }
}

fn bluff_frequency(config: &DecisionConfig, round: BettingRound, texture: &Texture) -> f64 {
    let base = match round {
        BettingRound::Flop => config.flop_bluff_frequency,
        BettingRound::Turn => config.turn_bluff_frequency,
        BettingRound::River => config.river_bluff_frequency,
        _ => 0.0,
    };
    let wet = if texture.draw_heavy {
        config.wet_board_bluff_multiplier
    } else {
        1.0
    };
    (base * wet).min(config.max_bluff_frequency)
}

fn size_scale(config: &DecisionConfig, to_call: u32, pot: u32) -> f64 {
    let ratio = if pot == 0 {
        f64::INFINITY
    } else {
        f64::from(to_call) / f64::from(pot)
    };
    if ratio <= config.tiny_bet_ratio {
        config.tiny_bet_scale
    } else if ratio <= config.small_bet_ratio {
        config.small_bet_scale
    } else if ratio <= config.medium_bet_ratio {
        config.medium_bet_scale
    } else {
        config.large_bet_scale
    }
}

pub(crate) fn decide(
    config: &DecisionConfig,
    snapshot: &TableSnapshot,
    seat: usize,
    hole: &[Card],
    ctx: BetContext,
    rng: &mut DecisionRng,
) -> Result<Action, DecisionError> {
    let strength = hand_strength(config, hole, &snapshot.community_cards)?;
    if !config.postflop_heuristics {
        return Ok(made_hand_only(config, &strength, ctx, snapshot.pot_total()));
    }

    let texture = Texture::read(&snapshot.community_cards, config);
    let score = (strength.value
        * texture.multiplier(config)
        * position_multiplier(config, snapshot, seat))
    .clamp(0.0, 1.0);
    let pot = snapshot.pot_total();
    let to_call = ctx.to_call();
    let bluff_chance = if config.bluffing {
        bluff_frequency(config, snapshot.round, &texture)
    } else {
        0.0
    };

    let action = if to_call > 0 {
        let scale = size_scale(config, to_call, pot);
        let pot_odds = f64::from(to_call) / f64::from(pot + to_call);
        let call_threshold = (config.call_threshold_base + pot_odds * config.pot_odds_weight) * scale;
        let raise_threshold = config.raise_threshold * scale;

        if score >= raise_threshold {
            raise_by_multiple(ctx, config.value_raise_multiplier)
        } else if score >= call_threshold {
            Action::Call
        } else if score >= config.bluff_raise_floor && rng.random::<f64>() < bluff_chance {
            if ctx.max_to() > ctx.highest_bet {
                wager(ctx, ctx.min_to().min(ctx.max_to()))
            } else {
                Action::Fold
            }
        } else {
            Action::Fold
        }
    } else {
        let threshold = if strength.top_pair_shaped() {
            config.top_pair_value_threshold
        } else {
            config.value_bet_threshold
        };
        if score >= threshold {
            let fraction = if score >= config.strong_bet_threshold {
                config.strong_bet_pot_fraction
            } else {
                config.value_bet_pot_fraction
            };
            pot_fraction(ctx, pot, fraction)
        } else if rng.random::<f64>() < bluff_chance {
            pot_fraction(ctx, pot, config.bluff_bet_pot_fraction)
        } else {
            Action::Check
        }
    };

    tracing::trace!(
        seat,
        round = ?snapshot.round,
        category = %strength.category,
        score,
        to_call,
        %action,
        "postflop decision"
    );
    Ok(action)
}

/// Plain strategy used when the scored heuristics are switched off.
fn made_hand_only(config: &DecisionConfig, strength: &Strength, ctx: BetContext, pot: u32) -> Action {
    let free = ctx.to_call() == 0;
    match strength.category {
        c if c >= Category::TwoPair => {
            if free {
                pot_fraction(ctx, pot, config.value_bet_pot_fraction)
            } else {
                raise_by_multiple(ctx, config.value_raise_multiplier)
            }
        }
        Category::OnePair if !free => Action::Call,
        _ if free => Action::Check,
        _ => Action::Fold,
    }
}
