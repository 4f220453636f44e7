use felt_engine::player::Action;
use felt_engine::rules::BetContext;
use felt_engine::snapshot::TableSnapshot;

use crate::config::DecisionConfig;
use crate::range::{HandClass, Position, RangeBook, Shape, Spot};
use crate::sizing::raise_by_multiple;

/// Outcome of consulting one range.
enum Lookup {
    Hit,
    NotInRange,
    Missing,
}

fn lookup(book: &RangeBook, position: Position, spot: Spot, class: &HandClass) -> Lookup {
    match book.get(position, spot) {
        Some(range) if range.contains(class) => Lookup::Hit,
        Some(_) => Lookup::NotInRange,
        None => Lookup::Missing,
    }
}

fn fold_on_miss(seat: usize, position: Position, spots: &[Spot], class: &HandClass) -> Action {
    tracing::debug!(
        seat,
        position = %position,
        spots = ?spots,
        hand = %class,
        "no range for preflop spot, folding"
    );
    Action::Fold
}

fn is_aces(class: &HandClass) -> bool {
    class.shape == Shape::Pair && class.high == felt_engine::cards::Rank::Ace
}

/// Preflop decision from the range tables, keyed by position and the number
/// of raises already made this round. Blinds are not raises.
pub(crate) fn decide(
    book: &RangeBook,
    config: &DecisionConfig,
    snapshot: &TableSnapshot,
    seat: usize,
    ctx: BetContext,
    class: HandClass,
) -> Action {
    let Some(position) = Position::of(snapshot, seat) else {
        return Action::Fold;
    };
    let raisers: Vec<usize> = snapshot
        .actions_this_round()
        .filter(|a| a.raised)
        .map(|a| a.seat)
        .collect();

    match raisers.as_slice() {
        [] => match lookup(book, position, Spot::Open, &class) {
            Lookup::Hit => raise_by_multiple(ctx, config.open_multiplier),
            Lookup::NotInRange if ctx.to_call() == 0 => Action::Check,
            Lookup::NotInRange => Action::Fold,
            Lookup::Missing => fold_on_miss(seat, position, &[Spot::Open], &class),
        },
        [opener] => {
            let Some(opener_position) = Position::of(snapshot, *opener) else {
                return Action::Fold;
            };
            let call_spot = if position == Position::BigBlind {
                Spot::Defend(opener_position)
            } else {
                Spot::Flat(opener_position)
            };
            let three_bet = Spot::ThreeBet(opener_position);
            match (
                lookup(book, position, three_bet, &class),
                lookup(book, position, call_spot, &class),
            ) {
                (Lookup::Hit, _) => raise_by_multiple(ctx, config.three_bet_multiplier),
                (_, Lookup::Hit) => Action::Call,
                (Lookup::Missing, Lookup::Missing) => {
                    fold_on_miss(seat, position, &[three_bet, call_spot], &class)
                }
                _ => Action::Fold,
            }
        }
        [opener, _] => {
            if *opener == seat {
                match (
                    lookup(book, position, Spot::FourBet, &class),
                    lookup(book, position, Spot::CallThreeBet, &class),
                ) {
                    (Lookup::Hit, _) => raise_by_multiple(ctx, config.four_bet_multiplier),
                    (_, Lookup::Hit) => Action::Call,
                    (Lookup::Missing, Lookup::Missing) => fold_on_miss(
                        seat,
                        position,
                        &[Spot::FourBet, Spot::CallThreeBet],
                        &class,
                    ),
                    _ => Action::Fold,
                }
            } else {
                match lookup(book, position, Spot::ColdFourBet, &class) {
                    Lookup::Hit => raise_by_multiple(ctx, config.four_bet_multiplier),
                    Lookup::NotInRange => Action::Fold,
                    Lookup::Missing => fold_on_miss(seat, position, &[Spot::ColdFourBet], &class),
                }
            }
        }
        [_, three_bettor, _] => {
            if *three_bettor == seat {
                match (
                    lookup(book, position, Spot::FiveBet, &class),
                    lookup(book, position, Spot::CallFourBet, &class),
                ) {
                    (Lookup::Hit, _) => raise_by_multiple(ctx, config.five_bet_multiplier),
                    (_, Lookup::Hit) => Action::Call,
                    (Lookup::Missing, Lookup::Missing) => fold_on_miss(
                        seat,
                        position,
                        &[Spot::FiveBet, Spot::CallFourBet],
                        &class,
                    ),
                    _ => Action::Fold,
                }
            } else {
                match lookup(book, position, Spot::ColdFiveBet, &class) {
                    Lookup::Hit => raise_by_multiple(ctx, config.five_bet_multiplier),
                    Lookup::NotInRange => Action::Fold,
                    Lookup::Missing => fold_on_miss(seat, position, &[Spot::ColdFiveBet], &class),
                }
            }
        }
        _ if is_aces(&class) => {
            // Past the five-bet everything left is a shove.
            if ctx.max_to() > ctx.highest_bet {
                Action::Raise(ctx.max_to())
            } else {
                Action::Call
            }
        }
        _ => Action::Fold,
    }
}
