use serde::{Deserialize, Serialize};

use crate::hand::EvaluatedHand;

/// A pot and the seats that can win it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    pub eligible: Vec<usize>,
}

/// What one seat has put in over the whole hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub seat: usize,
    pub committed: u32,
    pub folded: bool,
    pub all_in: bool,
}

/// Chips won by one seat from one pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotAward {
    pub pot_index: usize,
    pub seat: usize,
    pub amount: u32,
}

/// Splits hand-long contributions into a main pot and side pots.
///
/// Pots are cut at every distinct commitment of a live all-in player and at
/// the top commitment. Each slice takes `min(committed, level) -
/// min(committed, previous level)` from every contributor, folded or not, and
/// is winnable only by live seats that reached the level. Slices nobody live
/// can win fold into the previous pot; neighbouring pots with the same
/// eligible seats are merged.
pub fn build_pots(contributions: &[Contribution]) -> Vec<Pot> {
    let top = contributions.iter().map(|c| c.committed).max().unwrap_or(0);
    if top == 0 {
        return Vec::new();
    }

    let mut levels: Vec<u32> = contributions
        .iter()
        .filter(|c| c.all_in && !c.folded && c.committed > 0)
        .map(|c| c.committed)
        .collect();
    levels.push(top);
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::new();
    let mut orphaned = 0u32;
    let mut prev = 0u32;
    for level in levels {
        let amount: u32 = contributions
            .iter()
            .map(|c| c.committed.min(level) - c.committed.min(prev))
            .sum::<u32>()
            + orphaned;
        orphaned = 0;
        prev = level;
        if amount == 0 {
            continue;
        }

        let mut eligible: Vec<usize> = contributions
            .iter()
            .filter(|c| !c.folded && c.committed >= level)
            .map(|c| c.seat)
            .collect();
        eligible.sort_unstable();

        match pots.last_mut() {
            Some(last) if eligible.is_empty() || last.eligible == eligible => last.amount += amount,
            None if eligible.is_empty() => orphaned = amount,
            _ => pots.push(Pot { amount, eligible }),
        }
    }

    if orphaned > 0 {
        let mut eligible: Vec<usize> = contributions
            .iter()
            .filter(|c| !c.folded)
            .map(|c| c.seat)
            .collect();
        eligible.sort_unstable();
        pots.push(Pot {
            amount: orphaned,
            eligible,
        });
    }

    pots
}

/// Awards every pot independently.
///
/// A pot with a single eligible seat goes to that seat. Otherwise the best
/// evaluated hand among eligible seats wins; ties split evenly and leftover
/// chips go one at a time to the tied seats in `seat_order` (first seat after
/// the dealer first).
pub fn award_pots(
    pots: &[Pot],
    hands: &[(usize, EvaluatedHand)],
    seat_order: &[usize],
) -> Vec<PotAward> {
    let mut awards = Vec::new();
    for (pot_index, pot) in pots.iter().enumerate() {
        let winners = pot_winners(pot, hands, seat_order);
        if winners.is_empty() {
            continue;
        }
        let share = pot.amount / winners.len() as u32;
        let mut remainder = pot.amount % winners.len() as u32;
        for seat in winners {
            let mut amount = share;
            if remainder > 0 {
                amount += 1;
                remainder -= 1;
            }
            awards.push(PotAward {
                pot_index,
                seat,
                amount,
            });
        }
    }
    awards
}

fn pot_winners(pot: &Pot, hands: &[(usize, EvaluatedHand)], seat_order: &[usize]) -> Vec<usize> {
    if pot.eligible.len() == 1 {
        return pot.eligible.clone();
    }
    let contenders: Vec<(usize, EvaluatedHand)> = hands
        .iter()
        .filter(|(seat, _)| pot.eligible.contains(seat))
        .copied()
        .collect();
    let Some(best) = contenders.iter().map(|(_, h)| *h).max() else {
        return Vec::new();
    };
    let mut winners: Vec<usize> = contenders
        .iter()
        .filter(|(_, h)| *h == best)
        .map(|(seat, _)| *seat)
        .collect();
    winners.sort_by_key(|seat| {
        seat_order
            .iter()
            .position(|s| s == seat)
            .unwrap_or(usize::MAX)
    });
    winners
}
