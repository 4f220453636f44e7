use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::PlayerProfile;
use crate::pot::Pot;
use crate::rules::BetContext;
use crate::table::{ActionRecord, BettingRound, HandResult};

/// Read-only projection of a [`crate::table::Table`] for observers, bots and
/// the remote mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub hand_number: u64,
    pub round: BettingRound,
    pub max_seats: usize,
    /// Occupied seats only, ascending by seat index.
    pub players: Vec<PlayerSnapshot>,
    pub community_cards: Vec<Card>,
    pub pots: Vec<Pot>,
    pub current_highest_bet: u32,
    pub min_raise: u32,
    pub dealer_seat: Option<usize>,
    pub acting_seat: Option<usize>,
    pub small_blind: u32,
    pub big_blind: u32,
    pub turn_started_at: Option<DateTime<Utc>>,
    /// Every action taken this hand, in order.
    pub actions: Vec<ActionRecord>,
    pub last_result: Option<HandResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub seat: usize,
    pub profile: PlayerProfile,
    pub is_bot: bool,
    pub stack: u32,
    /// `None` when hidden from the viewer.
    pub hole_cards: Option<Vec<Card>>,
    pub current_bet: u32,
    pub total_committed: u32,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub has_acted: bool,
    pub is_dealer: bool,
    pub is_sb: bool,
    pub is_bb: bool,
    pub sitting_out: bool,
}

impl PlayerSnapshot {
    pub fn in_hand(&self) -> bool {
        !self.sitting_out && !self.is_folded
    }

    pub fn can_act(&self) -> bool {
        self.in_hand() && !self.is_all_in
    }
}

impl TableSnapshot {
    pub fn player(&self, seat: usize) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.seat == seat)
    }

    /// Swept pots plus bets still in front of the players. Mirrored
    /// snapshots are untrusted, so the sum saturates.
    pub fn pot_total(&self) -> u32 {
        self.pots
            .iter()
            .map(|p| p.amount)
            .chain(self.players.iter().map(|p| p.current_bet))
            .fold(0u32, u32::saturating_add)
    }

    pub fn to_call(&self, seat: usize) -> u32 {
        self.player(seat)
            .map(|p| self.current_highest_bet.saturating_sub(p.current_bet))
            .unwrap_or(0)
    }

    pub fn bet_context(&self, seat: usize) -> Option<BetContext> {
        self.player(seat).map(|p| BetContext {
            stack: p.stack,
            current_bet: p.current_bet,
            highest_bet: self.current_highest_bet,
            min_raise: self.min_raise,
        })
    }

    pub fn actions_this_round(&self) -> impl Iterator<Item = &ActionRecord> {
        let round = self.round;
        self.actions.iter().filter(move |a| a.round == round)
    }

    /// Seats dealt into the hand, clockwise starting left of the dealer.
    pub fn seats_from_dealer(&self) -> Vec<usize> {
        let mut seats: Vec<usize> = self
            .players
            .iter()
            .filter(|p| !p.sitting_out)
            .map(|p| p.seat)
            .collect();
        if let Some(dealer) = self.dealer_seat {
            seats.sort_by_key(|&s| (s + self.max_seats - dealer - 1) % self.max_seats);
        }
        seats
    }

    /// Copy for one viewer: other players' hole cards are hidden unless they
    /// were shown down.
    pub fn redacted_for(&self, viewer: Option<usize>) -> TableSnapshot {
        let shown: Vec<usize> = self
            .last_result
            .as_ref()
            .map(|r| r.showdown.iter().map(|s| s.seat).collect())
            .unwrap_or_default();
        let mut copy = self.clone();
        for p in copy.players.iter_mut() {
            if Some(p.seat) != viewer && !shown.contains(&p.seat) {
                p.hole_cards = None;
            }
        }
        copy
    }
}
