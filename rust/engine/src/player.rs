use crate::cards::Card;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A player action during a betting round.
///
/// `Bet` and `Raise` carry the total amount the seat's bet for this round
/// moves *to*, not the increment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(u32),
    Raise(u32),
}

impl Action {
    pub fn is_aggressive(&self) -> bool {
        matches!(self, Action::Bet(_) | Action::Raise(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fold => f.write_str("fold"),
            Action::Check => f.write_str("check"),
            Action::Call => f.write_str("call"),
            Action::Bet(a) => write!(f, "bet {a}"),
            Action::Raise(a) => write!(f, "raise to {a}"),
        }
    }
}

/// Identity supplied by the profile store at seating time. Opaque to the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PlayerProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// A seated player. Per-hand and per-round fields are reset by the table's
/// transition functions only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub profile: PlayerProfile,
    pub is_bot: bool,
    pub stack: u32,
    pub hole_cards: Vec<Card>,
    /// Chips put in during the current betting round.
    pub current_bet: u32,
    /// Chips put in during the whole hand, including `current_bet`.
    pub total_committed: u32,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub has_acted: bool,
    pub is_dealer: bool,
    pub is_sb: bool,
    pub is_bb: bool,
    /// Not dealt into the current hand (busted or seated mid-hand).
    pub sitting_out: bool,
    pub leave_pending: bool,
}

impl Player {
    pub fn new(profile: PlayerProfile, stack: u32, is_bot: bool) -> Self {
        Self {
            profile,
            is_bot,
            stack,
            hole_cards: Vec::with_capacity(2),
            current_bet: 0,
            total_committed: 0,
            is_folded: false,
            is_all_in: false,
            has_acted: false,
            is_dealer: false,
            is_sb: false,
            is_bb: false,
            sitting_out: true,
            leave_pending: false,
        }
    }

    /// Dealt into the current hand and not folded.
    pub fn in_hand(&self) -> bool {
        !self.sitting_out && !self.is_folded
    }

    /// Still able to take betting decisions this hand.
    pub fn can_act(&self) -> bool {
        self.in_hand() && !self.is_all_in
    }

    /// Moves up to `amount` chips from the stack into the current bet and
    /// returns what was actually paid. Emptying the stack marks the player
    /// all-in.
    pub fn commit(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.current_bet += paid;
        self.total_committed += paid;
        if self.stack == 0 {
            self.is_all_in = true;
        }
        paid
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.current_bet = 0;
        self.total_committed = 0;
        self.is_folded = false;
        self.is_all_in = false;
        self.has_acted = false;
        self.is_dealer = false;
        self.is_sb = false;
        self.is_bb = false;
        self.sitting_out = self.stack == 0;
    }

    pub fn reset_for_round(&mut self) {
        self.current_bet = 0;
        self.has_acted = false;
    }
}
