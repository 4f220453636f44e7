use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{evaluate, EvaluatedHand};
use crate::player::{Action, Player, PlayerProfile};
use crate::pot::{award_pots, build_pots, Contribution, Pot, PotAward};
use crate::rules::{validate_action, BetContext, ValidatedAction};
use crate::snapshot::{PlayerSnapshot, TableSnapshot};

/// Hand lifecycle. Transitions only move forward within a hand; a new hand
/// starts again at `Preflop`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BettingRound {
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    HandOver,
}

impl BettingRound {
    pub fn is_betting(self) -> bool {
        matches!(
            self,
            BettingRound::Preflop | BettingRound::Flop | BettingRound::Turn | BettingRound::River
        )
    }

    /// Community cards visible once this round is reached.
    pub fn board_len(self) -> usize {
        match self {
            BettingRound::Waiting | BettingRound::Preflop => 0,
            BettingRound::Flop => 3,
            BettingRound::Turn => 4,
            BettingRound::River | BettingRound::Showdown | BettingRound::HandOver => 5,
        }
    }

    fn next_street(self) -> Option<BettingRound> {
        match self {
            BettingRound::Preflop => Some(BettingRound::Flop),
            BettingRound::Flop => Some(BettingRound::Turn),
            BettingRound::Turn => Some(BettingRound::River),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub max_seats: usize,
    pub small_blind: u32,
    pub big_blind: u32,
    /// Deck RNG seed; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_seats: 6,
            small_blind: 5,
            big_blind: 10,
            seed: None,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(2..=10).contains(&self.max_seats) {
            return Err(GameError::InvalidConfig(
                "max_seats must be between 2 and 10".to_string(),
            ));
        }
        if self.small_blind == 0 {
            return Err(GameError::InvalidConfig(
                "small_blind must be greater than 0".to_string(),
            ));
        }
        if self.big_blind < self.small_blind {
            return Err(GameError::InvalidConfig(
                "big_blind must be at least small_blind".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seat: usize,
    pub round: BettingRound,
    pub action: Action,
    /// The seat's bet for the round after the action.
    pub bet_to: u32,
    /// The action raised the highest bet (including short all-ins).
    pub raised: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownHand {
    pub seat: usize,
    pub cards: Vec<Card>,
    pub hand: EvaluatedHand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub hand_number: u64,
    pub awards: Vec<PotAward>,
    /// Empty when the hand was won uncontested.
    pub showdown: Vec<ShowdownHand>,
}

impl HandResult {
    pub fn uncontested(&self) -> bool {
        self.showdown.is_empty()
    }

    pub fn total_won_by(&self, seat: usize) -> u32 {
        self.awards
            .iter()
            .filter(|a| a.seat == seat)
            .map(|a| a.amount)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub round: BettingRound,
    pub round_advanced: bool,
    pub hand_result: Option<HandResult>,
}

/// The single-table state machine. Every mutation goes through a method that
/// validates first and checks table invariants afterwards.
#[derive(Debug, Clone)]
pub struct Table {
    config: TableConfig,
    seats: Vec<Option<Player>>,
    deck: Deck,
    board: Vec<Card>,
    reserved_board: Vec<Card>,
    pots: Vec<Pot>,
    round: BettingRound,
    highest_bet: u32,
    min_raise: u32,
    dealer_seat: Option<usize>,
    acting_seat: Option<usize>,
    turn_started_at: Option<DateTime<Utc>>,
    hand_number: u64,
    chips_in_play: u64,
    actions: Vec<ActionRecord>,
    last_result: Option<HandResult>,
    invalid: bool,
}

impl Table {
    pub fn new(config: TableConfig) -> Result<Self, GameError> {
        config.validate()?;
        let deck = match config.seed {
            Some(seed) => Deck::new_with_seed(seed),
            None => Deck::from_entropy(),
        };
        Ok(Self {
            seats: vec![None; config.max_seats],
            deck,
            board: Vec::with_capacity(5),
            reserved_board: Vec::with_capacity(5),
            pots: Vec::new(),
            round: BettingRound::Waiting,
            highest_bet: 0,
            min_raise: config.big_blind,
            dealer_seat: None,
            acting_seat: None,
            turn_started_at: None,
            hand_number: 0,
            chips_in_play: 0,
            actions: Vec::new(),
            last_result: None,
            invalid: false,
            config,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn round(&self) -> BettingRound {
        self.round
    }

    pub fn acting_seat(&self) -> Option<usize> {
        self.acting_seat
    }

    pub fn dealer_seat(&self) -> Option<usize> {
        self.dealer_seat
    }

    pub fn current_highest_bet(&self) -> u32 {
        self.highest_bet
    }

    pub fn min_raise(&self) -> u32 {
        self.min_raise
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn last_result(&self) -> Option<&HandResult> {
        self.last_result.as_ref()
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn player(&self, seat: usize) -> Option<&Player> {
        self.seats.get(seat).and_then(Option::as_ref)
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn hand_in_progress(&self) -> bool {
        self.round.is_betting() || self.round == BettingRound::Showdown
    }

    /// Swept pots plus bets still in front of the players.
    pub fn pot_total(&self) -> u32 {
        self.pots.iter().map(|p| p.amount).sum::<u32>()
            + self.seats.iter().flatten().map(|p| p.current_bet).sum::<u32>()
    }

    /// Every chip at the table: stacks, live bets and swept pots.
    pub fn chips_on_table(&self) -> u64 {
        let pots: u64 = self.pots.iter().map(|p| u64::from(p.amount)).sum();
        let players: u64 = self
            .seats
            .iter()
            .flatten()
            .map(|p| u64::from(p.stack) + u64::from(p.current_bet))
            .sum();
        pots + players
    }

    /// Blind changes are only accepted between hands.
    pub fn set_blinds(&mut self, small_blind: u32, big_blind: u32) -> Result<(), GameError> {
        if self.hand_in_progress() {
            return Err(GameError::HandInProgress);
        }
        let next = TableConfig {
            small_blind,
            big_blind,
            ..self.config.clone()
        };
        next.validate()?;
        self.config = next;
        Ok(())
    }

    pub fn seat_player(
        &mut self,
        seat: usize,
        profile: PlayerProfile,
        stack: u32,
        is_bot: bool,
    ) -> Result<(), GameError> {
        let max_seats = self.config.max_seats;
        match self.seats.get(seat) {
            None => return Err(GameError::SeatOutOfRange { seat, max_seats }),
            Some(Some(_)) => return Err(GameError::SeatOccupied(seat)),
            Some(None) => {}
        }
        if stack == 0 {
            return Err(GameError::InvalidBetAmount {
                amount: 0,
                minimum: 1,
            });
        }
        // Pot arithmetic is u32, so the table as a whole must fit in one.
        let total = self.chips_on_table() + u64::from(stack);
        if total > u64::from(u32::MAX) {
            return Err(GameError::ChipLimitExceeded {
                stack,
                total,
                limit: u32::MAX,
            });
        }
        tracing::debug!(seat, player_id = %profile.id, stack, is_bot, "player seated");
        self.seats[seat] = Some(Player::new(profile, stack, is_bot));
        if self.hand_in_progress() {
            self.chips_in_play += u64::from(stack);
        }
        Ok(())
    }

    /// Removes the player now when it is not part of a running hand, otherwise
    /// marks it to leave once the hand is over. Returns `true` when the seat
    /// was freed immediately.
    pub fn leave(&mut self, seat: usize) -> Result<bool, GameError> {
        let max_seats = self.config.max_seats;
        let in_progress = self.hand_in_progress();
        let slot = self
            .seats
            .get_mut(seat)
            .ok_or(GameError::SeatOutOfRange { seat, max_seats })?;
        let player = slot.as_mut().ok_or(GameError::SeatEmpty(seat))?;
        if in_progress && !player.sitting_out {
            player.leave_pending = true;
            tracing::debug!(seat, "leave deferred to hand end");
            return Ok(false);
        }
        let stack = player.stack;
        *slot = None;
        if in_progress {
            self.chips_in_play = self.chips_in_play.saturating_sub(u64::from(stack));
        }
        Ok(true)
    }

    /// Shuffles, deals, moves the button, posts blinds and hands the action to
    /// the first seat.
    pub fn start_hand(&mut self) -> Result<(), GameError> {
        if self.invalid {
            return Err(GameError::TableInvalid);
        }
        if self.hand_in_progress() {
            return Err(GameError::HandInProgress);
        }

        for slot in self.seats.iter_mut() {
            if slot.as_ref().is_some_and(|p| p.leave_pending) {
                *slot = None;
            }
        }
        let ready = self.seats.iter().flatten().filter(|p| p.stack > 0).count();
        if ready < 2 {
            return Err(GameError::NotEnoughPlayers(ready));
        }

        for p in self.seats.iter_mut().flatten() {
            p.reset_for_hand();
        }
        self.chips_in_play = self.seats.iter().flatten().map(|p| u64::from(p.stack)).sum();
        self.hand_number += 1;
        self.board.clear();
        self.pots.clear();
        self.actions.clear();
        self.last_result = None;
        self.acting_seat = None;

        let dealer = self
            .next_seat_where(self.dealer_seat.unwrap_or(self.config.max_seats - 1), |p| {
                !p.sitting_out
            })
            .ok_or(GameError::NotEnoughPlayers(ready))?;
        self.dealer_seat = Some(dealer);

        self.deal(dealer)?;

        let (sb_seat, bb_seat) = if ready == 2 {
            let other = self
                .next_seat_where(dealer, |p| !p.sitting_out)
                .ok_or(GameError::NotEnoughPlayers(ready))?;
            (dealer, other)
        } else {
            let sb = self
                .next_seat_where(dealer, |p| !p.sitting_out)
                .ok_or(GameError::NotEnoughPlayers(ready))?;
            let bb = self
                .next_seat_where(sb, |p| !p.sitting_out)
                .ok_or(GameError::NotEnoughPlayers(ready))?;
            (sb, bb)
        };

        let (small_blind, big_blind) = (self.config.small_blind, self.config.big_blind);
        if let Some(p) = self.seat_mut(dealer) {
            p.is_dealer = true;
        }
        if let Some(p) = self.seat_mut(sb_seat) {
            p.is_sb = true;
            p.commit(small_blind);
        }
        if let Some(p) = self.seat_mut(bb_seat) {
            p.is_bb = true;
            p.commit(big_blind);
        }

        self.round = BettingRound::Preflop;
        self.highest_bet = big_blind;
        self.min_raise = big_blind;

        tracing::info!(
            hand_number = self.hand_number,
            dealer,
            small_blind_seat = sb_seat,
            big_blind_seat = bb_seat,
            players = ready,
            "hand started"
        );

        self.progress_from(bb_seat);
        self.check_integrity()
    }

    fn deal(&mut self, dealer: usize) -> Result<(), GameError> {
        self.deck.shuffle();
        let order = self.seats_after(dealer);
        let dealt_in = self.seats.iter().flatten().filter(|p| !p.sitting_out).count();
        // Two hole cards each, then three burns and five board cards.
        if self.deck.remaining() < dealt_in * 2 + 8 {
            return Err(GameError::DeckExhausted);
        }
        for _ in 0..2 {
            for &seat in &order {
                let Some(player) = self.seats[seat].as_mut() else {
                    continue;
                };
                if player.sitting_out {
                    continue;
                }
                let card = self.deck.deal_card().ok_or(GameError::DeckExhausted)?;
                player.hole_cards.push(card);
            }
        }
        self.reserved_board.clear();
        for street_cards in [3, 1, 1] {
            self.deck.burn_card();
            for _ in 0..street_cards {
                let card = self.deck.deal_card().ok_or(GameError::DeckExhausted)?;
                self.reserved_board.push(card);
            }
        }
        Ok(())
    }

    /// Validates and applies one action from the acting seat, then advances
    /// the round or the hand as far as the new state allows.
    pub fn apply_action(&mut self, seat: usize, action: Action) -> Result<ActionOutcome, GameError> {
        if self.invalid {
            return Err(GameError::TableInvalid);
        }
        if !self.round.is_betting() {
            return Err(GameError::NoHandInProgress);
        }
        let max_seats = self.config.max_seats;
        let player = self
            .seats
            .get(seat)
            .ok_or(GameError::SeatOutOfRange { seat, max_seats })?
            .as_ref()
            .ok_or(GameError::SeatEmpty(seat))?;
        if player.is_folded {
            return Err(GameError::PlayerAlreadyFolded(seat));
        }
        if player.is_all_in {
            return Err(GameError::PlayerAllIn(seat));
        }
        if self.acting_seat != Some(seat) {
            return Err(GameError::NotPlayersTurn {
                expected: self.acting_seat,
                actual: seat,
            });
        }

        let ctx = BetContext {
            stack: player.stack,
            current_bet: player.current_bet,
            highest_bet: self.highest_bet,
            min_raise: self.min_raise,
        };
        let validated = validate_action(ctx, action)?;

        let round = self.round;
        let previous_highest = self.highest_bet;
        let bet_to = {
            let Some(player) = self.seat_mut(seat) else {
                return Err(GameError::SeatEmpty(seat));
            };
            match validated {
                ValidatedAction::Fold => player.is_folded = true,
                ValidatedAction::Check => {}
                ValidatedAction::Call(chips) | ValidatedAction::AllIn(chips) => {
                    player.commit(chips);
                }
                ValidatedAction::Bet(to) | ValidatedAction::Raise(to) => {
                    let chips = to - player.current_bet;
                    player.commit(chips);
                }
            }
            player.has_acted = true;
            player.current_bet
        };

        let raised = bet_to > previous_highest;
        if raised {
            let increment = bet_to - previous_highest;
            if increment >= self.min_raise {
                self.min_raise = increment;
            }
            self.highest_bet = bet_to;
            for (idx, other) in self.seats.iter_mut().enumerate() {
                if let Some(other) = other {
                    if idx != seat {
                        other.has_acted = false;
                    }
                }
            }
        }

        self.actions.push(ActionRecord {
            seat,
            round,
            action,
            bet_to,
            raised,
        });
        tracing::debug!(
            hand_number = self.hand_number,
            seat,
            %action,
            ?validated,
            bet_to,
            "action applied"
        );

        let hand_result = self.progress_from(seat);
        self.check_integrity()?;
        Ok(ActionOutcome {
            round: self.round,
            round_advanced: self.round != round,
            hand_result,
        })
    }

    /// Moves the hand forward from the seat that last acted: picks the next
    /// actor, or closes rounds (dealing out when nobody can bet) until
    /// someone must act or the hand is over.
    fn progress_from(&mut self, last: usize) -> Option<HandResult> {
        let mut from = last;
        loop {
            let live = self.seats.iter().flatten().filter(|p| p.in_hand()).count();
            if live <= 1 {
                return Some(self.finish_hand(false));
            }
            if !self.round_complete() {
                self.acting_seat = self.next_seat_where(from, |p| {
                    p.can_act() && (!p.has_acted || p.current_bet < self.highest_bet)
                });
                if self.acting_seat.is_some() {
                    self.turn_started_at = Some(Utc::now());
                    return None;
                }
            }
            match self.round.next_street() {
                Some(next) => {
                    self.advance_to(next);
                    from = self.dealer_seat.unwrap_or(0);
                }
                None => return Some(self.finish_hand(true)),
            }
        }
    }

    fn round_complete(&self) -> bool {
        let able: Vec<&Player> = self.seats.iter().flatten().filter(|p| p.can_act()).collect();
        match able.as_slice() {
            [] => true,
            // Alone with chips behind: nothing left to bet against once matched.
            [only] => only.current_bet >= self.highest_bet,
            _ => able
                .iter()
                .all(|p| p.has_acted && p.current_bet == self.highest_bet),
        }
    }

    fn sweep_bets(&mut self) {
        let contributions: Vec<Contribution> = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(seat, p)| p.as_ref().map(|p| (seat, p)))
            .filter(|(_, p)| !p.sitting_out)
            .map(|(seat, p)| Contribution {
                seat,
                committed: p.total_committed,
                folded: p.is_folded,
                all_in: p.is_all_in,
            })
            .collect();
        self.pots = build_pots(&contributions);
        for p in self.seats.iter_mut().flatten() {
            p.reset_for_round();
        }
    }

    fn advance_to(&mut self, next: BettingRound) {
        self.sweep_bets();
        self.round = next;
        self.highest_bet = 0;
        self.min_raise = self.config.big_blind;
        self.acting_seat = None;
        let visible = next.board_len().min(self.reserved_board.len());
        self.board = self.reserved_board[..visible].to_vec();
        tracing::debug!(
            hand_number = self.hand_number,
            round = ?next,
            pot = self.pot_total(),
            "betting round advanced"
        );
    }

    fn finish_hand(&mut self, showdown: bool) -> HandResult {
        self.sweep_bets();
        self.acting_seat = None;
        self.turn_started_at = None;

        let mut shown = Vec::new();
        if showdown {
            self.round = BettingRound::Showdown;
            self.board = self.reserved_board.clone();
            for (seat, p) in self.seats.iter().enumerate() {
                let Some(p) = p else { continue };
                if !p.in_hand() {
                    continue;
                }
                let mut cards = p.hole_cards.clone();
                cards.extend_from_slice(&self.board);
                match evaluate(&cards) {
                    Ok(hand) => shown.push(ShowdownHand {
                        seat,
                        cards: p.hole_cards.clone(),
                        hand,
                    }),
                    Err(err) => tracing::error!(seat, error = %err, "showdown evaluation failed"),
                }
            }
        }

        let hands: Vec<(usize, EvaluatedHand)> = shown.iter().map(|s| (s.seat, s.hand)).collect();
        let order = self.seats_after(self.dealer_seat.unwrap_or(0));
        let awards = award_pots(&self.pots, &hands, &order);
        for award in &awards {
            if let Some(p) = self.seat_mut(award.seat) {
                p.stack += award.amount;
            }
        }
        self.pots.clear();
        self.round = BettingRound::HandOver;

        let result = HandResult {
            hand_number: self.hand_number,
            awards,
            showdown: shown,
        };
        tracing::info!(
            hand_number = self.hand_number,
            showdown,
            awards = ?result.awards,
            "hand finished"
        );
        self.last_result = Some(result.clone());
        result
    }

    /// Verifies chip conservation and the acting-seat / highest-bet
    /// invariants. A failure poisons the table.
    fn check_integrity(&mut self) -> Result<(), GameError> {
        if let Err(reason) = self.integrity_problem() {
            self.invalid = true;
            self.acting_seat = None;
            tracing::error!(hand_number = self.hand_number, %reason, "table integrity violated");
            return Err(GameError::IntegrityViolation(reason));
        }
        Ok(())
    }

    fn integrity_problem(&self) -> Result<(), String> {
        let stacks: u64 = self.seats.iter().flatten().map(|p| u64::from(p.stack)).sum();
        let total = stacks + u64::from(self.pot_total());
        if self.round != BettingRound::Waiting && total != self.chips_in_play {
            return Err(format!(
                "chips in play changed from {} to {}",
                self.chips_in_play, total
            ));
        }
        if let Some(seat) = self.acting_seat {
            match self.player(seat) {
                Some(p) if p.can_act() => {}
                _ => return Err(format!("acting seat {seat} cannot act")),
            }
        }
        if let Some(p) = self
            .seats
            .iter()
            .flatten()
            .find(|p| p.current_bet > self.highest_bet)
        {
            return Err(format!(
                "player {} bet {} above highest bet {}",
                p.profile.id, p.current_bet, self.highest_bet
            ));
        }
        Ok(())
    }

    fn seat_mut(&mut self, seat: usize) -> Option<&mut Player> {
        self.seats.get_mut(seat).and_then(Option::as_mut)
    }

    /// Seat indexes clockwise starting left of `start`, ending with `start`.
    fn seats_after(&self, start: usize) -> Vec<usize> {
        let n = self.config.max_seats;
        (1..=n).map(|i| (start + i) % n).collect()
    }

    fn next_seat_where<F>(&self, start: usize, pred: F) -> Option<usize>
    where
        F: Fn(&Player) -> bool,
    {
        self.seats_after(start)
            .into_iter()
            .find(|&s| self.player(s).is_some_and(&pred))
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let players = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(seat, p)| p.as_ref().map(|p| (seat, p)))
            .map(|(seat, p)| PlayerSnapshot {
                seat,
                profile: p.profile.clone(),
                is_bot: p.is_bot,
                stack: p.stack,
                hole_cards: (!p.hole_cards.is_empty()).then(|| p.hole_cards.clone()),
                current_bet: p.current_bet,
                total_committed: p.total_committed,
                is_folded: p.is_folded,
                is_all_in: p.is_all_in,
                has_acted: p.has_acted,
                is_dealer: p.is_dealer,
                is_sb: p.is_sb,
                is_bb: p.is_bb,
                sitting_out: p.sitting_out,
            })
            .collect();
        TableSnapshot {
            hand_number: self.hand_number,
            round: self.round,
            max_seats: self.config.max_seats,
            players,
            community_cards: self.board.clone(),
            pots: self.pots.clone(),
            current_highest_bet: self.highest_bet,
            min_raise: self.min_raise,
            dealer_seat: self.dealer_seat,
            acting_seat: self.acting_seat,
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            turn_started_at: self.turn_started_at,
            actions: self.actions.clone(),
            last_result: self.last_result.clone(),
        }
    }

    /// Rebuilds a playable table from a snapshot, typically a mirror of a
    /// remote session. Hidden hole cards and undealt board cards are drawn
    /// from a fresh deck that excludes every card already visible.
    pub fn restore(config: TableConfig, snapshot: &TableSnapshot) -> Result<Self, GameError> {
        let config = TableConfig {
            max_seats: snapshot.max_seats,
            small_blind: snapshot.small_blind,
            big_blind: snapshot.big_blind,
            ..config
        };
        let mut table = Table::new(config)?;

        let mut known: Vec<Card> = snapshot.community_cards.clone();
        for ps in &snapshot.players {
            let slot = table.seats.get_mut(ps.seat).ok_or_else(|| {
                GameError::InvalidSnapshot(format!("seat {} outside table", ps.seat))
            })?;
            let hole = ps.hole_cards.clone().unwrap_or_default();
            known.extend_from_slice(&hole);
            *slot = Some(Player {
                profile: ps.profile.clone(),
                is_bot: ps.is_bot,
                stack: ps.stack,
                hole_cards: hole,
                current_bet: ps.current_bet,
                total_committed: ps.total_committed,
                is_folded: ps.is_folded,
                is_all_in: ps.is_all_in,
                has_acted: ps.has_acted,
                is_dealer: ps.is_dealer,
                is_sb: ps.is_sb,
                is_bb: ps.is_bb,
                sitting_out: ps.sitting_out,
                leave_pending: false,
            });
        }

        let mut seen = known.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != known.len() {
            return Err(GameError::InvalidSnapshot("duplicate cards".to_string()));
        }

        // A mirrored table never sits in Showdown; payouts are already in the stacks.
        table.round = match snapshot.round {
            BettingRound::Showdown => BettingRound::HandOver,
            round => round,
        };
        table.board = snapshot.community_cards.clone();
        table.pots = snapshot.pots.clone();
        table.highest_bet = snapshot.current_highest_bet;
        table.min_raise = snapshot.min_raise;
        table.dealer_seat = snapshot.dealer_seat;
        table.acting_seat = snapshot.acting_seat;
        table.turn_started_at = snapshot.turn_started_at;
        table.hand_number = snapshot.hand_number;
        table.actions = snapshot.actions.clone();
        table.last_result = snapshot.last_result.clone();

        if table.chips_on_table() > u64::from(u32::MAX) {
            return Err(GameError::InvalidSnapshot(
                "chip total exceeds table capacity".to_string(),
            ));
        }

        table.deck.shuffle_excluding(&known);
        if table.hand_in_progress() {
            for p in table.seats.iter_mut().flatten() {
                if p.sitting_out || p.hole_cards.len() == 2 {
                    continue;
                }
                p.hole_cards.clear();
                for _ in 0..2 {
                    let card = table.deck.deal_card().ok_or(GameError::DeckExhausted)?;
                    p.hole_cards.push(card);
                }
            }
            table.reserved_board = table.board.clone();
            while table.reserved_board.len() < 5 {
                let card = table.deck.deal_card().ok_or(GameError::DeckExhausted)?;
                table.reserved_board.push(card);
            }
        }

        let stacks: u64 = table.seats.iter().flatten().map(|p| u64::from(p.stack)).sum();
        table.chips_in_play = stacks + u64::from(table.pot_total());

        if table.round.is_betting() && table.acting_seat.is_none() {
            let from = table.dealer_seat.unwrap_or(0);
            table.progress_from(from);
        }
        table
            .integrity_problem()
            .map_err(GameError::InvalidSnapshot)?;
        tracing::info!(
            hand_number = table.hand_number,
            round = ?table.round,
            "table restored from snapshot"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heads_up(stacks: [u32; 2]) -> Table {
        let mut t = Table::new(TableConfig {
            max_seats: 2,
            small_blind: 5,
            big_blind: 10,
            seed: Some(9),
        })
        .expect("table");
        t.seat_player(0, PlayerProfile::new("a", "A"), stacks[0], false)
            .expect("seat a");
        t.seat_player(1, PlayerProfile::new("b", "B"), stacks[1], false)
            .expect("seat b");
        t
    }

    #[test]
    fn dealer_posts_small_blind_heads_up() {
        let mut t = heads_up([1000, 1000]);
        t.start_hand().expect("start");
        let dealer = t.dealer_seat().expect("dealer");
        let p = t.player(dealer).expect("dealer player");
        assert!(p.is_dealer && p.is_sb);
        assert_eq!(p.current_bet, 5);
        assert_eq!(t.acting_seat(), Some(dealer));
    }

    #[test]
    fn validation_failure_leaves_state_untouched() {
        let mut t = heads_up([1000, 1000]);
        t.start_hand().expect("start");
        let before = t.snapshot();
        let acting = t.acting_seat().expect("acting");
        assert!(matches!(
            t.apply_action(acting, Action::Check),
            Err(GameError::CheckFacingBet { to_call: 5 })
        ));
        assert_eq!(t.snapshot(), before);
    }

    #[test]
    fn fold_awards_pot_uncontested() {
        let mut t = heads_up([1000, 1000]);
        t.start_hand().expect("start");
        let acting = t.acting_seat().expect("acting");
        let outcome = t.apply_action(acting, Action::Fold).expect("fold");
        let result = outcome.hand_result.expect("hand over");
        assert!(result.uncontested());
        assert_eq!(t.round(), BettingRound::HandOver);
        let other = 1 - acting;
        assert_eq!(t.player(other).expect("winner").stack, 1005);
        assert_eq!(t.player(acting).expect("loser").stack, 995);
    }

    #[test]
    fn leave_during_hand_is_deferred() {
        let mut t = heads_up([1000, 1000]);
        assert_eq!(
            t.seat_player(1, PlayerProfile::new("c", "C"), 100, false),
            Err(GameError::SeatOccupied(1))
        );
        t.start_hand().expect("start");
        assert_eq!(t.leave(0), Ok(false));
        assert!(t.player(0).expect("still seated").leave_pending);
    }

    #[test]
    fn seating_beyond_chip_capacity_is_refused() {
        let mut t = Table::new(TableConfig {
            max_seats: 3,
            ..TableConfig::default()
        })
        .expect("table");
        t.seat_player(0, PlayerProfile::new("a", "A"), 3_000_000_000, false)
            .expect("seat a");
        let err = t
            .seat_player(1, PlayerProfile::new("b", "B"), 3_000_000_000, false)
            .unwrap_err();
        assert!(matches!(err, GameError::ChipLimitExceeded { stack: 3_000_000_000, .. }));
        assert!(err.is_validation());
        assert!(t.player(1).is_none());
        assert_eq!(t.chips_on_table(), 3_000_000_000);
    }

    #[test]
    fn restore_refuses_over_capacity_snapshot() {
        let t = heads_up([1000, 1000]);
        let mut snap = t.snapshot();
        for p in &mut snap.players {
            p.stack = 3_000_000_000;
        }
        assert!(matches!(
            Table::restore(t.config().clone(), &snap),
            Err(GameError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn full_capacity_all_in_conserves_chips() {
        let big = u32::MAX / 2 + 1;
        let mut t = heads_up([u32::MAX / 2, big]);
        assert_eq!(t.chips_on_table(), u64::from(u32::MAX));

        t.start_hand().expect("start");
        let first = t.acting_seat().expect("acting");
        t.apply_action(first, Action::Raise(u32::MAX)).expect("shove");
        let second = t.acting_seat().expect("caller");
        let outcome = t.apply_action(second, Action::Call).expect("call");

        assert!(outcome.hand_result.is_some());
        assert_eq!(t.round(), BettingRound::HandOver);
        assert_eq!(t.chips_on_table(), u64::from(u32::MAX));
    }
}
