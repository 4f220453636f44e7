//! Remote table state as it travels over the wire.
//!
//! The remote session speaks its own vocabulary: cards are two-character
//! strings, phases are lowercase names and seats carry short flag names.
//! Conversion to and from [`TableSnapshot`] keeps every field a player can
//! see. Showdown hands are not sent; they are re-evaluated from the shown
//! cards and the board on arrival.
use chrono::{DateTime, Utc};
use felt_engine::cards::Card;
use felt_engine::hand::evaluate;
use felt_engine::player::{Action, PlayerProfile};
use felt_engine::pot::{Pot, PotAward};
use felt_engine::snapshot::{PlayerSnapshot, TableSnapshot};
use felt_engine::table::{ActionRecord, BettingRound, HandResult, ShowdownHand};
use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTableState {
    pub hand_no: u64,
    pub phase: String,
    pub seat_count: usize,
    pub seats: Vec<RemoteSeat>,
    pub board: Vec<String>,
    pub pots: Vec<RemotePot>,
    pub to_match: u32,
    pub min_raise_by: u32,
    pub button: Option<usize>,
    pub turn: Option<usize>,
    /// Small and big blind.
    pub blinds: [u32; 2],
    pub turn_started: Option<DateTime<Utc>>,
    pub history: Vec<RemoteAction>,
    pub result: Option<RemoteResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSeat {
    pub index: usize,
    pub player_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub bot: bool,
    pub chips: u32,
    /// Absent when hidden from this client.
    pub cards: Option<Vec<String>>,
    pub bet: u32,
    pub invested: u32,
    pub folded: bool,
    pub all_in: bool,
    pub acted: bool,
    pub button: bool,
    pub small_blind: bool,
    pub big_blind: bool,
    pub away: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePot {
    pub chips: u32,
    pub contenders: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAction {
    pub seat: usize,
    pub phase: String,
    pub kind: String,
    pub amount: Option<u32>,
    pub level: u32,
    pub raise: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResult {
    pub hand_no: u64,
    pub payouts: Vec<RemotePayout>,
    pub shown: Vec<RemoteShown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePayout {
    pub pot: usize,
    pub seat: usize,
    pub chips: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteShown {
    pub seat: usize,
    pub cards: Vec<String>,
}

fn phase_name(round: BettingRound) -> &'static str {
    match round {
        BettingRound::Waiting => "waiting",
        BettingRound::Preflop => "preflop",
        BettingRound::Flop => "flop",
        BettingRound::Turn => "turn",
        BettingRound::River => "river",
        BettingRound::Showdown => "showdown",
        BettingRound::HandOver => "complete",
    }
}

fn parse_phase(name: &str) -> Result<BettingRound, TransportError> {
    Ok(match name {
        "waiting" => BettingRound::Waiting,
        "preflop" => BettingRound::Preflop,
        "flop" => BettingRound::Flop,
        "turn" => BettingRound::Turn,
        "river" => BettingRound::River,
        "showdown" => BettingRound::Showdown,
        "complete" => BettingRound::HandOver,
        other => return Err(TransportError::Protocol(format!("unknown phase {other:?}"))),
    })
}

fn card_strings(cards: &[Card]) -> Vec<String> {
    cards.iter().map(Card::to_string).collect()
}

fn parse_card_strings(cards: &[String]) -> Result<Vec<Card>, TransportError> {
    cards
        .iter()
        .map(|c| {
            c.parse::<Card>()
                .map_err(|e| TransportError::Protocol(e.to_string()))
        })
        .collect()
}

fn encode_action(action: Action) -> (&'static str, Option<u32>) {
    match action {
        Action::Fold => ("fold", None),
        Action::Check => ("check", None),
        Action::Call => ("call", None),
        Action::Bet(to) => ("bet", Some(to)),
        Action::Raise(to) => ("raise", Some(to)),
    }
}

fn decode_action(kind: &str, amount: Option<u32>) -> Result<Action, TransportError> {
    match (kind, amount) {
        ("fold", None) => Ok(Action::Fold),
        ("check", None) => Ok(Action::Check),
        ("call", None) => Ok(Action::Call),
        ("bet", Some(to)) => Ok(Action::Bet(to)),
        ("raise", Some(to)) => Ok(Action::Raise(to)),
        _ => Err(TransportError::Protocol(format!(
            "bad action {kind:?} with amount {amount:?}"
        ))),
    }
}

impl From<&PlayerSnapshot> for RemoteSeat {
    fn from(p: &PlayerSnapshot) -> Self {
        RemoteSeat {
            index: p.seat,
            player_id: p.profile.id.clone(),
            name: p.profile.display_name.clone(),
            avatar: p.profile.avatar.clone(),
            bot: p.is_bot,
            chips: p.stack,
            cards: p.hole_cards.as_deref().map(card_strings),
            bet: p.current_bet,
            invested: p.total_committed,
            folded: p.is_folded,
            all_in: p.is_all_in,
            acted: p.has_acted,
            button: p.is_dealer,
            small_blind: p.is_sb,
            big_blind: p.is_bb,
            away: p.sitting_out,
        }
    }
}

impl TryFrom<RemoteSeat> for PlayerSnapshot {
    type Error = TransportError;

    fn try_from(s: RemoteSeat) -> Result<Self, Self::Error> {
        let hole_cards = s.cards.as_deref().map(parse_card_strings).transpose()?;
        Ok(PlayerSnapshot {
            seat: s.index,
            profile: PlayerProfile {
                id: s.player_id,
                display_name: s.name,
                avatar: s.avatar,
            },
            is_bot: s.bot,
            stack: s.chips,
            hole_cards,
            current_bet: s.bet,
            total_committed: s.invested,
            is_folded: s.folded,
            is_all_in: s.all_in,
            has_acted: s.acted,
            is_dealer: s.button,
            is_sb: s.small_blind,
            is_bb: s.big_blind,
            sitting_out: s.away,
        })
    }
}

impl From<&TableSnapshot> for RemoteTableState {
    fn from(snap: &TableSnapshot) -> Self {
        RemoteTableState {
            hand_no: snap.hand_number,
            phase: phase_name(snap.round).to_string(),
            seat_count: snap.max_seats,
            seats: snap.players.iter().map(RemoteSeat::from).collect(),
            board: card_strings(&snap.community_cards),
            pots: snap
                .pots
                .iter()
                .map(|p| RemotePot {
                    chips: p.amount,
                    contenders: p.eligible.clone(),
                })
                .collect(),
            to_match: snap.current_highest_bet,
            min_raise_by: snap.min_raise,
            button: snap.dealer_seat,
            turn: snap.acting_seat,
            blinds: [snap.small_blind, snap.big_blind],
            turn_started: snap.turn_started_at,
            history: snap
                .actions
                .iter()
                .map(|a| {
                    let (kind, amount) = encode_action(a.action);
                    RemoteAction {
                        seat: a.seat,
                        phase: phase_name(a.round).to_string(),
                        kind: kind.to_string(),
                        amount,
                        level: a.bet_to,
                        raise: a.raised,
                    }
                })
                .collect(),
            result: snap.last_result.as_ref().map(|r| RemoteResult {
                hand_no: r.hand_number,
                payouts: r
                    .awards
                    .iter()
                    .map(|a| RemotePayout {
                        pot: a.pot_index,
                        seat: a.seat,
                        chips: a.amount,
                    })
                    .collect(),
                shown: r
                    .showdown
                    .iter()
                    .map(|s| RemoteShown {
                        seat: s.seat,
                        cards: card_strings(&s.cards),
                    })
                    .collect(),
            }),
        }
    }
}

impl TryFrom<RemoteTableState> for TableSnapshot {
    type Error = TransportError;

    fn try_from(state: RemoteTableState) -> Result<Self, Self::Error> {
        let community_cards = parse_card_strings(&state.board)?;
        let players = state
            .seats
            .into_iter()
            .map(PlayerSnapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let actions = state
            .history
            .into_iter()
            .map(|a| {
                Ok(ActionRecord {
                    seat: a.seat,
                    round: parse_phase(&a.phase)?,
                    action: decode_action(&a.kind, a.amount)?,
                    bet_to: a.level,
                    raised: a.raise,
                })
            })
            .collect::<Result<Vec<_>, TransportError>>()?;
        let last_result = state
            .result
            .map(|r| decode_result(r, &community_cards))
            .transpose()?;

        Ok(TableSnapshot {
            hand_number: state.hand_no,
            round: parse_phase(&state.phase)?,
            max_seats: state.seat_count,
            players,
            community_cards,
            pots: state
                .pots
                .into_iter()
                .map(|p| Pot {
                    amount: p.chips,
                    eligible: p.contenders,
                })
                .collect(),
            current_highest_bet: state.to_match,
            min_raise: state.min_raise_by,
            dealer_seat: state.button,
            acting_seat: state.turn,
            small_blind: state.blinds[0],
            big_blind: state.blinds[1],
            turn_started_at: state.turn_started,
            actions,
            last_result,
        })
    }
}

fn decode_result(result: RemoteResult, board: &[Card]) -> Result<HandResult, TransportError> {
    let showdown = result
        .shown
        .into_iter()
        .map(|s| {
            let cards = parse_card_strings(&s.cards)?;
            let mut all = cards.clone();
            all.extend_from_slice(board);
            let hand = evaluate(&all).map_err(|e| {
                TransportError::Protocol(format!("seat {} shown hand: {e}", s.seat))
            })?;
            Ok(ShowdownHand {
                seat: s.seat,
                cards,
                hand,
            })
        })
        .collect::<Result<Vec<_>, TransportError>>()?;

    Ok(HandResult {
        hand_number: result.hand_no,
        awards: result
            .payouts
            .into_iter()
            .map(|p| PotAward {
                pot_index: p.pot,
                seat: p.seat,
                amount: p.chips,
            })
            .collect(),
        showdown,
    })
}
