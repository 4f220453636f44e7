//! # felt-engine: Table Rules Core
//!
//! A deterministic Texas Hold'em table for 2 to 10 seats. Covers hand
//! evaluation, betting validation, side pots and the hand state machine,
//! with a seeded deck so every hand can be replayed.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and text parsing
//! - [`deck`] - Seeded deck shuffling with ChaCha20 RNG
//! - [`hand`] - Best-five-of-seven hand evaluation
//! - [`player`] - Player state, profiles and actions
//! - [`rules`] - Betting validation
//! - [`pot`] - Main pot and side pot construction and awards
//! - [`table`] - Hand lifecycle state machine
//! - [`snapshot`] - Read-only table projection for observers and bots
//! - [`errors`] - Error types for table operations
//!
//! ## Quick Start
//!
//! ```rust
//! use felt_engine::cards::parse_cards;
//! use felt_engine::hand::{evaluate, Category};
//!
//! let cards = parse_cards("Ah Kh Qh Jh Th 2c 3d").unwrap();
//! let hand = evaluate(&cards).unwrap();
//! assert_eq!(hand.category, Category::StraightFlush);
//! ```
//!
//! ## Playing a Hand
//!
//! ```rust
//! use felt_engine::player::{Action, PlayerProfile};
//! use felt_engine::table::{BettingRound, Table, TableConfig};
//!
//! let mut table = Table::new(TableConfig { seed: Some(42), ..TableConfig::default() }).unwrap();
//! table.seat_player(0, PlayerProfile::new("a", "Alice"), 1000, false).unwrap();
//! table.seat_player(1, PlayerProfile::new("b", "Bob"), 1000, false).unwrap();
//! table.start_hand().unwrap();
//!
//! let seat = table.acting_seat().unwrap();
//! let outcome = table.apply_action(seat, Action::Fold).unwrap();
//! assert!(outcome.hand_result.is_some());
//! assert_eq!(table.round(), BettingRound::HandOver);
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod player;
pub mod pot;
pub mod rules;
pub mod snapshot;
pub mod table;

pub use errors::GameError;
pub use player::{Action, PlayerProfile};
pub use snapshot::{PlayerSnapshot, TableSnapshot};
pub use table::{BettingRound, Table, TableConfig};
