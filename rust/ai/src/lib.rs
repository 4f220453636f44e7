//! # felt-ai: Bot Decisions
//!
//! Decides actions for automated seats from a read-only table snapshot.
//! Preflop play follows position-keyed range charts; postflop play scores the
//! hand against the board and compares it with bet-size aware thresholds.
//!
//! ## Core Components
//!
//! - [`BotStrategy`] - Trait every bot implements
//! - [`RangeBot`] - The range-chart bot
//! - [`DecisionConfig`] - Tunable thresholds and feature switches
//! - [`decide_with_fallback`] - Never-fails wrapper used by the session layer
//! - [`create_ai`] - Factory for bots by name
//!
//! ## Quick Start
//!
//! ```rust
//! use felt_ai::{create_ai, decide_with_fallback, DecisionConfig, DecisionRng};
//! use felt_engine::player::PlayerProfile;
//! use felt_engine::table::{Table, TableConfig};
//! use rand::SeedableRng;
//!
//! let mut table = Table::new(TableConfig { seed: Some(1), ..TableConfig::default() }).unwrap();
//! table.seat_player(0, PlayerProfile::new("a", "A"), 1000, true).unwrap();
//! table.seat_player(1, PlayerProfile::new("b", "B"), 1000, true).unwrap();
//! table.start_hand().unwrap();
//!
//! let bot = create_ai("range", DecisionConfig::default()).unwrap();
//! let seat = table.acting_seat().unwrap();
//! let mut rng = DecisionRng::seed_from_u64(7);
//! let action = decide_with_fallback(bot.as_ref(), &table.snapshot(), seat, &mut rng);
//! assert!(table.apply_action(seat, action).is_ok());
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};

use felt_engine::player::Action;
use felt_engine::rules::validate_action;
use felt_engine::snapshot::TableSnapshot;
use rand_chacha::ChaCha20Rng;

pub mod bot;
pub mod config;
pub mod errors;
pub mod postflop;
mod preflop;
pub mod range;
mod sizing;

pub use bot::RangeBot;
pub use config::DecisionConfig;
pub use errors::DecisionError;

/// Seeded randomness handed to every decision. Same snapshot and seed give
/// the same action.
pub type DecisionRng = ChaCha20Rng;

/// Interface for automated seats. Implementations only read the snapshot.
pub trait BotStrategy: Send + Sync {
    /// Choose an action for `seat`, which is expected to be the acting seat.
    fn decide(
        &self,
        snapshot: &TableSnapshot,
        seat: usize,
        rng: &mut DecisionRng,
    ) -> Result<Action, DecisionError>;

    fn name(&self) -> &str;
}

/// Runs a strategy and always comes back with an action that is legal for the
/// snapshot. Errors, panics and illegal choices are replaced by Check when
/// nothing is owed, otherwise Fold.
pub fn decide_with_fallback(
    strategy: &dyn BotStrategy,
    snapshot: &TableSnapshot,
    seat: usize,
    rng: &mut DecisionRng,
) -> Action {
    let Some(ctx) = snapshot.bet_context(seat) else {
        return Action::Fold;
    };
    let safe = || {
        if validate_action(ctx, Action::Check).is_ok() {
            Action::Check
        } else {
            Action::Fold
        }
    };

    match catch_unwind(AssertUnwindSafe(|| strategy.decide(snapshot, seat, rng))) {
        Ok(Ok(action)) => match validate_action(ctx, action) {
            Ok(_) => action,
            Err(err) => {
                tracing::warn!(seat, %action, error = %err, bot = strategy.name(), "bot chose an illegal action");
                safe()
            }
        },
        Ok(Err(err)) => {
            tracing::warn!(seat, error = %err, bot = strategy.name(), "bot decision failed");
            safe()
        }
        Err(_) => {
            tracing::error!(seat, bot = strategy.name(), "bot decision panicked");
            safe()
        }
    }
}

/// Builds a bot by name. Unknown names fall back to the range bot.
///
/// ```rust
/// use felt_ai::{create_ai, DecisionConfig};
///
/// let ai = create_ai("range", DecisionConfig::default()).unwrap();
/// assert_eq!(ai.name(), "RangeBot");
/// let fallback = create_ai("shark", DecisionConfig::default()).unwrap();
/// assert_eq!(fallback.name(), "RangeBot");
/// ```
pub fn create_ai(name: &str, config: DecisionConfig) -> Result<Box<dyn BotStrategy>, DecisionError> {
    match name {
        "range" | "" => Ok(Box::new(RangeBot::new(config)?)),
        other => {
            tracing::warn!(requested = other, "unknown bot type, using range bot");
            Ok(Box::new(RangeBot::new(config)?))
        }
    }
}
