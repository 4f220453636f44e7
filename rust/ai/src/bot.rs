use felt_engine::snapshot::TableSnapshot;
use felt_engine::player::Action;
use felt_engine::table::BettingRound;

use crate::config::DecisionConfig;
use crate::errors::DecisionError;
use crate::range::{HandClass, RangeBook};
use crate::{postflop, preflop, BotStrategy, DecisionRng};

/// Range-chart preflop play with scored postflop heuristics.
///
/// # Example
///
/// ```rust
/// use felt_ai::{BotStrategy, DecisionConfig, RangeBot};
///
/// let bot = RangeBot::new(DecisionConfig::default()).unwrap();
/// assert_eq!(bot.name(), "RangeBot");
/// ```
#[derive(Debug, Clone)]
pub struct RangeBot {
    config: DecisionConfig,
    book: RangeBook,
}

impl RangeBot {
    pub fn new(config: DecisionConfig) -> Result<Self, DecisionError> {
        Self::with_book(config, RangeBook::standard()?)
    }

    pub fn with_book(config: DecisionConfig, book: RangeBook) -> Result<Self, DecisionError> {
        config.validate()?;
        Ok(Self { config, book })
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }
}

impl BotStrategy for RangeBot {
    fn decide(
        &self,
        snapshot: &TableSnapshot,
        seat: usize,
        rng: &mut DecisionRng,
    ) -> Result<Action, DecisionError> {
        let player = snapshot.player(seat).ok_or(DecisionError::NotSeated(seat))?;
        let ctx = snapshot
            .bet_context(seat)
            .ok_or(DecisionError::NotSeated(seat))?;
        let hole = match player.hole_cards.as_deref() {
            Some(cards @ [_, _]) => cards,
            _ => return Err(DecisionError::NoHoleCards(seat)),
        };

        match snapshot.round {
            BettingRound::Preflop => {
                let class = HandClass::from_cards(hole[0], hole[1]);
                Ok(preflop::decide(&self.book, &self.config, snapshot, seat, ctx, class))
            }
            BettingRound::Flop | BettingRound::Turn | BettingRound::River => {
                postflop::decide(&self.config, snapshot, seat, hole, ctx, rng)
            }
            _ => Ok(Action::Check),
        }
    }

    fn name(&self) -> &str {
        "RangeBot"
    }
}
