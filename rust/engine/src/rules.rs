use crate::errors::GameError;
use crate::player::Action as A;

/// Betting facts for the seat about to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetContext {
    pub stack: u32,
    pub current_bet: u32,
    pub highest_bet: u32,
    pub min_raise: u32,
}

impl BetContext {
    pub fn to_call(&self) -> u32 {
        self.highest_bet.saturating_sub(self.current_bet)
    }

    /// Largest bet level the seat can reach this round.
    pub fn max_to(&self) -> u32 {
        self.current_bet.saturating_add(self.stack)
    }

    /// Smallest legal full bet or raise level.
    pub fn min_to(&self) -> u32 {
        self.highest_bet.saturating_add(self.min_raise)
    }
}

/// An action checked against the betting state. Amounts in `Call` and
/// `AllIn` are chips leaving the stack; amounts in `Bet` and `Raise` are the
/// new bet level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    Call(u32),
    Bet(u32),
    Raise(u32),
    AllIn(u32),
}

/// Validates a player action according to betting rules and stack size.
///
/// Anything that would commit more than the stack is clamped to the stack and
/// becomes [`ValidatedAction::AllIn`]; a Call with nothing to call is a Check.
///
/// # Errors
///
/// - [`GameError::CheckFacingBet`] - Check while chips are owed
/// - [`GameError::BetAlreadyOpen`] - Bet when the round already has a bet
/// - [`GameError::NothingToRaise`] - Raise when nobody has bet
/// - [`GameError::InvalidBetAmount`] - Bet/Raise below `highest + min_raise`
///   that does not put the whole stack in
///
/// # Examples
///
/// ```
/// use felt_engine::rules::{validate_action, BetContext, ValidatedAction};
/// use felt_engine::player::Action;
///
/// let ctx = BetContext { stack: 50, current_bet: 0, highest_bet: 100, min_raise: 100 };
/// assert_eq!(validate_action(ctx, Action::Call), Ok(ValidatedAction::AllIn(50)));
///
/// let ctx = BetContext { stack: 1000, current_bet: 0, highest_bet: 100, min_raise: 100 };
/// assert!(validate_action(ctx, Action::Raise(150)).is_err());
/// assert_eq!(validate_action(ctx, Action::Raise(200)), Ok(ValidatedAction::Raise(200)));
/// ```
pub fn validate_action(ctx: BetContext, action: A) -> Result<ValidatedAction, GameError> {
    let to_call = ctx.to_call();
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::Check => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else {
                Err(GameError::CheckFacingBet { to_call })
            }
        }
        A::Call => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else if ctx.stack <= to_call {
                Ok(ValidatedAction::AllIn(ctx.stack))
            } else {
                Ok(ValidatedAction::Call(to_call))
            }
        }
        A::Bet(to) => {
            if ctx.highest_bet > 0 {
                return Err(GameError::BetAlreadyOpen {
                    current: ctx.highest_bet,
                });
            }
            aggressive(ctx, to).map(|level| level.unwrap_or(ValidatedAction::Bet(to)))
        }
        A::Raise(to) => {
            if ctx.highest_bet == 0 {
                return Err(GameError::NothingToRaise);
            }
            aggressive(ctx, to).map(|level| level.unwrap_or(ValidatedAction::Raise(to)))
        }
    }
}

/// Shared bounds check for Bet and Raise: `Some(AllIn)` when the stack is
/// exhausted, `None` for a regular full-size wager.
fn aggressive(ctx: BetContext, to: u32) -> Result<Option<ValidatedAction>, GameError> {
    if to >= ctx.max_to() {
        return Ok(Some(ValidatedAction::AllIn(ctx.stack)));
    }
    let minimum = ctx.min_to();
    if to < minimum {
        return Err(GameError::InvalidBetAmount {
            amount: to,
            minimum,
        });
    }
    Ok(None)
}
