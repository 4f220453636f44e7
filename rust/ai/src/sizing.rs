use felt_engine::player::Action;
use felt_engine::rules::BetContext;

/// Bet when the round is unopened, raise otherwise. `to` is the new level.
pub(crate) fn wager(ctx: BetContext, to: u32) -> Action {
    if ctx.highest_bet == 0 {
        Action::Bet(to)
    } else {
        Action::Raise(to)
    }
}

/// Clamps a target level into `[highest + min_raise, current_bet + stack]`.
/// A stack that cannot reach the minimum goes all in instead.
pub(crate) fn clamp_to(ctx: BetContext, target: u32) -> u32 {
    target.max(ctx.min_to()).min(ctx.max_to())
}

/// Raise to `multiplier` times the current highest bet. Calls when the stack
/// cannot even cover the current bet.
pub(crate) fn raise_by_multiple(ctx: BetContext, multiplier: f64) -> Action {
    if ctx.max_to() <= ctx.highest_bet {
        return Action::Call;
    }
    let target = (f64::from(ctx.highest_bet) * multiplier).round() as u32;
    wager(ctx, clamp_to(ctx, target))
}

/// Bet or raise by a fraction of the pot on top of the current highest bet.
pub(crate) fn pot_fraction(ctx: BetContext, pot: u32, fraction: f64) -> Action {
    if ctx.max_to() <= ctx.highest_bet {
        return Action::Call;
    }
    let target = ctx.highest_bet + (f64::from(pot) * fraction).round() as u32;
    wager(ctx, clamp_to(ctx, target))
}
