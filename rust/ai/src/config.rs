use serde::{Deserialize, Serialize};

use crate::errors::DecisionError;

/// Tuning knobs for [`crate::RangeBot`].
///
/// None of the postflop numbers are solver-derived; they are starting points
/// meant to be overridden from settings. Built once and handed to the bot by
/// value, never looked up globally at decision time.
///
/// # Examples
///
/// ```
/// use felt_ai::DecisionConfig;
///
/// let config = DecisionConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.open_multiplier, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Use the scored postflop heuristics. When off, bots play a plain
    /// made-hand strategy after the flop.
    pub postflop_heuristics: bool,
    /// Allow stochastic bluff bets and raises.
    pub bluffing: bool,

    // Preflop sizing, as multiples of the current highest bet.
    pub open_multiplier: f64,
    pub three_bet_multiplier: f64,
    pub four_bet_multiplier: f64,
    pub five_bet_multiplier: f64,

    /// Base strength per made-hand category, high card first.
    pub category_strength: [f64; 9],

    // Pair quality adjustments applied to one-pair hands.
    pub overpair_bonus: f64,
    pub top_pair_bonus: f64,
    pub middle_pair_bonus: f64,
    pub bottom_pair_bonus: f64,
    pub underpair_bonus: f64,
    /// Subtracted when the only pair is on the board.
    pub board_pair_penalty: f64,
    /// Scaled by the unpaired hole card's rank for top pair.
    pub kicker_weight: f64,

    // Draw potential, only counted before the river.
    pub flush_draw_bonus: f64,
    pub open_ended_bonus: f64,
    pub gutshot_bonus: f64,
    pub overcards_bonus: f64,

    // Board texture.
    pub draw_heavy_multiplier: f64,
    pub low_board_multiplier: f64,
    pub paired_board_multiplier: f64,
    /// Highest rank value that still counts as a low board.
    pub low_board_max_rank: u8,

    /// Added per street (flop 1, turn 2, river 3) in position; half of it is
    /// taken away out of position.
    pub position_step: f64,

    // Bet size classes as `to_call / pot`, with the threshold scale each
    // class applies.
    pub tiny_bet_ratio: f64,
    pub small_bet_ratio: f64,
    pub medium_bet_ratio: f64,
    pub tiny_bet_scale: f64,
    pub small_bet_scale: f64,
    pub medium_bet_scale: f64,
    pub large_bet_scale: f64,

    // Facing a bet.
    pub call_threshold_base: f64,
    pub pot_odds_weight: f64,
    pub raise_threshold: f64,
    pub value_raise_multiplier: f64,

    // First to act.
    pub value_bet_threshold: f64,
    pub top_pair_value_threshold: f64,
    pub strong_bet_threshold: f64,
    pub strong_bet_pot_fraction: f64,
    pub value_bet_pot_fraction: f64,
    pub bluff_bet_pot_fraction: f64,

    // Bluffing.
    pub bluff_raise_floor: f64,
    pub flop_bluff_frequency: f64,
    pub turn_bluff_frequency: f64,
    pub river_bluff_frequency: f64,
    pub wet_board_bluff_multiplier: f64,
    pub max_bluff_frequency: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            postflop_heuristics: true,
            bluffing: true,
            open_multiplier: 3.0,
            three_bet_multiplier: 3.0,
            four_bet_multiplier: 2.3,
            five_bet_multiplier: 2.2,
            category_strength: [0.10, 0.30, 0.55, 0.68, 0.76, 0.80, 0.90, 0.97, 0.99],
            overpair_bonus: 0.25,
            top_pair_bonus: 0.15,
            middle_pair_bonus: 0.06,
            bottom_pair_bonus: 0.02,
            underpair_bonus: 0.0,
            board_pair_penalty: 0.15,
            kicker_weight: 0.05,
            flush_draw_bonus: 0.12,
            open_ended_bonus: 0.10,
            gutshot_bonus: 0.05,
            overcards_bonus: 0.04,
            draw_heavy_multiplier: 1.05,
            low_board_multiplier: 1.05,
            paired_board_multiplier: 0.9,
            low_board_max_rank: 9,
            position_step: 0.03,
            tiny_bet_ratio: 0.25,
            small_bet_ratio: 0.5,
            medium_bet_ratio: 1.0,
            tiny_bet_scale: 0.6,
            small_bet_scale: 0.8,
            medium_bet_scale: 1.0,
            large_bet_scale: 1.15,
            call_threshold_base: 0.15,
            pot_odds_weight: 1.0,
            raise_threshold: 0.75,
            value_raise_multiplier: 2.5,
            value_bet_threshold: 0.55,
            top_pair_value_threshold: 0.45,
            strong_bet_threshold: 0.8,
            strong_bet_pot_fraction: 0.75,
            value_bet_pot_fraction: 0.5,
            bluff_bet_pot_fraction: 0.5,
            bluff_raise_floor: 0.25,
            flop_bluff_frequency: 0.12,
            turn_bluff_frequency: 0.08,
            river_bluff_frequency: 0.05,
            wet_board_bluff_multiplier: 1.25,
            max_bluff_frequency: 0.3,
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<(), DecisionError> {
        let multipliers = [
            ("open_multiplier", self.open_multiplier),
            ("three_bet_multiplier", self.three_bet_multiplier),
            ("four_bet_multiplier", self.four_bet_multiplier),
            ("five_bet_multiplier", self.five_bet_multiplier),
            ("value_raise_multiplier", self.value_raise_multiplier),
        ];
        for (name, value) in multipliers {
            if !(value.is_finite() && value >= 1.0) {
                return Err(DecisionError::InvalidConfig(format!(
                    "{name} must be at least 1.0, got {value}"
                )));
            }
        }

        let probabilities = [
            ("flop_bluff_frequency", self.flop_bluff_frequency),
            ("turn_bluff_frequency", self.turn_bluff_frequency),
            ("river_bluff_frequency", self.river_bluff_frequency),
            ("max_bluff_frequency", self.max_bluff_frequency),
            ("raise_threshold", self.raise_threshold),
            ("value_bet_threshold", self.value_bet_threshold),
            ("top_pair_value_threshold", self.top_pair_value_threshold),
            ("bluff_raise_floor", self.bluff_raise_floor),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(DecisionError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(self.tiny_bet_ratio < self.small_bet_ratio && self.small_bet_ratio < self.medium_bet_ratio)
        {
            return Err(DecisionError::InvalidConfig(
                "bet size ratios must be strictly increasing".to_string(),
            ));
        }
        if self.category_strength.windows(2).any(|w| w[0] > w[1]) {
            return Err(DecisionError::InvalidConfig(
                "category_strength must not decrease with category".to_string(),
            ));
        }
        Ok(())
    }
}
