use felt_engine::GameError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecisionError {
    #[error("Seat {0} is not at the table")]
    NotSeated(usize),
    #[error("Seat {0} has no visible hole cards")]
    NoHoleCards(usize),
    #[error("Invalid range notation: {0}")]
    InvalidRange(String),
    #[error("Invalid decision config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Evaluation(#[from] GameError),
}
