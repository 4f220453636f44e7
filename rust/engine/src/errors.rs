use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid bet amount: {amount}, minimum: {minimum}")]
    InvalidBetAmount { amount: u32, minimum: u32 },
    #[error("Cannot check facing a bet of {to_call}")]
    CheckFacingBet { to_call: u32 },
    #[error("Cannot bet when a bet of {current} is already open; raise instead")]
    BetAlreadyOpen { current: u32 },
    #[error("Cannot raise when there is no bet; bet instead")]
    NothingToRaise,
    #[error("No hand in progress")]
    NoHandInProgress,
    #[error("Hand already in progress")]
    HandInProgress,
    #[error("It's not seat {actual}'s turn (acting seat: {expected:?})")]
    NotPlayersTurn { expected: Option<usize>, actual: usize },
    #[error("Seat {0} is empty")]
    SeatEmpty(usize),
    #[error("Seat {0} is already occupied")]
    SeatOccupied(usize),
    #[error("Seat {seat} is out of range (table has {max_seats} seats)")]
    SeatOutOfRange { seat: usize, max_seats: usize },
    #[error("Player in seat {0} already folded")]
    PlayerAlreadyFolded(usize),
    #[error("Player in seat {0} is all-in")]
    PlayerAllIn(usize),
    #[error("Seating {stack} chips would put {total} chips on a table that holds at most {limit}")]
    ChipLimitExceeded { stack: u32, total: u64, limit: u32 },
    #[error("At least two players with chips are required, found {0}")]
    NotEnoughPlayers(usize),
    #[error("Invalid card notation: {0}")]
    InvalidCard(String),
    #[error("Hand evaluation needs 5 to 7 cards, got {0}")]
    InvalidCardCount(usize),
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),
    #[error("Snapshot cannot be restored: {0}")]
    InvalidSnapshot(String),
    #[error("Deck exhausted")]
    DeckExhausted,
    #[error("Table integrity violated: {0}")]
    IntegrityViolation(String),
    #[error("Table is invalid after an integrity violation and accepts no further actions")]
    TableInvalid,
}

impl GameError {
    /// Validation failures are rejected synchronously and leave the table
    /// untouched; everything else indicates a setup problem or a defect.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GameError::InvalidBetAmount { .. }
                | GameError::CheckFacingBet { .. }
                | GameError::BetAlreadyOpen { .. }
                | GameError::NothingToRaise
                | GameError::NoHandInProgress
                | GameError::HandInProgress
                | GameError::NotPlayersTurn { .. }
                | GameError::SeatEmpty(_)
                | GameError::SeatOccupied(_)
                | GameError::SeatOutOfRange { .. }
                | GameError::PlayerAlreadyFolded(_)
                | GameError::PlayerAllIn(_)
                | GameError::NotEnoughPlayers(_)
                | GameError::ChipLimitExceeded { .. }
        )
    }
}
