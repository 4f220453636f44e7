//! Error types for the session layer.
//!
//! Every failure carries a [`ErrorSeverity`] so callers and the adapter log it
//! at a consistent level. Only validation problems are meant for the player;
//! transport failures are absorbed by the embedded fallback.
use std::time::Duration;

use felt_ai::DecisionError;
use felt_engine::errors::GameError;
use thiserror::Error;

use crate::settings::SettingsError;

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected input, expected during normal play
    Client,
    /// Unexpected failure outside the table, needs investigation
    Server,
    /// Table integrity at risk
    Critical,
}

/// Failure talking to the remote session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Remote session disconnected")]
    Disconnected,
    #[error("Remote session did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Transport failure: {0}")]
    Io(String),
    #[error("Malformed remote payload: {0}")]
    Protocol(String),
    #[error("Remote events were already taken")]
    EventsUnavailable,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid action: {0}")]
    Validation(GameError),
    #[error("Table error: {0}")]
    Table(GameError),
    #[error("Remote session rejected the request: {0}")]
    RemoteRejected(String),
    #[error("Decision engine error: {0}")]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Cannot connect to a remote session after a hand has started")]
    ModeSwitchRefused,
    #[error("Already connected to a remote session")]
    AlreadyRemote,
    #[error("Session has been shut down")]
    ShutDown,
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        if err.is_validation() {
            SessionError::Validation(err)
        } else {
            SessionError::Table(err)
        }
    }
}

impl SessionError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "invalid_action",
            SessionError::Table(GameError::IntegrityViolation(_))
            | SessionError::Table(GameError::TableInvalid) => "table_invalid",
            SessionError::Table(_) => "table_error",
            SessionError::RemoteRejected(_) => "remote_rejected",
            SessionError::Decision(_) => "decision_failed",
            SessionError::Transport(_) => "transport_failed",
            SessionError::Settings(_) => "invalid_settings",
            SessionError::ModeSwitchRefused => "mode_switch_refused",
            SessionError::AlreadyRemote => "already_remote",
            SessionError::ShutDown => "session_shut_down",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::Validation(_)
            | SessionError::RemoteRejected(_)
            | SessionError::Settings(_)
            | SessionError::ModeSwitchRefused
            | SessionError::AlreadyRemote
            | SessionError::ShutDown => ErrorSeverity::Client,
            SessionError::Table(GameError::IntegrityViolation(_))
            | SessionError::Table(GameError::TableInvalid) => ErrorSeverity::Critical,
            SessionError::Table(_) | SessionError::Decision(_) | SessionError::Transport(_) => {
                ErrorSeverity::Server
            }
        }
    }

    /// Whether the message should be shown to the player as is.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            SessionError::Validation(_) | SessionError::RemoteRejected(_)
        )
    }

    /// Logs the error at the level its severity calls for.
    pub fn log(&self) {
        let code = self.error_code();
        match self.severity() {
            ErrorSeverity::Client => tracing::info!(error_code = code, error = %self, "client error"),
            ErrorSeverity::Server => tracing::error!(error_code = code, error = %self, "server error"),
            ErrorSeverity::Critical => {
                tracing::error!(error_code = code, error = %self, critical = true, "critical error")
            }
        }
    }
}
