//! # felt-session: Table Sessions
//!
//! Runs one poker table for a client, either in process or against a remote
//! authoritative session, behind a single API.
//!
//! ## Core Components
//!
//! - [`SessionAdapter`] - Mode switching front door to a table
//! - [`EventBus`] / [`EventSubscription`] - Table events for observers
//! - [`RemoteTransport`] - Connection to a remote session
//! - [`RemoteTableState`] - Wire form of a table snapshot
//! - [`BotScheduler`] - The single cancellable bot task
//! - [`SessionSettings`] - Table, timing and decision settings
//!
//! ## Modes
//!
//! In embedded mode the table runs locally and bots act after a short think
//! delay. In remote mode every request is forwarded and pushed state updates
//! replace the local mirror. A failed or timed out request, or a disconnect,
//! moves the session back to embedded play exactly once and publishes a
//! [`TableEvent::FallbackNotice`].

pub mod adapter;
pub mod errors;
pub mod events;
pub mod logging;
pub mod remote;
pub mod scheduler;
pub mod settings;
pub mod wire;

pub use adapter::{SessionAdapter, SessionMode};
pub use errors::{ErrorSeverity, SessionError, TransportError};
pub use events::{EventBus, EventSubscription, TableEvent};
pub use logging::{capture_logs, init_logging, init_test_logging, LogCapture, LogEntry};
pub use remote::{RemoteEvent, RemoteReply, RemoteRequest, RemoteTransport};
pub use scheduler::BotScheduler;
pub use settings::{SessionSettings, SettingsError, SettingsStore};
pub use wire::RemoteTableState;
