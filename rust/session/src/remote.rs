use async_trait::async_trait;
use felt_engine::player::{Action, PlayerProfile};
use felt_engine::table::TableConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::TransportError;
use crate::wire::RemoteTableState;

/// Requests the client can make of an authoritative remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteRequest {
    Create {
        config: TableConfig,
    },
    Join {
        table_id: String,
    },
    TakeSeat {
        seat: usize,
        profile: PlayerProfile,
        stack: u32,
        is_bot: bool,
    },
    Start,
    SubmitAction {
        seat: usize,
        action: Action,
    },
}

impl RemoteRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteRequest::Create { .. } => "create",
            RemoteRequest::Join { .. } => "join",
            RemoteRequest::TakeSeat { .. } => "take_seat",
            RemoteRequest::Start => "start",
            RemoteRequest::SubmitAction { .. } => "submit_action",
        }
    }
}

/// Answer to a [`RemoteRequest`] that reached the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteReply {
    Accepted,
    Created { table_id: String },
    Rejected { reason: String },
}

/// Pushed by the remote session without being asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
    StateUpdate { state: Box<RemoteTableState> },
    Message { text: String },
    Disconnected { reason: String },
}

/// Connection to a remote table. Implementations own the actual socket or
/// channel; the adapter only sees requests, replies and pushed events.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn request(&self, request: RemoteRequest) -> Result<RemoteReply, TransportError>;

    /// Hands over the push stream. Only the first call returns it.
    fn take_events(&self) -> Option<mpsc::Receiver<RemoteEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_with_type_tag() {
        let json = serde_json::to_value(RemoteRequest::SubmitAction {
            seat: 2,
            action: Action::Raise(60),
        })
        .expect("serialize");
        assert_eq!(json["type"], "submit_action");
        assert_eq!(json["seat"], 2);

        let back: RemoteRequest = serde_json::from_value(json).expect("deserialize");
        assert_eq!(
            back,
            RemoteRequest::SubmitAction {
                seat: 2,
                action: Action::Raise(60)
            }
        );
    }

    #[test]
    fn replies_parse_from_status() {
        let reply: RemoteReply =
            serde_json::from_str(r#"{"status":"rejected","reason":"not your turn"}"#)
                .expect("parse");
        assert_eq!(
            reply,
            RemoteReply::Rejected {
                reason: "not your turn".into()
            }
        );
    }
}
