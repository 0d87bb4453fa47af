use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorNumber, CorrelationId};
use crate::mailbox::MessageCategory;

/// Deferred domain work, written transactionally alongside the state change
/// that produced it.
///
/// A closed enum: the dispatch table is keyed by [`CommandKind`], so every
/// variant is known at compile time and an unhandled variant can only mean a
/// dispatcher that was wired incompletely at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InternalCommand {
    /// Render and enqueue the confirmation message for an accepted
    /// transaction, then schedule its data-available notification.
    CreateConfirmationMessage {
        transaction_id: String,
        correlation_id: CorrelationId,
    },
    /// Tell an actor over the transport that a message is waiting.
    DispatchNotification {
        recipient: ActorNumber,
        message_type: String,
        category: MessageCategory,
        correlation_id: CorrelationId,
    },
}

impl InternalCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            InternalCommand::CreateConfirmationMessage { .. } => {
                CommandKind::CreateConfirmationMessage
            }
            InternalCommand::DispatchNotification { .. } => CommandKind::DispatchNotification,
        }
    }

    /// Encode for persistence in the command outbox (compact binary).
    pub fn encode(&self) -> Result<Vec<u8>, bitcode::Error> {
        bitcode::serialize(self)
    }

    /// Decode a persisted command payload.
    pub fn decode(payload: &[u8]) -> Result<Self, bitcode::Error> {
        bitcode::deserialize(payload)
    }
}

/// Dispatch-table key for [`InternalCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    CreateConfirmationMessage,
    DispatchNotification,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::CreateConfirmationMessage => write!(f, "CreateConfirmationMessage"),
            CommandKind::DispatchNotification => write!(f, "DispatchNotification"),
        }
    }
}

/// Persisted outbox row for one deferred command.
///
/// Pending while `processed_at` is `None`; once the processor has run it,
/// `processed_at` is set and `error` records the failure text, if any.
/// Records are kept forever for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommandRecord {
    pub id: u64,
    pub kind: CommandKind,
    #[serde(with = "crate::mailbox::message::payload_serde")]
    pub payload: Vec<u8>,
    pub created_at: SystemTime,
    pub processed_at: Option<SystemTime>,
    pub error: Option<String>,
}

impl QueuedCommandRecord {
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }
}
