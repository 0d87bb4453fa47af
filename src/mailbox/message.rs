use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorNumber, MarketRole};

/// Coarse routing class of an outgoing message.
///
/// An actor retrieves one category per peek; categories never mix within a
/// bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCategory {
    MasterData,
    Aggregations,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageCategory::MasterData => write!(f, "MasterData"),
            MessageCategory::Aggregations => write!(f, "Aggregations"),
        }
    }
}

/// A produced outgoing message before it is persisted.
///
/// The payload is an opaque, already-rendered wire document; the store never
/// inspects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub process_type: String,
    pub message_type: String,
    pub category: MessageCategory,
    #[serde(with = "payload_serde")]
    pub payload: Vec<u8>,
}

/// A persisted outgoing message.
///
/// The id is assigned by the store from a monotonic sequence, so id order is
/// creation order. Immutable once created; removed only when the bundle it
/// belongs to is dequeued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnqueuedMessage {
    pub id: u64,
    pub created_at: SystemTime,
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub process_type: String,
    pub message_type: String,
    pub category: MessageCategory,
    #[serde(with = "payload_serde")]
    pub payload: Vec<u8>,
}

impl EnqueuedMessage {
    pub(crate) fn from_outgoing(id: u64, created_at: SystemTime, message: OutgoingMessage) -> Self {
        EnqueuedMessage {
            id,
            created_at,
            receiver: message.receiver,
            receiver_role: message.receiver_role,
            sender: message.sender,
            sender_role: message.sender_role,
            process_type: message.process_type,
            message_type: message.message_type,
            category: message.category,
            payload: message.payload,
        }
    }

    /// The homogeneity tuple this message bundles under.
    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey {
            process_type: self.process_type.clone(),
            receiver: self.receiver.clone(),
            receiver_role: self.receiver_role,
            sender: self.sender.clone(),
            sender_role: self.sender_role,
            message_type: self.message_type.clone(),
        }
    }
}

/// The tuple every member of a bundle must agree on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingKey {
    pub process_type: String,
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub message_type: String,
}

pub(crate) mod payload_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(payload: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(payload).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
