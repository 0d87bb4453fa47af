use std::fmt;

use crate::mailbox::message::{EnqueuedMessage, MessageCategory, RoutingKey};

/// Rejection raised when a candidate bundle breaks homogeneity.
///
/// Attributes are checked in a fixed order against the first member; the
/// first attribute that differs anywhere in the candidate set determines the
/// reported kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    Empty,
    ProcessTypeMismatch,
    ReceiverMismatch,
    ReceiverRoleMismatch,
    SenderMismatch,
    SenderRoleMismatch,
    MessageTypeMismatch,
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::Empty => write!(f, "bundle candidate contains no messages"),
            BundleError::ProcessTypeMismatch => {
                write!(f, "process type differs within bundle candidate")
            }
            BundleError::ReceiverMismatch => {
                write!(f, "receiver number differs within bundle candidate")
            }
            BundleError::ReceiverRoleMismatch => {
                write!(f, "receiver role differs within bundle candidate")
            }
            BundleError::SenderMismatch => {
                write!(f, "sender number differs within bundle candidate")
            }
            BundleError::SenderRoleMismatch => {
                write!(f, "sender role differs within bundle candidate")
            }
            BundleError::MessageTypeMismatch => {
                write!(f, "message type differs within bundle candidate")
            }
        }
    }
}

impl std::error::Error for BundleError {}

/// A homogeneous, non-empty group of outgoing messages delivered together.
///
/// Bundles are a derived view over the message store, never persisted
/// themselves; a bundle is addressed at dequeue time by its member ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
    messages: Vec<EnqueuedMessage>,
}

impl Bundle {
    /// Validate a candidate set and form a bundle from it.
    ///
    /// Member order is preserved. The selector only ever hands this function
    /// homogeneous sets, so a mismatch here signals a selection fault; tests
    /// exercise each rejection kind directly with hand-built sets.
    pub fn validate(messages: Vec<EnqueuedMessage>) -> Result<Self, BundleError> {
        let first = messages.first().ok_or(BundleError::Empty)?;

        if messages.iter().any(|m| m.process_type != first.process_type) {
            return Err(BundleError::ProcessTypeMismatch);
        }
        if messages.iter().any(|m| m.receiver != first.receiver) {
            return Err(BundleError::ReceiverMismatch);
        }
        if messages.iter().any(|m| m.receiver_role != first.receiver_role) {
            return Err(BundleError::ReceiverRoleMismatch);
        }
        if messages.iter().any(|m| m.sender != first.sender) {
            return Err(BundleError::SenderMismatch);
        }
        if messages.iter().any(|m| m.sender_role != first.sender_role) {
            return Err(BundleError::SenderRoleMismatch);
        }
        if messages.iter().any(|m| m.message_type != first.message_type) {
            return Err(BundleError::MessageTypeMismatch);
        }

        Ok(Bundle { messages })
    }

    pub fn messages(&self) -> &[EnqueuedMessage] {
        &self.messages
    }

    /// Ids of every member, in bundle order. This is the handle a client
    /// passes back to dequeue the bundle.
    pub fn message_ids(&self) -> Vec<u64> {
        self.messages.iter().map(|m| m.id).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        // Bundles are non-empty by construction.
        false
    }

    pub fn routing_key(&self) -> RoutingKey {
        self.messages[0].routing_key()
    }

    pub fn category(&self) -> MessageCategory {
        self.messages[0].category
    }

    /// Concatenated payloads of all members, the body served by a peek.
    pub fn payload(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for message in &self.messages {
            body.extend_from_slice(&message.payload);
        }
        body
    }
}
