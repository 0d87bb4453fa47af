//! Contracts for the black-box collaborators the delivery core calls out to,
//! with in-process implementations for local use and tests.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::actor::{ActorNumber, CorrelationId, MarketRole};
use crate::mailbox::MessageCategory;

/// Structural validation of a submitted raw payload.
pub trait SchemaValidator {
    /// `Ok` when the payload is structurally sound, otherwise the list of
    /// structural errors to return to the submitter.
    fn validate(&self, raw: &[u8]) -> Result<(), Vec<String>>;
}

/// Validator that accepts everything. Stands in for the real schema
/// machinery in tests and local setups.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllValidator;

impl SchemaValidator for AcceptAllValidator {
    fn validate(&self, _raw: &[u8]) -> Result<(), Vec<String>> {
        Ok(())
    }
}

/// Header of a document handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub message_type: String,
    pub process_type: String,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub correlation_id: CorrelationId,
}

/// One activity record within a document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub body: serde_json::Value,
}

/// Turns a validated header plus activity records into opaque wire bytes.
pub trait DocumentRenderer {
    type Error: fmt::Display;

    fn render(
        &self,
        header: &DocumentHeader,
        records: &[ActivityRecord],
    ) -> Result<Vec<u8>, Self::Error>;
}

/// Renderer producing a JSON document. The real exchange renders
/// format-specific wire documents; this one keeps local setups and tests
/// self-contained.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct Document<'a> {
    header: &'a DocumentHeader,
    activity_records: &'a [ActivityRecord],
}

impl DocumentRenderer for JsonRenderer {
    type Error = serde_json::Error;

    fn render(
        &self,
        header: &DocumentHeader,
        records: &[ActivityRecord],
    ) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&Document {
            header,
            activity_records: records,
        })
    }
}

/// Notification that a message is waiting for an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: ActorNumber,
    pub message_type: String,
    pub category: MessageCategory,
}

/// Delivers notifications to an external bus.
pub trait TransportSender {
    type Error: fmt::Display;

    fn send(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), Self::Error>;
}

/// Error raised by the in-process senders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderError {
    Poisoned(&'static str),
    Encode(String),
}

impl fmt::Display for SenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderError::Poisoned(what) => write!(f, "transport sender {} poisoned", what),
            SenderError::Encode(message) => {
                write!(f, "notification encoding failed: {}", message)
            }
        }
    }
}

impl std::error::Error for SenderError {}

/// Sender that writes notifications to stdout or a captured buffer.
pub struct LogSender {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl Default for LogSender {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSender {
    pub fn new() -> Self {
        LogSender { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogSender {
            buffer: Some(buffer),
        }
    }
}

impl TransportSender for LogSender {
    type Error = SenderError;

    fn send(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), Self::Error> {
        let line = format!(
            "[NOTIFY] {} {} {} {}",
            correlation_id, notification.recipient, notification.category, notification.message_type
        );
        if let Some(buffer) = &self.buffer {
            let mut buffer = buffer
                .lock()
                .map_err(|_| SenderError::Poisoned("buffer"))?;
            buffer.push(line);
        } else {
            println!("{}", line);
        }
        Ok(())
    }
}

/// Sender that fans notifications out to in-process subscribers via an
/// `EventEmitter`, keyed by message type.
#[cfg(feature = "emitter")]
pub struct EmitterSender {
    emitter: Mutex<crate::EventEmitter>,
}

#[cfg(feature = "emitter")]
impl EmitterSender {
    pub fn new(emitter: crate::EventEmitter) -> Self {
        EmitterSender {
            emitter: Mutex::new(emitter),
        }
    }
}

#[cfg(feature = "emitter")]
impl TransportSender for EmitterSender {
    type Error = SenderError;

    fn send(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), Self::Error> {
        let body = serde_json::to_string(&serde_json::json!({
            "correlation_id": correlation_id,
            "notification": notification,
        }))
        .map_err(|e| SenderError::Encode(e.to_string()))?;

        let mut emitter = self
            .emitter
            .lock()
            .map_err(|_| SenderError::Poisoned("emitter"))?;
        emitter.emit(&notification.message_type, body);
        Ok(())
    }
}
