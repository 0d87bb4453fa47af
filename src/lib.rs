//! Reliable delivery core for a B2B market-message exchange.
//!
//! Market participants submit structured transactions and later retrieve the
//! messages produced for them. Three pieces carry the guarantees:
//!
//! - **Deduplication registry**: atomic claim-once sets for message and
//!   transaction ids, so a resubmitted transaction is rejected instead of
//!   applied twice.
//! - **Mailbox**: an append-only store of produced messages per actor, read
//!   through a peek/dequeue protocol that delivers homogeneous bundles —
//!   peek never consumes, dequeue is idempotent.
//! - **Command outbox**: follow-up work is persisted in the same unit of
//!   work as the state change that produced it and drained asynchronously,
//!   with the outcome recorded durably.
//!
//! Everything else — schema validation, document rendering, transport — is a
//! collaborator behind a narrow trait in [`contracts`], with in-process
//! implementations for local use.
//!
//! ```
//! use std::sync::Arc;
//! use markethub::*;
//!
//! let store = Arc::new(InMemoryMarketStore::new());
//!
//! let ingestion = IngestionService::new(Arc::clone(&store), AcceptAllValidator);
//! ingestion.submit(
//!     MarketTransaction {
//!         message_id: "M1".to_string(),
//!         transaction_id: "T1".to_string(),
//!         sender: ActorNumber::new("5790000000001"),
//!         sender_role: MarketRole::EnergySupplier,
//!         receiver: ActorNumber::new("5790000000002"),
//!         receiver_role: MarketRole::MarketOperator,
//!         process_type: "E65".to_string(),
//!         payload: b"<transaction/>".to_vec(),
//!     },
//!     &CorrelationId::new("corr-1"),
//! ).unwrap();
//!
//! let mut dispatcher = CommandDispatcher::new();
//! dispatcher.register(
//!     CommandKind::CreateConfirmationMessage,
//!     Box::new(ConfirmationMessageHandler::new(Arc::clone(&store), JsonRenderer)),
//! ).unwrap();
//! dispatcher.register(
//!     CommandKind::DispatchNotification,
//!     Box::new(NotificationHandler::new(LogSender::new())),
//! ).unwrap();
//!
//! let processor = OutboxProcessor::new(Arc::clone(&store), dispatcher);
//! processor.process_pending().unwrap();
//!
//! let mailbox = Mailbox::new(Arc::clone(&store));
//! let bundle = mailbox
//!     .peek(&ActorNumber::new("5790000000001"), MessageCategory::MasterData)
//!     .unwrap()
//!     .expect("confirmation is waiting");
//! mailbox.dequeue(&bundle.message_ids()).unwrap();
//! ```

mod actor;
mod contracts;
mod dedup;
mod error;
mod ingestion;
mod mailbox;
mod outbox;
mod store;
mod uow;

pub use actor::{ActorNumber, CorrelationId, MarketRole};
pub use contracts::{
    AcceptAllValidator, ActivityRecord, DocumentHeader, DocumentRenderer, JsonRenderer, LogSender,
    Notification, SchemaValidator, SenderError, TransportSender,
};
pub use dedup::{DedupScope, DedupStore};
pub use error::StoreError;
pub use ingestion::{AcceptedTransaction, IngestionError, IngestionService, MarketTransaction};
pub use mailbox::{
    Bundle, BundleError, EnqueuedMessage, Mailbox, MailboxError, MessageCategory, MessageStore,
    OutgoingMessage, RoutingKey, DEFAULT_MAX_BUNDLE_SIZE,
};
pub use outbox::{
    CommandDispatcher, CommandError, CommandHandler, CommandKind, ConfirmationMessageHandler,
    InternalCommand, NotificationHandler, OutboxProcessor, ProcessResult, QueuedCommandRecord,
    CONFIRMATION_MESSAGE_TYPE,
};
pub use store::{
    CommandStore, InMemoryMarketStore, StoreOp, TransactionStore, TransactionalStore,
};
pub use uow::UnitOfWork;

#[cfg(feature = "emitter")]
pub use contracts::EmitterSender;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
