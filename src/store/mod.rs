//! Storage contracts shared by every component of the delivery core.
//!
//! All mutation goes through the closed [`StoreOp`] set and
//! [`TransactionalStore::apply`]; the only mutation outside it is the dedup
//! claim, which must be atomic on its own (see `DedupStore`).

mod in_memory;

pub use in_memory::InMemoryMarketStore;

use crate::error::StoreError;
use crate::ingestion::AcceptedTransaction;
use crate::mailbox::OutgoingMessage;
use crate::outbox::{CommandKind, QueuedCommandRecord};

/// One mutation of the persisted store.
///
/// Ops are staged in a `UnitOfWork` and applied as an atomic batch, which is
/// what gives ingestion and outbox processing their commit-together
/// semantics.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreOp {
    /// Record a successfully ingested transaction.
    RecordTransaction(AcceptedTransaction),
    /// Append an outgoing message; the store assigns its id and timestamp.
    Enqueue(OutgoingMessage),
    /// Append a queued internal command; the store assigns its id and
    /// timestamp.
    Schedule {
        kind: CommandKind,
        payload: Vec<u8>,
    },
    /// Stamp a command processed, with the error text on failure.
    MarkProcessed {
        command_id: u64,
        error: Option<String>,
    },
    /// Remove dequeued messages. Unknown ids are skipped.
    RemoveMessages(Vec<u64>),
}

/// Atomic batch application: every op in the batch lands, or none do.
pub trait TransactionalStore {
    fn apply(&self, ops: Vec<StoreOp>) -> Result<(), StoreError>;
}

/// Read side of the internal command outbox.
pub trait CommandStore {
    /// All commands with no processed timestamp, oldest first.
    fn pending_commands(&self) -> Result<Vec<QueuedCommandRecord>, StoreError>;

    /// A single command record by id.
    fn command(&self, id: u64) -> Result<Option<QueuedCommandRecord>, StoreError>;
}

/// Read side of the accepted-transaction record.
pub trait TransactionStore {
    fn accepted_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<AcceptedTransaction>, StoreError>;
}
