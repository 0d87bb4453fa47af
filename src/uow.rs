use crate::error::StoreError;
use crate::ingestion::AcceptedTransaction;
use crate::mailbox::OutgoingMessage;
use crate::outbox::InternalCommand;
use crate::store::{StoreOp, TransactionalStore};

/// Explicit transaction boundary over the store.
///
/// Operations are staged in order and land in a single atomic `apply` on
/// commit. Dropping an uncommitted unit of work discards everything, so a
/// scheduled command only ever exists if the domain change that produced it
/// committed too.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    ops: Vec<StoreOp>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        UnitOfWork { ops: Vec::new() }
    }

    /// Stage an accepted-transaction record.
    pub fn record_transaction(&mut self, transaction: AcceptedTransaction) {
        self.ops.push(StoreOp::RecordTransaction(transaction));
    }

    /// Stage an outgoing message for the mailbox.
    pub fn enqueue_message(&mut self, message: OutgoingMessage) {
        self.ops.push(StoreOp::Enqueue(message));
    }

    /// Stage a deferred command for the outbox.
    ///
    /// The command is encoded eagerly so a malformed command fails here, in
    /// the producer's call, rather than at drain time.
    pub fn schedule(&mut self, command: &InternalCommand) -> Result<(), bitcode::Error> {
        let payload = command.encode()?;
        self.ops.push(StoreOp::Schedule {
            kind: command.kind(),
            payload,
        });
        Ok(())
    }

    /// Stage the processed mark for a drained command.
    pub fn mark_processed(&mut self, command_id: u64, error: Option<String>) {
        self.ops.push(StoreOp::MarkProcessed { command_id, error });
    }

    /// Stage removal of dequeued messages.
    pub fn remove_messages(&mut self, message_ids: &[u64]) {
        self.ops.push(StoreOp::RemoveMessages(message_ids.to_vec()));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every staged operation as one atomic batch.
    pub fn commit(self, store: &impl TransactionalStore) -> Result<(), StoreError> {
        store.apply(self.ops)
    }
}
