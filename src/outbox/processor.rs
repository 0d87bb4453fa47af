use std::sync::Arc;

use crate::error::StoreError;
use crate::outbox::command::{InternalCommand, QueuedCommandRecord};
use crate::outbox::dispatch::{CommandDispatcher, CommandError};
use crate::store::{CommandStore, TransactionalStore};
use crate::uow::UnitOfWork;

/// Result of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub processed: usize,
    pub failed: usize,
}

impl ProcessResult {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}

/// Drains the internal command outbox.
///
/// Runs in its own execution cycle, typically on a timer, and coordinates
/// with producers only through the store. Each command executes inside a
/// fresh unit of work, and the handler's staged effects commit together with
/// the command's processed mark, so after a crash a re-scan finds every
/// command either fully applied and marked, or untouched and still pending.
///
/// A failing handler does not fail the drain: its error text is recorded on
/// the command, the command is marked processed anyway, and the cycle moves
/// on. Failed commands are terminal and never retried; revisit this policy
/// before relying on it for work that must survive transient downstream
/// outages.
pub struct OutboxProcessor<S> {
    store: Arc<S>,
    dispatcher: CommandDispatcher,
}

impl<S: CommandStore + TransactionalStore> OutboxProcessor<S> {
    pub fn new(store: Arc<S>, dispatcher: CommandDispatcher) -> Self {
        OutboxProcessor { store, dispatcher }
    }

    /// Execute every command that is pending at the start of the cycle.
    ///
    /// Commands scheduled by handlers during the cycle stay pending until
    /// the next one.
    pub fn process_pending(&self) -> Result<ProcessResult, StoreError> {
        let pending = self.store.pending_commands()?;
        let mut result = ProcessResult::default();

        for record in pending {
            if self.process_one(&record)? {
                result.processed += 1;
            } else {
                result.failed += 1;
            }
        }

        if result.total() > 0 {
            tracing::debug!(
                processed = result.processed,
                failed = result.failed,
                "drained command outbox"
            );
        }

        Ok(result)
    }

    /// Run a single command and commit exactly once.
    ///
    /// On success the staged effects and the processed mark ride the same
    /// commit. On failure the staged effects are discarded and only the
    /// mark, carrying the error text, is committed.
    fn process_one(&self, record: &QueuedCommandRecord) -> Result<bool, StoreError> {
        let mut uow = UnitOfWork::new();
        let outcome = InternalCommand::decode(&record.payload)
            .map_err(|e| CommandError::Codec(e.to_string()))
            .and_then(|command| self.dispatcher.dispatch(&command, &mut uow));

        match outcome {
            Ok(()) => {
                uow.mark_processed(record.id, None);
                uow.commit(self.store.as_ref())?;
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    command_id = record.id,
                    kind = %record.kind,
                    error = %err,
                    "command failed; marking processed with error"
                );
                let mut uow = UnitOfWork::new();
                uow.mark_processed(record.id, Some(err.to_string()));
                uow.commit(self.store.as_ref())?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorNumber, CorrelationId};
    use crate::mailbox::MessageCategory;
    use crate::outbox::command::CommandKind;
    use crate::outbox::dispatch::CommandHandler;
    use crate::store::InMemoryMarketStore;

    struct FailingHandler;

    impl CommandHandler for FailingHandler {
        fn handle(
            &self,
            _command: &InternalCommand,
            _uow: &mut UnitOfWork,
        ) -> Result<(), CommandError> {
            Err(CommandError::Send("downstream timed out".to_string()))
        }
    }

    struct SucceedingHandler;

    impl CommandHandler for SucceedingHandler {
        fn handle(
            &self,
            _command: &InternalCommand,
            _uow: &mut UnitOfWork,
        ) -> Result<(), CommandError> {
            Ok(())
        }
    }

    fn schedule(store: &InMemoryMarketStore) {
        let mut uow = UnitOfWork::new();
        uow.schedule(&InternalCommand::DispatchNotification {
            recipient: ActorNumber::new("5790000000001"),
            message_type: "Confirmation".to_string(),
            category: MessageCategory::MasterData,
            correlation_id: CorrelationId::new("corr-1"),
        })
        .unwrap();
        uow.commit(store).unwrap();
    }

    #[test]
    fn successful_command_is_marked_without_error() {
        let store = Arc::new(InMemoryMarketStore::new());
        schedule(&store);

        let mut dispatcher = CommandDispatcher::new();
        dispatcher
            .register(CommandKind::DispatchNotification, Box::new(SucceedingHandler))
            .unwrap();

        let processor = OutboxProcessor::new(Arc::clone(&store), dispatcher);
        let result = processor.process_pending().unwrap();

        assert_eq!(result, ProcessResult { processed: 1, failed: 0 });
        let record = store.command(1).unwrap().unwrap();
        assert!(record.processed_at.is_some());
        assert!(record.error.is_none());
    }

    #[test]
    fn failing_command_is_marked_with_error_and_nothing_escapes() {
        let store = Arc::new(InMemoryMarketStore::new());
        schedule(&store);

        let mut dispatcher = CommandDispatcher::new();
        dispatcher
            .register(CommandKind::DispatchNotification, Box::new(FailingHandler))
            .unwrap();

        let processor = OutboxProcessor::new(Arc::clone(&store), dispatcher);
        let result = processor.process_pending().unwrap();

        assert_eq!(result, ProcessResult { processed: 0, failed: 1 });
        let record = store.command(1).unwrap().unwrap();
        assert!(record.processed_at.is_some());
        assert!(record.error.as_deref().unwrap().contains("downstream timed out"));

        // Terminal: a second drain finds nothing pending.
        let again = processor.process_pending().unwrap();
        assert_eq!(again, ProcessResult::default());
    }

    #[test]
    fn unregistered_command_is_recorded_as_failure() {
        let store = Arc::new(InMemoryMarketStore::new());
        schedule(&store);

        let processor = OutboxProcessor::new(Arc::clone(&store), CommandDispatcher::new());
        let result = processor.process_pending().unwrap();

        assert_eq!(result, ProcessResult { processed: 0, failed: 1 });
        let record = store.command(1).unwrap().unwrap();
        assert!(record
            .error
            .as_deref()
            .unwrap()
            .contains("no handler registered"));
    }
}
