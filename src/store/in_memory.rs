use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use crate::actor::ActorNumber;
use crate::dedup::{DedupScope, DedupStore};
use crate::error::StoreError;
use crate::ingestion::AcceptedTransaction;
use crate::mailbox::{EnqueuedMessage, MessageCategory, MessageStore, RoutingKey};
use crate::outbox::QueuedCommandRecord;
use crate::store::{CommandStore, StoreOp, TransactionStore, TransactionalStore};

/// Everything the delivery core persists, in one place.
///
/// Messages and commands keep insertion order, so id order is creation
/// order.
struct StoreState {
    message_ids: HashSet<String>,
    transaction_ids: HashSet<String>,
    transactions: Vec<AcceptedTransaction>,
    messages: Vec<EnqueuedMessage>,
    commands: Vec<QueuedCommandRecord>,
    next_message_id: u64,
    next_command_id: u64,
}

impl StoreState {
    fn new() -> Self {
        StoreState {
            message_ids: HashSet::new(),
            transaction_ids: HashSet::new(),
            transactions: Vec::new(),
            messages: Vec::new(),
            commands: Vec::new(),
            next_message_id: 1,
            next_command_id: 1,
        }
    }
}

/// In-process backing store for the whole delivery core.
///
/// A single mutex guards all tables. That one lock is what makes `apply` an
/// all-or-nothing batch and `try_claim` a genuine first-writer-wins insert
/// rather than a check-then-insert race.
pub struct InMemoryMarketStore {
    state: Mutex<StoreState>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        InMemoryMarketStore {
            state: Mutex::new(StoreState::new()),
        }
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    /// Every command record ever scheduled, including processed ones.
    /// Records are audit state and are never deleted.
    pub fn command_history(&self) -> Result<Vec<QueuedCommandRecord>, StoreError> {
        let state = self.lock("command history")?;
        Ok(state.commands.clone())
    }
}

impl Default for InMemoryMarketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupStore for InMemoryMarketStore {
    fn try_claim(&self, scope: DedupScope, key: &str) -> Result<bool, StoreError> {
        let mut state = self.lock("claim")?;
        let claimed = match scope {
            DedupScope::MessageId => state.message_ids.insert(key.to_string()),
            DedupScope::TransactionId => state.transaction_ids.insert(key.to_string()),
        };
        Ok(claimed)
    }
}

impl MessageStore for InMemoryMarketStore {
    fn count_pending(&self, actor: &ActorNumber) -> Result<usize, StoreError> {
        let state = self.lock("count pending")?;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.receiver == *actor)
            .count())
    }

    fn find_oldest_pending(
        &self,
        actor: &ActorNumber,
        category: MessageCategory,
    ) -> Result<Option<RoutingKey>, StoreError> {
        let state = self.lock("find oldest pending")?;
        // The vec is id-ordered, so the first match is the oldest.
        Ok(state
            .messages
            .iter()
            .find(|m| m.receiver == *actor && m.category == category)
            .map(EnqueuedMessage::routing_key))
    }

    fn select_bundle(
        &self,
        actor: &ActorNumber,
        category: MessageCategory,
        key: &RoutingKey,
        max: usize,
    ) -> Result<Vec<EnqueuedMessage>, StoreError> {
        let state = self.lock("select bundle")?;
        Ok(state
            .messages
            .iter()
            .filter(|m| {
                m.receiver == *actor && m.category == category && m.routing_key() == *key
            })
            .take(max)
            .cloned()
            .collect())
    }
}

impl CommandStore for InMemoryMarketStore {
    fn pending_commands(&self) -> Result<Vec<QueuedCommandRecord>, StoreError> {
        let state = self.lock("pending commands")?;
        Ok(state
            .commands
            .iter()
            .filter(|c| c.is_pending())
            .cloned()
            .collect())
    }

    fn command(&self, id: u64) -> Result<Option<QueuedCommandRecord>, StoreError> {
        let state = self.lock("load command")?;
        Ok(state.commands.iter().find(|c| c.id == id).cloned())
    }
}

impl TransactionStore for InMemoryMarketStore {
    fn accepted_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<AcceptedTransaction>, StoreError> {
        let state = self.lock("load transaction")?;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }
}

impl TransactionalStore for InMemoryMarketStore {
    fn apply(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        let mut state = self.lock("apply")?;
        let now = SystemTime::now();

        for op in ops {
            match op {
                StoreOp::RecordTransaction(transaction) => {
                    state.transactions.push(transaction);
                }
                StoreOp::Enqueue(message) => {
                    let id = state.next_message_id;
                    state.next_message_id += 1;
                    state
                        .messages
                        .push(EnqueuedMessage::from_outgoing(id, now, message));
                }
                StoreOp::Schedule { kind, payload } => {
                    let id = state.next_command_id;
                    state.next_command_id += 1;
                    state.commands.push(QueuedCommandRecord {
                        id,
                        kind,
                        payload,
                        created_at: now,
                        processed_at: None,
                        error: None,
                    });
                }
                StoreOp::MarkProcessed { command_id, error } => {
                    if let Some(record) =
                        state.commands.iter_mut().find(|c| c.id == command_id)
                    {
                        record.processed_at = Some(now);
                        record.error = error;
                    }
                }
                StoreOp::RemoveMessages(ids) => {
                    state.messages.retain(|m| !ids.contains(&m.id));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::actor::MarketRole;
    use crate::mailbox::OutgoingMessage;
    use crate::outbox::CommandKind;

    fn actor() -> ActorNumber {
        ActorNumber::new("5790000000001")
    }

    fn outgoing(receiver: ActorNumber, process_type: &str) -> OutgoingMessage {
        OutgoingMessage {
            receiver,
            receiver_role: MarketRole::EnergySupplier,
            sender: ActorNumber::new("5790000000002"),
            sender_role: MarketRole::MarketOperator,
            process_type: process_type.to_string(),
            message_type: "Confirmation".to_string(),
            category: MessageCategory::MasterData,
            payload: b"<doc/>".to_vec(),
        }
    }

    #[test]
    fn first_claim_wins_second_loses() {
        let store = InMemoryMarketStore::new();

        assert!(store.try_claim(DedupScope::MessageId, "M1").unwrap());
        assert!(!store.try_claim(DedupScope::MessageId, "M1").unwrap());
    }

    #[test]
    fn scopes_do_not_collide() {
        let store = InMemoryMarketStore::new();

        assert!(store.try_claim(DedupScope::MessageId, "X").unwrap());
        assert!(store.try_claim(DedupScope::TransactionId, "X").unwrap());
    }

    #[test]
    fn concurrent_claims_yield_exactly_one_winner() {
        let store = Arc::new(InMemoryMarketStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.try_claim(DedupScope::TransactionId, "T1").unwrap())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn enqueue_assigns_monotonic_ids() {
        let store = InMemoryMarketStore::new();
        store
            .apply(vec![
                StoreOp::Enqueue(outgoing(actor(), "E65")),
                StoreOp::Enqueue(outgoing(actor(), "E65")),
            ])
            .unwrap();

        let key = store
            .find_oldest_pending(&actor(), MessageCategory::MasterData)
            .unwrap()
            .unwrap();
        let bundle = store
            .select_bundle(&actor(), MessageCategory::MasterData, &key, 10)
            .unwrap();

        assert_eq!(bundle.len(), 2);
        assert!(bundle[0].id < bundle[1].id);
    }

    #[test]
    fn oldest_pending_group_wins_priority() {
        let store = InMemoryMarketStore::new();
        // The E66 message is older than both E65 messages, so its group
        // takes priority even though the E65 group has more members.
        store
            .apply(vec![
                StoreOp::Enqueue(outgoing(actor(), "E66")),
                StoreOp::Enqueue(outgoing(actor(), "E65")),
                StoreOp::Enqueue(outgoing(actor(), "E65")),
            ])
            .unwrap();

        let key = store
            .find_oldest_pending(&actor(), MessageCategory::MasterData)
            .unwrap()
            .unwrap();
        assert_eq!(key.process_type, "E66");
    }

    #[test]
    fn select_bundle_excludes_other_routing_keys() {
        let store = InMemoryMarketStore::new();
        store
            .apply(vec![
                StoreOp::Enqueue(outgoing(actor(), "E65")),
                StoreOp::Enqueue(outgoing(actor(), "E66")),
                StoreOp::Enqueue(outgoing(actor(), "E65")),
            ])
            .unwrap();

        let key = store
            .find_oldest_pending(&actor(), MessageCategory::MasterData)
            .unwrap()
            .unwrap();
        let bundle = store
            .select_bundle(&actor(), MessageCategory::MasterData, &key, 10)
            .unwrap();

        assert_eq!(bundle.len(), 2);
        assert!(bundle.iter().all(|m| m.process_type == "E65"));
    }

    #[test]
    fn count_pending_is_per_actor() {
        let store = InMemoryMarketStore::new();
        let other = ActorNumber::new("5790000000009");
        store
            .apply(vec![
                StoreOp::Enqueue(outgoing(actor(), "E65")),
                StoreOp::Enqueue(outgoing(other.clone(), "E65")),
            ])
            .unwrap();

        assert_eq!(store.count_pending(&actor()).unwrap(), 1);
        assert_eq!(store.count_pending(&other).unwrap(), 1);
    }

    #[test]
    fn remove_skips_unknown_ids() {
        let store = InMemoryMarketStore::new();
        store
            .apply(vec![StoreOp::Enqueue(outgoing(actor(), "E65"))])
            .unwrap();

        store
            .apply(vec![StoreOp::RemoveMessages(vec![1, 99])])
            .unwrap();
        store
            .apply(vec![StoreOp::RemoveMessages(vec![1, 99])])
            .unwrap();

        assert_eq!(store.count_pending(&actor()).unwrap(), 0);
    }

    #[test]
    fn mark_processed_stamps_time_and_error() {
        let store = InMemoryMarketStore::new();
        store
            .apply(vec![StoreOp::Schedule {
                kind: CommandKind::DispatchNotification,
                payload: Vec::new(),
            }])
            .unwrap();

        store
            .apply(vec![StoreOp::MarkProcessed {
                command_id: 1,
                error: Some("downstream unavailable".to_string()),
            }])
            .unwrap();

        let record = store.command(1).unwrap().unwrap();
        assert!(record.processed_at.is_some());
        assert_eq!(record.error.as_deref(), Some("downstream unavailable"));
        assert!(store.pending_commands().unwrap().is_empty());
    }

    #[test]
    fn apply_commits_the_whole_batch_together() {
        let store = InMemoryMarketStore::new();
        store
            .apply(vec![
                StoreOp::Enqueue(outgoing(actor(), "E65")),
                StoreOp::Schedule {
                    kind: CommandKind::DispatchNotification,
                    payload: Vec::new(),
                },
            ])
            .unwrap();

        assert_eq!(store.count_pending(&actor()).unwrap(), 1);
        assert_eq!(store.pending_commands().unwrap().len(), 1);
    }
}
