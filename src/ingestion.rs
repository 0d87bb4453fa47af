use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorNumber, CorrelationId, MarketRole};
use crate::contracts::SchemaValidator;
use crate::dedup::{DedupScope, DedupStore};
use crate::error::StoreError;
use crate::outbox::InternalCommand;
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

/// A market transaction as submitted by an actor.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketTransaction {
    pub message_id: String,
    pub transaction_id: String,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub process_type: String,
    pub payload: Vec<u8>,
}

/// Persisted record of a successfully ingested transaction.
///
/// Follow-up commands resolve routing through this record; if it is gone by
/// the time a command runs, that command fails with unresolvable routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptedTransaction {
    pub message_id: String,
    pub transaction_id: String,
    pub sender: ActorNumber,
    pub sender_role: MarketRole,
    pub receiver: ActorNumber,
    pub receiver_role: MarketRole,
    pub process_type: String,
    pub accepted_at: SystemTime,
}

/// Rejection returned synchronously to a submitting actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// The payload failed structural validation.
    Invalid(Vec<String>),
    /// The message id was already claimed by an earlier submission.
    DuplicateMessageId(String),
    /// The transaction id was already claimed by an earlier submission.
    DuplicateTransactionId(String),
    /// The follow-up command could not be encoded.
    Codec(String),
    Store(StoreError),
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionError::Invalid(errors) => {
                write!(f, "payload failed validation: {}", errors.join("; "))
            }
            IngestionError::DuplicateMessageId(id) => {
                write!(f, "message id {} was already submitted", id)
            }
            IngestionError::DuplicateTransactionId(id) => {
                write!(f, "transaction id {} was already submitted", id)
            }
            IngestionError::Codec(message) => {
                write!(f, "follow-up command encoding failed: {}", message)
            }
            IngestionError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IngestionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestionError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for IngestionError {
    fn from(err: StoreError) -> Self {
        IngestionError::Store(err)
    }
}

/// Ingestion endpoint of the exchange.
///
/// Validates, claims both dedup namespaces, and commits the accepted record
/// together with its confirmation command in one unit of work. Duplicates
/// are terminal rejections: no state change, no outgoing work.
pub struct IngestionService<S, V> {
    store: Arc<S>,
    validator: V,
}

impl<S, V> IngestionService<S, V>
where
    S: DedupStore + TransactionalStore,
    V: SchemaValidator,
{
    pub fn new(store: Arc<S>, validator: V) -> Self {
        IngestionService { store, validator }
    }

    pub fn submit(
        &self,
        transaction: MarketTransaction,
        correlation_id: &CorrelationId,
    ) -> Result<(), IngestionError> {
        self.validator
            .validate(&transaction.payload)
            .map_err(IngestionError::Invalid)?;

        if !self
            .store
            .try_claim(DedupScope::MessageId, &transaction.message_id)?
        {
            tracing::info!(
                message_id = %transaction.message_id,
                correlation_id = %correlation_id,
                "rejected duplicate message id"
            );
            return Err(IngestionError::DuplicateMessageId(transaction.message_id));
        }

        if !self
            .store
            .try_claim(DedupScope::TransactionId, &transaction.transaction_id)?
        {
            tracing::info!(
                transaction_id = %transaction.transaction_id,
                correlation_id = %correlation_id,
                "rejected duplicate transaction id"
            );
            return Err(IngestionError::DuplicateTransactionId(
                transaction.transaction_id,
            ));
        }

        let accepted = AcceptedTransaction {
            message_id: transaction.message_id,
            transaction_id: transaction.transaction_id,
            sender: transaction.sender,
            sender_role: transaction.sender_role,
            receiver: transaction.receiver,
            receiver_role: transaction.receiver_role,
            process_type: transaction.process_type,
            accepted_at: SystemTime::now(),
        };

        let mut uow = UnitOfWork::new();
        uow.schedule(&InternalCommand::CreateConfirmationMessage {
            transaction_id: accepted.transaction_id.clone(),
            correlation_id: correlation_id.clone(),
        })
        .map_err(|e| IngestionError::Codec(e.to_string()))?;
        uow.record_transaction(accepted);
        uow.commit(self.store.as_ref())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::AcceptAllValidator;
    use crate::store::{CommandStore, InMemoryMarketStore};

    fn transaction(message_id: &str, transaction_id: &str) -> MarketTransaction {
        MarketTransaction {
            message_id: message_id.to_string(),
            transaction_id: transaction_id.to_string(),
            sender: ActorNumber::new("5790000000001"),
            sender_role: MarketRole::EnergySupplier,
            receiver: ActorNumber::new("5790000000002"),
            receiver_role: MarketRole::MarketOperator,
            process_type: "E65".to_string(),
            payload: b"<transaction/>".to_vec(),
        }
    }

    struct RejectingValidator;

    impl SchemaValidator for RejectingValidator {
        fn validate(&self, _raw: &[u8]) -> Result<(), Vec<String>> {
            Err(vec!["missing element 'process'".to_string()])
        }
    }

    #[test]
    fn accepted_transaction_schedules_confirmation() {
        let store = Arc::new(InMemoryMarketStore::new());
        let service = IngestionService::new(Arc::clone(&store), AcceptAllValidator);

        service
            .submit(transaction("M1", "T1"), &CorrelationId::new("corr-1"))
            .unwrap();

        let pending = store.pending_commands().unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn duplicate_message_id_is_rejected_without_new_work() {
        let store = Arc::new(InMemoryMarketStore::new());
        let service = IngestionService::new(Arc::clone(&store), AcceptAllValidator);

        service
            .submit(transaction("M1", "T1"), &CorrelationId::new("corr-1"))
            .unwrap();
        let result = service.submit(transaction("M1", "T2"), &CorrelationId::new("corr-2"));

        assert_eq!(
            result,
            Err(IngestionError::DuplicateMessageId("M1".to_string()))
        );
        assert_eq!(store.pending_commands().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_transaction_id_is_rejected() {
        let store = Arc::new(InMemoryMarketStore::new());
        let service = IngestionService::new(Arc::clone(&store), AcceptAllValidator);

        service
            .submit(transaction("M1", "T1"), &CorrelationId::new("corr-1"))
            .unwrap();
        let result = service.submit(transaction("M2", "T1"), &CorrelationId::new("corr-2"));

        assert_eq!(
            result,
            Err(IngestionError::DuplicateTransactionId("T1".to_string()))
        );
    }

    #[test]
    fn invalid_payload_is_rejected_before_any_claim() {
        let store = Arc::new(InMemoryMarketStore::new());
        let service = IngestionService::new(Arc::clone(&store), RejectingValidator);

        let result = service.submit(transaction("M1", "T1"), &CorrelationId::new("corr-1"));
        assert!(matches!(result, Err(IngestionError::Invalid(_))));

        // The ids were not consumed by the failed attempt.
        let retry = IngestionService::new(Arc::clone(&store), AcceptAllValidator)
            .submit(transaction("M1", "T1"), &CorrelationId::new("corr-2"));
        assert!(retry.is_ok());
    }
}
