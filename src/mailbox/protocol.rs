use std::fmt;
use std::sync::Arc;

use crate::actor::ActorNumber;
use crate::error::StoreError;
use crate::mailbox::bundle::{Bundle, BundleError};
use crate::mailbox::message::MessageCategory;
use crate::mailbox::store::MessageStore;
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

/// Default cap on the number of messages delivered in one bundle.
pub const DEFAULT_MAX_BUNDLE_SIZE: usize = 1000;

/// Error returned by the mailbox protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    Store(StoreError),
    /// The selector produced a non-homogeneous set. This indicates a
    /// selection fault, not bad client input.
    Mismatch(BundleError),
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxError::Store(err) => write!(f, "{}", err),
            MailboxError::Mismatch(err) => write!(f, "bundle selection fault: {}", err),
        }
    }
}

impl std::error::Error for MailboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MailboxError::Store(err) => Some(err),
            MailboxError::Mismatch(err) => Some(err),
        }
    }
}

impl From<StoreError> for MailboxError {
    fn from(err: StoreError) -> Self {
        MailboxError::Store(err)
    }
}

impl From<BundleError> for MailboxError {
    fn from(err: BundleError) -> Self {
        MailboxError::Mismatch(err)
    }
}

/// Peek/dequeue retrieval protocol over the outgoing message store.
///
/// Peek is a pure read: it selects the current bundle for an (actor,
/// category) pair without consuming anything, so a client that retries a
/// peek after a lost response sees the identical member set. Dequeue removes
/// the peeked members by id and is idempotent, so a retried dequeue after a
/// timeout is always safe.
pub struct Mailbox<S> {
    store: Arc<S>,
    max_bundle_size: usize,
}

impl<S> Mailbox<S> {
    pub fn new(store: Arc<S>) -> Self {
        Mailbox {
            store,
            max_bundle_size: DEFAULT_MAX_BUNDLE_SIZE,
        }
    }

    /// Set the maximum number of messages returned in one bundle.
    pub fn with_max_bundle_size(mut self, max: usize) -> Self {
        self.max_bundle_size = max;
        self
    }
}

impl<S: MessageStore + TransactionalStore> Mailbox<S> {
    /// Return the next bundle for (actor, category), or `None` when the
    /// mailbox is empty. Does not consume anything.
    pub fn peek(
        &self,
        actor: &ActorNumber,
        category: MessageCategory,
    ) -> Result<Option<Bundle>, MailboxError> {
        let Some(key) = self.store.find_oldest_pending(actor, category)? else {
            return Ok(None);
        };

        let messages = self
            .store
            .select_bundle(actor, category, &key, self.max_bundle_size)?;

        // The selector filtered on the full routing key already; validation
        // is a defensive re-check, not the enforcement point.
        let bundle = Bundle::validate(messages)?;
        tracing::debug!(
            actor = %actor,
            category = %category,
            process_type = %key.process_type,
            members = bundle.len(),
            "peeked bundle"
        );

        Ok(Some(bundle))
    }

    /// Permanently remove the given messages from the store.
    ///
    /// Ids that no longer exist are skipped, so dequeuing an
    /// already-consumed bundle succeeds as a no-op.
    pub fn dequeue(&self, message_ids: &[u64]) -> Result<(), MailboxError> {
        let mut uow = UnitOfWork::new();
        uow.remove_messages(message_ids);
        uow.commit(self.store.as_ref())?;

        tracing::info!(messages = message_ids.len(), "dequeued bundle");
        Ok(())
    }

    /// Number of pending messages addressed to `actor`.
    pub fn pending_count(&self, actor: &ActorNumber) -> Result<usize, MailboxError> {
        Ok(self.store.count_pending(actor)?)
    }
}
