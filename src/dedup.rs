use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Namespace of a deduplication claim.
///
/// Message ids and transaction ids live in disjoint registries: claiming a
/// value as a message id never blocks the same value as a transaction id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DedupScope {
    MessageId,
    TransactionId,
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupScope::MessageId => write!(f, "message-id"),
            DedupScope::TransactionId => write!(f, "transaction-id"),
        }
    }
}

/// Persisted claim-once registry.
///
/// `try_claim` is an atomic insert-if-absent: for any (scope, key) pair, at
/// most one caller ever observes `true`, including under concurrent callers.
/// Implementations must perform the insert as a single storage operation, not
/// as an existence check followed by an insert. Claims are never deleted; the
/// registry is append-only audit state.
pub trait DedupStore {
    /// Attempt to claim `key` within `scope`.
    ///
    /// Returns `true` if this call performed the insert (first claim) and
    /// `false` if the key was already present. A `false` result is a terminal
    /// duplicate, not a transient failure.
    fn try_claim(&self, scope: DedupScope, key: &str) -> Result<bool, StoreError>;
}
