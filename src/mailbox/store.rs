use crate::actor::ActorNumber;
use crate::error::StoreError;
use crate::mailbox::message::{EnqueuedMessage, MessageCategory, RoutingKey};

/// Read side of the outgoing message store.
///
/// Messages enter the store through a unit of work (see `UnitOfWork`) and
/// leave it through the mailbox's dequeue; these queries drive bundle
/// selection in between.
pub trait MessageStore {
    /// Number of not-yet-dequeued messages addressed to `actor`, across all
    /// categories.
    fn count_pending(&self, actor: &ActorNumber) -> Result<usize, StoreError>;

    /// The routing key of the earliest-created pending message for
    /// (actor, category).
    ///
    /// This is the bundling tie-break: whichever homogeneous group contains
    /// the oldest message wins priority, even when newer groups are also
    /// eligible. Without it, a steady stream of newer process types could
    /// starve older pending work indefinitely.
    fn find_oldest_pending(
        &self,
        actor: &ActorNumber,
        category: MessageCategory,
    ) -> Result<Option<RoutingKey>, StoreError>;

    /// Up to `max` pending messages for (actor, category) matching exactly
    /// `key`, oldest first.
    fn select_bundle(
        &self,
        actor: &ActorNumber,
        category: MessageCategory,
        key: &RoutingKey,
        max: usize,
    ) -> Result<Vec<EnqueuedMessage>, StoreError>;
}
