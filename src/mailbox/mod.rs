//! Outgoing message store and the peek/dequeue mailbox protocol.
//!
//! Every produced message is appended here, tagged with routing and
//! classification attributes. An actor retrieves messages one homogeneous
//! bundle at a time: peek returns the current bundle without consuming it,
//! dequeue removes it by member ids.

mod bundle;
pub(crate) mod message;
mod protocol;
mod store;

pub use bundle::{Bundle, BundleError};
pub use message::{EnqueuedMessage, MessageCategory, OutgoingMessage, RoutingKey};
pub use protocol::{Mailbox, MailboxError, DEFAULT_MAX_BUNDLE_SIZE};
pub use store::MessageStore;
