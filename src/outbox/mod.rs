//! Transactional internal-command outbox.
//!
//! Deferred work is written as a [`QueuedCommandRecord`] in the same unit of
//! work as the state change that produced it; the [`OutboxProcessor`] drains
//! pending records in a separate cycle and records the outcome durably.

mod command;
mod dispatch;
mod handlers;
mod processor;

pub use command::{CommandKind, InternalCommand, QueuedCommandRecord};
pub use dispatch::{CommandDispatcher, CommandError, CommandHandler};
pub use handlers::{
    ConfirmationMessageHandler, NotificationHandler, CONFIRMATION_MESSAGE_TYPE,
};
pub use processor::{OutboxProcessor, ProcessResult};
