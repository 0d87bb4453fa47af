use std::collections::HashMap;
use std::fmt;

use crate::error::StoreError;
use crate::outbox::command::{CommandKind, InternalCommand};
use crate::uow::UnitOfWork;

/// Failure of a single command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No handler registered for the command's kind.
    Unregistered(CommandKind),
    /// A handler was registered twice for the same kind.
    DuplicateHandler(CommandKind),
    /// The persisted payload could not be decoded, or a handler received a
    /// variant it was not registered for.
    Codec(String),
    /// The command references an ingestion record that no longer exists.
    UnresolvableRouting { transaction_id: String },
    /// The document renderer rejected the payload.
    Render(String),
    /// The transport sender failed to deliver the notification.
    Send(String),
    Store(StoreError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unregistered(kind) => {
                write!(f, "no handler registered for command {}", kind)
            }
            CommandError::DuplicateHandler(kind) => {
                write!(f, "handler already registered for command {}", kind)
            }
            CommandError::Codec(message) => write!(f, "command codec error: {}", message),
            CommandError::UnresolvableRouting { transaction_id } => write!(
                f,
                "transaction {} not found while resolving routing",
                transaction_id
            ),
            CommandError::Render(message) => write!(f, "document rendering failed: {}", message),
            CommandError::Send(message) => write!(f, "notification send failed: {}", message),
            CommandError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Store(err)
    }
}

/// Executes one command, staging every effect into the given unit of work.
///
/// Handlers never commit; the processor commits the staged effects together
/// with the command's processed mark.
pub trait CommandHandler {
    fn handle(&self, command: &InternalCommand, uow: &mut UnitOfWork) -> Result<(), CommandError>;
}

/// Closed dispatch table from command kind to handler.
///
/// Handlers are registered exhaustively at startup; dispatching a kind
/// nobody registered fails with [`CommandError::Unregistered`].
#[derive(Default)]
pub struct CommandDispatcher {
    handlers: HashMap<CommandKind, Box<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        CommandDispatcher {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        kind: CommandKind,
        handler: Box<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        if self.handlers.contains_key(&kind) {
            return Err(CommandError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    pub fn registered_kinds(&self) -> Vec<CommandKind> {
        self.handlers.keys().copied().collect()
    }

    pub fn dispatch(
        &self,
        command: &InternalCommand,
        uow: &mut UnitOfWork,
    ) -> Result<(), CommandError> {
        match self.handlers.get(&command.kind()) {
            Some(handler) => handler.handle(command, uow),
            None => Err(CommandError::Unregistered(command.kind())),
        }
    }
}
