use std::sync::Arc;

use crate::contracts::{
    ActivityRecord, DocumentHeader, DocumentRenderer, Notification, TransportSender,
};
use crate::mailbox::{MessageCategory, OutgoingMessage};
use crate::outbox::command::InternalCommand;
use crate::outbox::dispatch::{CommandError, CommandHandler};
use crate::store::TransactionStore;
use crate::uow::UnitOfWork;

/// Message type of the confirmation document sent back to a submitter.
pub const CONFIRMATION_MESSAGE_TYPE: &str = "Confirmation";

/// Handles `CreateConfirmationMessage`: resolves the accepted transaction,
/// renders the confirmation document, stages it for the submitter's mailbox
/// and schedules the data-available notification.
pub struct ConfirmationMessageHandler<S, R> {
    store: Arc<S>,
    renderer: R,
}

impl<S, R> ConfirmationMessageHandler<S, R> {
    pub fn new(store: Arc<S>, renderer: R) -> Self {
        ConfirmationMessageHandler { store, renderer }
    }
}

impl<S, R> CommandHandler for ConfirmationMessageHandler<S, R>
where
    S: TransactionStore,
    R: DocumentRenderer,
{
    fn handle(&self, command: &InternalCommand, uow: &mut UnitOfWork) -> Result<(), CommandError> {
        let InternalCommand::CreateConfirmationMessage {
            transaction_id,
            correlation_id,
        } = command
        else {
            return Err(CommandError::Codec(format!(
                "confirmation handler received {}",
                command.kind()
            )));
        };

        let transaction = self
            .store
            .accepted_transaction(transaction_id)?
            .ok_or_else(|| CommandError::UnresolvableRouting {
                transaction_id: transaction_id.clone(),
            })?;

        // The exchange answers the submitter, so original sender and
        // receiver swap places.
        let header = DocumentHeader {
            message_type: CONFIRMATION_MESSAGE_TYPE.to_string(),
            process_type: transaction.process_type.clone(),
            sender: transaction.receiver.clone(),
            sender_role: transaction.receiver_role,
            receiver: transaction.sender.clone(),
            receiver_role: transaction.sender_role,
            correlation_id: correlation_id.clone(),
        };
        let records = vec![ActivityRecord {
            id: transaction.transaction_id.clone(),
            body: serde_json::json!({ "status": "Accepted" }),
        }];

        let payload = self
            .renderer
            .render(&header, &records)
            .map_err(|e| CommandError::Render(e.to_string()))?;

        uow.enqueue_message(OutgoingMessage {
            receiver: transaction.sender.clone(),
            receiver_role: transaction.sender_role,
            sender: transaction.receiver.clone(),
            sender_role: transaction.receiver_role,
            process_type: transaction.process_type.clone(),
            message_type: CONFIRMATION_MESSAGE_TYPE.to_string(),
            category: MessageCategory::MasterData,
            payload,
        });

        uow.schedule(&InternalCommand::DispatchNotification {
            recipient: transaction.sender.clone(),
            message_type: CONFIRMATION_MESSAGE_TYPE.to_string(),
            category: MessageCategory::MasterData,
            correlation_id: correlation_id.clone(),
        })
        .map_err(|e| CommandError::Codec(e.to_string()))?;

        Ok(())
    }
}

/// Handles `DispatchNotification`: pushes a data-available notification
/// through the transport sender.
pub struct NotificationHandler<T> {
    sender: T,
}

impl<T> NotificationHandler<T> {
    pub fn new(sender: T) -> Self {
        NotificationHandler { sender }
    }
}

impl<T: TransportSender> CommandHandler for NotificationHandler<T> {
    fn handle(&self, command: &InternalCommand, _uow: &mut UnitOfWork) -> Result<(), CommandError> {
        let InternalCommand::DispatchNotification {
            recipient,
            message_type,
            category,
            correlation_id,
        } = command
        else {
            return Err(CommandError::Codec(format!(
                "notification handler received {}",
                command.kind()
            )));
        };

        let notification = Notification {
            recipient: recipient.clone(),
            message_type: message_type.clone(),
            category: *category,
        };

        self.sender
            .send(correlation_id, &notification)
            .map_err(|e| CommandError::Send(e.to_string()))
    }
}
