use std::sync::{Arc, Mutex};

use markethub::{
    AcceptAllValidator, ActorNumber, CommandDispatcher, CommandKind, ConfirmationMessageHandler,
    IngestionService, InMemoryMarketStore, JsonRenderer, LogSender, Mailbox, MarketRole,
    MarketTransaction, MessageCategory, NotificationHandler, OutboxProcessor, OutgoingMessage,
};

/// A fully wired exchange: ingestion, outbox processor, and mailbox over one
/// shared in-memory store. Sent notifications are captured in `sent`.
pub struct Hub {
    pub store: Arc<InMemoryMarketStore>,
    pub ingestion: IngestionService<InMemoryMarketStore, AcceptAllValidator>,
    pub processor: OutboxProcessor<InMemoryMarketStore>,
    pub mailbox: Mailbox<InMemoryMarketStore>,
    pub sent: Arc<Mutex<Vec<String>>>,
}

pub fn hub() -> Hub {
    let store = Arc::new(InMemoryMarketStore::new());
    let sent = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(
            CommandKind::CreateConfirmationMessage,
            Box::new(ConfirmationMessageHandler::new(
                Arc::clone(&store),
                JsonRenderer,
            )),
        )
        .unwrap();
    dispatcher
        .register(
            CommandKind::DispatchNotification,
            Box::new(NotificationHandler::new(LogSender::with_buffer(
                Arc::clone(&sent),
            ))),
        )
        .unwrap();

    Hub {
        ingestion: IngestionService::new(Arc::clone(&store), AcceptAllValidator),
        processor: OutboxProcessor::new(Arc::clone(&store), dispatcher),
        mailbox: Mailbox::new(Arc::clone(&store)),
        store,
        sent,
    }
}

pub fn supplier() -> ActorNumber {
    ActorNumber::new("5790000000001")
}

pub fn operator() -> ActorNumber {
    ActorNumber::new("5790000000002")
}

pub fn transaction(message_id: &str, transaction_id: &str) -> MarketTransaction {
    MarketTransaction {
        message_id: message_id.to_string(),
        transaction_id: transaction_id.to_string(),
        sender: supplier(),
        sender_role: MarketRole::EnergySupplier,
        receiver: operator(),
        receiver_role: MarketRole::MarketOperator,
        process_type: "E65".to_string(),
        payload: b"<transaction/>".to_vec(),
    }
}

pub fn outgoing(
    receiver: ActorNumber,
    process_type: &str,
    category: MessageCategory,
) -> OutgoingMessage {
    OutgoingMessage {
        receiver,
        receiver_role: MarketRole::EnergySupplier,
        sender: operator(),
        sender_role: MarketRole::MarketOperator,
        process_type: process_type.to_string(),
        message_type: "GenericNotification".to_string(),
        category,
        payload: format!("<doc process=\"{}\"/>", process_type).into_bytes(),
    }
}
