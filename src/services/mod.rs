pub mod amount;
pub mod chain;
pub mod completion;
pub mod notify;
pub mod payments;
pub mod transfer;

pub use chain::{ChainClient, RpcChainClient, TxInfo};
pub use completion::CompletionService;
pub use notify::{
    LogNotifier, Notifier, PaymentNotification, ReceiptGenerator, StubReceiptGenerator,
    WebhookNotifier,
};
pub use payments::PaymentService;
