pub mod health;
pub mod orders;
pub mod payments;

pub use health::*;
pub use orders::*;
pub use payments::*;

use std::sync::Arc;

use crate::services::{ChainClient, CompletionService, PaymentService};

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub completion: Arc<CompletionService>,
    pub chain: Arc<dyn ChainClient>,
}
