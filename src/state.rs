use std::sync::Arc;

use crate::config::AppConfig;
use crate::email::Mailer;
use crate::payments::PaymentProvider;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub payments: Arc<dyn PaymentProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}
