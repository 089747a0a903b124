use std::sync::Arc;

use domains::TokenVerifier;
use services::Services;

use crate::metrics::Metrics;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub verifier: Arc<dyn TokenVerifier>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(services: Services, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            services,
            verifier,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
