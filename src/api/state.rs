use std::sync::Arc;

use crate::services::RecommendationService;

/// Shared application state
///
/// Everything behind the `Arc` is read-only after startup, so handlers read it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(service: RecommendationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
