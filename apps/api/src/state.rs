use std::sync::Arc;

use crate::contacts::fixtures::FixtureStore;
use crate::summary::generator::SummaryGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<FixtureStore>,
    /// Owns the model seam and the session cache.
    pub summaries: Arc<SummaryGenerator>,
}
