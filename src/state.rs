//! Shared application state handed to every request handler

use std::sync::Arc;

use crate::service::{AnalyticsService, BusinessService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub businesses: Arc<BusinessService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(businesses: Arc<BusinessService>, analytics: Arc<AnalyticsService>) -> Self {
        Self {
            businesses,
            analytics,
        }
    }
}
