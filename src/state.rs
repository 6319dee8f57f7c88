/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to Clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::DpopService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub dpop: Arc<DpopService>,
}

impl AppState {
    pub fn new(dpop: Arc<DpopService>) -> Self {
        Self { dpop }
    }
}
