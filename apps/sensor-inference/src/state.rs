use crate::engine::InferenceEngine;
use std::sync::Arc;

/// Shared across requests; the engine is read-only after startup. A future
/// model reload swaps the whole `Arc`, never entries inside it.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
}
