//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::invoice::InvoiceComposer;
use crate::storage::ArtifactStore;

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<InvoiceComposer>,
    pub artifacts: ArtifactStore,
}

impl AppState {
    pub fn new(composer: InvoiceComposer, artifacts: ArtifactStore) -> Self {
        Self {
            composer: Arc::new(composer),
            artifacts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            InvoiceComposer::from_config(config),
            ArtifactStore::new(config.artifact_dir.clone()),
        )
    }
}
