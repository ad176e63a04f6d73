//! Application state.

use std::sync::Arc;

use gather_media::{MediaConfig, MediaProcessor, MediaResult};

use crate::config::ApiConfig;
use crate::services::UploadService;
use crate::store::Catalog;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub catalog: Arc<Catalog>,
    pub processor: MediaProcessor,
    pub uploads: UploadService,
}

impl AppState {
    /// Create state with an empty catalog.
    pub fn new(config: ApiConfig, media: MediaConfig) -> MediaResult<Self> {
        let catalog = Arc::new(Catalog::new());
        let processor = MediaProcessor::new(media)?;
        let uploads = UploadService::new(
            Arc::clone(&catalog),
            processor.clone(),
            config.media_root.clone(),
        );

        Ok(Self {
            config,
            catalog,
            processor,
            uploads,
        })
    }
}
