//! Upload processing: record bookkeeping around the media pipelines.
//!
//! The pipelines only produce files. This service owns the media record: it
//! flips it to available once every rendition exists, or marks it failed and
//! deletes the partial output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinHandle;

use gather_media::{MediaProcessor, MediaResult};
use gather_models::{EventId, MediaId, MediaKind, MediaRecord, MediaStatus};

use crate::error::{ApiError, ApiResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::store::Catalog;

/// A submitted upload. `settled` resolves with the final status.
pub struct PendingUpload {
    pub record: MediaRecord,
    pub settled: JoinHandle<MediaStatus>,
}

#[derive(Clone)]
pub struct UploadService {
    catalog: Arc<Catalog>,
    processor: MediaProcessor,
    media_root: PathBuf,
}

impl UploadService {
    pub fn new(catalog: Arc<Catalog>, processor: MediaProcessor, media_root: PathBuf) -> Self {
        Self {
            catalog,
            processor,
            media_root,
        }
    }

    /// Register an uploaded file and start producing its renditions.
    pub async fn submit(
        &self,
        event_id: &EventId,
        kind: MediaKind,
        input_path: PathBuf,
    ) -> ApiResult<PendingUpload> {
        if self.catalog.get_event(event_id).await.is_none() {
            return Err(ApiError::not_found(format!("event {}", event_id)));
        }
        if !tokio::fs::try_exists(&input_path).await.unwrap_or(false) {
            return Err(ApiError::bad_request(format!(
                "input file does not exist: {}",
                input_path.display()
            )));
        }

        let id = MediaId::new();
        let output_dir = self.media_root.join(event_id.as_str()).join(id.as_str());
        let record = MediaRecord {
            id,
            ..MediaRecord::new(event_id.clone(), kind, input_path, output_dir)
        };
        self.catalog.insert_media(record.clone()).await;

        let logger = JobLogger::new(record.id.as_str(), format!("{}_upload", kind));
        logger.log_start(&format!("processing {}", record.input_path.display()));

        let work = self.start_pipeline(&record);
        let settled = tokio::spawn(settle(
            Arc::clone(&self.catalog),
            record.clone(),
            work,
            logger,
        ));

        Ok(PendingUpload { record, settled })
    }

    fn start_pipeline(&self, record: &MediaRecord) -> BoxFuture<'static, MediaResult<Vec<PathBuf>>> {
        let id = record.id.as_str();
        let input = &record.input_path;
        let output = &record.output_dir;

        match record.kind {
            MediaKind::Clip => self
                .processor
                .process_clip(id, input, output)
                .map(|result| result.map(|hls| hls.files()))
                .boxed(),
            MediaKind::Image => self.processor.process_event_image(id, input, output).boxed(),
            MediaKind::Avatar => self.processor.process_avatar(id, input, output).boxed(),
        }
    }
}

async fn settle(
    catalog: Arc<Catalog>,
    record: MediaRecord,
    work: BoxFuture<'static, MediaResult<Vec<PathBuf>>>,
    logger: JobLogger,
) -> MediaStatus {
    let started = Instant::now();
    let result = work.await;
    let elapsed = started.elapsed();
    metrics::record_upload(record.kind.as_str(), result.is_ok(), elapsed.as_secs_f64());

    match result {
        Ok(outputs) => {
            logger.log_completion(
                &format!("{} renditions written", outputs.len()),
                elapsed.as_millis(),
            );
            catalog.mark_media_available(&record.id, outputs).await;
            MediaStatus::Available
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            remove_partial_output(&record.output_dir, &logger).await;
            catalog.mark_media_failed(&record.id, e.to_string()).await;
            MediaStatus::Failed
        }
    }
}

async fn remove_partial_output(dir: &Path, logger: &JobLogger) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => logger.log_warning(&format!("failed to remove {}: {}", dir.display(), e)),
    }
}
