//! Media processor owning the video and image queues.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use gather_models::quality::{AVATAR_LADDER, IMAGE_LADDER, VIDEO_LADDER};
use gather_models::{ImageQuality, MediaCategory, VideoQuality};
use gather_queue::{JobHandle, ProcessingJob, ProcessingQueue, QueueConfig, QueueStats};

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_renditions;
use crate::resize::{image_output_path, resize_image};
use crate::video::{transcode_hls, HlsOutput};

/// Snapshot of both pipelines.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorStats {
    pub video: QueueStats,
    pub image: QueueStats,
}

/// Turns uploaded files into rendition ladders.
///
/// Video and image work run on separate queues. A whole clip is one video
/// job; every still rendition is its own image job. Work is submitted when a
/// `process_*` method is called, not when the returned future is polled.
///
/// Nothing here cleans up after a failure: partial output stays under the
/// output directory for the caller to remove.
#[derive(Clone)]
pub struct MediaProcessor {
    config: MediaConfig,
    video_queue: ProcessingQueue<HlsOutput>,
    image_queue: ProcessingQueue<PathBuf>,
}

impl MediaProcessor {
    pub fn new(config: MediaConfig) -> MediaResult<Self> {
        let video_queue = ProcessingQueue::new(QueueConfig::new("video", config.video_concurrency))
            .map_err(MediaError::Queue)?;
        let image_queue = ProcessingQueue::new(QueueConfig::new("image", config.image_concurrency))
            .map_err(MediaError::Queue)?;

        info!(
            video_concurrency = config.video_concurrency,
            image_concurrency = config.image_concurrency,
            "Media processor ready"
        );

        Ok(Self {
            config,
            video_queue,
            image_queue,
        })
    }

    pub fn from_env() -> MediaResult<Self> {
        Self::new(MediaConfig::from_env())
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            video: self.video_queue.stats(),
            image: self.image_queue.stats(),
        }
    }

    /// Transcode a clip into an HLS ladder as a single video job.
    pub fn process_video(
        &self,
        id: &str,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        qualities: &[VideoQuality],
    ) -> impl Future<Output = MediaResult<HlsOutput>> + Send + 'static {
        let submitted = self.submit_video(id, input.as_ref(), output_dir.as_ref(), qualities);
        async move {
            let output = submitted?.await?;
            record_renditions(MediaCategory::Video.as_str(), output.renditions.len());
            Ok(output)
        }
    }

    /// Transcode with the default video ladder.
    pub fn process_clip(
        &self,
        id: &str,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> impl Future<Output = MediaResult<HlsOutput>> + Send + 'static {
        self.process_video(id, input, output_dir, VIDEO_LADDER)
    }

    /// Resize an image into `qualities`, one image job per quality.
    ///
    /// Resolves with the output paths in ladder order once every job has
    /// settled. If any job failed, the first failure in ladder order is
    /// returned.
    pub fn process_image(
        &self,
        id: &str,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        qualities: &[ImageQuality],
    ) -> impl Future<Output = MediaResult<Vec<PathBuf>>> + Send + 'static {
        self.process_stills(MediaCategory::Image, id, input.as_ref(), output_dir.as_ref(), qualities)
    }

    /// Resize an avatar into the avatar ladder.
    pub fn process_avatar(
        &self,
        id: &str,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> impl Future<Output = MediaResult<Vec<PathBuf>>> + Send + 'static {
        self.process_stills(
            MediaCategory::Avatar,
            id,
            input.as_ref(),
            output_dir.as_ref(),
            AVATAR_LADDER,
        )
    }

    /// Resize with the default image ladder.
    pub fn process_event_image(
        &self,
        id: &str,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> impl Future<Output = MediaResult<Vec<PathBuf>>> + Send + 'static {
        self.process_image(id, input, output_dir, IMAGE_LADDER)
    }

    fn submit_video(
        &self,
        id: &str,
        input: &Path,
        output_dir: &Path,
        qualities: &[VideoQuality],
    ) -> MediaResult<JobHandle<HlsOutput>> {
        if qualities.is_empty() {
            return Err(MediaError::EmptyLadder);
        }

        let input = input.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let qualities = qualities.to_vec();
        let config = self.config.clone();

        let job = ProcessingJob::new(id, move || async move {
            transcode_hls(&input, &output_dir, &qualities, &config).await
        });
        Ok(self.video_queue.submit(job))
    }

    fn process_stills(
        &self,
        category: MediaCategory,
        id: &str,
        input: &Path,
        output_dir: &Path,
        qualities: &[ImageQuality],
    ) -> impl Future<Output = MediaResult<Vec<PathBuf>>> + Send + 'static {
        let submitted = if qualities.is_empty() {
            Err(MediaError::EmptyLadder)
        } else {
            Ok(qualities
                .iter()
                .map(|quality| self.submit_still(id, input, output_dir, *quality))
                .collect::<Vec<_>>())
        };

        async move {
            let handles = submitted?;
            let count = handles.len();

            // Wait for every job so no rendition is still being written
            // when the caller starts cleaning up.
            let mut outputs = Vec::with_capacity(count);
            let mut first_error = None;
            for handle in handles {
                let job_id = handle.job_id().to_string();
                match handle.await {
                    Ok(path) => outputs.push(path),
                    Err(e) => {
                        warn!(job_id = %job_id, error = %e, "Image rendition failed");
                        first_error.get_or_insert(MediaError::from(e));
                    }
                }
            }

            if let Some(err) = first_error {
                return Err(err);
            }
            record_renditions(category.as_str(), count);
            Ok(outputs)
        }
    }

    fn submit_still(
        &self,
        id: &str,
        input: &Path,
        output_dir: &Path,
        quality: ImageQuality,
    ) -> JobHandle<PathBuf> {
        let input = input.to_path_buf();
        let output = image_output_path(output_dir, &quality);
        let jpeg_quality = self.config.jpeg_quality;

        let job = ProcessingJob::new(format!("{}:{}", id, quality.name), move || async move {
            let joined = tokio::task::spawn_blocking(move || {
                resize_image(&input, &output, &quality, jpeg_quality).map(|()| output)
            })
            .await;

            match joined {
                Ok(result) => result,
                // Re-raise so the queue reports the panic as such
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(MediaError::internal(format!("resize task failed: {}", e))),
            }
        });
        self.image_queue.submit(job)
    }
}
