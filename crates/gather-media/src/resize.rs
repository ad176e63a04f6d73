//! Still-image renditions.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use gather_models::{FitMode, ImageQuality};

use crate::error::{MediaError, MediaResult};
use crate::metrics::record_tool_duration;

/// Extension of every still rendition.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Output path for `quality` under `output_dir`, e.g. `<dir>/high.jpg`.
pub fn image_output_path(output_dir: &Path, quality: &ImageQuality) -> PathBuf {
    output_dir.join(format!("{}.{}", quality.name, IMAGE_EXTENSION))
}

/// Decode `input`, fit it into `quality`'s box and write a JPEG to `output`.
///
/// Blocking; callers on the runtime should use `spawn_blocking`.
pub fn resize_image(
    input: &Path,
    output: &Path,
    quality: &ImageQuality,
    jpeg_quality: u8,
) -> MediaResult<()> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let started = Instant::now();
    let result = encode_rendition(input, output, quality, jpeg_quality);
    record_tool_duration("image", result.is_ok(), started.elapsed().as_secs_f64());
    result
}

fn encode_rendition(
    input: &Path,
    output: &Path,
    quality: &ImageQuality,
    jpeg_quality: u8,
) -> MediaResult<()> {
    let source = image::open(input).map_err(|e| match e {
        image::ImageError::IoError(io) => MediaError::Io(io),
        other => MediaError::Unreadable(other.to_string()),
    })?;

    let (width, height) = (quality.width, quality.height);
    let resized = match quality.fit {
        FitMode::Contain => source.resize(width, height, FilterType::Lanczos3),
        FitMode::Cover => source.resize_to_fill(width, height, FilterType::Lanczos3),
        FitMode::Fill => source.resize_exact(width, height, FilterType::Lanczos3),
    };

    // JPEG carries no alpha channel
    let rgb = resized.to_rgb8();

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(output)?);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, jpeg_quality.clamp(1, 100)))?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        quality = quality.name,
        width = rgb.width(),
        height = rgb.height(),
        "Image rendition written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_models::quality::{AVATAR_LADDER, IMAGE_LADDER};
    use image::{GenericImageView, RgbImage};
    use tempfile::TempDir;

    fn source_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("source.png");
        RgbImage::from_fn(width, height, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_output_path() {
        let path = image_output_path(Path::new("/media/img"), &IMAGE_LADDER[0]);
        assert_eq!(path, PathBuf::from("/media/img/high.jpg"));
    }

    #[test]
    fn test_contain_preserves_aspect() {
        let dir = TempDir::new().unwrap();
        let input = source_image(dir.path(), 400, 200);
        let low = &IMAGE_LADDER[2];
        let output = image_output_path(dir.path(), low);

        resize_image(&input, &output, low, 80).unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (640, 320));
    }

    #[test]
    fn test_cover_fills_square() {
        let dir = TempDir::new().unwrap();
        let input = source_image(dir.path(), 400, 200);
        let small = &AVATAR_LADDER[2];
        let output = image_output_path(dir.path(), small);

        resize_image(&input, &output, small, 80).unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (small.width, small.height));
    }

    #[test]
    fn test_fill_stretches() {
        let dir = TempDir::new().unwrap();
        let input = source_image(dir.path(), 300, 300);
        let banner = ImageQuality {
            name: "banner",
            width: 200,
            height: 50,
            fit: FitMode::Fill,
        };
        let output = image_output_path(dir.path(), &banner);

        resize_image(&input, &output, &banner, 90).unwrap();

        assert_eq!(image::open(&output).unwrap().dimensions(), (200, 50));
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = resize_image(
            &dir.path().join("missing.png"),
            &dir.path().join("out.jpg"),
            &IMAGE_LADDER[0],
            80,
        );
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[test]
    fn test_garbage_input_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("notes.png");
        std::fs::write(&input, b"definitely not an image").unwrap();

        let result = resize_image(&input, &dir.path().join("out.jpg"), &IMAGE_LADDER[0], 80);
        assert!(matches!(result, Err(MediaError::Unreadable(_))));
    }
}
