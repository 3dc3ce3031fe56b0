use std::path::{Path, PathBuf};

use crate::{
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    error::{StopmoError, StopmoResult},
};

/// Milliseconds per encoded frame. Governs both the output frame rate and
/// the per-item frame-repeat calculation; not user-configurable.
pub const FRAME_INTERVAL_MS: u64 = 40;
/// Output frame rate derived from the frame interval (25 fps).
pub const OUTPUT_FPS: u32 = (1000 / FRAME_INTERVAL_MS) as u32;

/// One source image and how long it should stay on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSpec {
    pub path: PathBuf,
    pub duration_ms: u64,
}

/// How many encoded frames a duration maps to. A nonzero duration below the
/// frame interval still contributes one frame, and so does a zero duration
/// that survived plan validation.
pub fn repeat_count(duration_ms: u64) -> u64 {
    (duration_ms / FRAME_INTERVAL_MS).max(1)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    /// Index into the input sequence.
    pub index: usize,
    pub repeats: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub entries: Vec<PlanEntry>,
    pub total_frames: u64,
}

/// Pure planning step: validate the input sequence and compute per-frame
/// repeat counts, in input order.
///
/// Rejects an empty sequence and the all-zero-durations case with
/// `InvalidInput`. A zero duration mixed with nonzero ones is NOT rejected
/// and is planned at one frame; only the all-zero case fails.
pub fn frame_plan(frames: &[FrameSpec]) -> StopmoResult<FramePlan> {
    if frames.is_empty() {
        return Err(StopmoError::invalid_input("no frames selected"));
    }
    if frames.iter().all(|f| f.duration_ms == 0) {
        return Err(StopmoError::invalid_input(
            "every selected frame has zero duration",
        ));
    }

    let entries: Vec<PlanEntry> = frames
        .iter()
        .enumerate()
        .map(|(index, f)| PlanEntry {
            index,
            repeats: repeat_count(f.duration_ms),
        })
        .collect();
    let total_frames = entries.iter().map(|e| e.repeats).sum();

    Ok(FramePlan {
        entries,
        total_frames,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembleReport {
    pub frames_written: u64,
    pub width: u32,
    pub height: u32,
}

/// Render the frame sequence into an MP4 at `out_path`.
///
/// Validation happens before any file is created or touched, so a rejected
/// request leaves a pre-existing output file intact. The canvas size comes
/// from the first image (cropped to even dimensions for yuv420p); every
/// subsequent image must match it. Frames are written strictly in input
/// order by a single sequential writer, and the file is fully flushed before
/// this returns. Any pre-existing file at `out_path` is overwritten in
/// place.
#[tracing::instrument(skip(frames))]
pub fn assemble(frames: &[FrameSpec], out_path: &Path) -> StopmoResult<AssembleReport> {
    let plan = frame_plan(frames)?;
    tracing::debug!(
        frames = frames.len(),
        total_frames = plan.total_frames,
        "assembling video"
    );

    let mut encoder: Option<FfmpegEncoder> = None;
    let report = match write_planned_frames(&plan, frames, out_path, &mut encoder) {
        Ok(report) => report,
        Err(e) => {
            // Kill a half-fed ffmpeg so it cannot finalize a partial video.
            if let Some(enc) = encoder.take() {
                enc.abort();
            }
            return Err(e);
        }
    };

    let enc = encoder
        .take()
        .ok_or_else(|| StopmoError::encode("no frames were encoded (bug)"))?;
    enc.finish()?;

    tracing::info!(
        frames_written = report.frames_written,
        "wrote {}",
        out_path.display()
    );
    Ok(report)
}

fn write_planned_frames(
    plan: &FramePlan,
    frames: &[FrameSpec],
    out_path: &Path,
    encoder: &mut Option<FfmpegEncoder>,
) -> StopmoResult<AssembleReport> {
    let mut canvas = (0u32, 0u32);
    let mut frames_written = 0u64;

    for entry in &plan.entries {
        let source = &frames[entry.index];
        let mut img = load_rgba(&source.path)?;
        img = crop_to_even(img);
        flatten_alpha_in_place(&mut img);

        let (width, height) = img.dimensions();
        if encoder.is_none() {
            canvas = (width, height);
            *encoder = Some(FfmpegEncoder::new(EncodeConfig {
                width,
                height,
                fps: OUTPUT_FPS,
                out_path: out_path.to_path_buf(),
                overwrite: true,
            })?);
        } else if (width, height) != canvas {
            return Err(StopmoError::asset(format!(
                "image '{}' is {width}x{height}, expected {}x{} (all frames must match the first image)",
                source.path.display(),
                canvas.0,
                canvas.1
            )));
        }
        let Some(enc) = encoder.as_mut() else {
            return Err(StopmoError::encode("encoder not initialized (bug)"));
        };

        for _ in 0..entry.repeats {
            enc.write_frame(img.as_raw())?;
            frames_written += 1;
        }
    }

    Ok(AssembleReport {
        frames_written,
        width: canvas.0,
        height: canvas.1,
    })
}

fn load_rgba(path: &Path) -> StopmoResult<image::RgbaImage> {
    let img = image::open(path).map_err(|e| {
        StopmoError::asset(format!("failed to load image '{}': {e}", path.display()))
    })?;
    Ok(img.to_rgba8())
}

/// Drop the last row/column when a dimension is odd; libx264 yuv420p wants
/// even sizes.
fn crop_to_even(img: image::RgbaImage) -> image::RgbaImage {
    let (w, h) = img.dimensions();
    let (ew, eh) = (w & !1, h & !1);
    if (ew, eh) == (w, h) {
        return img;
    }
    image::imageops::crop_imm(&img, 0, 0, ew, eh).to_image()
}

/// Composite straight-alpha pixels over black and force full opacity, so the
/// bytes piped to ffmpeg are plain opaque RGBA.
fn flatten_alpha_in_place(img: &mut image::RgbaImage) {
    for px in img.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        px[0] = (((px[0] as u16) * a + 127) / 255) as u8;
        px[1] = (((px[1] as u16) * a + 127) / 255) as u8;
        px[2] = (((px[2] as u16) * a + 127) / 255) as u8;
        px[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, duration_ms: u64) -> FrameSpec {
        FrameSpec {
            path: PathBuf::from(name),
            duration_ms,
        }
    }

    #[test]
    fn repeat_count_floors_with_minimum_of_one() {
        assert_eq!(repeat_count(90), 2);
        assert_eq!(repeat_count(40), 1);
        assert_eq!(repeat_count(39), 1);
        assert_eq!(repeat_count(10), 1);
        assert_eq!(repeat_count(0), 1);
        assert_eq!(repeat_count(200), 5);
    }

    #[test]
    fn plan_preserves_order_and_counts() {
        let plan = frame_plan(&[spec("a.png", 90), spec("b.png", 40)]).unwrap();
        assert_eq!(plan.total_frames, 3);
        assert_eq!(
            plan.entries,
            vec![
                PlanEntry {
                    index: 0,
                    repeats: 2
                },
                PlanEntry {
                    index: 1,
                    repeats: 1
                },
            ]
        );
    }

    #[test]
    fn tiny_duration_still_gets_one_frame() {
        let plan = frame_plan(&[spec("a.png", 10)]).unwrap();
        assert_eq!(plan.total_frames, 1);
    }

    #[test]
    fn empty_sequence_is_invalid_input() {
        let err = frame_plan(&[]).unwrap_err();
        assert!(matches!(err, StopmoError::InvalidInput(_)));
    }

    #[test]
    fn all_zero_durations_are_invalid_input() {
        let err = frame_plan(&[spec("a.png", 0), spec("b.png", 0)]).unwrap_err();
        assert!(matches!(err, StopmoError::InvalidInput(_)));
    }

    #[test]
    fn zero_duration_among_nonzero_still_gets_one_frame() {
        // Only the all-zero case is rejected; a lone zero duration slips
        // through at one frame.
        let plan = frame_plan(&[spec("a.png", 0), spec("b.png", 80)]).unwrap();
        assert_eq!(plan.entries[0].repeats, 1);
        assert_eq!(plan.entries[1].repeats, 2);
        assert_eq!(plan.total_frames, 3);
    }

    #[test]
    fn crop_to_even_trims_odd_edges() {
        let img = image::RgbaImage::from_pixel(3, 5, image::Rgba([1, 2, 3, 255]));
        let cropped = crop_to_even(img);
        assert_eq!(cropped.dimensions(), (2, 4));

        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255]));
        assert_eq!(crop_to_even(img).dimensions(), (4, 2));
    }

    #[test]
    fn flatten_composites_over_black() {
        let mut img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 128]));
        flatten_alpha_in_place(&mut img);
        assert_eq!(img.get_pixel(0, 0), &image::Rgba([128, 0, 0, 255]));

        let mut opaque = image::RgbaImage::from_pixel(1, 1, image::Rgba([9, 8, 7, 255]));
        flatten_alpha_in_place(&mut opaque);
        assert_eq!(opaque.get_pixel(0, 0), &image::Rgba([9, 8, 7, 255]));
    }
}
