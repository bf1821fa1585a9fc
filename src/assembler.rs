use crate::api::SpeechSynth;
use crate::caption::{chars_per_line, wrap_caption};
use crate::config::{Config, DurationPolicy, VideoMode, VideoSettings};
use crate::error::PipelineError;
use crate::ffmpeg::{self, MuxPlan};
use crate::model::{AUDIO_PREFIX, AdScript, LocalImage, VIDEO_PREFIX, VideoArtifact, unique_path};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Largest narration/visual gap tolerated under `DurationPolicy::Reject`.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// Below this the tracks count as equally long.
const PAD_EPSILON_SECS: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub image: PathBuf,
    pub caption: String,
    pub seconds: f64,
    pub width: u32,
    pub height: u32,
}

/// Pairs images with captions in input order. Per-line mode yields
/// `min(images, lines)` segments; whole-script mode yields one.
pub fn plan_segments(images: &[LocalImage], script: &AdScript, settings: &VideoSettings) -> Vec<SegmentPlan> {
    let seconds = settings.segment_seconds();
    let segment = |img: &LocalImage, caption: String| SegmentPlan {
        image: img.path.clone(),
        caption,
        seconds,
        width: img.width,
        height: img.height,
    };

    match settings.mode {
        VideoMode::PerLine => images
            .iter()
            .zip(script.lines.iter())
            .map(|(img, line)| segment(img, line.clone()))
            .collect(),
        VideoMode::WholeScript => match images.first() {
            Some(img) if !script.lines.is_empty() => vec![segment(img, script.spoken_text())],
            _ => Vec::new(),
        },
    }
}

/// Common canvas height: the tallest image once scaled to `frame_width`, rounded up to even.
pub fn frame_height(segments: &[SegmentPlan], frame_width: u32) -> u32 {
    segments
        .iter()
        .filter(|s| s.width > 0 && s.height > 0)
        .map(|s| {
            let scaled = (s.height as f64 * frame_width as f64 / s.width as f64).round() as u32;
            (scaled + 1) & !1
        })
        .max()
        .unwrap_or(frame_width)
        .max(2)
}

pub fn plan_mux(policy: DurationPolicy, visual_secs: f64, audio_secs: f64) -> Result<MuxPlan, PipelineError> {
    match policy {
        DurationPolicy::HoldLastFrame => {
            let gap = audio_secs - visual_secs;
            Ok(MuxPlan {
                pad_seconds: (gap > PAD_EPSILON_SECS).then_some(gap),
                limit_seconds: None,
            })
        }
        DurationPolicy::TrimAudio => Ok(MuxPlan {
            pad_seconds: None,
            limit_seconds: Some(visual_secs),
        }),
        DurationPolicy::Reject => {
            if (audio_secs - visual_secs).abs() > DURATION_TOLERANCE_SECS {
                return Err(PipelineError::Assembly(format!(
                    "narration is {:.2}s but visuals are {:.2}s",
                    audio_secs, visual_secs
                )));
            }
            Ok(MuxPlan {
                pad_seconds: None,
                limit_seconds: Some(visual_secs),
            })
        }
    }
}

async fn render(
    settings: &VideoSettings,
    workdir: &Path,
    segments: &[SegmentPlan],
    audio_path: &Path,
) -> Result<PathBuf, PipelineError> {
    let height = frame_height(segments, settings.frame_width);
    let wrap_width = chars_per_line(settings.frame_width, settings.caption_margin, settings.caption_font_size());

    let mut list = String::new();
    for (idx, seg) in segments.iter().enumerate() {
        let n = idx + 1;
        let caption_file = format!("caption_{}.txt", n);
        let segment_file = format!("segment_{}.mp4", n);

        let wrapped = wrap_caption(&seg.caption, wrap_width).join("\n");
        fs::write(workdir.join(&caption_file), wrapped)
            .await
            .context("Failed to write caption file")
            .map_err(PipelineError::assembly)?;

        let image = std::path::absolute(&seg.image)
            .context("Failed to resolve image path")
            .map_err(PipelineError::assembly)?;
        logi(format!("Building segment {}/{}: {}", n, segments.len(), image.display()));
        let built = ffmpeg::ffmpeg_make_segment(settings, workdir, &image, &caption_file, height, seg.seconds, &segment_file)
            .await
            .map_err(PipelineError::assembly)?;
        if !built {
            return Err(PipelineError::Assembly(format!("segment {} was not written", n)));
        }
        list.push_str(&format!("file '{}'\n", segment_file));
    }

    fs::write(workdir.join("concat_list.txt"), list)
        .await
        .context("Failed to write concat list")
        .map_err(PipelineError::assembly)?;
    if !ffmpeg::ffmpeg_concat_videos(settings, workdir, "concat_list.txt", "visual.mp4")
        .await
        .map_err(PipelineError::assembly)?
    {
        return Err(PipelineError::Assembly("concatenated track was not written".to_string()));
    }
    logok(format!("Concatenated {} segment(s)", segments.len()));

    let visual_secs: f64 = segments.iter().map(|s| s.seconds).sum();
    let audio_secs = ffmpeg::ffprobe_duration_seconds(&settings.ffprobe_bin, audio_path)
        .await
        .map_err(PipelineError::assembly)?;
    let plan = plan_mux(settings.duration_policy, visual_secs, audio_secs)?;
    logi(format!(
        "Muxing narration {:.2}s over visuals {:.2}s ({:?})",
        audio_secs, visual_secs, settings.duration_policy
    ));

    if !ffmpeg::ffmpeg_mux_audio(settings, workdir, "visual.mp4", audio_path, plan, "final.mp4")
        .await
        .map_err(PipelineError::assembly)?
    {
        return Err(PipelineError::Assembly("final video was not written".to_string()));
    }
    Ok(workdir.join("final.mp4"))
}

async fn narrate_and_render(
    cfg: &Config,
    tts: &dyn SpeechSynth,
    script: &AdScript,
    segments: &[SegmentPlan],
    audio_path: &Path,
    out_path: &Path,
) -> Result<(), PipelineError> {
    logi(format!("TTS -> {}", audio_path.display()));
    tts.synthesize(&script.spoken_text(), audio_path)
        .await
        .map_err(PipelineError::assembly)?;

    let workdir = tempfile::Builder::new()
        .prefix("assembly_")
        .tempdir_in(&cfg.temp_dir)
        .context("Failed to create assembly dir")
        .map_err(PipelineError::assembly)?;

    let final_mp4 = render(&cfg.video, workdir.path(), segments, audio_path).await?;
    fs::rename(&final_mp4, out_path)
        .await
        .with_context(|| format!("Failed to move video to {}", out_path.display()))
        .map_err(PipelineError::assembly)
}

/// Narrates the script, renders one captioned segment per planned pair and
/// encodes the result. On failure the narration and any partial video are removed.
pub async fn create_video(
    cfg: &Config,
    tts: &dyn SpeechSynth,
    images: &[LocalImage],
    script: &AdScript,
) -> Result<VideoArtifact, PipelineError> {
    if images.is_empty() {
        return Err(PipelineError::NoImages);
    }
    let settings = &cfg.video;
    let segments = plan_segments(images, script, settings);
    if segments.is_empty() {
        return Err(PipelineError::Assembly("script has no lines to caption".to_string()));
    }

    let audio_path = std::path::absolute(unique_path(&cfg.temp_dir, AUDIO_PREFIX, ".mp3"))
        .context("Failed to resolve audio path")
        .map_err(PipelineError::assembly)?;
    let out_path = unique_path(&cfg.temp_dir, VIDEO_PREFIX, ".mp4");

    if let Err(err) = narrate_and_render(cfg, tts, script, &segments, &audio_path, &out_path).await {
        logw(format!("Video creation failed: {}", err));
        let _ = fs::remove_file(&audio_path).await;
        let _ = fs::remove_file(&out_path).await;
        return Err(err);
    }

    logok(format!("Video written: {}", out_path.display()));
    Ok(VideoArtifact { path: out_path })
}
