use crate::caption::escape_filter_value;
use crate::config::VideoSettings;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Extra encoding directives for the final audio/video mux.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MuxPlan {
    /// Clone the last frame for this many seconds.
    pub pad_seconds: Option<f64>,
    /// Cut the output at this length.
    pub limit_seconds: Option<f64>,
}

async fn run_cmd(args: &[String], cwd: Option<&Path>) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.context("Command execution failed")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = stderr.trim().chars().rev().take(400).collect::<String>();
        let tail = tail.chars().rev().collect::<String>();
        return Err(anyhow::anyhow!("Command failed ({}): {:?} {}", output.status, args, tail));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(ffprobe_bin: &str, path: &Path) -> Result<f64> {
    let output = Command::new(ffprobe_bin)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

/// Still image held for `seconds`, fitted into `width`x`height` and captioned
/// from `caption_file` at the bottom centre.
pub fn segment_args(
    settings: &VideoSettings,
    image: &Path,
    caption_file: &str,
    height: u32,
    seconds: f64,
    out_mp4: &str,
) -> Vec<String> {
    let width = settings.frame_width;
    let font = match &settings.caption_font {
        Some(path) => format!("fontfile={}", escape_filter_value(&path.display().to_string())),
        None => "font=Arial".to_string(),
    };
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,\
         drawtext=textfile={cap}:{font}:fontsize={fs}:fontcolor=white:borderw=2:bordercolor=black:\
         line_spacing=6:expansion=none:x=(w-text_w)/2:y=h-text_h-{margin},format=yuv420p",
        w = width,
        h = height,
        cap = escape_filter_value(caption_file),
        font = font,
        fs = settings.caption_font_size(),
        margin = settings.caption_margin,
    );

    vec![
        settings.ffmpeg_bin.clone(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-loop".to_string(),
        "1".to_string(),
        "-framerate".to_string(),
        settings.fps.to_string(),
        "-t".to_string(),
        format!("{:.3}", seconds),
        "-i".to_string(),
        image.display().to_string(),
        "-vf".to_string(),
        filter,
        "-r".to_string(),
        settings.fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-an".to_string(),
        out_mp4.to_string(),
    ]
}

pub fn concat_args(settings: &VideoSettings, list_txt: &str, out_mp4: &str) -> Vec<String> {
    vec![
        settings.ffmpeg_bin.clone(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.to_string(),
        "-r".to_string(),
        settings.fps.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-an".to_string(),
        out_mp4.to_string(),
    ]
}

pub fn mux_args(settings: &VideoSettings, video_in: &str, audio_in: &Path, plan: MuxPlan, out_mp4: &str) -> Vec<String> {
    let mut args = vec![
        settings.ffmpeg_bin.clone(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video_in.to_string(),
        "-i".to_string(),
        audio_in.display().to_string(),
    ];
    if let Some(pad) = plan.pad_seconds {
        args.push("-vf".to_string());
        args.push(format!("tpad=stop_mode=clone:stop_duration={:.3}", pad));
    }
    args.extend(
        [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset",
            "veryfast", "-crf", "22", "-c:a", "aac", "-b:a", "192k",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push("-r".to_string());
    args.push(settings.fps.to_string());
    if let Some(limit) = plan.limit_seconds {
        args.push("-t".to_string());
        args.push(format!("{:.3}", limit));
    }
    args.extend(["-movflags", "+faststart", "-f", "mp4"].iter().map(|s| s.to_string()));
    args.push(out_mp4.to_string());
    args
}

pub async fn ffmpeg_make_segment(
    settings: &VideoSettings,
    workdir: &Path,
    image: &Path,
    caption_file: &str,
    height: u32,
    seconds: f64,
    out_mp4: &str,
) -> Result<bool> {
    let args = segment_args(settings, image, caption_file, height, seconds, out_mp4);
    run_cmd(&args, Some(workdir)).await?;
    Ok(workdir.join(out_mp4).exists())
}

pub async fn ffmpeg_concat_videos(settings: &VideoSettings, workdir: &Path, list_txt: &str, out_mp4: &str) -> Result<bool> {
    let args = concat_args(settings, list_txt, out_mp4);
    run_cmd(&args, Some(workdir)).await?;
    Ok(workdir.join(out_mp4).exists())
}

pub async fn ffmpeg_mux_audio(
    settings: &VideoSettings,
    workdir: &Path,
    video_in: &str,
    audio_in: &Path,
    plan: MuxPlan,
    out_mp4: &str,
) -> Result<bool> {
    let args = mux_args(settings, video_in, audio_in, plan, out_mp4);
    run_cmd(&args, Some(workdir)).await?;
    Ok(workdir.join(out_mp4).exists())
}
