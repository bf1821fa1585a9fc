use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "open_api_key")]
    pub openai_key: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_script_lines")]
    pub script_lines: u32,

    #[serde(default = "default_true")]
    pub fallback_images: bool,
    #[serde(default = "default_fallback_image_count")]
    pub fallback_image_count: u32,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,

    #[serde(default)]
    pub tts_provider: TtsProvider,
    #[serde(default = "default_tts_lang")]
    pub tts_lang: String,
    #[serde(default = "default_google_tts_base_url")]
    pub google_tts_base_url: String,
    #[serde(rename = "elevenlabs_api_key")]
    #[serde(default)]
    pub elevenlabs_key: String,
    #[serde(default = "default_elevenlabs_base_url")]
    pub elevenlabs_base_url: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,

    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub hero_image_fallback: bool,

    #[serde(default)]
    pub video: VideoSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    #[default]
    Google,
    Elevenlabs,
}

/// One image per script line, or a single image carrying the whole script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoMode {
    #[default]
    PerLine,
    WholeScript,
}

/// What to do when narration and the visual track differ in length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    #[default]
    HoldLastFrame,
    TrimAudio,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default)]
    pub mode: VideoMode,
    /// Defaults per mode when absent: 2.5 s per line, 10 s for a whole-script still.
    #[serde(default)]
    pub segment_seconds: Option<f64>,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub caption_font_size: Option<u32>,
    #[serde(default = "default_caption_margin")]
    pub caption_margin: u32,
    #[serde(default)]
    pub caption_font: Option<PathBuf>,
    #[serde(default)]
    pub duration_policy: DurationPolicy,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            mode: VideoMode::default(),
            segment_seconds: None,
            frame_width: default_frame_width(),
            fps: default_fps(),
            caption_font_size: None,
            caption_margin: default_caption_margin(),
            caption_font: None,
            duration_policy: DurationPolicy::default(),
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
        }
    }
}

impl VideoSettings {
    pub fn segment_seconds(&self) -> f64 {
        self.segment_seconds.unwrap_or(match self.mode {
            VideoMode::PerLine => 2.5,
            VideoMode::WholeScript => 10.0,
        })
    }

    pub fn caption_font_size(&self) -> u32 {
        self.caption_font_size.unwrap_or(match self.mode {
            VideoMode::PerLine => 40,
            VideoMode::WholeScript => 28,
        })
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f64 {
    0.8
}

fn default_script_lines() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_fallback_image_count() -> u32 {
    3
}

fn default_image_model() -> String {
    "dall-e-2".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_tts_lang() -> String {
    "en".to_string()
}

fn default_google_tts_base_url() -> String {
    "https://translate.google.com".to_string()
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("ai_video_ads")
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_frame_width() -> u32 {
    720
}

fn default_fps() -> u32 {
    24
}

fn default_caption_margin() -> u32 {
    20
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".to_string()
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("config.json: invalid JSON")
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let bad = |msg: &str| -> Result<(), PipelineError> {
            Err(PipelineError::Config(msg.to_string()))
        };

        if self.openai_key.is_empty() {
            return bad("config.json: open_api_key missing");
        }
        if self.tts_provider == TtsProvider::Elevenlabs && self.elevenlabs_key.is_empty() {
            return bad("config.json: elevenlabs_api_key missing (tts_provider is elevenlabs)");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return bad("config.json: temperature must be within 0.0..=2.0");
        }
        if !(1..=12).contains(&self.script_lines) {
            return bad("config.json: script_lines must be within 1..=12");
        }
        if self.fallback_images && !(1..=10).contains(&self.fallback_image_count) {
            return bad("config.json: fallback_image_count must be within 1..=10");
        }
        if self.http_timeout_secs == 0 {
            return bad("config.json: http_timeout_secs must be positive");
        }
        if self.temp_dir.as_os_str().is_empty() {
            return bad("config.json: temp_dir must not be empty");
        }

        let video = &self.video;
        if !(video.segment_seconds() > 0.0 && video.segment_seconds().is_finite()) {
            return bad("config.json: video.segment_seconds must be positive");
        }
        if video.frame_width < 64 || video.frame_width % 2 != 0 {
            return bad("config.json: video.frame_width must be an even number >= 64");
        }
        if video.fps == 0 {
            return bad("config.json: video.fps must be positive");
        }
        if video.caption_font_size() == 0 {
            return bad("config.json: video.caption_font_size must be positive");
        }
        if video.caption_margin * 2 >= video.frame_width {
            return bad("config.json: video.caption_margin leaves no room for captions");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = Config::from_json(r#"{"open_api_key": "sk-test"}"#).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.openai_model, "gpt-4o");
        assert_eq!(cfg.script_lines, 4);
        assert_eq!(cfg.tts_provider, TtsProvider::Google);
        assert_eq!(cfg.http_timeout_secs, 15);
        assert_eq!(cfg.video.frame_width, 720);
        assert_eq!(cfg.video.fps, 24);
        assert_eq!(cfg.video.segment_seconds(), 2.5);
        assert_eq!(cfg.video.caption_font_size(), 40);
        assert_eq!(cfg.video.duration_policy, DurationPolicy::HoldLastFrame);
    }

    #[test]
    fn whole_script_mode_changes_defaults() {
        let cfg = Config::from_json(
            r#"{"open_api_key": "k", "video": {"mode": "whole_script", "duration_policy": "trim_audio"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.video.mode, VideoMode::WholeScript);
        assert_eq!(cfg.video.segment_seconds(), 10.0);
        assert_eq!(cfg.video.caption_font_size(), 28);
        assert_eq!(cfg.video.duration_policy, DurationPolicy::TrimAudio);
    }

    #[test]
    fn missing_openai_key_is_rejected() {
        let cfg = Config::from_json(r#"{"open_api_key": ""}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn elevenlabs_requires_its_key() {
        let cfg =
            Config::from_json(r#"{"open_api_key": "k", "tts_provider": "elevenlabs"}"#).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("elevenlabs_api_key"));
    }

    #[test]
    fn odd_frame_width_is_rejected() {
        let cfg =
            Config::from_json(r#"{"open_api_key": "k", "video": {"frame_width": 721}}"#).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn load_reads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"open_api_key": "k", "script_lines": 0}"#)
            .await
            .unwrap();
        assert!(Config::load(&path).await.is_err());

        tokio::fs::write(&path, r#"{"open_api_key": "k", "script_lines": 5}"#)
            .await
            .unwrap();
        assert_eq!(Config::load(&path).await.unwrap().script_lines, 5);
    }
}
