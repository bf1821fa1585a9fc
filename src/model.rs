use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name offered when the finished video is handed to the user.
pub const DOWNLOAD_FILE_NAME: &str = "ai_ad.mp4";
pub const VIDEO_MIME: &str = "video/mp4";

pub const IMAGE_PREFIX: &str = "img_";
pub const AUDIO_PREFIX: &str = "audio_";
pub const VIDEO_PREFIX: &str = "video_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub title: String,
    pub description: String,
    pub image_locators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImage {
    pub path: PathBuf,
    pub source_locator: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdScript {
    pub raw_text: String,
    pub lines: Vec<String>,
}

impl AdScript {
    pub fn new(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let lines = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { raw_text, lines }
    }

    /// Narration text: every caption line read back to back.
    pub fn spoken_text(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
}

impl VideoArtifact {
    pub fn download_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        VIDEO_MIME
    }
}

/// Everything a front end shows for one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub product: ProductInfo,
    pub image_urls: Vec<String>,
    pub images: Vec<LocalImage>,
    pub script: AdScript,
    pub video: VideoArtifact,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// `<dir>/<prefix><32 hex chars><ext>`
pub fn unique_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    let suffix: u128 = rand::thread_rng().r#gen();
    dir.join(format!("{}{:032x}{}", prefix, suffix, ext))
}
