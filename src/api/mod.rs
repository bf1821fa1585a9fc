pub mod elevenlabs;
pub mod google_tts;
pub mod openai;

use crate::config::{Config, TtsProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

/// Text-to-speech backend producing an MP3 file.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    async fn synthesize(&self, text: &str, out_mp3_path: &Path) -> Result<()>;
}

pub fn speech_synth_for(client: &Client, cfg: &Config) -> Box<dyn SpeechSynth> {
    match cfg.tts_provider {
        TtsProvider::Google => Box::new(google_tts::GoogleTts::new(client.clone(), cfg)),
        TtsProvider::Elevenlabs => Box::new(elevenlabs::ElevenLabsTts::new(client.clone(), cfg)),
    }
}

pub(crate) async fn write_audio(out_mp3_path: &Path, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        anyhow::bail!("TTS returned no audio");
    }
    if let Some(parent) = out_mp3_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    fs::write(out_mp3_path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", out_mp3_path.display()))?;
    Ok(())
}
