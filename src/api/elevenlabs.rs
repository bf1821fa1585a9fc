use super::{SpeechSynth, write_audio};
use crate::config::Config;
use crate::logw;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;

pub struct ElevenLabsTts {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsTts {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            base_url: cfg.elevenlabs_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.elevenlabs_key.clone(),
            voice_id: cfg.eleven_voice_id.clone(),
            model_id: cfg.eleven_model_id.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynth for ElevenLabsTts {
    async fn synthesize(&self, text: &str, out_mp3_path: &Path) -> Result<()> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format=mp3_44100_128",
            self.base_url, self.voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        if !resp.status().is_success() {
            logw(format!("ElevenLabs TTS failed HTTP {}", resp.status().as_u16()));
            anyhow::bail!("ElevenLabs TTS failed HTTP {}", resp.status().as_u16());
        }

        let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
        write_audio(out_mp3_path, &bytes).await
    }
}
