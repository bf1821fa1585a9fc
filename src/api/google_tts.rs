use super::{SpeechSynth, write_audio};
use crate::config::Config;
use crate::logi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// The translate endpoint refuses longer inputs.
const MAX_CHUNK_CHARS: usize = 100;

/// Key-free speech from the Google Translate voice endpoint.
pub struct GoogleTts {
    client: Client,
    base_url: String,
    lang: String,
    timeout: Duration,
}

impl GoogleTts {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            base_url: cfg.google_tts_base_url.trim_end_matches('/').to_string(),
            lang: cfg.tts_lang.clone(),
            timeout: Duration::from_secs(cfg.http_timeout_secs.max(30)),
        }
    }
}

/// Splits on whitespace into pieces of at most `max_chars` characters.
/// A single word longer than the limit is cut mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            chunks.push(head);
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechSynth for GoogleTts {
    async fn synthesize(&self, text: &str, out_mp3_path: &Path) -> Result<()> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("Nothing to synthesize");
        }

        let url = format!("{}/translate_tts", self.base_url);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", self.lang.as_str()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .timeout(self.timeout)
                .send()
                .await
                .context("Google TTS request failed")?;

            if !resp.status().is_success() {
                anyhow::bail!("Google TTS failed HTTP {} on chunk {}", resp.status().as_u16(), idx + 1);
            }
            let bytes = resp.bytes().await.context("Google TTS response read failed")?;
            audio.extend_from_slice(&bytes);
        }

        logi(format!("TTS audio: {} chunk(s), {} bytes", chunks.len(), audio.len()));
        write_audio(out_mp3_path, &audio).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn chunks_respect_word_boundaries() {
        let chunks = chunk_text("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three", "four"]);
        assert!(chunk_text("   ", 10).is_empty());
    }

    #[test]
    fn overlong_word_is_split() {
        let chunks = chunk_text("ab abcdefghij c", 4);
        assert_eq!(chunks, vec!["ab", "abcd", "efgh", "ij c"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[tokio::test]
    async fn concatenates_chunk_audio() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("client", "tw-ob"))
            .and(query_param("tl", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3".to_vec()))
            .expect(2)
            .mount(&server)
            .await;

        let cfg = Config::from_json(&format!(
            r#"{{"open_api_key": "k", "google_tts_base_url": "{}"}}"#,
            server.uri()
        ))
        .unwrap();
        let tts = GoogleTts::new(Client::new(), &cfg);

        let text = "word ".repeat(30);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.mp3");
        tts.synthesize(&text, &out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"mp3mp3");
    }
}
