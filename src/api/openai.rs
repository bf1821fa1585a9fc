use crate::config::Config;
use crate::{logi, logw};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const CHAT_TIMEOUT_SECS: u64 = 120;
const IMAGE_TIMEOUT_SECS: u64 = 180;

fn log_openai_error(root: &Value) {
    let Some(err) = root.get("error") else {
        return;
    };
    if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
        logw(format!("OpenAI error message: {}", msg));
    }
    if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
        logw(format!("OpenAI error type: {}", typ));
    }
    if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
        logw(format!("OpenAI error code: {}", code));
    }
}

async fn post_json(client: &Client, cfg: &Config, endpoint: &str, body: &Value, timeout_s: u64) -> Result<Value> {
    let url = format!("{}{}", cfg.openai_base_url.trim_end_matches('/'), endpoint);
    let resp = client
        .post(url)
        .bearer_auth(&cfg.openai_key)
        .json(body)
        .timeout(Duration::from_secs(timeout_s))
        .send()
        .await
        .context("OpenAI request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    let root: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

    if !status.is_success() {
        logw(format!("OpenAI HTTP {}", status.as_u16()));
        log_openai_error(&root);
        if root.is_null() && !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("OpenAI raw body: {}", snippet));
        }
        anyhow::bail!("OpenAI HTTP {}", status.as_u16());
    }
    if root.is_null() {
        anyhow::bail!("OpenAI response was not JSON");
    }

    Ok(root)
}

pub fn chat_output_text(root: &Value) -> Option<String> {
    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Single-user-message chat completion; returns the first choice's content.
pub async fn chat_completion(client: &Client, cfg: &Config, prompt: &str) -> Result<String> {
    let body = json!({
        "model": cfg.openai_model,
        "messages": [
            {"role": "user", "content": prompt},
        ],
        "temperature": cfg.temperature,
    });

    let root = post_json(client, cfg, "/v1/chat/completions", &body, CHAT_TIMEOUT_SECS).await?;
    match chat_output_text(&root) {
        Some(text) => Ok(text),
        None => {
            logw("OpenAI response parse failed.");
            anyhow::bail!("OpenAI response had no message content")
        }
    }
}

pub async fn generate_images(client: &Client, cfg: &Config, prompt: &str, count: u32) -> Result<Vec<String>> {
    let body = json!({
        "model": cfg.image_model,
        "prompt": prompt,
        "n": count,
        "size": cfg.image_size,
    });

    let root = post_json(client, cfg, "/v1/images/generations", &body, IMAGE_TIMEOUT_SECS).await?;
    let urls = root
        .get("data")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("url").and_then(|u| u.as_str()))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    logi(format!("OpenAI images received: {}", urls.len()));
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_text_reads_first_choice() {
        let root = json!({"choices": [{"message": {"role": "assistant", "content": "Hi"}}, {"message": {"content": "no"}}]});
        assert_eq!(chat_output_text(&root).as_deref(), Some("Hi"));
        assert_eq!(chat_output_text(&json!({"choices": []})), None);
        assert_eq!(chat_output_text(&json!({"error": {"message": "x"}})), None);
    }
}
