use crate::api::openai;
use crate::config::Config;
use crate::error::PipelineError;
use crate::model::AdScript;
use crate::logi;
use reqwest::Client;

pub fn build_prompt(title: &str, description: &str, lines: u32) -> String {
    format!(
        "You are a marketing assistant. Write a short {lines}-line video ad script \
         for the following product. Each line should highlight a benefit or call to action.\n\n\
         Product name: {title}\n\
         Product description: {description}\n\n\
         Format it as {lines} short lines."
    )
}

/// Asks the chat model for an ad script. The reply is kept verbatim apart
/// from surrounding whitespace.
pub async fn generate_ad_script(
    client: &Client,
    cfg: &Config,
    title: &str,
    description: &str,
) -> Result<AdScript, PipelineError> {
    logi(format!("Generating ad script with {} for: {}", cfg.openai_model, title));
    let prompt = build_prompt(title, description, cfg.script_lines);

    let text = openai::chat_completion(client, cfg, &prompt)
        .await
        .map_err(PipelineError::generation)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::Generation("model returned an empty script".to_string()));
    }

    let script = AdScript::new(text);
    logi(format!("Generated script: {}", script.lines.join(" | ")));
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config::from_json(&format!(
            r#"{{"open_api_key": "sk-test", "openai_base_url": "{}"}}"#,
            server.uri()
        ))
        .unwrap()
    }

    #[test]
    fn prompt_names_product_and_line_count() {
        let prompt = build_prompt("Kettle", "Boils fast", 4);
        assert!(prompt.starts_with("You are a marketing assistant. Write a short 4-line video ad script"));
        assert!(prompt.contains("Product name: Kettle\nProduct description: Boils fast\n\n"));
        assert!(prompt.ends_with("Format it as 4 short lines."));
    }

    #[tokio::test]
    async fn returns_trimmed_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o", "temperature": 0.8})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "\n  Boils in 60s.\nBuy now!  \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let script = generate_ad_script(&Client::new(), &config_for(&server), "Kettle", "Boils fast")
            .await
            .unwrap();
        assert_eq!(script.raw_text, "Boils in 60s.\nBuy now!");
        assert_eq!(script.lines, vec!["Boils in 60s.", "Buy now!"]);
    }

    #[tokio::test]
    async fn service_error_is_a_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit", "type": "requests", "code": "rate_limit_exceeded"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = generate_ad_script(&Client::new(), &config_for(&server), "Kettle", "Boils fast")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(ref msg) if msg.contains("429")));
    }
}
