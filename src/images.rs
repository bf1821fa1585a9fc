use crate::api::openai;
use crate::config::Config;
use crate::fetch::http_get_bytes;
use crate::model::{IMAGE_PREFIX, LocalImage, unique_path};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Outcome of the best-effort image generation used when scraping found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackImages {
    Generated(Vec<String>),
    Unavailable { reason: String },
}

pub async fn generate_fallback_images(client: &Client, cfg: &Config, title: &str) -> FallbackImages {
    let prompt = format!("Product showcase of: {}", title);
    logi(format!("Generating fallback AI images for: {}", prompt));

    match openai::generate_images(client, cfg, &prompt, cfg.fallback_image_count).await {
        Ok(urls) if urls.is_empty() => FallbackImages::Unavailable {
            reason: "image service returned no images".to_string(),
        },
        Ok(urls) => FallbackImages::Generated(urls),
        Err(err) => {
            logw(format!("AI image generation failed: {:#}", err));
            FallbackImages::Unavailable {
                reason: format!("{:#}", err),
            }
        }
    }
}

/// Maps the locator's extension to an encoder; unknown extensions become JPEG.
fn output_format(locator: &str) -> (&'static str, ImageFormat) {
    let path = Url::parse(locator)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| locator.to_string());
    let ext = Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => (".png", ImageFormat::Png),
        Some("webp") => (".webp", ImageFormat::WebP),
        Some("jpeg") => (".jpeg", ImageFormat::Jpeg),
        _ => (".jpg", ImageFormat::Jpeg),
    }
}

/// Decodes, drops alpha and re-encodes in the target format.
fn reencode_rgb(bytes: &[u8], path: &Path, format: ImageFormat) -> Result<(u32, u32)> {
    let decoded = image::load_from_memory(bytes).context("Image decode failed")?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    rgb.save_with_format(path, format)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok((rgb.width(), rgb.height()))
}

pub async fn download_image(client: &Client, cfg: &Config, url: &str) -> Result<LocalImage> {
    let bytes = http_get_bytes(client, url, Duration::from_secs(cfg.http_timeout_secs)).await?;
    let (ext, format) = output_format(url);
    let path: PathBuf = unique_path(&cfg.temp_dir, IMAGE_PREFIX, ext);

    let target = path.clone();
    let (width, height) = tokio::task::spawn_blocking(move || reencode_rgb(&bytes, &target, format))
        .await
        .context("Image re-encode task failed")??;

    Ok(LocalImage {
        path,
        source_locator: url.to_string(),
        width,
        height,
    })
}

/// One slot per input URL; an empty locator or a failed download leaves `None` in its slot.
pub async fn download_images(client: &Client, cfg: &Config, urls: &[String]) -> Vec<Option<LocalImage>> {
    let mut out = Vec::with_capacity(urls.len());
    for url in urls {
        if url.trim().is_empty() {
            out.push(None);
            continue;
        }
        match download_image(client, cfg, url).await {
            Ok(img) => {
                logok(format!("Image saved: {} ({}x{})", img.path.display(), img.width, img.height));
                out.push(Some(img));
            }
            Err(err) => {
                logw(format!("Failed to download image: {} | {:#}", url, err));
                out.push(None);
            }
        }
    }
    out
}

pub fn usable(images: Vec<Option<LocalImage>>) -> Vec<LocalImage> {
    images.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba, RgbaImage};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, temp_dir: &Path) -> Config {
        let mut cfg = Config::from_json(&format!(
            r#"{{"open_api_key": "k", "openai_base_url": "{}"}}"#,
            server.uri()
        ))
        .unwrap();
        cfg.temp_dir = temp_dir.to_path_buf();
        cfg
    }

    fn rgba_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 128]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn format_follows_locator_extension() {
        assert_eq!(output_format("https://x.example/a/b.PNG?v=2").0, ".png");
        assert_eq!(output_format("https://x.example/a/b._SL500_.jpg").0, ".jpg");
        assert_eq!(output_format("https://x.example/a/b.gif").0, ".jpg");
        assert_eq!(output_format("https://x.example/img").0, ".jpg");
    }

    #[tokio::test]
    async fn download_drops_alpha_and_records_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/photo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(rgba_png(6, 4)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cfg = config_for(&server, dir.path());
        let url = format!("{}/p/photo.png", server.uri());
        let img = download_image(&Client::new(), &cfg, &url).await.unwrap();

        assert_eq!((img.width, img.height), (6, 4));
        assert_eq!(img.source_locator, url);
        let name = img.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("img_") && name.ends_with(".png"));

        let reopened = image::open(&img.path).unwrap();
        assert_eq!(reopened.color(), ColorType::Rgb8);
    }

    #[tokio::test]
    async fn failed_download_leaves_a_none_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(rgba_png(2, 2)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not an image".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cfg = config_for(&server, dir.path());
        let urls = vec![
            format!("{}/missing.jpg", server.uri()),
            format!("{}/ok.png", server.uri()),
            format!("{}/garbage.jpg", server.uri()),
            String::new(),
        ];

        let slots = download_images(&Client::new(), &cfg, &urls).await;
        assert_eq!(slots.len(), 4);
        assert!(slots[0].is_none());
        assert!(slots[1].is_some());
        assert!(slots[2].is_none());
        assert!(slots[3].is_none());
        assert_eq!(usable(slots).len(), 1);
    }

    #[tokio::test]
    async fn fallback_generation_failure_is_a_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cfg = config_for(&server, dir.path());
        let result = generate_fallback_images(&Client::new(), &cfg, "Kettle").await;
        assert!(matches!(result, FallbackImages::Unavailable { .. }));
    }

    #[tokio::test]
    async fn fallback_generation_returns_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "prompt": "Product showcase of: Kettle", "n": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"url": "https://img.example/1.png"}, {"url": "https://img.example/2.png"}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cfg = config_for(&server, dir.path());
        let result = generate_fallback_images(&Client::new(), &cfg, "Kettle").await;
        assert_eq!(
            result,
            FallbackImages::Generated(vec![
                "https://img.example/1.png".to_string(),
                "https://img.example/2.png".to_string()
            ])
        );
    }
}
