use crate::api::{self, SpeechSynth};
use crate::assembler;
use crate::config::Config;
use crate::error::PipelineError;
use crate::extract::{self, ExtractOptions};
use crate::fetch;
use crate::images::{self, FallbackImages};
use crate::init;
use crate::model::{AdScript, LocalImage, ProductInfo, RunReport, VideoArtifact};
use crate::script;
use crate::{logi, logok, logw};
use chrono::Utc;
use reqwest::Client;

/// Receives intermediate results as each stage of a run completes.
pub trait RunObserver: Send {
    fn on_product(&mut self, _product: &ProductInfo) {}
    fn on_image_urls(&mut self, _urls: &[String]) {}
    fn on_script(&mut self, _script: &AdScript) {}
    fn on_images(&mut self, _images: &[LocalImage]) {}
    fn on_video(&mut self, _video: &VideoArtifact) {}
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// One configured pipeline: a shared HTTP client plus the speech backend.
pub struct Generator {
    cfg: Config,
    client: Client,
    tts: Box<dyn SpeechSynth>,
}

impl Generator {
    pub fn new(cfg: Config) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let client = fetch::build_client().map_err(|e| PipelineError::Config(format!("{:#}", e)))?;
        let tts = api::speech_synth_for(&client, &cfg);
        Ok(Self { cfg, client, tts })
    }

    pub fn with_speech(cfg: Config, tts: Box<dyn SpeechSynth>) -> Result<Self, PipelineError> {
        let mut generator = Self::new(cfg)?;
        generator.tts = tts;
        Ok(generator)
    }

    /// Scrape, script, download, assemble. The first failing stage ends the run.
    pub async fn run_generation(
        &self,
        url: &str,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport, PipelineError> {
        let cfg = &self.cfg;
        let started_at = Utc::now();
        init::ensure_directories(&cfg.temp_dir)
            .await
            .map_err(|e| PipelineError::Config(format!("{:#}", e)))?;

        let page_url = fetch::parse_page_url(url)?;
        let html = fetch::fetch_page(&self.client, cfg, url).await?;
        let opts = ExtractOptions {
            hero_fallback: cfg.hero_image_fallback,
            ..ExtractOptions::default()
        };
        let product = extract::extract_product_info(&html, Some(&page_url), &opts);
        observer.on_product(&product);

        let mut image_urls = product.image_locators.clone();
        if image_urls.is_empty() && cfg.fallback_images {
            match images::generate_fallback_images(&self.client, cfg, &product.title).await {
                FallbackImages::Generated(urls) => {
                    logok(format!("Fallback images generated: {}", urls.len()));
                    image_urls = urls;
                }
                FallbackImages::Unavailable { reason } => {
                    logw(format!("No fallback images: {}", reason));
                }
            }
        }
        observer.on_image_urls(&image_urls);

        let script = script::generate_ad_script(&self.client, cfg, &product.title, &product.description).await?;
        observer.on_script(&script);

        let local_images = images::usable(images::download_images(&self.client, cfg, &image_urls).await);
        if local_images.is_empty() {
            logw("No images downloaded; cannot build a video.");
            return Err(PipelineError::NoImages);
        }
        observer.on_images(&local_images);

        let video = assembler::create_video(cfg, self.tts.as_ref(), &local_images, &script).await?;
        observer.on_video(&video);

        let finished_at = Utc::now();
        logi(format!(
            "Run finished in {:.1}s",
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        ));

        Ok(RunReport {
            product,
            image_urls,
            images: local_images,
            script,
            video,
            started_at,
            finished_at,
        })
    }
}
