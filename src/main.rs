use ai_video_ads::cli::{self, Command, USAGE};
use ai_video_ads::config::Config;
use ai_video_ads::generator::{Generator, RunObserver};
use ai_video_ads::housekeeping;
use ai_video_ads::init;
use ai_video_ads::model::{AdScript, LocalImage, ProductInfo, VideoArtifact};
use anyhow::{Context, Result};

/// Prints each stage's output as the run progresses.
struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_product(&mut self, product: &ProductInfo) {
        println!("\n{}\n{}", product.title, product.description);
    }

    fn on_image_urls(&mut self, urls: &[String]) {
        for url in urls {
            println!("image: {}", url);
        }
    }

    fn on_script(&mut self, script: &AdScript) {
        println!("\n--- script ---\n{}\n--------------", script.raw_text);
    }

    fn on_images(&mut self, images: &[LocalImage]) {
        println!("{} image(s) downloaded", images.len());
    }

    fn on_video(&mut self, video: &VideoArtifact) {
        println!("\nVideo generated: {} ({})", video.path.display(), video.mime_type());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("[ERROR] {}\n\n{}", err, USAGE);
            std::process::exit(2);
        }
    };

    let cfg = Config::load(&args.config).await?;
    init::ensure_directories(&cfg.temp_dir).await?;

    match args.command {
        Command::Purge { older_than_hours } => {
            let removed = housekeeping::purge_artifacts(
                &cfg.temp_dir,
                chrono::Duration::hours(older_than_hours),
                chrono::Utc::now(),
            )
            .await?;
            println!("Removed {} file(s)", removed);
        }
        Command::Generate { url, out } => {
            match init::ffmpeg_version(&cfg.video.ffmpeg_bin).await {
                None => eprintln!("[WARNING] FFmpeg not found in PATH. Please install FFmpeg."),
                Some(version) => {
                    if let Some(warning) = init::caption_font_warning(&version, cfg.video.caption_font.as_deref()) {
                        tracing::warn!("{}", warning);
                    }
                }
            }

            let generator = Generator::new(cfg)?;
            let report = generator
                .run_generation(&url, &mut ConsoleObserver)
                .await
                .context("Ad generation failed")?;

            let target = out.unwrap_or_else(|| report.video.download_name().into());
            tokio::fs::copy(&report.video.path, &target)
                .await
                .with_context(|| format!("Failed to save video to {}", target.display()))?;
            println!("Saved: {}", target.display());
        }
    }

    Ok(())
}
