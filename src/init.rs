use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub async fn ensure_directories(temp_dir: &Path) -> Result<()> {
    if !temp_dir.exists() {
        fs::create_dir_all(temp_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", temp_dir.display()))?;
        crate::logi(format!("Created directory: {}", temp_dir.display()));
    }
    Ok(())
}

/// Output of `ffmpeg -version`, or `None` when the binary cannot run.
pub async fn ffmpeg_version(ffmpeg_bin: &str) -> Option<String> {
    match tokio::process::Command::new(ffmpeg_bin)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).to_string()),
        _ => None,
    }
}

/// Captions without a font file resolve `Arial` through fontconfig.
pub fn caption_font_warning(version_output: &str, caption_font: Option<&Path>) -> Option<String> {
    if caption_font.is_some() || version_output.contains("--enable-libfontconfig") {
        return None;
    }
    Some(
        "ffmpeg was built without fontconfig; set video.caption_font to a .ttf file or captions will fail"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_directories(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_directories(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn missing_ffmpeg_binary_has_no_version() {
        assert!(ffmpeg_version("definitely-not-an-ffmpeg-binary").await.is_none());
    }

    #[test]
    fn warns_about_fonts_only_without_fontconfig_or_font_file() {
        let with_fc = "ffmpeg version 6.1\nconfiguration: --enable-gpl --enable-libfontconfig --enable-libx264\n";
        let without_fc = "ffmpeg version 6.1\nconfiguration: --enable-gpl --enable-libfreetype --enable-libx264\n";

        assert!(caption_font_warning(with_fc, None).is_none());
        assert!(caption_font_warning(without_fc, Some(Path::new("/fonts/Arial.ttf"))).is_none());

        let warning = caption_font_warning(without_fc, None).unwrap();
        assert!(warning.contains("caption_font"));
    }
}
