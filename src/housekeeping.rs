use crate::model::{AUDIO_PREFIX, IMAGE_PREFIX, VIDEO_PREFIX};
use crate::{logi, logw};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

fn is_artifact(name: &str) -> bool {
    [IMAGE_PREFIX, AUDIO_PREFIX, VIDEO_PREFIX]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Deletes pipeline artifacts in `temp_dir` last modified before `now - older_than`.
/// Returns how many files were removed.
pub async fn purge_artifacts(temp_dir: &Path, older_than: Duration, now: DateTime<Utc>) -> Result<usize> {
    if !temp_dir.is_dir() {
        return Ok(0);
    }
    let cutoff = now - older_than;

    let mut removed = 0;
    for entry in WalkDir::new(temp_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_artifact(&name) {
            continue;
        }
        let modified: DateTime<Utc> = match entry.metadata()?.modified() {
            Ok(t) => t.into(),
            Err(_) => continue,
        };
        if modified >= cutoff {
            continue;
        }

        match fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(err) => logw(format!("Failed to remove {}: {}", entry.path().display(), err)),
        }
    }

    logi(format!("Purged {} artifact(s) from {}", removed, temp_dir.display()));
    Ok(removed)
}
