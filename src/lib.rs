use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod assembler;
pub mod caption;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ffmpeg;
pub mod generator;
pub mod housekeeping;
pub mod images;
pub mod init;
pub mod model;
pub mod script;

pub use error::PipelineError;

pub type GeneratorLogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<GeneratorLogHook>>> = Lazy::new(|| Mutex::new(None));

/// Installs (or clears) a process-wide callback that receives every tagged
/// log line, so a front end can mirror pipeline progress.
pub fn set_log_hook(hook: Option<GeneratorLogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("[{}] {}", tag, message),
        _ => tracing::info!("[{}] {}", tag, message),
    }

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_hook_receives_tagged_lines() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hook: GeneratorLogHook = Arc::new(Mutex::new(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        }));

        set_log_hook(Some(hook));
        logok("log-hook-probe");
        set_log_hook(None);
        logi("log-hook-probe-after-clear");

        let lines = seen.lock().unwrap();
        assert!(lines.iter().any(|l| l == "[OK] log-hook-probe"));
        assert!(!lines.iter().any(|l| l.contains("after-clear")));
    }
}
