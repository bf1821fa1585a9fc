use thiserror::Error;

/// Stage-level failures of one ad-generation run. Each variant halts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("script generation failed: {0}")]
    Generation(String),

    #[error("video assembly failed: {0}")]
    Assembly(String),

    #[error("no usable product images were downloaded")]
    NoImages,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Keeps the whole `anyhow` context chain in the message.
    pub(crate) fn assembly(err: anyhow::Error) -> Self {
        Self::Assembly(format!("{:#}", err))
    }

    pub(crate) fn generation(err: anyhow::Error) -> Self {
        Self::Generation(format!("{:#}", err))
    }
}
