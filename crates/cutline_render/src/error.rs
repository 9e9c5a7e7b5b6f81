use cutline_core::types::MediaId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no video clips to export")]
    NoExportableContent,

    #[error("media not found: {0}")]
    UnknownMedia(MediaId),

    #[error("plan is stale: {0} has been removed")]
    StalePlan(MediaId),

    #[error("encode failed at step {step_index}: {reason}")]
    EncodeFailed { step_index: usize, reason: String },

    #[error("encode cancelled before step {step_index}")]
    Cancelled { step_index: usize },

    #[error("ffmpeg not found")]
    FfmpegNotFound,

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
