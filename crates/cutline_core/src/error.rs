use crate::types::{ClipId, MediaId, TimeUs, TrackId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Track not found: {0}")]
    UnknownTrack(TrackId),

    #[error("Media not found: {0}")]
    UnknownMedia(MediaId),

    #[error("Clip not found: {0}")]
    UnknownClip(ClipId),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Probe incomplete for {0}: duration is unknown")]
    ProbeIncomplete(String),

    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("Invalid trim: {0}")]
    InvalidTrim(String),

    #[error("Split point {at} is outside {clip}")]
    OutOfBounds { clip: ClipId, at: TimeUs },

    #[error("Overlap detected: {clip} would overlap {other}")]
    OverlapDetected { clip: ClipId, other: ClipId },
}

pub type Result<T> = std::result::Result<T, CoreError>;
