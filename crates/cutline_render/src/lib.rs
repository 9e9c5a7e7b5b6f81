//! Export pipeline: compiles a session's timeline into a [`RenderPlan`] and
//! runs it against an [`Encoder`].

pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod plan;

pub use encode::{run_plan, EncodeProgress, Encoder};
pub use error::{RenderError, Result};
pub use ffmpeg::FfmpegEncoder;
pub use plan::{compile, RenderPlan, RenderStep, SegmentId};
