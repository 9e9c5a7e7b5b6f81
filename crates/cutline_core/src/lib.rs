//! Timeline engine: media catalog, tracks and clips, and the edit operations
//! that keep them consistent.

pub mod catalog;
pub mod command;
pub mod config;
mod editing;
pub mod error;
pub mod session;
pub mod timeline;
pub mod types;

pub use catalog::{MediaCatalog, MediaRemoved};
pub use command::{EditCommand, EditOutcome};
pub use config::{EngineConfig, LoggingConfig};
pub use error::{CoreError, Result};
pub use session::{NormalizeTarget, Session, SessionSettings};
pub use timeline::Timeline;
