//! The edit surface offered to UI and script collaborators.
//!
//! Each [`EditCommand`] maps onto one session operation. Times on this
//! boundary are seconds; they are converted to [`TimeUs`] on entry.

use crate::error::{CoreError, Result};
use crate::session::Session;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    ImportMedia(MediaImport),
    AttachVisualMetadata {
        media: MediaId,
        width: Option<u32>,
        height: Option<u32>,
        thumbnail: Option<String>,
    },
    RemoveMedia {
        media: MediaId,
    },
    PlaceClip {
        media: MediaId,
        track: TrackId,
    },
    MoveClip {
        clip: ClipId,
        start: f64,
    },
    TrimClip {
        clip: ClipId,
        trim_start: f64,
        trim_end: f64,
    },
    SplitClip {
        clip: ClipId,
        at: f64,
    },
    RemoveClip {
        clip: ClipId,
    },
}

/// What a successful command produced or changed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    MediaImported(MediaReference),
    MetadataAttached(MediaReference),
    MediaRemoved { clips: Vec<ClipId> },
    ClipPlaced(Clip),
    ClipUpdated(Clip),
    ClipSplit { left: Clip, right: Clip },
    ClipRemoved { clip: Option<ClipId> },
}

impl EditCommand {
    pub fn apply(self, session: &mut Session) -> Result<EditOutcome> {
        tracing::debug!(command = self.description(), "applying edit");
        match self {
            EditCommand::ImportMedia(import) => {
                session.import_media(import).map(EditOutcome::MediaImported)
            }
            EditCommand::AttachVisualMetadata {
                media,
                width,
                height,
                thumbnail,
            } => session
                .attach_visual_metadata(media, width, height, thumbnail)
                .map(|m| EditOutcome::MetadataAttached(m.clone())),
            EditCommand::RemoveMedia { media } => Ok(EditOutcome::MediaRemoved {
                clips: session.remove_media(media),
            }),
            EditCommand::PlaceClip { media, track } => {
                session.place_clip(media, track).map(EditOutcome::ClipPlaced)
            }
            EditCommand::MoveClip { clip, start } => {
                let start = seconds(start, "start", CoreError::InvalidPlacement)?;
                session.move_clip(clip, start)?;
                Ok(updated(session, clip))
            }
            EditCommand::TrimClip {
                clip,
                trim_start,
                trim_end,
            } => {
                let trim_start = seconds(trim_start, "trim start", CoreError::InvalidTrim)?;
                let trim_end = seconds(trim_end, "trim end", CoreError::InvalidTrim)?;
                session.trim_clip(clip, trim_start, trim_end)?;
                Ok(updated(session, clip))
            }
            EditCommand::SplitClip { clip, at } => {
                let at = seconds(at, "split point", CoreError::InvalidPlacement)?;
                session
                    .split_clip(clip, at)
                    .map(|(left, right)| EditOutcome::ClipSplit { left, right })
            }
            EditCommand::RemoveClip { clip } => Ok(EditOutcome::ClipRemoved {
                clip: session.remove_clip(clip).map(|c| c.id),
            }),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            EditCommand::ImportMedia(_) => "Import media",
            EditCommand::AttachVisualMetadata { .. } => "Attach visual metadata",
            EditCommand::RemoveMedia { .. } => "Remove media",
            EditCommand::PlaceClip { .. } => "Add clip",
            EditCommand::MoveClip { .. } => "Move clip",
            EditCommand::TrimClip { .. } => "Trim clip",
            EditCommand::SplitClip { .. } => "Split clip",
            EditCommand::RemoveClip { .. } => "Remove clip",
        }
    }
}

impl Session {
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome> {
        command.apply(self)
    }
}

/// Seconds from the command boundary, rejected with `err` when NaN,
/// infinite, or beyond [`TimeUs::MAX`].
fn seconds(value: f64, what: &str, err: fn(String) -> CoreError) -> Result<TimeUs> {
    TimeUs::try_from_seconds(value).ok_or_else(|| err(format!("{what} {value} is not a usable time")))
}

fn updated(session: &Session, clip: ClipId) -> EditOutcome {
    match session.timeline().clip(clip) {
        Some(c) => EditOutcome::ClipUpdated(c.clone()),
        None => EditOutcome::ClipRemoved { clip: None },
    }
}
