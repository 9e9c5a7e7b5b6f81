//! The timeline aggregate: a fixed set of tracks plus the derived total
//! duration.
//!
//! Invariants kept by every edit in [`crate::editing`]:
//!
//! 1. clips on one track never overlap on `[start, end)`, and each track's
//!    clip list is sorted by `start`;
//! 2. `0 <= trim_start < trim_end <= media.duration`;
//! 3. `duration == trim_end - trim_start`;
//! 4. `start >= 0`;
//! 5. every clip's media id resolves in the catalog;
//! 6. `total_duration >= min_duration` and `>=` every clip end.

use crate::catalog::MediaCatalog;
use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Session length floor used when nothing else is configured.
pub const DEFAULT_MIN_DURATION: TimeUs = TimeUs(120_000_000);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    tracks: Vec<Track>,
    total_duration: TimeUs,
    min_duration: TimeUs,
    clip_ids: IdAllocator,
}

impl Timeline {
    /// Create the session's tracks. Track ids are assigned 1, 2, 3... in the
    /// order given.
    pub fn new(min_duration: TimeUs, specs: &[TrackSpec]) -> Self {
        let min_duration = min_duration.clamp(TimeUs::ZERO, TimeUs::MAX);
        let tracks = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Track {
                id: TrackId(i as u32 + 1),
                name: spec.name.clone(),
                kind: spec.kind,
                clips: vec![],
            })
            .collect();
        Self {
            tracks,
            total_duration: min_duration,
            min_duration,
            clip_ids: IdAllocator::new(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips().find(|c| c.id == id)
    }

    /// All clips, in track creation order and then by start.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn total_duration(&self) -> TimeUs {
        self.total_duration
    }

    pub fn min_duration(&self) -> TimeUs {
        self.min_duration
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.clips.is_empty())
    }

    /// Re-verify every invariant listed in the module docs.
    pub fn check_invariants(&self, catalog: &MediaCatalog) -> Result<()> {
        let mut max_end = TimeUs::ZERO;
        for track in &self.tracks {
            for (i, clip) in track.clips.iter().enumerate() {
                if clip.track_id != track.id {
                    return Err(CoreError::InvalidPlacement(format!(
                        "{} is stored on {} but claims {}",
                        clip.id, track.id, clip.track_id
                    )));
                }
                if clip.start.is_negative() {
                    return Err(CoreError::InvalidPlacement(format!(
                        "{} starts at {}",
                        clip.id, clip.start
                    )));
                }
                let media = catalog
                    .get(clip.media_id)
                    .ok_or(CoreError::UnknownMedia(clip.media_id))?;
                check_trim_window(clip.trim_start, clip.trim_end, media.duration)?;
                if clip.duration != clip.trim_end - clip.trim_start {
                    return Err(CoreError::InvalidTrim(format!(
                        "{} has duration {} for window {}..{}",
                        clip.id, clip.duration, clip.trim_start, clip.trim_end
                    )));
                }
                if let Some(next) = track.clips.get(i + 1) {
                    if next.start < clip.start {
                        return Err(CoreError::InvalidPlacement(format!(
                            "{} is out of order on {}",
                            next.id, track.id
                        )));
                    }
                    if clip.overlaps(next) {
                        return Err(CoreError::OverlapDetected {
                            clip: next.id,
                            other: clip.id,
                        });
                    }
                }
                if clip.end() > TimeUs::MAX {
                    return Err(CoreError::InvalidPlacement(format!(
                        "{} ends past the timeline limit",
                        clip.id
                    )));
                }
                max_end = max_end.max(clip.end());
            }
        }
        if self.total_duration < self.min_duration || self.total_duration < max_end {
            return Err(CoreError::InvalidPlacement(format!(
                "total duration {} is below floor {} or last clip end {}",
                self.total_duration, self.min_duration, max_end
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Crate-internal helpers for the edit operations
    // -----------------------------------------------------------------------

    pub(crate) fn allocate_clip_id(&mut self) -> ClipId {
        ClipId(self.clip_ids.next_raw())
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub(crate) fn track_at_mut(&mut self, index: usize) -> &mut Track {
        &mut self.tracks[index]
    }

    pub(crate) fn track_at(&self, index: usize) -> &Track {
        &self.tracks[index]
    }

    /// Find the (track_index, clip_index) for a given clip id.
    pub(crate) fn find_clip_location(&self, clip_id: ClipId) -> Option<(usize, usize)> {
        for (ti, track) in self.tracks.iter().enumerate() {
            if let Some(ci) = track.clips.iter().position(|c| c.id == clip_id) {
                return Some((ti, ci));
            }
        }
        None
    }

    /// Grow the total duration to cover `end`.
    pub(crate) fn extend_total_duration(&mut self, end: TimeUs) {
        self.total_duration = self.total_duration.max(end);
    }

    /// Recompute the total duration from scratch, floored at the minimum.
    /// This is the only path that can shrink it.
    pub(crate) fn recompute_total_duration(&mut self) {
        self.total_duration = self
            .clips()
            .map(Clip::end)
            .fold(self.min_duration, TimeUs::max);
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION, &default_track_specs())
    }
}

/// `0 <= trim_start < trim_end <= media_duration`.
pub(crate) fn check_trim_window(
    trim_start: TimeUs,
    trim_end: TimeUs,
    media_duration: TimeUs,
) -> Result<()> {
    if trim_start.is_negative() {
        return Err(CoreError::InvalidTrim(format!(
            "trim start {trim_start} is before the media start"
        )));
    }
    if trim_end > media_duration {
        return Err(CoreError::InvalidTrim(format!(
            "trim end {trim_end} is past the media end {media_duration}"
        )));
    }
    if trim_end <= trim_start {
        return Err(CoreError::InvalidTrim(format!(
            "empty window {trim_start}..{trim_end}"
        )));
    }
    Ok(())
}
