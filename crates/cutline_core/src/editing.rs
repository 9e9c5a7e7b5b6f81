use crate::catalog::MediaCatalog;
use crate::error::{CoreError, Result};
use crate::timeline::{check_trim_window, Timeline};
use crate::types::*;

impl Timeline {
    /// Append a clip covering the whole of `media_id` at the tail of
    /// `track_id`. Never fills gaps; use [`Timeline::move_clip`] to reorder.
    pub fn place_clip(
        &mut self,
        catalog: &MediaCatalog,
        media_id: MediaId,
        track_id: TrackId,
    ) -> Result<Clip> {
        let track = self
            .track(track_id)
            .ok_or(CoreError::UnknownTrack(track_id))?;
        let media = catalog
            .get(media_id)
            .ok_or(CoreError::UnknownMedia(media_id))?;
        if media.kind == MediaKind::Audio && track.kind == TrackKind::Video {
            return Err(CoreError::InvalidPlacement(format!(
                "{media_id} is audio-only and cannot go on video {track_id}"
            )));
        }
        let start = track.end();
        check_extent(start, media.duration)?;

        let clip = Clip {
            id: self.allocate_clip_id(),
            media_id,
            track_id,
            name: media.name.clone(),
            start,
            duration: media.duration,
            trim_start: TimeUs::ZERO,
            trim_end: media.duration,
        };

        let end = clip.end();
        self.track_mut(track_id)
            .ok_or(CoreError::UnknownTrack(track_id))?
            .clips
            .push(clip.clone());
        self.extend_total_duration(end);

        tracing::debug!(clip = %clip.id, media = %media_id, track = %track_id, start = %start, "clip placed");
        Ok(clip)
    }

    /// Move a clip to a new timeline position on its own track.
    pub fn move_clip(&mut self, clip_id: ClipId, new_start: TimeUs) -> Result<()> {
        let (track_idx, clip_idx) = self
            .find_clip_location(clip_id)
            .ok_or(CoreError::UnknownClip(clip_id))?;

        if new_start.is_negative() || !new_start.is_in_range() {
            return Err(CoreError::InvalidPlacement(format!(
                "{clip_id} cannot start at {new_start}"
            )));
        }

        let duration = self.track_at(track_idx).clips[clip_idx].duration;
        check_extent(new_start, duration)?;
        self.check_clear(track_idx, clip_id, new_start, new_start + duration)?;

        let track = self.track_at_mut(track_idx);
        track.clips[clip_idx].start = new_start;
        track.clips.sort_by_key(|c| c.start);
        self.recompute_total_duration();

        tracing::debug!(clip = %clip_id, start = %new_start, "clip moved");
        Ok(())
    }

    /// Set a clip's trim window. The left edge on the timeline follows the
    /// left trim handle: `start` shifts by `new_trim_start - old_trim_start`.
    pub fn trim_clip(
        &mut self,
        catalog: &MediaCatalog,
        clip_id: ClipId,
        new_trim_start: TimeUs,
        new_trim_end: TimeUs,
    ) -> Result<()> {
        let (track_idx, clip_idx) = self
            .find_clip_location(clip_id)
            .ok_or(CoreError::UnknownClip(clip_id))?;
        let clip = &self.track_at(track_idx).clips[clip_idx];
        let media = catalog
            .get(clip.media_id)
            .ok_or(CoreError::UnknownMedia(clip.media_id))?;

        check_trim_window(new_trim_start, new_trim_end, media.duration)?;

        let new_start = clip.start + (new_trim_start - clip.trim_start);
        if new_start.is_negative() {
            return Err(CoreError::InvalidTrim(format!(
                "{clip_id} would start at {new_start}"
            )));
        }
        let new_duration = new_trim_end - new_trim_start;
        check_extent(new_start, new_duration)?;
        self.check_clear(track_idx, clip_id, new_start, new_start + new_duration)?;

        let track = self.track_at_mut(track_idx);
        let clip = &mut track.clips[clip_idx];
        clip.start = new_start;
        clip.trim_start = new_trim_start;
        clip.trim_end = new_trim_end;
        clip.duration = new_duration;
        track.clips.sort_by_key(|c| c.start);
        self.recompute_total_duration();

        tracing::debug!(
            clip = %clip_id,
            trim_start = %new_trim_start,
            trim_end = %new_trim_end,
            "clip trimmed"
        );
        Ok(())
    }

    /// Split a clip at a timeline position strictly inside it. The left half
    /// keeps the original id; the right half gets a fresh one and sits
    /// directly after it in track order.
    pub fn split_clip(&mut self, clip_id: ClipId, at: TimeUs) -> Result<(Clip, Clip)> {
        let (track_idx, clip_idx) = self
            .find_clip_location(clip_id)
            .ok_or(CoreError::UnknownClip(clip_id))?;

        let original = self.track_at(track_idx).clips[clip_idx].clone();
        if at <= original.start || at >= original.end() {
            return Err(CoreError::OutOfBounds { clip: clip_id, at });
        }

        let offset = at - original.start;
        let split_source = original.trim_start + offset;

        let left = Clip {
            trim_end: split_source,
            duration: split_source - original.trim_start,
            ..original.clone()
        };
        let right = Clip {
            id: self.allocate_clip_id(),
            start: at,
            trim_start: split_source,
            trim_end: original.trim_end,
            duration: original.trim_end - split_source,
            ..original
        };

        let track = self.track_at_mut(track_idx);
        track.clips[clip_idx] = left.clone();
        track.clips.insert(clip_idx + 1, right.clone());

        tracing::debug!(clip = %clip_id, right = %right.id, at = %at, "clip split");
        Ok((left, right))
    }

    /// Remove a clip. Unknown ids are a no-op and yield `None`. This can
    /// shrink the total duration back toward the floor.
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        let (track_idx, clip_idx) = self.find_clip_location(clip_id)?;
        let removed = self.track_at_mut(track_idx).clips.remove(clip_idx);
        self.recompute_total_duration();
        tracing::debug!(clip = %clip_id, "clip removed");
        Some(removed)
    }

    /// Drop every clip that references `media_id`, recomputing the total
    /// duration once at the end. Returns the removed ids in track order.
    pub fn remove_clips_for_media(&mut self, media_id: MediaId) -> Vec<ClipId> {
        let mut removed = Vec::new();
        for ti in 0..self.tracks().len() {
            self.track_at_mut(ti).clips.retain(|c| {
                if c.media_id == media_id {
                    removed.push(c.id);
                    false
                } else {
                    true
                }
            });
        }
        if !removed.is_empty() {
            self.recompute_total_duration();
            tracing::debug!(media = %media_id, count = removed.len(), "dependent clips removed");
        }
        removed
    }

    /// Reject `[start, end)` for `clip_id` if it intersects any sibling on
    /// the same track.
    fn check_clear(&self, track_idx: usize, clip_id: ClipId, start: TimeUs, end: TimeUs) -> Result<()> {
        for other in &self.track_at(track_idx).clips {
            if other.id != clip_id && spans_overlap(start, end, other.start, other.end()) {
                return Err(CoreError::OverlapDetected {
                    clip: clip_id,
                    other: other.id,
                });
            }
        }
        Ok(())
    }
}

/// A clip must end within [`TimeUs::MAX`]. Both inputs are in range, so the
/// sum cannot overflow.
fn check_extent(start: TimeUs, duration: TimeUs) -> Result<()> {
    if start + duration > TimeUs::MAX {
        return Err(CoreError::InvalidPlacement(format!(
            "a clip at {start} lasting {duration} ends past the timeline limit"
        )));
    }
    Ok(())
}
