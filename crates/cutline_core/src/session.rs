use crate::catalog::MediaCatalog;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::timeline::{Timeline, DEFAULT_MIN_DURATION};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Fixed output format for exported segments. Every segment in one plan uses
/// the same target so they can be joined without re-encoding; sources with a
/// different aspect ratio are letterboxed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NormalizeTarget {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    pub min_duration: TimeUs,
    pub tracks: Vec<TrackSpec>,
    pub export: NormalizeTarget,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_DURATION,
            tracks: default_track_specs(),
            export: preset_720p(),
        }
    }
}

/// One editing session: the media catalog and the timeline built from it.
/// Owned by the caller; clone it to hand an immutable snapshot to export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub settings: SessionSettings,
    catalog: MediaCatalog,
    timeline: Timeline,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        let timeline = Timeline::new(settings.min_duration, &settings.tracks);
        Self {
            settings,
            catalog: MediaCatalog::new(),
            timeline,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.session_settings())
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn import_media(&mut self, import: MediaImport) -> Result<MediaReference> {
        self.catalog.register(import)
    }

    pub fn attach_visual_metadata(
        &mut self,
        id: MediaId,
        width: Option<u32>,
        height: Option<u32>,
        thumbnail: Option<String>,
    ) -> Result<&MediaReference> {
        self.catalog.attach_visual_metadata(id, width, height, thumbnail)
    }

    /// Remove a media item and every clip that uses it, in one step. Unknown
    /// ids are a no-op. Returns the ids of the clips that went with it.
    pub fn remove_media(&mut self, id: MediaId) -> Vec<ClipId> {
        match self.catalog.remove(id) {
            Some(event) => self.timeline.remove_clips_for_media(event.media_id),
            None => vec![],
        }
    }

    pub fn place_clip(&mut self, media_id: MediaId, track_id: TrackId) -> Result<Clip> {
        self.timeline.place_clip(&self.catalog, media_id, track_id)
    }

    pub fn move_clip(&mut self, clip_id: ClipId, new_start: TimeUs) -> Result<()> {
        self.timeline.move_clip(clip_id, new_start)
    }

    pub fn trim_clip(
        &mut self,
        clip_id: ClipId,
        new_trim_start: TimeUs,
        new_trim_end: TimeUs,
    ) -> Result<()> {
        self.timeline
            .trim_clip(&self.catalog, clip_id, new_trim_start, new_trim_end)
    }

    pub fn split_clip(&mut self, clip_id: ClipId, at: TimeUs) -> Result<(Clip, Clip)> {
        self.timeline.split_clip(clip_id, at)
    }

    pub fn remove_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        self.timeline.remove_clip(clip_id)
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.timeline.check_invariants(&self.catalog)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

/// 1280x720 30fps preset.
pub fn preset_720p() -> NormalizeTarget {
    NormalizeTarget {
        width: 1280,
        height: 720,
        frame_rate: 30,
    }
}

/// 1920x1080 30fps preset.
pub fn preset_1080p() -> NormalizeTarget {
    NormalizeTarget {
        width: 1920,
        height: 1080,
        frame_rate: 30,
    }
}

/// 1080x1920 30fps (vertical/shorts) preset.
pub fn preset_shorts() -> NormalizeTarget {
    NormalizeTarget {
        width: 1080,
        height: 1920,
        frame_rate: 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn video(name: &str, secs: f64) -> MediaImport {
        MediaImport {
            name: name.to_string(),
            size_bytes: 2048,
            mime_type: "video/mp4".to_string(),
            locator: MediaLocator::new(format!("blob:{name}")),
            probe: ProbeMetadata {
                duration_secs: Some(secs),
                width: Some(1920),
                height: Some(1080),
                thumbnail: None,
            },
        }
    }

    #[test]
    fn remove_media_cascades_to_clips() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 150.0)).unwrap().id;
        let b = session.import_media(video("b.mp4", 10.0)).unwrap().id;
        let a1 = session.place_clip(a, TrackId(1)).unwrap().id;
        let b1 = session.place_clip(b, TrackId(2)).unwrap().id;
        let a2 = session.place_clip(a, TrackId(3)).unwrap().id;
        assert_eq!(session.timeline().total_duration(), TimeUs::from_seconds(150.0));

        let removed = session.remove_media(a);
        assert_eq!(removed, vec![a1, a2]);
        assert!(session.catalog().get(a).is_none());
        assert!(session.timeline().clip(b1).is_some());
        assert_eq!(session.timeline().total_duration(), TimeUs::from_seconds(120.0));
        session.check_invariants().unwrap();
    }

    #[test]
    fn remove_media_unknown_is_noop() {
        let mut session = Session::default();
        let before = session.clone();
        assert!(session.remove_media(MediaId(3)).is_empty());
        assert_eq!(session, before);
    }

    #[test]
    fn settings_drive_tracks_and_floor() {
        let settings = SessionSettings {
            min_duration: TimeUs::from_seconds(10.0),
            tracks: vec![TrackSpec::new("Only", TrackKind::Video)],
            export: preset_1080p(),
        };
        let session = Session::new(settings);
        assert_eq!(session.timeline().tracks().len(), 1);
        assert_eq!(session.timeline().total_duration(), TimeUs::from_seconds(10.0));
        assert_eq!(session.settings.export.width, 1920);
    }

    #[test]
    fn failed_edit_leaves_session_unchanged() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 5.0)).unwrap().id;
        let clip = session.place_clip(a, TrackId(1)).unwrap().id;
        let before = session.clone();

        assert!(matches!(
            session.trim_clip(clip, TimeUs::ZERO, TimeUs::from_seconds(6.0)),
            Err(CoreError::InvalidTrim(_))
        ));
        assert!(matches!(
            session.split_clip(clip, TimeUs::ZERO),
            Err(CoreError::OutOfBounds { .. })
        ));
        assert!(matches!(
            session.place_clip(a, TrackId(8)),
            Err(CoreError::UnknownTrack(_))
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn snapshot_serializes_as_json() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 5.0)).unwrap().id;
        session.place_clip(a, TrackId(1)).unwrap();

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(session, back);
    }

    #[test]
    fn preset_values_are_correct() {
        assert_eq!((preset_720p().width, preset_720p().height), (1280, 720));
        assert_eq!((preset_1080p().width, preset_1080p().height), (1920, 1080));
        assert_eq!((preset_shorts().width, preset_shorts().height), (1080, 1920));
        assert_eq!(preset_shorts().frame_rate, 30);
    }
}
