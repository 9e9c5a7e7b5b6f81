use crate::error::{RenderError, Result};
use cutline_core::catalog::MediaCatalog;
use cutline_core::session::{NormalizeTarget, Session};
use cutline_core::timeline::Timeline;
use cutline_core::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name of an intermediate artifact produced by a [`TrimStep`] and consumed
/// by the final [`ConcatStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub usize);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg{}", self.0)
    }
}

/// Cut `[trim_start, trim_end)` out of one source and re-encode it to the
/// plan's normalize target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimStep {
    pub clip_id: ClipId,
    pub media_id: MediaId,
    pub source: MediaLocator,
    pub trim_start: TimeUs,
    pub trim_end: TimeUs,
    pub normalize: NormalizeTarget,
    pub output: SegmentId,
}

impl TrimStep {
    pub fn duration(&self) -> TimeUs {
        self.trim_end - self.trim_start
    }
}

/// Join segments, in order, into the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatStep {
    pub segments: Vec<SegmentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RenderStep {
    Trim(TrimStep),
    Concat(ConcatStep),
}

/// An ordered export program: one trim step per exported clip, followed by a
/// single concat step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub steps: Vec<RenderStep>,
    pub target: NormalizeTarget,
}

impl RenderPlan {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn trim_steps(&self) -> impl Iterator<Item = &TrimStep> {
        self.steps.iter().filter_map(|s| match s {
            RenderStep::Trim(t) => Some(t),
            RenderStep::Concat(_) => None,
        })
    }

    /// Segment ids in concat order.
    pub fn segments(&self) -> Vec<SegmentId> {
        self.trim_steps().map(|t| t.output).collect()
    }

    /// Every media item the plan reads from.
    pub fn media_ids(&self) -> BTreeSet<MediaId> {
        self.trim_steps().map(|t| t.media_id).collect()
    }

    /// Sum of the segment durations, i.e. the length of the exported video.
    pub fn output_duration(&self) -> TimeUs {
        self.trim_steps()
            .map(TrimStep::duration)
            .fold(TimeUs::ZERO, |acc, d| acc + d)
    }

    /// Fail if any media the plan reads from has since left the catalog.
    pub fn ensure_fresh(&self, catalog: &MediaCatalog) -> Result<()> {
        match self.media_ids().into_iter().find(|id| !catalog.contains(*id)) {
            Some(id) => Err(RenderError::StalePlan(id)),
            None => Ok(()),
        }
    }
}

/// Compile the session's timeline into a render plan.
///
/// Clips on video tracks are exported back to back in order of timeline
/// start; gaps and layering are not represented. Audio tracks are ignored.
pub fn compile(session: &Session) -> Result<RenderPlan> {
    compile_timeline(
        session.timeline(),
        session.catalog(),
        &session.settings.export,
    )
}

pub fn compile_timeline(
    timeline: &Timeline,
    catalog: &MediaCatalog,
    target: &NormalizeTarget,
) -> Result<RenderPlan> {
    let mut video_clips: Vec<&Clip> = timeline
        .tracks()
        .iter()
        .filter(|t| t.kind == TrackKind::Video)
        .flat_map(|t| t.clips.iter())
        .collect();

    if video_clips.is_empty() {
        return Err(RenderError::NoExportableContent);
    }

    // Stable: equal starts keep track creation order.
    video_clips.sort_by_key(|c| c.start);

    let mut steps = Vec::with_capacity(video_clips.len() + 1);
    for (i, clip) in video_clips.iter().enumerate() {
        let media = catalog
            .get(clip.media_id)
            .ok_or(RenderError::UnknownMedia(clip.media_id))?;
        steps.push(RenderStep::Trim(TrimStep {
            clip_id: clip.id,
            media_id: clip.media_id,
            source: media.locator.clone(),
            trim_start: clip.trim_start,
            trim_end: clip.trim_end,
            normalize: target.clone(),
            output: SegmentId(i),
        }));
    }
    let segments = (0..video_clips.len()).map(SegmentId).collect();
    steps.push(RenderStep::Concat(ConcatStep { segments }));

    let plan = RenderPlan {
        steps,
        target: target.clone(),
    };
    tracing::info!(
        steps = plan.step_count(),
        duration = %plan.output_duration(),
        width = target.width,
        height = target.height,
        "compiled render plan"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_core::session::SessionSettings;

    fn video(name: &str, secs: f64) -> MediaImport {
        MediaImport {
            name: name.to_string(),
            size_bytes: 1024,
            mime_type: "video/mp4".to_string(),
            locator: MediaLocator::new(format!("/media/{name}")),
            probe: ProbeMetadata {
                duration_secs: Some(secs),
                width: Some(1920),
                height: Some(1080),
                thumbnail: None,
            },
        }
    }

    fn secs(s: f64) -> TimeUs {
        TimeUs::from_seconds(s)
    }

    #[test]
    fn compile_empty_session_returns_no_content() {
        let session = Session::default();
        assert!(matches!(
            compile(&session),
            Err(RenderError::NoExportableContent)
        ));
    }

    #[test]
    fn compile_one_trimmed_clip() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 10.0)).unwrap().id;
        let clip = session.place_clip(a, TrackId(1)).unwrap().id;
        session.trim_clip(clip, secs(2.0), secs(7.0)).unwrap();

        let plan = compile(&session).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                RenderStep::Trim(TrimStep {
                    clip_id: clip,
                    media_id: a,
                    source: MediaLocator::new("/media/a.mp4"),
                    trim_start: secs(2.0),
                    trim_end: secs(7.0),
                    normalize: session.settings.export.clone(),
                    output: SegmentId(0),
                }),
                RenderStep::Concat(ConcatStep {
                    segments: vec![SegmentId(0)],
                }),
            ]
        );
        assert_eq!(plan.output_duration(), secs(5.0));
    }

    #[test]
    fn compile_orders_by_timeline_start_across_tracks() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        let b = session.import_media(video("b.mp4", 6.0)).unwrap().id;
        // a at 0..4 on track 1, then 10..14; b at 5..11 on track 2.
        let a1 = session.place_clip(a, TrackId(1)).unwrap().id;
        let a2 = session.place_clip(a, TrackId(1)).unwrap().id;
        session.move_clip(a2, secs(10.0)).unwrap();
        let b1 = session.place_clip(b, TrackId(2)).unwrap().id;
        session.move_clip(b1, secs(5.0)).unwrap();

        let plan = compile(&session).unwrap();
        let order: Vec<ClipId> = plan.trim_steps().map(|t| t.clip_id).collect();
        assert_eq!(order, vec![a1, b1, a2]);
        assert_eq!(plan.step_count(), 4);
        assert_eq!(
            plan.segments(),
            vec![SegmentId(0), SegmentId(1), SegmentId(2)]
        );
    }

    #[test]
    fn compile_equal_starts_keep_track_order() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        let b = session.import_media(video("b.mp4", 4.0)).unwrap().id;
        let on_track2 = session.place_clip(b, TrackId(2)).unwrap().id;
        let on_track1 = session.place_clip(a, TrackId(1)).unwrap().id;

        let plan = compile(&session).unwrap();
        let order: Vec<ClipId> = plan.trim_steps().map(|t| t.clip_id).collect();
        assert_eq!(order, vec![on_track1, on_track2]);
    }

    #[test]
    fn compile_ignores_audio_tracks() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        session.place_clip(a, TrackId(3)).unwrap();
        assert!(matches!(
            compile(&session),
            Err(RenderError::NoExportableContent)
        ));
    }

    #[test]
    fn compile_uses_session_export_target() {
        let mut settings = SessionSettings::default();
        settings.export = NormalizeTarget {
            width: 640,
            height: 360,
            frame_rate: 24,
        };
        let mut session = Session::new(settings);
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        session.place_clip(a, TrackId(1)).unwrap();

        let plan = compile(&session).unwrap();
        let step = plan.trim_steps().next().unwrap();
        assert_eq!(step.normalize.width, 640);
        assert_eq!(step.normalize.frame_rate, 24);
        assert_eq!(plan.target, step.normalize);
    }

    #[test]
    fn compile_missing_media_returns_error() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        session.place_clip(a, TrackId(1)).unwrap();

        let empty = MediaCatalog::new();
        let err = compile_timeline(session.timeline(), &empty, &session.settings.export)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownMedia(id) if id == a));
    }

    #[test]
    fn plan_goes_stale_when_media_removed() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        let b = session.import_media(video("b.mp4", 4.0)).unwrap().id;
        session.place_clip(a, TrackId(1)).unwrap();
        session.place_clip(b, TrackId(1)).unwrap();

        let plan = compile(&session).unwrap();
        assert!(plan.ensure_fresh(session.catalog()).is_ok());
        assert_eq!(plan.media_ids().into_iter().collect::<Vec<_>>(), vec![a, b]);

        session.remove_media(b);
        assert!(matches!(
            plan.ensure_fresh(session.catalog()),
            Err(RenderError::StalePlan(id)) if id == b
        ));
    }

    #[test]
    fn segment_ids_display() {
        assert_eq!(SegmentId(3).to_string(), "seg3");
    }

    #[test]
    fn plan_serializes_with_step_tags() {
        let mut session = Session::default();
        let a = session.import_media(video("a.mp4", 4.0)).unwrap().id;
        session.place_clip(a, TrackId(1)).unwrap();
        let plan = compile(&session).unwrap();

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["steps"][0]["step"], "trim");
        assert_eq!(json["steps"][1]["step"], "concat");
        let back: RenderPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
