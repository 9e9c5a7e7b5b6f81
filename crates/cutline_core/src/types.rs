use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

/// A position or length on either the timeline or a media item's own
/// timebase, in whole microseconds.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    /// Largest position or length the timeline accepts. The sum of any two
    /// in-range values still fits in an `i64`.
    pub const MAX: Self = Self(i64::MAX / 4);

    /// Convert from seconds, rounding to the nearest microsecond. Saturates
    /// out-of-range input; use [`TimeUs::try_from_seconds`] for untrusted
    /// values.
    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    /// Like [`TimeUs::from_seconds`], but `None` for NaN, infinities and
    /// magnitudes beyond [`TimeUs::MAX`].
    pub fn try_from_seconds(s: f64) -> Option<Self> {
        if !s.is_finite() {
            return None;
        }
        let us = (s * 1_000_000.0).round();
        if us.abs() > Self::MAX.0 as f64 {
            return None;
        }
        Some(Self(us as i64))
    }

    pub fn is_in_range(&self) -> bool {
        self.0.abs() <= Self::MAX.0
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

typed_id!(
    /// Identity of one catalog entry.
    MediaId(u64),
    "media"
);
typed_id!(
    /// Identity of one clip placement. Survives moves and trims; the left half
    /// of a split keeps it.
    ClipId(u64),
    "clip"
);
typed_id!(
    /// 1-based track number, in creation order.
    TrackId(u32),
    "track"
);

/// Monotonic id source. Ids handed out by one allocator are never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Classify a declared MIME type. Only `video/*` and `audio/*` are
    /// supported.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let (top, sub) = mime.split_once('/')?;
        if sub.is_empty() {
            return None;
        }
        match top.to_ascii_lowercase().as_str() {
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MediaLocator
// ---------------------------------------------------------------------------

/// How to fetch a media item's raw bytes. Owned by the ingestion side and
/// never interpreted by the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MediaLocator(pub String);

impl MediaLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ProbeMetadata / MediaImport
// ---------------------------------------------------------------------------

/// Results of probing a source file, as reported by ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProbeMetadata {
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<String>,
}

/// Everything ingestion hands over when registering a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaImport {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub locator: MediaLocator,
    #[serde(default)]
    pub probe: ProbeMetadata,
}

// ---------------------------------------------------------------------------
// MediaReference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaReference {
    pub id: MediaId,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub kind: MediaKind,
    pub duration: TimeUs,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<String>,
    pub locator: MediaLocator,
}

// ---------------------------------------------------------------------------
// TrackKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A trimmed window `[trim_start, trim_end)` of one media item, placed at
/// `start` on one track. `duration == trim_end - trim_start` always.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub media_id: MediaId,
    pub track_id: TrackId,
    pub name: String,
    pub start: TimeUs,
    pub duration: TimeUs,
    pub trim_start: TimeUs,
    pub trim_end: TimeUs,
}

impl Clip {
    pub fn end(&self) -> TimeUs {
        self.start + self.duration
    }

    /// Half-open interval intersection on the timeline.
    pub fn overlaps(&self, other: &Clip) -> bool {
        spans_overlap(self.start, self.end(), other.start, other.end())
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub(crate) fn spans_overlap(a_start: TimeUs, a_end: TimeUs, b_start: TimeUs, b_end: TimeUs) -> bool {
    a_start < b_end && b_start < a_end
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    /// Sorted by `start`, pairwise non-overlapping.
    pub clips: Vec<Clip>,
}

impl Track {
    /// End of the last clip, or zero for an empty track.
    pub fn end(&self) -> TimeUs {
        self.clips.last().map(Clip::end).unwrap_or(TimeUs::ZERO)
    }
}

/// Name and kind of a track created at session start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackSpec {
    pub name: String,
    pub kind: TrackKind,
}

impl TrackSpec {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Two video lanes and one audio lane.
pub fn default_track_specs() -> Vec<TrackSpec> {
    vec![
        TrackSpec::new("Video Track 1", TrackKind::Video),
        TrackSpec::new("Video Track 2", TrackKind::Video),
        TrackSpec::new("Audio Track 1", TrackKind::Audio),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
