//! Registry of imported source media.

use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Emitted when a media item leaves the catalog. The timeline reacts by
/// dropping every clip that references `media_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRemoved {
    pub media_id: MediaId,
    pub locator: MediaLocator,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaCatalog {
    entries: Vec<MediaReference>,
    ids: IdAllocator,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probed source. Duration is mandatory; dimensions and
    /// thumbnail may arrive later through [`attach_visual_metadata`].
    ///
    /// [`attach_visual_metadata`]: MediaCatalog::attach_visual_metadata
    pub fn register(&mut self, import: MediaImport) -> Result<MediaReference> {
        let kind = MediaKind::from_mime(&import.mime_type).ok_or_else(|| {
            CoreError::InvalidMedia(format!(
                "{}: unsupported media type {:?}",
                import.name, import.mime_type
            ))
        })?;

        let duration = match import.probe.duration_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => match TimeUs::try_from_seconds(secs) {
                Some(d) => d,
                None => {
                    return Err(CoreError::InvalidMedia(format!(
                        "{}: duration {secs}s is out of range",
                        import.name
                    )))
                }
            },
            _ => return Err(CoreError::ProbeIncomplete(import.name)),
        };
        // Sub-microsecond durations round to nothing.
        if duration.0 <= 0 {
            return Err(CoreError::ProbeIncomplete(import.name));
        }

        check_dimension(&import.name, "width", import.probe.width)?;
        check_dimension(&import.name, "height", import.probe.height)?;

        let media = MediaReference {
            id: MediaId(self.ids.next_raw()),
            name: import.name,
            size_bytes: import.size_bytes,
            mime_type: import.mime_type,
            kind,
            duration,
            width: import.probe.width,
            height: import.probe.height,
            thumbnail: import.probe.thumbnail,
            locator: import.locator,
        };

        tracing::info!(
            media = %media.id,
            name = %media.name,
            duration = %media.duration,
            "media registered"
        );
        self.entries.push(media.clone());
        Ok(media)
    }

    /// Fill in optional visual metadata. Each field may go from absent to
    /// present once; setting an already-present field is rejected and nothing
    /// is written.
    pub fn attach_visual_metadata(
        &mut self,
        id: MediaId,
        width: Option<u32>,
        height: Option<u32>,
        thumbnail: Option<String>,
    ) -> Result<&MediaReference> {
        let media = self
            .entries
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(CoreError::UnknownMedia(id))?;

        check_dimension(&media.name, "width", width)?;
        check_dimension(&media.name, "height", height)?;
        for (field, incoming, present) in [
            ("width", width.is_some(), media.width.is_some()),
            ("height", height.is_some(), media.height.is_some()),
            ("thumbnail", thumbnail.is_some(), media.thumbnail.is_some()),
        ] {
            if incoming && present {
                return Err(CoreError::InvalidMedia(format!(
                    "{}: {field} is already set",
                    media.name
                )));
            }
        }

        if width.is_some() {
            media.width = width;
        }
        if height.is_some() {
            media.height = height;
        }
        if thumbnail.is_some() {
            media.thumbnail = thumbnail;
        }
        Ok(media)
    }

    /// Remove a media item. Unknown ids are a no-op and yield `None`.
    pub fn remove(&mut self, id: MediaId) -> Option<MediaRemoved> {
        let pos = self.entries.iter().position(|m| m.id == id)?;
        let media = self.entries.remove(pos);
        tracing::info!(media = %media.id, name = %media.name, "media removed");
        Some(MediaRemoved {
            media_id: media.id,
            locator: media.locator,
        })
    }

    pub fn get(&self, id: MediaId) -> Option<&MediaReference> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MediaId) -> bool {
        self.get(id).is_some()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MediaReference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_dimension(name: &str, field: &str, value: Option<u32>) -> Result<()> {
    if value == Some(0) {
        return Err(CoreError::InvalidMedia(format!(
            "{name}: {field} must be positive"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(name: &str, mime: &str, duration: Option<f64>) -> MediaImport {
        MediaImport {
            name: name.to_string(),
            size_bytes: 1024,
            mime_type: mime.to_string(),
            locator: MediaLocator::new(format!("/media/{name}")),
            probe: ProbeMetadata {
                duration_secs: duration,
                ..Default::default()
            },
        }
    }

    #[test]
    fn register_assigns_increasing_ids() {
        let mut catalog = MediaCatalog::new();
        let a = catalog.register(import("a.mp4", "video/mp4", Some(10.0))).unwrap();
        let b = catalog.register(import("b.mp3", "audio/mpeg", Some(3.0))).unwrap();
        assert_eq!(a.id, MediaId(1));
        assert_eq!(b.id, MediaId(2));
        assert_eq!(a.kind, MediaKind::Video);
        assert_eq!(b.kind, MediaKind::Audio);
        assert_eq!(a.duration, TimeUs(10_000_000));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn register_rejects_unsupported_type() {
        let mut catalog = MediaCatalog::new();
        let err = catalog
            .register(import("logo.png", "image/png", Some(1.0)))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMedia(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn register_requires_duration() {
        let mut catalog = MediaCatalog::new();
        for bad in [None, Some(0.0), Some(-1.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let err = catalog.register(import("a.mp4", "video/mp4", bad)).unwrap_err();
            assert!(matches!(err, CoreError::ProbeIncomplete(_)), "{bad:?}");
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn register_rejects_duration_beyond_timeline_limit() {
        let mut catalog = MediaCatalog::new();
        let err = catalog
            .register(import("a.mp4", "video/mp4", Some(1e300)))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMedia(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn register_rejects_zero_dimensions() {
        let mut catalog = MediaCatalog::new();
        let mut imp = import("a.mp4", "video/mp4", Some(1.0));
        imp.probe.width = Some(0);
        assert!(matches!(
            catalog.register(imp).unwrap_err(),
            CoreError::InvalidMedia(_)
        ));
    }

    #[test]
    fn attach_visual_metadata_fills_absent_fields_once() {
        let mut catalog = MediaCatalog::new();
        let id = catalog.register(import("a.mp4", "video/mp4", Some(4.0))).unwrap().id;

        let media = catalog
            .attach_visual_metadata(id, Some(1920), Some(1080), None)
            .unwrap();
        assert_eq!(media.width, Some(1920));
        assert_eq!(media.height, Some(1080));
        assert_eq!(media.thumbnail, None);

        catalog
            .attach_visual_metadata(id, None, None, Some("thumb-1".into()))
            .unwrap();
        assert_eq!(catalog.get(id).unwrap().thumbnail.as_deref(), Some("thumb-1"));

        // Second write to width is rejected.
        let err = catalog
            .attach_visual_metadata(id, Some(1280), None, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMedia(_)));
        assert_eq!(catalog.get(id).unwrap().width, Some(1920));
    }

    #[test]
    fn attach_visual_metadata_rejects_partially_conflicting_call_atomically() {
        let mut catalog = MediaCatalog::new();
        let mut imp = import("a.mp4", "video/mp4", Some(4.0));
        imp.probe.thumbnail = Some("t".into());
        let id = catalog.register(imp).unwrap().id;

        let err = catalog
            .attach_visual_metadata(id, Some(640), Some(480), Some("t2".into()))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMedia(_)));
        let media = catalog.get(id).unwrap();
        assert_eq!(media.width, None);
        assert_eq!(media.height, None);
        assert_eq!(media.thumbnail.as_deref(), Some("t"));
    }

    #[test]
    fn attach_visual_metadata_unknown_media() {
        let mut catalog = MediaCatalog::new();
        let err = catalog
            .attach_visual_metadata(MediaId(99), Some(1), Some(1), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownMedia(MediaId(99))));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut catalog = MediaCatalog::new();
        let id = catalog.register(import("a.mp4", "video/mp4", Some(4.0))).unwrap().id;

        let event = catalog.remove(id).unwrap();
        assert_eq!(event.media_id, id);
        assert_eq!(event.locator.as_str(), "/media/a.mp4");
        assert!(catalog.get(id).is_none());

        assert!(catalog.remove(id).is_none());
        assert!(catalog.remove(MediaId(42)).is_none());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut catalog = MediaCatalog::new();
        let a = catalog.register(import("a.mp4", "video/mp4", Some(1.0))).unwrap().id;
        catalog.remove(a);
        let b = catalog.register(import("b.mp4", "video/mp4", Some(1.0))).unwrap().id;
        assert_ne!(a, b);
    }
}
