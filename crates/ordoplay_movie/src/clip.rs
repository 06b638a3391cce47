// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip containing a hierarchy of tracks.

use crate::block::Block;
use crate::error::{MovieError, Result};
use crate::keyframe::KeyframeCurve;
use crate::track::{Track, TrackId};
use crate::value::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current clip format version
pub const CLIP_FORMAT_VERSION: u32 = 1;

/// A timeline of tracks describing changing property values and actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "ClipModel", into = "ClipModel")]
pub struct Clip {
    /// All tracks, including nested ones, ordered by id
    tracks: BTreeMap<TrackId, Track>,
    /// Tracks without a parent, ordered by id
    root_tracks: Vec<TrackId>,
}

impl Clip {
    /// Create an empty clip
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new track, optionally nested under `parent`
    pub fn add_track(
        &mut self,
        name: impl Into<String>,
        value_type: ValueType,
        parent: Option<TrackId>,
    ) -> Result<TrackId> {
        let id = TrackId::new();
        self.insert_track(Track::new(id, name, value_type, parent))?;
        Ok(id)
    }

    fn insert_track(&mut self, track: Track) -> Result<()> {
        let id = track.id();
        if self.tracks.contains_key(&id) {
            return Err(MovieError::DuplicateTrack(id));
        }

        match track.parent {
            Some(parent_id) => {
                let parent = self
                    .tracks
                    .get_mut(&parent_id)
                    .ok_or(MovieError::InvalidHierarchy { parent: parent_id })?;
                insert_sorted(&mut parent.children, id);
            }
            None => insert_sorted(&mut self.root_tracks, id),
        }

        self.tracks.insert(id, track);
        Ok(())
    }

    /// Remove a track.
    ///
    /// Children are not removed: they stay in [`Clip::all_tracks`] but are no
    /// longer reachable from [`Clip::root_tracks`]. Remove them first if that
    /// isn't wanted.
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        let track = self.tracks.remove(&track_id)?;

        let siblings = match track.parent {
            Some(parent_id) => self.tracks.get_mut(&parent_id).map(|p| &mut p.children),
            None => Some(&mut self.root_tracks),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|id| *id != track_id);
        }

        Some(track)
    }

    /// Get a track
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&track_id)
    }

    /// Tracks at the root of the hierarchy, ordered by id
    pub fn root_tracks(&self) -> impl Iterator<Item = &Track> {
        self.root_tracks.iter().filter_map(|id| self.tracks.get(id))
    }

    /// All tracks including nested ones, ordered by id
    pub fn all_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Children of a track, ordered by id
    pub fn children(&self, track_id: TrackId) -> impl Iterator<Item = &Track> {
        self.tracks
            .get(&track_id)
            .map(|t| t.children())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.tracks.get(id))
    }

    /// Find a direct child of `parent` by name
    pub fn find_child(&self, parent: TrackId, name: &str) -> Option<&Track> {
        self.children(parent).find(|t| t.name == name)
    }

    /// Get track count, including nested tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Full name of a track, e.g. `Camera/Transform/Position`
    pub fn track_path(&self, track_id: TrackId) -> Option<String> {
        let mut track = self.tracks.get(&track_id)?;
        let mut parts = vec![track.name.as_str()];

        while let Some(parent) = track.parent().and_then(|id| self.tracks.get(&id)) {
            if parts.len() > self.tracks.len() {
                return None;
            }
            parts.push(parent.name.as_str());
            track = parent;
        }

        parts.reverse();
        Some(parts.join("/"))
    }

    /// How long this clip takes to fully play, in seconds
    pub fn duration(&self) -> f32 {
        self.tracks
            .values()
            .map(Track::duration)
            .fold(0.0, f32::max)
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> std::result::Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> std::result::Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Load a clip from a RON file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_ron(&content)?)
    }

    /// Save a clip to a RON file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = self.to_ron()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn insert_sorted(ids: &mut Vec<TrackId>, id: TrackId) {
    if let Err(idx) = ids.binary_search(&id) {
        ids.insert(idx, id);
    }
}

/// Flat, serialized form of a [`Clip`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipModel {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Every track, parents before children
    pub tracks: Vec<TrackModel>,
}

fn default_version() -> u32 {
    CLIP_FORMAT_VERSION
}

/// Serialized form of a [`Track`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackModel {
    /// Track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Parent track ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TrackId>,
    /// Playback blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Editable keyframes the blocks were compiled from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<KeyframeCurve>,
}

impl From<Clip> for ClipModel {
    fn from(clip: Clip) -> Self {
        let mut tracks = Vec::with_capacity(clip.tracks.len());
        let mut written = BTreeSet::new();

        // Orphans of removed parents are written as roots, their subtrees kept
        let orphans = clip
            .tracks
            .values()
            .filter(|t| t.parent().is_some_and(|p| !clip.tracks.contains_key(&p)))
            .map(Track::id);
        let tops: Vec<TrackId> = clip.root_tracks.iter().copied().chain(orphans).collect();

        for top in tops {
            // Depth-first so parents always precede children
            let mut pending = vec![top];
            while let Some(id) = pending.pop() {
                let Some(track) = clip.tracks.get(&id) else {
                    continue;
                };
                if !written.insert(id) {
                    continue;
                }
                pending.extend(track.children().iter().rev());

                let mut model = TrackModel::from(track);
                if id == top {
                    model.parent = None;
                }
                tracks.push(model);
            }
        }

        Self {
            version: CLIP_FORMAT_VERSION,
            tracks,
        }
    }
}

impl From<&Track> for TrackModel {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id(),
            name: track.name.clone(),
            value_type: track.value_type().clone(),
            parent: track.parent(),
            blocks: track.blocks().to_vec(),
            keyframes: track.keyframes().cloned(),
        }
    }
}

impl TryFrom<ClipModel> for Clip {
    type Error = MovieError;

    fn try_from(model: ClipModel) -> Result<Self> {
        if model.version > CLIP_FORMAT_VERSION {
            return Err(MovieError::Serialization(format!(
                "Clip version {} is newer than supported version {}",
                model.version, CLIP_FORMAT_VERSION
            )));
        }

        let mut clip = Clip::new();

        for model in model.tracks {
            let mut track = Track::new(model.id, model.name, model.value_type, model.parent);
            for block in model.blocks {
                track.insert_block(block)?;
            }
            if let Some(curve) = model.keyframes {
                track.set_keyframes(curve);
            }
            clip.insert_track(track)?;
        }

        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ActionData, BlockData, BlockId, SampleInterpolation, SamplesData};
    use crate::value::Value;

    #[test]
    fn test_empty_clip() {
        let clip = Clip::new();
        assert_eq!(clip.duration(), 0.0);
        assert_eq!(clip.track_count(), 0);
        assert_eq!(clip.root_tracks().count(), 0);
    }

    #[test]
    fn test_hierarchy() {
        let mut clip = Clip::new();
        let camera = clip.add_track("Camera", ValueType::Object, None).unwrap();
        let light = clip.add_track("Light", ValueType::Object, None).unwrap();
        let fov = clip.add_track("FieldOfView", ValueType::Float, Some(camera)).unwrap();

        assert_eq!(clip.track_count(), 3);
        assert_eq!(clip.root_tracks().count(), 2);
        assert_eq!(clip.track(fov).unwrap().parent(), Some(camera));
        assert_eq!(clip.track(camera).unwrap().children(), &[fov]);
        assert_eq!(clip.find_child(camera, "FieldOfView").unwrap().id(), fov);
        assert!(clip.find_child(light, "FieldOfView").is_none());
        assert_eq!(clip.track_path(fov).as_deref(), Some("Camera/FieldOfView"));

        // Deterministic ordering by id
        let ids: Vec<TrackId> = clip.all_tracks().map(Track::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        let roots: Vec<TrackId> = clip.root_tracks().map(Track::id).collect();
        assert!(roots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_foreign_parent() {
        let mut other = Clip::new();
        let foreign = other.add_track("Elsewhere", ValueType::Object, None).unwrap();

        let mut clip = Clip::new();
        let result = clip.add_track("Child", ValueType::Float, Some(foreign));
        assert_eq!(result, Err(MovieError::InvalidHierarchy { parent: foreign }));
        assert_eq!(clip.track_count(), 0);
    }

    #[test]
    fn test_remove_track() {
        let mut clip = Clip::new();
        let root = clip.add_track("Root", ValueType::Object, None).unwrap();
        let child = clip.add_track("Child", ValueType::Float, Some(root)).unwrap();

        let removed = clip.remove_track(child).unwrap();
        assert_eq!(removed.id(), child);
        assert!(clip.track(child).is_none());
        assert!(clip.all_tracks().all(|t| t.id() != child));
        assert!(clip.track(root).unwrap().children().is_empty());

        clip.remove_track(root).unwrap();
        assert_eq!(clip.root_tracks().count(), 0);
        assert!(clip.remove_track(root).is_none());
    }

    #[test]
    fn test_remove_parent_orphans_children() {
        let mut clip = Clip::new();
        let root = clip.add_track("Root", ValueType::Object, None).unwrap();
        let child = clip.add_track("Child", ValueType::Float, Some(root)).unwrap();

        clip.remove_track(root);
        assert!(clip.track(child).is_some());
        assert_eq!(clip.root_tracks().count(), 0);
        assert_eq!(clip.track(child).unwrap().parent(), Some(root));
    }

    #[test]
    fn test_duration() {
        let mut clip = Clip::new();
        let a = clip.add_track("A", ValueType::Float, None).unwrap();
        let b = clip.add_track("B", ValueType::Bool, None).unwrap();

        let track = clip.track_mut(a).unwrap();
        track
            .add_block(0.5, Some(2.0), BlockData::Constant(Value::Float(1.0)))
            .unwrap();
        let track = clip.track_mut(b).unwrap();
        track
            .add_block(0.0, Some(1.0), BlockData::Constant(Value::Bool(false)))
            .unwrap();
        track
            .add_block(4.0, None, BlockData::Constant(Value::Bool(true)))
            .unwrap();

        // Open-ended blocks count from their start only
        assert_eq!(clip.duration(), 4.0);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut clip = Clip::new();
        let object = clip.add_track("Door", ValueType::Object, None).unwrap();
        let hinge = clip
            .add_track("Hinge", ValueType::Component("Hinge".into()), Some(object))
            .unwrap();
        let angle = clip.add_track("Angle", ValueType::Float, Some(hinge)).unwrap();

        clip.track_mut(angle)
            .unwrap()
            .add_block(
                0.0,
                Some(1.0),
                BlockData::Samples(SamplesData::new(
                    2.0,
                    SampleInterpolation::Linear,
                    vec![Value::Float(0.0), Value::Float(45.0)],
                )),
            )
            .unwrap();
        clip.track_mut(object)
            .unwrap()
            .add_block(
                0.5,
                Some(0.25),
                BlockData::Action(ActionData::new("Creak").with_parameter("volume", "0.8")),
            )
            .unwrap();

        let ron_str = clip.to_ron().unwrap();
        let loaded = Clip::from_ron(&ron_str).unwrap();

        assert_eq!(loaded.track_count(), 3);
        assert_eq!(loaded.track(angle).unwrap().parent(), Some(hinge));
        assert_eq!(loaded.track(hinge).unwrap().children(), &[angle]);
        assert_eq!(loaded.track_path(angle), clip.track_path(angle));
        assert_eq!(
            loaded.track(angle).unwrap().blocks(),
            clip.track(angle).unwrap().blocks()
        );
        assert_eq!(
            loaded.track(object).unwrap().blocks(),
            clip.track(object).unwrap().blocks()
        );
        assert_eq!(loaded.duration(), clip.duration());
    }

    #[test]
    fn test_ron_round_trip_keeps_orphaned_subtree() {
        let mut clip = Clip::new();
        let root = clip.add_track("Root", ValueType::Object, None).unwrap();
        let mid = clip.add_track("Mid", ValueType::Object, Some(root)).unwrap();
        let leaf = clip.add_track("Leaf", ValueType::Float, Some(mid)).unwrap();
        let other = clip.add_track("Other", ValueType::Object, None).unwrap();
        clip.remove_track(root);

        let loaded = Clip::from_ron(&clip.to_ron().unwrap()).unwrap();

        assert_eq!(loaded.track_count(), 3);
        assert_eq!(loaded.track(mid).unwrap().parent(), None);
        assert_eq!(loaded.track(mid).unwrap().children(), &[leaf]);
        assert_eq!(loaded.track(leaf).unwrap().parent(), Some(mid));
        assert_eq!(loaded.track_path(leaf).as_deref(), Some("Mid/Leaf"));

        let mut roots: Vec<TrackId> = loaded.root_tracks().map(Track::id).collect();
        roots.sort();
        let mut expected = vec![mid, other];
        expected.sort();
        assert_eq!(roots, expected);
    }

    #[test]
    fn test_load_rejects_duplicate_track() {
        let a = TrackId::new();
        let b = TrackId::new();
        let track = |id, parent| TrackModel {
            id,
            name: "Loop".into(),
            value_type: ValueType::Object,
            parent,
            blocks: Vec::new(),
            keyframes: None,
        };

        // A second `a` under `b` would close a parent cycle
        let model = ClipModel {
            version: CLIP_FORMAT_VERSION,
            tracks: vec![track(a, None), track(b, Some(a)), track(a, Some(b))],
        };
        assert_eq!(
            Clip::try_from(model).unwrap_err(),
            MovieError::DuplicateTrack(a)
        );
    }

    #[test]
    fn test_load_rejects_last_block_id() {
        let model = ClipModel {
            version: CLIP_FORMAT_VERSION,
            tracks: vec![TrackModel {
                id: TrackId::new(),
                name: "Height".into(),
                value_type: ValueType::Float,
                parent: None,
                blocks: vec![Block {
                    id: BlockId(u32::MAX),
                    start_time: 0.0,
                    duration: Some(1.0),
                    data: BlockData::Constant(Value::Float(1.0)),
                }],
                keyframes: None,
            }],
        };
        let text = ron::ser::to_string(&model).unwrap();

        assert!(Clip::from_ron(&text).is_err());
        assert_eq!(
            Clip::try_from(model).unwrap_err(),
            MovieError::InvalidBlockId(BlockId(u32::MAX))
        );
    }

    #[test]
    fn test_load_keeps_error_source() {
        let dir = std::env::temp_dir().join(format!("ordoplay_movie_{}", uuid::Uuid::new_v4()));
        let missing = dir.join("missing.clip.ron");

        let err = Clip::load(&missing).unwrap_err();
        let MovieError::Io(io) = &err else {
            panic!("expected an I/O error, got {err:?}");
        };
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
        assert!(std::error::Error::source(&err).is_some());

        std::fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.clip.ron");
        std::fs::write(&broken, "(tracks: [").unwrap();
        assert!(matches!(Clip::load(&broken), Err(MovieError::Parse(_))));

        let saved = dir.join("saved.clip.ron");
        let mut clip = Clip::new();
        clip.add_track("Door", ValueType::Object, None).unwrap();
        clip.save(&saved).unwrap();
        assert_eq!(Clip::load(&saved).unwrap().track_count(), 1);
        assert!(matches!(
            clip.save(&dir.join("absent").join("clip.ron")),
            Err(MovieError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_rejects_unknown_parent() {
        let model = ClipModel {
            version: CLIP_FORMAT_VERSION,
            tracks: vec![TrackModel {
                id: TrackId::new(),
                name: "Lost".into(),
                value_type: ValueType::Float,
                parent: Some(TrackId::new()),
                blocks: Vec::new(),
                keyframes: None,
            }],
        };
        assert!(matches!(
            Clip::try_from(model),
            Err(MovieError::InvalidHierarchy { .. })
        ));
    }
}
