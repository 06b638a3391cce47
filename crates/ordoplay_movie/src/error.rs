// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for movie clips, compilation and playback.

use crate::binding::{ComponentId, ObjectId};
use crate::block::BlockId;
use crate::track::TrackId;
use crate::value::ValueType;
use std::sync::Arc;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MovieError>;

/// Error raised by clip editing, compilation, binding or playback
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MovieError {
    /// Tried to parent a track to one that isn't part of this clip
    #[error("Can't parent to track {parent} from a different clip")]
    InvalidHierarchy {
        /// The rejected parent
        parent: TrackId,
    },

    /// Track id already used in this clip
    #[error("Duplicate track id: {0}")]
    DuplicateTrack(TrackId),

    /// Track not found in the clip
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Block not found on the track
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    /// Block id leaves no room for the next one on its track
    #[error("Block id out of range: {0}")]
    InvalidBlockId(BlockId),

    /// Track has no resolvable property
    #[error("Track {0} has no bound property")]
    UnresolvedBinding(TrackId),

    /// Value type disagrees with the declared type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared type
        expected: ValueType,
        /// Type that was supplied
        actual: ValueType,
    },

    /// Block data the current host can't play back
    #[error("Unsupported block data: {0}")]
    UnsupportedBlockData(&'static str),

    /// Curve has no keyframes
    #[error("Curve has no keyframes")]
    EmptyCurve,

    /// A block would claim time already claimed by another block
    #[error("Block starting at {start} overlaps an existing block")]
    BlockOverlap {
        /// Start time of the rejected block
        start: f32,
    },

    /// Negative or non-finite block timing
    #[error("Invalid block timing: start {start}, duration {duration:?}")]
    InvalidBlockTime {
        /// Requested start time
        start: f32,
        /// Requested duration
        duration: Option<f32>,
    },

    /// Keyframe time is not a finite number
    #[error("Invalid keyframe time: {0}")]
    InvalidKeyframeTime(f32),

    /// Sample rate must be finite and positive
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Scene reference bindings can't be assigned
    #[error("Binding is read-only")]
    ReadOnlyBinding,

    /// Named member doesn't exist on the target
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Scene object doesn't exist
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Scene component doesn't exist
    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// Player has no clip to operate on
    #[error("No movie clip assigned")]
    NoClip,

    /// Clip file couldn't be read or written
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Clip text isn't valid RON or doesn't describe a valid clip
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Clip couldn't be written as RON
    #[error("Format error: {0}")]
    Format(#[from] ron::Error),

    /// Clip data is well-formed but can't be used
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for MovieError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError(Arc::new(err)))
    }
}

/// Shared [`std::io::Error`], compared by kind and message
#[derive(Debug, Clone, thiserror::Error)]
#[error(transparent)]
pub struct IoError(Arc<std::io::Error>);

impl IoError {
    /// Kind of the underlying error
    pub fn kind(&self) -> std::io::ErrorKind {
        self.0.kind()
    }
}

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.0.to_string() == other.0.to_string()
    }
}
