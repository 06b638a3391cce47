// SPDX-License-Identifier: MIT OR Apache-2.0
//! Movie clips for `OrdoPlay`.
//!
//! This crate provides timeline playback of scene properties:
//! - Hierarchical tracks holding time-ordered blocks
//! - Keyframe curves compiled into playback blocks
//! - Binding tracks to objects, components and their members
//! - A player with looping, clamping and one-shot actions
//!
//! ## Architecture
//!
//! The movie system is built on:
//! - A clip owning every track, linked by id
//! - Closed value and block data types
//! - A [`Scene`] trait implemented by the host
//! - A two-tier binding cache resolved lazily from parent tracks

pub mod value;
pub mod keyframe;
pub mod block;
pub mod track;
pub mod clip;
pub mod compile;
pub mod binding;
pub mod scene;
pub mod memory;
pub mod playback;
pub mod player;
pub mod settings;
mod error;

pub use value::{Interpolator, Value, ValueType};
pub use keyframe::{Keyframe, KeyframeCurve, KeyframeInterpolation};
pub use block::{ActionData, Block, BlockData, BlockId, SampleInterpolation, SamplesData};
pub use track::{BlockMut, Track, TrackId};
pub use clip::{Clip, CLIP_FORMAT_VERSION};
pub use compile::{compile, CompiledBlock, DEFAULT_SAMPLE_RATE};
pub use binding::{Binding, BindingMapping, BindingSet, ComponentId, MemberBinding, ObjectId, SceneRef};
pub use scene::Scene;
pub use memory::{DispatchedAction, MemoryScene};
pub use playback::{apply_frame, ActionTracker, FrameReport};
pub use player::{MoviePlayer, PlaybackState};
pub use settings::{MovieSettings, SETTINGS_FORMAT_VERSION};
pub use error::{IoError, MovieError, Result};
