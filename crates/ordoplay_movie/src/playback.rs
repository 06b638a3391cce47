// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluating a clip at a point in time and applying it to a scene.

use crate::binding::BindingSet;
use crate::block::{BlockData, BlockId};
use crate::clip::Clip;
use crate::error::MovieError;
use crate::scene::Scene;
use crate::track::{Track, TrackId};
use std::collections::HashMap;

/// What happened while applying one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Time that was applied
    pub time: f32,
    /// Tracks whose value was written to the scene
    pub applied: Vec<TrackId>,
    /// Tracks with no usable binding
    pub unresolved: Vec<TrackId>,
    /// Action blocks that fired this frame
    pub fired: Vec<(TrackId, BlockId)>,
    /// Action blocks the scene couldn't run
    pub unsupported: Vec<(TrackId, BlockId)>,
    /// Tracks whose value couldn't be written
    pub failed: Vec<(TrackId, MovieError)>,
}

impl FrameReport {
    /// Whether every track either applied cleanly or had nothing to do
    pub fn is_clean(&self) -> bool {
        self.unsupported.is_empty() && self.failed.is_empty()
    }
}

/// Remembers which action block each track was in on the last frame, so an
/// action fires once when its block is entered.
#[derive(Debug, Clone, Default)]
pub struct ActionTracker {
    active: HashMap<TrackId, BlockId>,
}

impl ActionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `block` active on `track`. Returns true if it wasn't already.
    pub fn enter(&mut self, track: TrackId, block: BlockId) -> bool {
        self.active.insert(track, block) != Some(block)
    }

    /// Mark no action block active on `track`
    pub fn leave(&mut self, track: TrackId) {
        self.active.remove(&track);
    }

    /// Forget all active blocks, so the next frame fires again
    pub fn reset(&mut self) {
        self.active.clear();
    }
}

/// Evaluate every track of `clip` at `time` and write the results to `scene`.
///
/// Tracks are visited root first in id order, each parent before its
/// children, so a child can resolve against the value its parent just
/// received. Failures are collected in the report and never stop the pass.
pub fn apply_frame(
    clip: &Clip,
    bindings: &mut BindingSet,
    scene: &mut dyn Scene,
    actions: &mut ActionTracker,
    time: f32,
) -> FrameReport {
    let mut frame = Frame {
        clip,
        bindings,
        scene,
        actions,
        report: FrameReport {
            time,
            ..FrameReport::default()
        },
    };

    for track in clip.root_tracks() {
        frame.apply_track(track, time);
    }

    frame.report
}

struct Frame<'a> {
    clip: &'a Clip,
    bindings: &'a mut BindingSet,
    scene: &'a mut dyn Scene,
    actions: &'a mut ActionTracker,
    report: FrameReport,
}

impl Frame<'_> {
    fn apply_track(&mut self, track: &Track, time: f32) {
        self.apply_value(track, time);

        let clip = self.clip;
        // Children may still resolve on their own
        for child in track.children() {
            if let Some(child) = clip.track(*child) {
                self.apply_track(child, time);
            }
        }
    }

    fn apply_value(&mut self, track: &Track, time: f32) {
        let track_id = track.id();

        let Some(binding) = self
            .bindings
            .get_or_auto_resolve(self.clip, track, &*self.scene)
        else {
            self.actions.leave(track_id);
            self.report.unresolved.push(track_id);
            return;
        };

        let Some(block) = track.block_at(time) else {
            self.actions.leave(track_id);
            return;
        };

        match &block.data {
            BlockData::Action(action) => {
                // Not entered until there is something to fire on
                let Some(target) = binding.get(&*self.scene) else {
                    self.actions.leave(track_id);
                    self.report.unresolved.push(track_id);
                    return;
                };

                if !self.actions.enter(track_id, block.id) {
                    return;
                }

                match self.scene.dispatch_action(&target, action) {
                    Ok(()) => {
                        tracing::debug!("Fired '{}' on '{}'", action.event, track.name);
                        self.report.fired.push((track_id, block.id));
                    }
                    Err(MovieError::UnsupportedBlockData(kind)) => {
                        tracing::warn!(
                            "Scene can't play {} block {} on '{}'",
                            kind,
                            block.id,
                            self.track_label(track)
                        );
                        self.report.unsupported.push((track_id, block.id));
                    }
                    Err(err) => {
                        tracing::warn!("Action on '{}' failed: {}", self.track_label(track), err);
                        self.report.failed.push((track_id, err));
                    }
                }
            }
            _ => {
                self.actions.leave(track_id);

                let Some(value) = block.value_at(time) else {
                    return;
                };

                match binding.set(&mut *self.scene, value) {
                    Ok(()) => {
                        tracing::trace!("Applied '{}' at {}", track.name, time);
                        self.report.applied.push(track_id);
                    }
                    Err(err) => {
                        tracing::warn!("Can't apply '{}': {}", self.track_label(track), err);
                        self.report.failed.push((track_id, err));
                    }
                }
            }
        }
    }

    fn track_label(&self, track: &Track) -> String {
        self.clip
            .track_path(track.id())
            .unwrap_or_else(|| track.name.clone())
    }
}
