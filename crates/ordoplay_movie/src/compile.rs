// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiling keyframe curves into playback blocks.
//!
//! Curves that blend are sampled at a fixed rate into a single block, so
//! playback is an array lookup. Curves that can't blend become one constant
//! block per keyframe.

use crate::block::{Block, BlockData, SampleInterpolation, SamplesData};
use crate::error::{MovieError, Result};
use crate::clip::Clip;
use crate::keyframe::KeyframeCurve;
use crate::track::{Track, TrackId};

/// Samples per second used when nothing else is configured
pub const DEFAULT_SAMPLE_RATE: f32 = 30.0;

/// A block produced by the compiler, not yet added to a track
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBlock {
    /// Start time in seconds
    pub start_time: f32,
    /// Length in seconds; `None` extends to the end of the clip
    pub duration: Option<f32>,
    /// Block contents
    pub data: BlockData,
}

/// Compile a curve into blocks
pub fn compile(curve: &KeyframeCurve, sample_rate: f32) -> Result<Vec<CompiledBlock>> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(MovieError::InvalidSampleRate(sample_rate));
    }

    if curve.is_empty() {
        return Ok(Vec::new());
    }

    if curve.can_interpolate() {
        let duration = curve.duration();
        let sample_count = ((sample_rate * duration).ceil() as usize).max(1);

        let samples = (0..sample_count)
            .map(|i| curve.value_at(duration * i as f32 / sample_count as f32))
            .collect();

        return Ok(vec![CompiledBlock {
            start_time: 0.0,
            duration: Some(duration),
            data: BlockData::Samples(SamplesData::new(
                sample_rate,
                SampleInterpolation::Linear,
                samples,
            )),
        }]);
    }

    let keyframes = curve.keyframes();
    let blocks = keyframes
        .iter()
        .enumerate()
        .map(|(i, prev)| CompiledBlock {
            start_time: prev.time,
            duration: keyframes.get(i + 1).map(|next| next.time - prev.time),
            data: BlockData::Constant(prev.value.clone()),
        })
        .collect();

    Ok(blocks)
}

impl Track {
    /// Store `curve` as this track's keyframes and replace all blocks with
    /// its compiled form
    pub fn write_keyframes(&mut self, curve: KeyframeCurve, sample_rate: f32) -> Result<&[Block]> {
        if curve.value_type() != self.value_type() {
            return Err(MovieError::TypeMismatch {
                expected: self.value_type().clone(),
                actual: curve.value_type().clone(),
            });
        }

        let compiled = compile(&curve, sample_rate)?;

        // Keyframes may start before zero, which blocks can't
        if compiled.iter().any(|b| b.start_time < 0.0) {
            return Err(MovieError::InvalidBlockTime {
                start: compiled.iter().map(|b| b.start_time).fold(0.0, f32::min),
                duration: None,
            });
        }

        self.replace_blocks(
            compiled
                .into_iter()
                .map(|block| (block.start_time, block.duration, block.data)),
        )?;

        tracing::debug!(
            "Compiled {} keyframes on '{}' into {} blocks",
            curve.len(),
            self.name,
            self.block_count()
        );

        self.set_keyframes(curve);
        Ok(self.blocks())
    }
}

impl Clip {
    /// Compile `curve` onto the track with `track_id`
    pub fn write_keyframes(
        &mut self,
        track_id: TrackId,
        curve: KeyframeCurve,
        sample_rate: f32,
    ) -> Result<&[Block]> {
        self.track_mut(track_id)
            .ok_or(MovieError::TrackNotFound(track_id))?
            .write_keyframes(curve, sample_rate)
    }
}
