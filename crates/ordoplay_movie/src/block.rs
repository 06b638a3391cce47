// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-ranged blocks of playback data on a track.

use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a block, unique within its track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a sample array is read between samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleInterpolation {
    /// Closest sample
    Nearest,
    /// Blend the two neighbouring samples
    #[default]
    Linear,
}

/// Values pre-evaluated at a fixed rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplesData {
    /// Samples per second
    pub sample_rate: f32,
    /// Reading mode between samples
    pub interpolation: SampleInterpolation,
    /// Sample values, starting at the block start
    pub samples: Vec<Value>,
}

impl SamplesData {
    /// Create sample data
    pub fn new(sample_rate: f32, interpolation: SampleInterpolation, samples: Vec<Value>) -> Self {
        Self {
            sample_rate,
            interpolation,
            samples,
        }
    }

    /// Value at `offset` seconds from the block start, clamped to the array
    pub fn sample(&self, offset: f32) -> Option<Value> {
        let last = self.samples.len().checked_sub(1)?;
        let position = (offset * self.sample_rate).clamp(0.0, last as f32);

        match self.interpolation {
            SampleInterpolation::Nearest => self.samples.get(position.round() as usize).cloned(),
            SampleInterpolation::Linear => {
                let index = position.floor() as usize;
                let prev = &self.samples[index];
                let Some(next) = self.samples.get(index + 1) else {
                    return Some(prev.clone());
                };

                let t = position - index as f32;
                if t <= 0.0 {
                    return Some(prev.clone());
                }

                // Types without a blend function hold the earlier sample
                Some(match prev.value_type().and_then(|ty| ty.interpolator()) {
                    Some(interpolator) => interpolator.interpolate(prev, next, t),
                    None => prev.clone(),
                })
            }
        }
    }
}

/// A one-shot event fired when playback enters its block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    /// Event name
    pub event: String,
    /// Additional parameters
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, String>,
}

impl ActionData {
    /// Create an action with no parameters
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Data held by a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockData {
    /// One value for the whole block
    Constant(Value),
    /// Densely sampled values
    Samples(SamplesData),
    /// Fire-once event
    Action(ActionData),
}

impl BlockData {
    /// Get the kind name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Constant(_) => "constant",
            Self::Samples(_) => "samples",
            Self::Action(_) => "action",
        }
    }

    /// Whether this data can live on a track of the given type
    pub fn is_of_type(&self, value_type: &ValueType) -> bool {
        match self {
            Self::Constant(value) => value.is_of_type(value_type),
            Self::Samples(data) => data.samples.iter().all(|v| v.is_of_type(value_type)),
            Self::Action(_) => true,
        }
    }

    /// Type of the first stored value, for error reporting
    pub(crate) fn stored_type(&self) -> Option<ValueType> {
        match self {
            Self::Constant(value) => value.value_type(),
            Self::Samples(data) => data.samples.first().and_then(Value::value_type),
            Self::Action(_) => None,
        }
    }

    /// Value at `offset` seconds from the block start. Actions have none.
    pub fn value_at(&self, offset: f32) -> Option<Value> {
        match self {
            Self::Constant(value) => Some(value.clone()),
            Self::Samples(data) => data.sample(offset),
            Self::Action(_) => None,
        }
    }
}

/// A span of time on a track holding one kind of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Identifier within the track
    pub id: BlockId,
    /// Start time in seconds
    pub start_time: f32,
    /// Length in seconds; `None` extends to the end of the clip
    pub duration: Option<f32>,
    /// Block contents
    pub data: BlockData,
}

impl Block {
    /// End time, or `None` if open-ended
    pub fn end_time(&self) -> Option<f32> {
        self.duration.map(|d| self.start_time + d)
    }

    /// End time used for ordering and overlap checks
    pub(crate) fn end_or_infinity(&self) -> f32 {
        self.end_time().unwrap_or(f32::INFINITY)
    }

    /// Whether `time` falls in `[start, end)`
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start_time && time < self.end_or_infinity()
    }

    /// Value at an absolute clip time
    pub fn value_at(&self, time: f32) -> Option<Value> {
        self.data.value_at(time - self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_samples(interpolation: SampleInterpolation, values: &[f32]) -> SamplesData {
        SamplesData::new(
            2.0,
            interpolation,
            values.iter().map(|v| Value::Float(*v)).collect(),
        )
    }

    #[test]
    fn test_linear_samples() {
        let data = float_samples(SampleInterpolation::Linear, &[0.0, 10.0, 20.0]);
        assert_eq!(data.sample(0.0), Some(Value::Float(0.0)));
        assert_eq!(data.sample(0.25), Some(Value::Float(5.0)));
        assert_eq!(data.sample(0.5), Some(Value::Float(10.0)));
        // Clamped to array bounds
        assert_eq!(data.sample(-1.0), Some(Value::Float(0.0)));
        assert_eq!(data.sample(30.0), Some(Value::Float(20.0)));
    }

    #[test]
    fn test_nearest_samples() {
        let data = float_samples(SampleInterpolation::Nearest, &[0.0, 10.0, 20.0]);
        assert_eq!(data.sample(0.2), Some(Value::Float(0.0)));
        assert_eq!(data.sample(0.3), Some(Value::Float(10.0)));
        assert_eq!(data.sample(0.9), Some(Value::Float(20.0)));
    }

    #[test]
    fn test_empty_samples() {
        let data = float_samples(SampleInterpolation::Linear, &[]);
        assert_eq!(data.sample(0.0), None);
    }

    #[test]
    fn test_linear_samples_hold_steps() {
        let data = SamplesData::new(
            1.0,
            SampleInterpolation::Linear,
            vec![Value::Int(1), Value::Int(2)],
        );
        assert_eq!(data.sample(0.9), Some(Value::Int(1)));
        assert_eq!(data.sample(1.0), Some(Value::Int(2)));
    }

    #[test]
    fn test_block_range() {
        let block = Block {
            id: BlockId(0),
            start_time: 1.0,
            duration: Some(2.0),
            data: BlockData::Constant(Value::Bool(true)),
        };
        assert!(!block.contains(0.5));
        assert!(block.contains(1.0));
        assert!(block.contains(2.9));
        assert!(!block.contains(3.0));
        assert_eq!(block.end_time(), Some(3.0));

        let open = Block {
            duration: None,
            ..block
        };
        assert!(open.contains(1000.0));
        assert_eq!(open.end_time(), None);
    }

    #[test]
    fn test_data_type_check() {
        assert!(BlockData::Constant(Value::Float(1.0)).is_of_type(&ValueType::Float));
        assert!(!BlockData::Constant(Value::Float(1.0)).is_of_type(&ValueType::Vec3));
        assert!(BlockData::Action(ActionData::new("Explode")).is_of_type(&ValueType::Object));
        assert_eq!(
            BlockData::Action(ActionData::new("Explode")).value_at(0.0),
            None
        );
    }
}
