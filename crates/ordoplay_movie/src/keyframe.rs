// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe curves: the editable, sparse form of a track's values.
//!
//! Curves are not played back directly. They get compiled into blocks by
//! [`crate::compile`], but they are stored with the track so they can be
//! edited again later.

use crate::error::{MovieError, Result};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Easing applied between a keyframe and the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyframeInterpolation {
    /// Hold the previous value (step)
    #[default]
    None,
    /// Linear
    Linear,
    /// Ease in
    QuadraticIn,
    /// Ease out
    QuadraticOut,
    /// Ease in and out
    QuadraticInOut,
}

impl KeyframeInterpolation {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Linear => "Linear",
            Self::QuadraticIn => "Ease In",
            Self::QuadraticOut => "Ease Out",
            Self::QuadraticInOut => "Ease In Out",
        }
    }

    /// Get all interpolation modes
    pub fn all() -> &'static [KeyframeInterpolation] {
        &[
            Self::None,
            Self::Linear,
            Self::QuadraticIn,
            Self::QuadraticOut,
            Self::QuadraticInOut,
        ]
    }

    /// Map linear progress `t` in `[0, 1]` to eased progress.
    ///
    /// `None` never makes progress, so the previous keyframe's value holds.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u / 2.0
                }
            }
        }
    }
}

/// A keyframe in a curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub time: f32,
    /// Value at this keyframe
    pub value: Value,
    /// Easing towards the next keyframe, overriding the curve default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<KeyframeInterpolation>,
}

impl Keyframe {
    /// Create a new keyframe
    pub fn new(time: f32, value: Value) -> Self {
        Self {
            time,
            value,
            interpolation: None,
        }
    }

    /// Set interpolation override
    pub fn with_interpolation(mut self, mode: KeyframeInterpolation) -> Self {
        self.interpolation = Some(mode);
        self
    }
}

/// Sparse set of keyframes for one value type, sorted by time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveModel", into = "CurveModel")]
pub struct KeyframeCurve {
    value_type: ValueType,
    /// Default easing between keyframes
    pub interpolation: KeyframeInterpolation,
    keyframes: Vec<Keyframe>,
}

impl KeyframeCurve {
    /// Create an empty curve.
    ///
    /// Types that can blend default to ease-in-out, everything else steps.
    pub fn new(value_type: ValueType) -> Self {
        let interpolation = if value_type.can_interpolate() {
            KeyframeInterpolation::QuadraticInOut
        } else {
            KeyframeInterpolation::None
        };

        Self {
            value_type,
            interpolation,
            keyframes: Vec::new(),
        }
    }

    /// Set the default easing
    pub fn with_interpolation(mut self, mode: KeyframeInterpolation) -> Self {
        self.interpolation = mode;
        self
    }

    /// Type of every value in this curve
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Whether values blend between keyframes
    pub fn can_interpolate(&self) -> bool {
        self.value_type.can_interpolate()
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether there are no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe, or 0 if empty
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Get all keyframes in time order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Iterate keyframes in time order
    pub fn iter(&self) -> std::slice::Iter<'_, Keyframe> {
        self.keyframes.iter()
    }

    /// Insert a keyframe, replacing any existing one at the same time
    pub fn set_keyframe(&mut self, keyframe: Keyframe) -> Result<()> {
        if !keyframe.time.is_finite() {
            return Err(MovieError::InvalidKeyframeTime(keyframe.time));
        }

        if !keyframe.value.is_of_type(&self.value_type) {
            return Err(MovieError::TypeMismatch {
                expected: self.value_type.clone(),
                actual: keyframe
                    .value
                    .value_type()
                    .unwrap_or_else(|| self.value_type.clone()),
            });
        }

        match self.index_of(keyframe.time) {
            Ok(idx) => self.keyframes[idx] = keyframe,
            Err(idx) => self.keyframes.insert(idx, keyframe),
        }

        Ok(())
    }

    /// Insert a keyframe from parts
    pub fn set(&mut self, time: f32, value: Value) -> Result<()> {
        self.set_keyframe(Keyframe::new(time, value))
    }

    /// Get the keyframe at exactly `time`
    pub fn keyframe_at(&self, time: f32) -> Option<&Keyframe> {
        self.index_of(time).ok().map(|idx| &self.keyframes[idx])
    }

    /// Remove the keyframe at exactly `time`
    pub fn remove_keyframe(&mut self, time: f32) -> Option<Keyframe> {
        let idx = self.index_of(time).ok()?;
        Some(self.keyframes.remove(idx))
    }

    /// Remove every keyframe
    pub fn clear(&mut self) {
        self.keyframes.clear();
    }

    fn index_of(&self, time: f32) -> std::result::Result<usize, usize> {
        self.keyframes
            .binary_search_by(|k| k.time.total_cmp(&time))
    }

    /// Evaluate the curve at `time`.
    ///
    /// An empty curve yields the type's default value. Outside the keyframe
    /// range the first / last value is held.
    pub fn value_at(&self, time: f32) -> Value {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return self.value_type.default_value();
        };

        // Index of the first keyframe after `time`
        let next_idx = self.keyframes.partition_point(|k| k.time <= time);

        if next_idx == 0 {
            return first.value.clone();
        }

        let Some(next) = self.keyframes.get(next_idx) else {
            return last.value.clone();
        };

        let prev = &self.keyframes[next_idx - 1];

        let Some(interpolator) = self.value_type.interpolator() else {
            return prev.value.clone();
        };

        let t = (time - prev.time) / (next.time - prev.time);
        let eased = prev.interpolation.unwrap_or(self.interpolation).apply(t);

        interpolator.interpolate(&prev.value, &next.value, eased)
    }

    /// Evaluate the curve, failing instead of defaulting when empty
    pub fn try_value_at(&self, time: f32) -> Result<Value> {
        if self.is_empty() {
            return Err(MovieError::EmptyCurve);
        }
        Ok(self.value_at(time))
    }
}

/// Serialized form of a [`KeyframeCurve`], checked on load
#[derive(Serialize, Deserialize)]
struct CurveModel {
    value_type: ValueType,
    interpolation: KeyframeInterpolation,
    keyframes: Vec<Keyframe>,
}

impl From<KeyframeCurve> for CurveModel {
    fn from(curve: KeyframeCurve) -> Self {
        Self {
            value_type: curve.value_type,
            interpolation: curve.interpolation,
            keyframes: curve.keyframes,
        }
    }
}

impl TryFrom<CurveModel> for KeyframeCurve {
    type Error = MovieError;

    fn try_from(model: CurveModel) -> Result<Self> {
        let mut curve = KeyframeCurve::new(model.value_type).with_interpolation(model.interpolation);
        for keyframe in model.keyframes {
            curve.set_keyframe(keyframe)?;
        }
        Ok(curve)
    }
}

impl<'a> IntoIterator for &'a KeyframeCurve {
    type Item = &'a Keyframe;
    type IntoIter = std::slice::Iter<'a, Keyframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_curve(points: &[(f32, f32)]) -> KeyframeCurve {
        let mut curve = KeyframeCurve::new(ValueType::Float)
            .with_interpolation(KeyframeInterpolation::Linear);
        for &(time, value) in points {
            curve.set(time, Value::Float(value)).unwrap();
        }
        curve
    }

    #[test]
    fn test_default_interpolation() {
        assert_eq!(
            KeyframeCurve::new(ValueType::Vec3).interpolation,
            KeyframeInterpolation::QuadraticInOut
        );
        assert_eq!(
            KeyframeCurve::new(ValueType::Bool).interpolation,
            KeyframeInterpolation::None
        );
    }

    #[test]
    fn test_easing_functions() {
        for mode in KeyframeInterpolation::all() {
            if *mode == KeyframeInterpolation::None {
                assert_eq!(mode.apply(0.7), 0.0);
                continue;
            }
            assert!(mode.apply(0.0).abs() < 1e-6, "{}", mode.name());
            assert!((mode.apply(1.0) - 1.0).abs() < 1e-6, "{}", mode.name());
        }
        assert_eq!(KeyframeInterpolation::QuadraticIn.apply(0.5), 0.25);
        assert_eq!(KeyframeInterpolation::QuadraticOut.apply(0.5), 0.75);
        assert_eq!(KeyframeInterpolation::QuadraticInOut.apply(0.5), 0.5);
        assert_eq!(KeyframeInterpolation::QuadraticInOut.apply(0.25), 0.125);
    }

    #[test]
    fn test_keyframes_stay_sorted_and_unique() {
        let mut curve = float_curve(&[(2.0, 20.0), (0.0, 0.0), (1.0, 10.0)]);
        curve.set(1.0, Value::Float(15.0)).unwrap();

        let times: Vec<f32> = curve.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(curve.keyframe_at(1.0).unwrap().value, Value::Float(15.0));
        assert_eq!(curve.duration(), 2.0);

        assert!(curve.remove_keyframe(1.0).is_some());
        assert!(curve.remove_keyframe(1.0).is_none());
        assert_eq!(curve.len(), 2);
    }

    #[test]
    fn test_rejects_wrong_type() {
        let mut curve = KeyframeCurve::new(ValueType::Float);
        let result = curve.set(0.0, Value::Bool(true));
        assert!(matches!(result, Err(MovieError::TypeMismatch { .. })));
        assert!(curve.set(f32::NAN, Value::Float(1.0)).is_err());
        assert!(curve.is_empty());
    }

    #[test]
    fn test_empty_curve_defaults() {
        let curve = KeyframeCurve::new(ValueType::Vec2);
        assert_eq!(curve.value_at(3.0), Value::Vec2([0.0, 0.0]));
        assert_eq!(curve.try_value_at(3.0), Err(MovieError::EmptyCurve));
        assert_eq!(curve.duration(), 0.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        let curve = float_curve(&[(1.0, 5.0), (3.0, 7.0)]);
        assert_eq!(curve.value_at(-10.0), Value::Float(5.0));
        assert_eq!(curve.value_at(0.5), Value::Float(5.0));
        assert_eq!(curve.value_at(3.0), Value::Float(7.0));
        assert_eq!(curve.value_at(100.0), Value::Float(7.0));
    }

    #[test]
    fn test_linear_blend_is_idempotent() {
        let curve = float_curve(&[(0.0, 0.0), (2.0, 10.0)]);
        assert_eq!(curve.value_at(1.0), Value::Float(5.0));
        assert_eq!(curve.value_at(1.0), curve.value_at(1.0));
        assert_eq!(curve.value_at(0.5), Value::Float(2.5));
    }

    #[test]
    fn test_keyframe_override_uses_previous() {
        let mut curve = float_curve(&[(2.0, 10.0)]);
        curve
            .set_keyframe(
                Keyframe::new(0.0, Value::Float(0.0))
                    .with_interpolation(KeyframeInterpolation::QuadraticIn),
            )
            .unwrap();

        // Eased by the keyframe at t=0, not the curve default
        assert_eq!(curve.value_at(1.0), Value::Float(2.5));

        curve
            .set_keyframe(
                Keyframe::new(0.0, Value::Float(0.0))
                    .with_interpolation(KeyframeInterpolation::None),
            )
            .unwrap();
        assert_eq!(curve.value_at(1.9), Value::Float(0.0));
    }

    #[test]
    fn test_step_for_non_interpolating_types() {
        let mut curve = KeyframeCurve::new(ValueType::Bool)
            .with_interpolation(KeyframeInterpolation::Linear);
        curve.set(0.0, Value::Bool(false)).unwrap();
        curve.set(1.0, Value::Bool(true)).unwrap();

        assert_eq!(curve.value_at(0.99), Value::Bool(false));
        assert_eq!(curve.value_at(1.0), Value::Bool(true));
    }

    #[test]
    fn test_serialization() {
        let curve = float_curve(&[(0.0, 1.0), (0.5, 2.0)]);
        let ron_str = ron::ser::to_string_pretty(&curve, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: KeyframeCurve = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, curve);
    }

    #[test]
    fn test_load_sorts_keyframes() {
        let loaded: KeyframeCurve = ron::from_str(
            "(
                value_type: Float,
                interpolation: Linear,
                keyframes: [
                    (time: 2.0, value: Float(10.0)),
                    (time: 0.0, value: Float(0.0)),
                ],
            )",
        )
        .unwrap();

        let times: Vec<f32> = loaded.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 2.0]);
        assert_eq!(loaded.value_at(1.0), Value::Float(5.0));
        assert!(loaded.keyframe_at(2.0).is_some());
    }

    #[test]
    fn test_load_rejects_wrong_type() {
        let result: std::result::Result<KeyframeCurve, _> = ron::from_str(
            "(
                value_type: Float,
                interpolation: Linear,
                keyframes: [(time: 0.0, value: Bool(true))],
            )",
        );
        assert!(result.is_err());
    }
}
