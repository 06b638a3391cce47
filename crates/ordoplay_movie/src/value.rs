// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values carried by tracks, and how they interpolate.

use crate::binding::{ComponentId, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a track or property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean flag
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// Rotation quaternion (x, y, z, w)
    Rotation,
    /// Color (RGBA)
    Color,
    /// Text
    Text,
    /// Reference to a scene object that contains components
    Object,
    /// Reference to a component of the named type
    Component(String),
}

impl ValueType {
    /// Get the display name
    pub fn name(&self) -> &str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Vec2 => "Vec2",
            Self::Vec3 => "Vec3",
            Self::Vec4 => "Vec4",
            Self::Rotation => "Rotation",
            Self::Color => "Color",
            Self::Text => "Text",
            Self::Object => "Object",
            Self::Component(name) => name,
        }
    }

    /// Whether values of this type reference a component
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    /// Whether values of this type reference a scene object or component
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Object | Self::Component(_))
    }

    /// Blending function for this type, if it has one
    pub fn interpolator(&self) -> Option<Interpolator> {
        match self {
            Self::Float | Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::Color => {
                Some(Interpolator::Linear)
            }
            Self::Rotation => Some(Interpolator::Spherical),
            Self::Bool | Self::Int | Self::Text | Self::Object | Self::Component(_) => None,
        }
    }

    /// Whether keyframes of this type blend smoothly, rather than holding
    pub fn can_interpolate(&self) -> bool {
        self.interpolator().is_some()
    }

    /// Value used when nothing else is known
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Vec2 => Value::Vec2([0.0; 2]),
            Self::Vec3 => Value::Vec3([0.0; 3]),
            Self::Vec4 => Value::Vec4([0.0; 4]),
            Self::Rotation => Value::Rotation([0.0, 0.0, 0.0, 1.0]),
            Self::Color => Value::Color([0.0; 4]),
            Self::Text => Value::Text(String::new()),
            Self::Object => Value::Object(None),
            Self::Component(_) => Value::Component(None),
        }
    }

    /// Names of the scalar fields exposed by vector-like types
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Self::Vec2 => &["x", "y"],
            Self::Vec3 => &["x", "y", "z"],
            Self::Vec4 | Self::Rotation => &["x", "y", "z", "w"],
            Self::Color => &["r", "g", "b", "a"],
            _ => &[],
        }
    }

    /// Type of a named scalar field, e.g. `x` of a `Vec3`
    pub fn field_type(&self, field: &str) -> Option<ValueType> {
        self.field_names()
            .iter()
            .any(|name| *name == field)
            .then_some(ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value of one of the supported [`ValueType`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f32),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector
    Vec3([f32; 3]),
    /// 4D vector
    Vec4([f32; 4]),
    /// Rotation quaternion (x, y, z, w)
    Rotation([f32; 4]),
    /// Color (RGBA)
    Color([f32; 4]),
    /// Text
    Text(String),
    /// Scene object reference
    Object(Option<ObjectId>),
    /// Component reference
    Component(Option<ComponentId>),
}

impl Value {
    /// Whether this value can be stored in a property of the given type.
    ///
    /// Component references match any component type; the scene is
    /// responsible for handing out components of the right kind.
    pub fn is_of_type(&self, value_type: &ValueType) -> bool {
        matches!(
            (self, value_type),
            (Value::Bool(_), ValueType::Bool)
                | (Value::Int(_), ValueType::Int)
                | (Value::Float(_), ValueType::Float)
                | (Value::Vec2(_), ValueType::Vec2)
                | (Value::Vec3(_), ValueType::Vec3)
                | (Value::Vec4(_), ValueType::Vec4)
                | (Value::Rotation(_), ValueType::Rotation)
                | (Value::Color(_), ValueType::Color)
                | (Value::Text(_), ValueType::Text)
                | (Value::Object(_), ValueType::Object)
                | (Value::Component(_), ValueType::Component(_))
        )
    }

    /// Get the value type, where it can be known from the value alone
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Vec4(_) => ValueType::Vec4,
            Value::Rotation(_) => ValueType::Rotation,
            Value::Color(_) => ValueType::Color,
            Value::Text(_) => ValueType::Text,
            Value::Object(_) => ValueType::Object,
            Value::Component(_) => return None,
        })
    }

    /// Whether this value references something in the scene
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Component(_))
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as object reference if possible
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => *id,
            _ => None,
        }
    }

    fn components(&self) -> Option<&[f32]> {
        match self {
            Value::Vec2(v) => Some(v.as_slice()),
            Value::Vec3(v) => Some(v.as_slice()),
            Value::Vec4(v) | Value::Rotation(v) | Value::Color(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn components_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Value::Vec2(v) => Some(v.as_mut_slice()),
            Value::Vec3(v) => Some(v.as_mut_slice()),
            Value::Vec4(v) | Value::Rotation(v) | Value::Color(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    fn field_index(&self, field: &str) -> Option<usize> {
        self.value_type()?
            .field_names()
            .iter()
            .position(|name| *name == field)
    }

    /// Read a named scalar field, e.g. `y` of a `Vec3`
    pub fn field(&self, field: &str) -> Option<Value> {
        let index = self.field_index(field)?;
        self.components().map(|c| Value::Float(c[index]))
    }

    /// Copy of this value with one scalar field replaced
    pub fn with_field(&self, field: &str, value: &Value) -> Option<Value> {
        let index = self.field_index(field)?;
        let scalar = value.as_float()?;
        let mut result = self.clone();
        result.components_mut()?[index] = scalar;
        Some(result)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Object(Some(id)) => write!(f, "object {id}"),
            Value::Component(Some(id)) => write!(f, "component {id}"),
            Value::Object(None) | Value::Component(None) => f.write_str("none"),
            _ => match self.components() {
                Some(c) => write!(f, "{c:?}"),
                None => Ok(()),
            },
        }
    }
}

/// Blending function between two values of the same type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolator {
    /// Component-wise linear blend
    Linear,
    /// Spherical blend for rotations
    Spherical,
}

impl Interpolator {
    /// Blend `a` towards `b` by `t`. Mismatched values hold at `a`.
    pub fn interpolate(self, a: &Value, b: &Value, t: f32) -> Value {
        match (self, a, b) {
            (Self::Linear, Value::Float(a), Value::Float(b)) => Value::Float(lerp(*a, *b, t)),
            (Self::Linear, Value::Vec2(a), Value::Vec2(b)) => Value::Vec2(lerp_array(*a, *b, t)),
            (Self::Linear, Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(lerp_array(*a, *b, t)),
            (Self::Linear, Value::Vec4(a), Value::Vec4(b)) => Value::Vec4(lerp_array(*a, *b, t)),
            (Self::Linear, Value::Color(a), Value::Color(b)) => Value::Color(lerp_array(*a, *b, t)),
            (Self::Spherical, Value::Rotation(a), Value::Rotation(b)) => {
                Value::Rotation(slerp(*a, *b, t))
            }
            _ => a.clone(),
        }
    }
}

/// Linear interpolation between two floats
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_array<const N: usize>(a: [f32; N], b: [f32; N], t: f32) -> [f32; N] {
    std::array::from_fn(|i| lerp(a[i], b[i], t))
}

/// Spherical linear interpolation for quaternions
pub fn slerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let mut dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];

    // Take the short way round
    let mut b = b;
    if dot < 0.0 {
        b = b.map(|c| -c);
        dot = -dot;
    }

    // Nearly parallel: lerp and renormalize
    if dot > 0.9995 {
        let result = lerp_array(a, b, t);
        let len = result.iter().map(|c| c * c).sum::<f32>().sqrt();
        if len <= f32::EPSILON {
            return a;
        }
        return result.map(|c| c / len);
    }

    let theta_0 = dot.acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;

    std::array::from_fn(|i| a[i] * s0 + b[i] * s1)
}
