// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding tracks to properties in the scene.
//!
//! Tracks are matched to the scene by [`TrackId`], so tracks from several
//! clips can drive the same property if they share an id. There are two
//! tiers of bindings:
//! - scene references, pointing at an object or component, which are
//!   persisted through [`BindingMapping`]
//! - member bindings, naming a member of a parent binding's value, which are
//!   rebuilt on demand by [`BindingSet::get_or_auto_resolve`]

use crate::clip::Clip;
use crate::error::{MovieError, Result};
use crate::scene::Scene;
use crate::track::{Track, TrackId};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Scene object ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Scene component ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub Uuid);

impl ComponentId {
    /// Create a new random component ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a specific object or component in the scene
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneRef {
    /// A scene object
    Object(ObjectId),
    /// A component
    Component {
        /// Component ID
        id: ComponentId,
        /// Component type name
        component_type: String,
    },
}

/// A named member of a parent binding's value
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    parent: Box<Binding>,
    name: String,
    value_type: ValueType,
}

impl MemberBinding {
    /// Binding whose value holds this member
    pub fn parent(&self) -> &Binding {
        &self.parent
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A gettable, settable property in the scene
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Object or component reference
    SceneRef(SceneRef),
    /// Member of another binding's value
    Member(MemberBinding),
}

impl Binding {
    /// Binding to an object
    pub fn object(object: ObjectId) -> Self {
        Self::SceneRef(SceneRef::Object(object))
    }

    /// Binding to a component
    pub fn component(component: ComponentId, component_type: impl Into<String>) -> Self {
        Self::SceneRef(SceneRef::Component {
            id: component,
            component_type: component_type.into(),
        })
    }

    /// Binding to a named member of `parent`'s value.
    ///
    /// Members of references are described by the scene; members of vector
    /// values are their scalar fields. Returns `None` if the member can't be
    /// described.
    pub fn member(parent: Binding, name: impl Into<String>, scene: &dyn Scene) -> Option<Self> {
        let name = name.into();
        let parent_value = parent.get(scene)?;

        let value_type = if parent_value.is_reference() {
            scene.member_type(&parent_value, &name)?
        } else {
            parent.value_type().field_type(&name)?
        };

        Some(Self::Member(MemberBinding {
            parent: Box::new(parent),
            name,
            value_type,
        }))
    }

    /// Declared type of the property
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::SceneRef(SceneRef::Object(_)) => ValueType::Object,
            Self::SceneRef(SceneRef::Component { component_type, .. }) => {
                ValueType::Component(component_type.clone())
            }
            Self::Member(member) => member.value_type.clone(),
        }
    }

    /// The referenced object or component, for scene reference bindings
    pub fn scene_ref(&self) -> Option<&SceneRef> {
        match self {
            Self::SceneRef(scene_ref) => Some(scene_ref),
            Self::Member(_) => None,
        }
    }

    /// Read the current value
    pub fn get(&self, scene: &dyn Scene) -> Option<Value> {
        match self {
            Self::SceneRef(SceneRef::Object(id)) => {
                scene.contains_object(*id).then_some(Value::Object(Some(*id)))
            }
            Self::SceneRef(SceneRef::Component { id, .. }) => scene
                .component_type(*id)
                .map(|_| Value::Component(Some(*id))),
            Self::Member(member) => {
                let target = member.parent.get(scene)?;
                if target.is_reference() {
                    scene.get_member(&target, &member.name)
                } else {
                    target.field(&member.name)
                }
            }
        }
    }

    /// Assign a new value.
    ///
    /// Members of value-typed parents are written back up the chain, so
    /// setting `x` of a position rewrites the whole position.
    pub fn set(&self, scene: &mut dyn Scene, value: Value) -> Result<()> {
        let member = match self {
            Self::SceneRef(_) => return Err(MovieError::ReadOnlyBinding),
            Self::Member(member) => member,
        };

        if !value.is_of_type(&member.value_type) {
            return Err(MovieError::TypeMismatch {
                expected: member.value_type.clone(),
                actual: value.value_type().unwrap_or_else(|| member.value_type.clone()),
            });
        }

        let target = member
            .parent
            .get(scene)
            .ok_or_else(|| MovieError::MemberNotFound(member.name.clone()))?;

        if target.is_reference() {
            return scene.set_member(&target, &member.name, value);
        }

        let updated = target
            .with_field(&member.name, &value)
            .ok_or_else(|| MovieError::MemberNotFound(member.name.clone()))?;
        member.parent.set(scene, updated)
    }
}

/// Persisted form of a scene reference binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingMapping {
    /// Bound track
    pub track_id: TrackId,
    /// Bound object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectId>,
    /// Bound component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
}

/// Cached bindings from track ids to scene properties
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    /// Object and component references, persisted with the player
    scene_refs: IndexMap<TrackId, Binding>,
    /// Member bindings found by auto-resolution, never persisted
    members: HashMap<TrackId, Binding>,
}

impl BindingSet {
    /// Create an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a track to an object
    pub fn bind_object(&mut self, track_id: TrackId, object: ObjectId) {
        self.members.remove(&track_id);
        self.scene_refs.insert(track_id, Binding::object(object));
    }

    /// Bind a track to a component
    pub fn bind_component(
        &mut self,
        track_id: TrackId,
        component: ComponentId,
        component_type: impl Into<String>,
    ) {
        self.members.remove(&track_id);
        self.scene_refs
            .insert(track_id, Binding::component(component, component_type));
    }

    /// Bind a track to any property. Scene references go to the persisted tier.
    pub fn bind(&mut self, track_id: TrackId, binding: Binding) {
        match binding {
            Binding::SceneRef(_) => {
                self.members.remove(&track_id);
                self.scene_refs.insert(track_id, binding);
            }
            Binding::Member(_) => {
                self.scene_refs.shift_remove(&track_id);
                self.members.insert(track_id, binding);
            }
        }
    }

    /// Remove any binding for a track
    pub fn unbind(&mut self, track_id: TrackId) -> Option<Binding> {
        let scene_ref = self.scene_refs.shift_remove(&track_id);
        let member = self.members.remove(&track_id);
        scene_ref.or(member)
    }

    /// Forget every binding
    pub fn reset(&mut self) {
        self.scene_refs.clear();
        self.members.clear();
    }

    /// Number of cached bindings
    pub fn len(&self) -> usize {
        self.scene_refs.len() + self.members.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.scene_refs.is_empty() && self.members.is_empty()
    }

    /// Cached binding for a track, ignoring its declared type
    pub fn binding(&self, track_id: TrackId) -> Option<&Binding> {
        self.scene_refs
            .get(&track_id)
            .or_else(|| self.members.get(&track_id))
    }

    /// Property bound to `track`, if its type still matches the track's
    pub fn get_property(&self, track: &Track) -> Option<&Binding> {
        let binding = self.binding(track.id())?;
        (binding.value_type() == *track.value_type()).then_some(binding)
    }

    /// Property bound to `track`, resolving it from the parent track's
    /// binding if needed.
    ///
    /// A component track under an object track binds to the object's
    /// component of that type. Any other track binds to the member of its
    /// parent's value named after the track. Nothing is cached on failure,
    /// so later calls try again.
    pub fn get_or_auto_resolve(
        &mut self,
        clip: &Clip,
        track: &Track,
        scene: &dyn Scene,
    ) -> Option<Binding> {
        // A cached binding of the wrong type stays unresolved until reset
        if self.binding(track.id()).is_some() {
            return self.get_property(track).cloned();
        }

        // Can only auto-resolve if the parent is already resolved
        let parent_track = clip.track(track.parent()?)?;
        let parent = self.get_property(parent_track)?.clone();

        if track.value_type().is_component() && parent.value_type() == ValueType::Object {
            let object = parent.get(scene)?.as_object()?;
            let component = scene.find_component(object, track.value_type().name())?;

            tracing::debug!(
                "Resolved component track '{}' to {}",
                track.name,
                component
            );

            let binding = Binding::component(component, track.value_type().name());
            self.scene_refs.insert(track.id(), binding.clone());
            return Some(binding);
        }

        let binding = Binding::member(parent, track.name.clone(), scene)?;
        tracing::debug!(
            "Resolved member track '{}' as {}",
            track.name,
            binding.value_type()
        );
        self.members.insert(track.id(), binding.clone());

        (binding.value_type() == *track.value_type()).then_some(binding)
    }

    /// Scene reference bindings in their persisted form
    pub fn mapping(&self) -> Vec<BindingMapping> {
        self.scene_refs
            .iter()
            .filter_map(|(track_id, binding)| match binding.scene_ref()? {
                SceneRef::Object(object) => Some(BindingMapping {
                    track_id: *track_id,
                    object: Some(*object),
                    component: None,
                }),
                SceneRef::Component { id, .. } => Some(BindingMapping {
                    track_id: *track_id,
                    object: None,
                    component: Some(*id),
                }),
            })
            .collect()
    }

    /// Replace all bindings with a persisted mapping.
    ///
    /// Entries whose object or component no longer exists are dropped.
    pub fn load_mapping(&mut self, mapping: &[BindingMapping], scene: &dyn Scene) {
        self.reset();

        for entry in mapping {
            if let Some(object) = entry.object {
                if scene.contains_object(object) {
                    self.bind_object(entry.track_id, object);
                } else {
                    tracing::debug!("Dropping binding of {} to missing object {}", entry.track_id, object);
                }
            }

            if let Some(component) = entry.component {
                match scene.component_type(component) {
                    Some(component_type) => {
                        self.bind_component(entry.track_id, component, component_type);
                    }
                    None => tracing::debug!(
                        "Dropping binding of {} to missing component {}",
                        entry.track_id,
                        component
                    ),
                }
            }
        }
    }
}
