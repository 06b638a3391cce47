// SPDX-License-Identifier: MIT OR Apache-2.0
//! A minimal in-memory [`Scene`] for tools and tests.

use crate::binding::{ComponentId, ObjectId};
use crate::block::ActionData;
use crate::error::{MovieError, Result};
use crate::scene::Scene;
use crate::value::{Value, ValueType};
use indexmap::IndexMap;

/// A typed member slot
#[derive(Debug, Clone, PartialEq)]
struct Member {
    value_type: ValueType,
    value: Value,
}

type Members = IndexMap<String, Member>;

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    members: Members,
    components: Vec<ComponentId>,
}

#[derive(Debug, Clone)]
struct MemoryComponent {
    owner: ObjectId,
    component_type: String,
    members: Members,
}

/// An action received through [`Scene::dispatch_action`]
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedAction {
    /// Bound target the action ran against
    pub target: Value,
    /// The action block's data
    pub action: ActionData,
}

/// Scene of named objects holding typed members and components
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: IndexMap<ObjectId, MemoryObject>,
    components: IndexMap<ComponentId, MemoryComponent>,
    dispatched: Vec<DispatchedAction>,
    supports_actions: bool,
}

impl MemoryScene {
    /// Create an empty scene that rejects actions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene that records dispatched actions
    pub fn with_actions() -> Self {
        Self {
            supports_actions: true,
            ..Self::default()
        }
    }

    /// Add an object
    pub fn add_object(&mut self, name: impl Into<String>) -> ObjectId {
        let id = ObjectId::new();
        self.insert_object(id, name);
        id
    }

    /// Add an object under a known id, e.g. one kept in a saved binding
    /// mapping. Returns `false` if the id is already taken.
    pub fn insert_object(&mut self, id: ObjectId, name: impl Into<String>) -> bool {
        if self.objects.contains_key(&id) {
            return false;
        }
        self.objects.insert(
            id,
            MemoryObject {
                name: name.into(),
                members: Members::new(),
                components: Vec::new(),
            },
        );
        true
    }

    /// Remove an object along with its components
    pub fn remove_object(&mut self, object: ObjectId) -> bool {
        let Some(removed) = self.objects.shift_remove(&object) else {
            return false;
        };
        for component in removed.components {
            self.components.shift_remove(&component);
        }
        true
    }

    /// Attach a component of `component_type` to an object
    pub fn add_component(
        &mut self,
        object: ObjectId,
        component_type: impl Into<String>,
    ) -> Result<ComponentId> {
        let owner = self
            .objects
            .get_mut(&object)
            .ok_or(MovieError::ObjectNotFound(object))?;

        let id = ComponentId::new();
        owner.components.push(id);
        self.components.insert(
            id,
            MemoryComponent {
                owner: object,
                component_type: component_type.into(),
                members: Members::new(),
            },
        );
        Ok(id)
    }

    /// Remove a component from its object
    pub fn remove_component(&mut self, component: ComponentId) -> bool {
        let Some(removed) = self.components.shift_remove(&component) else {
            return false;
        };
        if let Some(owner) = self.objects.get_mut(&removed.owner) {
            owner.components.retain(|c| *c != component);
        }
        true
    }

    /// Declare a member on an object with an explicit type
    pub fn define_object_member(
        &mut self,
        object: ObjectId,
        name: impl Into<String>,
        value_type: ValueType,
        value: Value,
    ) -> Result<()> {
        let members = &mut self
            .objects
            .get_mut(&object)
            .ok_or(MovieError::ObjectNotFound(object))?
            .members;
        define(members, name.into(), value_type, value)
    }

    /// Declare a member on a component with an explicit type
    pub fn define_component_member(
        &mut self,
        component: ComponentId,
        name: impl Into<String>,
        value_type: ValueType,
        value: Value,
    ) -> Result<()> {
        let members = &mut self
            .components
            .get_mut(&component)
            .ok_or(MovieError::ComponentNotFound(component))?
            .members;
        define(members, name.into(), value_type, value)
    }

    /// Declare a member on an object, typed after its value
    pub fn set_object_member(
        &mut self,
        object: ObjectId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let name = name.into();
        let value_type = self.infer_type(&value, &name)?;
        self.define_object_member(object, name, value_type, value)
    }

    /// Declare a member on a component, typed after its value
    pub fn set_component_member(
        &mut self,
        component: ComponentId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let name = name.into();
        let value_type = self.infer_type(&value, &name)?;
        self.define_component_member(component, name, value_type, value)
    }

    /// Current value of an object's member
    pub fn object_member(&self, object: ObjectId, name: &str) -> Option<&Value> {
        self.objects
            .get(&object)?
            .members
            .get(name)
            .map(|m| &m.value)
    }

    /// Current value of a component's member
    pub fn component_member(&self, component: ComponentId, name: &str) -> Option<&Value> {
        self.components
            .get(&component)?
            .members
            .get(name)
            .map(|m| &m.value)
    }

    /// Objects in insertion order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &str)> {
        self.objects.iter().map(|(id, o)| (*id, o.name.as_str()))
    }

    /// Actions received so far
    pub fn dispatched(&self) -> &[DispatchedAction] {
        &self.dispatched
    }

    /// Forget received actions
    pub fn clear_dispatched(&mut self) {
        self.dispatched.clear();
    }

    fn infer_type(&self, value: &Value, name: &str) -> Result<ValueType> {
        if let Some(value_type) = value.value_type() {
            return Ok(value_type);
        }
        match value {
            Value::Component(Some(id)) => self
                .component_type(*id)
                .map(ValueType::Component)
                .ok_or(MovieError::ComponentNotFound(*id)),
            // Null component references carry no type name
            _ => Err(MovieError::MemberNotFound(name.to_string())),
        }
    }

    fn members(&self, target: &Value) -> Option<&Members> {
        match target {
            Value::Object(Some(id)) => self.objects.get(id).map(|o| &o.members),
            Value::Component(Some(id)) => self.components.get(id).map(|c| &c.members),
            _ => None,
        }
    }

    fn members_mut(&mut self, target: &Value) -> Result<&mut Members> {
        match target {
            Value::Object(Some(id)) => self
                .objects
                .get_mut(id)
                .map(|o| &mut o.members)
                .ok_or(MovieError::ObjectNotFound(*id)),
            Value::Component(Some(id)) => self
                .components
                .get_mut(id)
                .map(|c| &mut c.members)
                .ok_or(MovieError::ComponentNotFound(*id)),
            other => Err(MovieError::MemberNotFound(other.to_string())),
        }
    }
}

fn define(members: &mut Members, name: String, value_type: ValueType, value: Value) -> Result<()> {
    if !value.is_of_type(&value_type) {
        return Err(MovieError::TypeMismatch {
            actual: value.value_type().unwrap_or_else(|| value_type.clone()),
            expected: value_type,
        });
    }
    members.insert(name, Member { value_type, value });
    Ok(())
}

impl Scene for MemoryScene {
    fn contains_object(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn object_name(&self, object: ObjectId) -> Option<String> {
        self.objects.get(&object).map(|o| o.name.clone())
    }

    fn component_type(&self, component: ComponentId) -> Option<String> {
        self.components
            .get(&component)
            .map(|c| c.component_type.clone())
    }

    fn component_owner(&self, component: ComponentId) -> Option<ObjectId> {
        self.components.get(&component).map(|c| c.owner)
    }

    fn find_component(&self, object: ObjectId, component_type: &str) -> Option<ComponentId> {
        self.objects
            .get(&object)?
            .components
            .iter()
            .copied()
            .find(|id| {
                self.components
                    .get(id)
                    .is_some_and(|c| c.component_type == component_type)
            })
    }

    fn member_type(&self, target: &Value, member: &str) -> Option<ValueType> {
        self.members(target)?
            .get(member)
            .map(|m| m.value_type.clone())
    }

    fn get_member(&self, target: &Value, member: &str) -> Option<Value> {
        self.members(target)?.get(member).map(|m| m.value.clone())
    }

    fn set_member(&mut self, target: &Value, member: &str, value: Value) -> Result<()> {
        let slot = self
            .members_mut(target)?
            .get_mut(member)
            .ok_or_else(|| MovieError::MemberNotFound(member.to_string()))?;

        if !value.is_of_type(&slot.value_type) {
            return Err(MovieError::TypeMismatch {
                expected: slot.value_type.clone(),
                actual: value
                    .value_type()
                    .unwrap_or_else(|| slot.value_type.clone()),
            });
        }

        slot.value = value;
        Ok(())
    }

    fn dispatch_action(&mut self, target: &Value, action: &ActionData) -> Result<()> {
        if !self.supports_actions {
            return Err(MovieError::UnsupportedBlockData("action"));
        }
        self.dispatched.push(DispatchedAction {
            target: target.clone(),
            action: action.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members() {
        let mut scene = MemoryScene::new();
        let cube = scene.add_object("Cube");
        scene
            .set_object_member(cube, "Visible", Value::Bool(true))
            .unwrap();

        let target = Value::Object(Some(cube));
        assert_eq!(scene.member_type(&target, "Visible"), Some(ValueType::Bool));
        assert_eq!(scene.get_member(&target, "Visible"), Some(Value::Bool(true)));

        scene
            .set_member(&target, "Visible", Value::Bool(false))
            .unwrap();
        assert_eq!(scene.object_member(cube, "Visible"), Some(&Value::Bool(false)));

        assert!(matches!(
            scene.set_member(&target, "Visible", Value::Float(1.0)),
            Err(MovieError::TypeMismatch { .. })
        ));
        assert_eq!(
            scene.set_member(&target, "Missing", Value::Bool(true)),
            Err(MovieError::MemberNotFound("Missing".into()))
        );
    }

    #[test]
    fn test_components() {
        let mut scene = MemoryScene::new();
        let cube = scene.add_object("Cube");
        let light = scene.add_component(cube, "Light").unwrap();

        assert_eq!(scene.find_component(cube, "Light"), Some(light));
        assert_eq!(scene.find_component(cube, "Camera"), None);
        assert_eq!(scene.component_owner(light), Some(cube));
        assert_eq!(scene.component_type(light).as_deref(), Some("Light"));

        // Component references are typed after the component
        scene
            .set_object_member(cube, "Key", Value::Component(Some(light)))
            .unwrap();
        assert_eq!(
            scene.member_type(&Value::Object(Some(cube)), "Key"),
            Some(ValueType::Component("Light".into()))
        );

        assert!(scene.remove_object(cube));
        assert_eq!(scene.component_type(light), None);
        assert_eq!(
            scene.add_component(cube, "Light"),
            Err(MovieError::ObjectNotFound(cube))
        );
    }

    #[test]
    fn test_insert_object_with_known_id() {
        let mut scene = MemoryScene::new();
        let saved = ObjectId::new();
        assert!(!scene.contains_object(saved));

        assert!(scene.insert_object(saved, "Door"));
        assert!(scene.contains_object(saved));
        assert!(!scene.insert_object(saved, "Other"));
        assert_eq!(scene.objects().count(), 1);
    }

    #[test]
    fn test_actions() {
        let mut plain = MemoryScene::new();
        let action = ActionData::new("Explode");
        assert_eq!(
            plain.dispatch_action(&Value::Object(None), &action),
            Err(MovieError::UnsupportedBlockData("action"))
        );

        let mut scene = MemoryScene::with_actions();
        scene
            .dispatch_action(&Value::Object(None), &action)
            .unwrap();
        assert_eq!(scene.dispatched().len(), 1);
        assert_eq!(scene.dispatched()[0].action.event, "Explode");

        scene.clear_dispatched();
        assert!(scene.dispatched().is_empty());
    }
}
