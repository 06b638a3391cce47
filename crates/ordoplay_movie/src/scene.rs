// SPDX-License-Identifier: MIT OR Apache-2.0
//! What the movie player needs from the host's scene.
//!
//! The crate has no notion of game objects or components beyond ids. A host
//! implements [`Scene`] to let bindings look objects up, read and write named
//! members, and run actions.

use crate::binding::{ComponentId, ObjectId};
use crate::block::ActionData;
use crate::error::{MovieError, Result};
use crate::value::{Value, ValueType};

/// Access to live scene objects for binding and playback
pub trait Scene {
    /// Whether an object with this id exists
    fn contains_object(&self, object: ObjectId) -> bool;

    /// Display name of an object
    fn object_name(&self, object: ObjectId) -> Option<String>;

    /// Type name of a live component
    fn component_type(&self, component: ComponentId) -> Option<String>;

    /// Object a component is attached to
    fn component_owner(&self, component: ComponentId) -> Option<ObjectId>;

    /// Find a component of exactly `component_type` on an object
    fn find_component(&self, object: ObjectId, component_type: &str) -> Option<ComponentId>;

    /// Declared type of a named member of a referenced object or component
    fn member_type(&self, target: &Value, member: &str) -> Option<ValueType>;

    /// Read a named member of a referenced object or component
    fn get_member(&self, target: &Value, member: &str) -> Option<Value>;

    /// Write a named member of a referenced object or component
    fn set_member(&mut self, target: &Value, member: &str, value: Value) -> Result<()>;

    /// Run an action block's event against a bound target.
    ///
    /// Hosts without action support keep the default, which reports the
    /// block as unsupported.
    fn dispatch_action(&mut self, target: &Value, action: &ActionData) -> Result<()> {
        let _ = (target, action);
        Err(MovieError::UnsupportedBlockData("action"))
    }
}
