//! Component list cleanup
//!
//! Removal rules for the entries of an object's `components` list, and the
//! `active` flag shared by all component kinds.

use super::{Cleaner, ObjectInfo};
use crate::document::{Object, Value};
use crate::error::CleanError;
use crate::schema::ComponentSchema;
use tracing::{debug, warn};

impl Cleaner<'_> {
    /// Clean an object's component list, dropping the `components` key when
    /// no entry survives
    pub(super) fn clean_components(
        &mut self,
        entry: &mut Object,
        object: &ObjectInfo,
    ) -> Result<(), CleanError> {
        let Some(value) = entry.get_mut("components") else {
            return Ok(());
        };
        let found = value.kind_name();
        let components = value.as_array_mut().ok_or_else(|| CleanError::Malformed {
            object: object.name.clone(),
            location: "\"components\"".to_string(),
            expected: "array",
            found,
        })?;

        let count = components.len();
        let removed = components
            .try_retain(|index, component| self.clean_component(index, component, object))?;

        if removed == count {
            entry.remove("components");
            debug!(object = %object.name, "Removed empty component list");
        }
        Ok(())
    }

    /// Returns whether the entry stays in the list
    fn clean_component(
        &mut self,
        index: usize,
        component: &mut Value,
        object: &ObjectInfo,
    ) -> Result<bool, CleanError> {
        let found = component.kind_name();
        let component = match component {
            // Placeholder for an imported component nobody touched yet; only
            // meaningful on linked objects
            Value::Null => return Ok(object.linked),
            Value::Object(c) => c,
            _ => {
                return Err(CleanError::Malformed {
                    object: object.name.clone(),
                    location: format!("component {}", index),
                    expected: "object or null",
                    found,
                })
            }
        };

        let type_name = match component.get("type") {
            None => None,
            Some(ty) => Some(
                ty.as_str()
                    .ok_or_else(|| CleanError::Malformed {
                        object: object.name.clone(),
                        location: format!("type of component {}", index),
                        expected: "string",
                        found: ty.kind_name(),
                    })?
                    .to_string(),
            ),
        };

        let Some(type_name) = type_name else {
            // Linked components may leave out the type: they patch an imported
            // component, e.g. `{ "active": false }` on a mesh from a glb
            if object.linked {
                self.clean_typeless(component, object)?;
                return Ok(true);
            }
            warn!(
                "Removed malformed component in object with name \"{}\" (missing type)",
                object.name
            );
            self.stats.invalid_removed += 1;
            return Ok(false);
        };

        let schema = self.schema;
        let Some(properties) = schema.get(&type_name) else {
            warn!(
                "Removed missing component with type \"{}\" from object with name \"{}\"",
                type_name, object.name
            );
            self.stats.invalid_removed += 1;
            return Ok(false);
        };

        self.clean_typed(component, &type_name, properties, object)?;
        Ok(true)
    }

    fn clean_typed(
        &mut self,
        component: &mut Object,
        type_name: &str,
        properties: &ComponentSchema,
        object: &ObjectInfo,
    ) -> Result<(), CleanError> {
        component.try_retain(|key, value| match key {
            "type" => Ok(true),
            "active" => self.clean_active(value, Some(type_name), object),
            _ if key == type_name => {
                let group = property_group(value, key, object)?;
                self.prune_group(properties, type_name, object, group)?;
                Ok(true)
            }
            _ => {
                // Leftover properties from a type this component used to have
                debug!(object = %object.name, group = key, "Removed stale property group");
                Ok(false)
            }
        })?;
        Ok(())
    }

    /// Every key of a typeless linked component other than `active` is a
    /// property group named after the component type it patches
    fn clean_typeless(
        &mut self,
        component: &mut Object,
        object: &ObjectInfo,
    ) -> Result<(), CleanError> {
        let schema = self.schema;
        component.try_retain(|key, value| {
            if key == "active" {
                return self.clean_active(value, None, object);
            }
            let Some(properties) = schema.get(key) else {
                warn!(
                    "Removed property group for unknown component type \"{}\" from linked object with name \"{}\"",
                    key, object.name
                );
                self.stats.invalid_removed += 1;
                return Ok(false);
            };
            let group = property_group(value, key, object)?;
            self.prune_group(properties, key, object, group)?;
            Ok(true)
        })?;
        Ok(())
    }

    /// `active: true` is the implicit default and gets removed; `false` stays
    fn clean_active(
        &mut self,
        value: &Value,
        type_name: Option<&str>,
        object: &ObjectInfo,
    ) -> Result<bool, CleanError> {
        match value {
            Value::Bool(true) => {
                self.stats.defaults_removed += 1;
                Ok(false)
            }
            Value::Bool(false) => Ok(true),
            _ => Err(CleanError::InvalidActiveValue {
                object: object.name.clone(),
                component: type_name.map(str::to_string),
            }),
        }
    }
}

fn property_group<'v>(
    value: &'v mut Value,
    key: &str,
    object: &ObjectInfo,
) -> Result<&'v mut Object, CleanError> {
    let found = value.kind_name();
    value.as_object_mut().ok_or_else(|| CleanError::Malformed {
        object: object.name.clone(),
        location: format!("property group \"{}\"", key),
        expected: "object",
        found,
    })
}
