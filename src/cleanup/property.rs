//! Property pruning
//!
//! Decides, per declared kind, whether a component property equals its
//! default. Defaults are compared exactly; unlike transforms there is no
//! tolerance here.

use super::{Cleaner, ObjectInfo};
use crate::document::{Object, Value};
use crate::error::CleanError;
use crate::schema::{ComponentSchema, PropertySchema};
use tracing::{debug, warn};

impl Cleaner<'_> {
    /// Prune every property of one component's property group
    pub(super) fn prune_group(
        &mut self,
        properties: &ComponentSchema,
        component: &str,
        object: &ObjectInfo,
        group: &mut Object,
    ) -> Result<(), CleanError> {
        group.try_retain(|key, value| {
            self.prune_property(properties, component, object, key, value)
                .map(|deleted| !deleted)
        })?;
        Ok(())
    }

    /// Returns whether the property should be deleted: either it isn't
    /// declared by the component, or it holds the declared default.
    pub(super) fn prune_property(
        &mut self,
        properties: &ComponentSchema,
        component: &str,
        object: &ObjectInfo,
        key: &str,
        value: &Value,
    ) -> Result<bool, CleanError> {
        let Some(schema) = properties.get(key) else {
            warn!(
                "Invalid component property \"{}\" removed for component with type \"{}\" from object with name \"{}\"",
                key, component, object.name
            );
            self.stats.invalid_removed += 1;
            return Ok(true);
        };

        let mismatch = |expected: &'static str| CleanError::TypeMismatch {
            object: object.name.clone(),
            component: component.to_string(),
            property: key.to_string(),
            expected,
            found: value.kind_name(),
        };

        let is_default = match schema {
            PropertySchema::Native => {
                warn!(
                    "Ignored native property \"{}\" for component with type \"{}\" from object with name \"{}\"",
                    key, component, object.name
                );
                false
            }
            PropertySchema::Bool { default } => {
                let v = value.as_bool().ok_or_else(|| mismatch("boolean"))?;
                *default == Some(v)
            }
            // Numbers and strings are only checked against a declared default
            PropertySchema::Int { default } | PropertySchema::Float { default } => match default {
                Some(default) => {
                    let v = value.as_f64().ok_or_else(|| mismatch("number"))?;
                    *default == v
                }
                None => false,
            },
            PropertySchema::String { default } => match default {
                Some(default) => {
                    let v = value.as_str().ok_or_else(|| mismatch("string"))?;
                    default == v
                }
                None => false,
            },
            PropertySchema::Enum { default } => {
                let v = value.as_str().ok_or_else(|| mismatch("string"))?;
                default == v
            }
            PropertySchema::Vector { kind, default } => {
                let array = value.as_array().ok_or_else(|| mismatch("numeric array"))?;
                if array.len() != kind.len() {
                    return Err(CleanError::VectorLengthMismatch {
                        object: object.name.clone(),
                        component: component.to_string(),
                        property: key.to_string(),
                        expected: kind.len(),
                        found: array.len(),
                    });
                }
                let elements = array
                    .iter()
                    .map(Value::as_f64)
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| mismatch("numeric array"))?;
                default.as_ref() == Some(&elements)
            }
            // Dependency tracking would go here; references are kept as-is
            PropertySchema::Asset(_) => false,
            PropertySchema::Composite(_) | PropertySchema::Object => false,
            PropertySchema::Unrecognized { kind } => {
                return Err(CleanError::UnknownPropertyKind {
                    object: object.name.clone(),
                    component: component.to_string(),
                    property: key.to_string(),
                    kind: kind.clone(),
                });
            }
        };

        if is_default {
            debug!(object = %object.name, component, property = key, "Removed default property");
            self.stats.defaults_removed += 1;
        }
        Ok(is_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::testing::schema;
    use crate::cleanup::{CleanupOptions, CleanupStats};
    use crate::document::Document;

    /// Prune `spinner` properties given as a JSON object, returning what's left
    fn prune(group: &str) -> Result<(String, CleanupStats), CleanError> {
        let table = schema();
        let mut cleaner = Cleaner::new(&table, &CleanupOptions::default());
        let object = ObjectInfo {
            name: "Spinner".to_string(),
            linked: false,
        };
        let mut doc = Document::parse(group).unwrap();
        let group = doc.root_mut().as_object_mut().unwrap();
        let properties = table.get("spinner").unwrap();
        cleaner.prune_group(properties, "spinner", &object, group)?;
        Ok((doc.to_string(), cleaner.stats))
    }

    #[test]
    fn test_bool_default_true() {
        let (out, stats) = prune(r#"{"clockwise": true}"#).unwrap();
        assert_eq!(out, "{}");
        assert_eq!(stats.defaults_removed, 1);

        let (out, stats) = prune(r#"{"clockwise": false}"#).unwrap();
        assert_eq!(out, r#"{"clockwise": false}"#);
        assert_eq!(stats.defaults_removed, 0);
    }

    #[test]
    fn test_bool_rejects_other_values() {
        let err = prune(r#"{"clockwise": 1}"#).unwrap_err();
        assert_eq!(
            err,
            CleanError::TypeMismatch {
                object: "Spinner".into(),
                component: "spinner".into(),
                property: "clockwise".into(),
                expected: "boolean",
                found: "number",
            }
        );
    }

    #[test]
    fn test_numbers_compare_exactly() {
        let (out, stats) = prune(r#"{"speed": 1.0, "count": 3}"#).unwrap();
        assert_eq!(out, "{}");
        assert_eq!(stats.defaults_removed, 2);

        let (out, stats) = prune(r#"{"speed": 1.00001, "count": 4}"#).unwrap();
        assert_eq!(out, r#"{"speed": 1.00001, "count": 4}"#);
        assert_eq!(stats.defaults_removed, 0);
    }

    #[test]
    fn test_number_with_default_rejects_string() {
        let err = prune(r#"{"speed": "fast"}"#).unwrap_err();
        assert!(matches!(
            err,
            CleanError::TypeMismatch { expected: "number", found: "string", .. }
        ));
    }

    #[test]
    fn test_without_default_value_is_kept_unchecked() {
        let input = r#"{"ratio": "half", "caption": 12}"#;
        let (out, stats) = prune(input).unwrap();
        assert_eq!(out, input);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_strings_and_enums() {
        let (out, stats) = prune(r#"{"label": "spin", "mode": "fast"}"#).unwrap();
        assert_eq!(out, "{}");
        assert_eq!(stats.defaults_removed, 2);

        let (out, _) = prune(r#"{"label": "Spin", "mode": "slow"}"#).unwrap();
        assert_eq!(out, r#"{"label": "Spin", "mode": "slow"}"#);
    }

    #[test]
    fn test_vectors_compare_elementwise() {
        let (out, stats) = prune(r#"{"tint": [1, 1, 1, 1]}"#).unwrap();
        assert_eq!(out, "{}");
        assert_eq!(stats.defaults_removed, 1);

        // No tolerance, unlike transforms
        let (out, _) = prune(r#"{"tint": [1, 1, 1, 0.9999999]}"#).unwrap();
        assert_eq!(out, r#"{"tint": [1, 1, 1, 0.9999999]}"#);
    }

    #[test]
    fn test_vector_length_mismatch() {
        let err = prune(r#"{"tint": [1, 1, 1]}"#).unwrap_err();
        assert!(matches!(
            err,
            CleanError::VectorLengthMismatch { expected: 4, found: 3, .. }
        ));
    }

    #[test]
    fn test_references_and_natives_are_kept() {
        let input = r#"{"target": "mesh-12", "handle": 7, "nested": {"a": 1}}"#;
        let (out, stats) = prune(input).unwrap();
        assert_eq!(out, input);
        assert_eq!(stats.defaults_removed, 0);
    }

    #[test]
    fn test_undeclared_property_is_invalid() {
        let (out, stats) = prune(r#"{"speed": 2, "gone": true}"#).unwrap();
        assert_eq!(out, r#"{"speed": 2}"#);
        assert_eq!(stats.invalid_removed, 1);
        assert_eq!(stats.defaults_removed, 0);
    }

    #[test]
    fn test_unrecognized_kind_is_fatal() {
        let err = prune(r#"{"weird": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            CleanError::UnknownPropertyKind { ref kind, ref property, .. }
                if kind == "99" && property == "weird"
        ));
    }
}
