//! Transform normalization
//!
//! Snaps near-zero and near-one transform components to exact `0.0` / `1.0`
//! literals, and drops whole transform arrays that end up at their default.

use super::ObjectInfo;
use crate::document::{Number, Object, Value};
use crate::error::CleanError;
use tracing::debug;

/// Tolerance used when snapping transform components
pub const DEFAULT_EPSILON: f64 = 0.0001;

/// Exact value a transform component was snapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    Zero,
    One,
}

impl Canonical {
    fn value(self) -> f64 {
        match self {
            Canonical::Zero => 0.0,
            Canonical::One => 1.0,
        }
    }
}

struct TransformField {
    name: &'static str,
    default: &'static [Canonical],
}

const TRANSFORM_FIELDS: [TransformField; 3] = [
    TransformField {
        name: "translation",
        default: &[Canonical::Zero, Canonical::Zero, Canonical::Zero],
    },
    TransformField {
        name: "scaling",
        default: &[Canonical::One, Canonical::One, Canonical::One],
    },
    TransformField {
        name: "rotation",
        default: &[
            Canonical::Zero,
            Canonical::Zero,
            Canonical::Zero,
            Canonical::One,
        ],
    },
];

/// Classify one transform component, rewriting it in place to `0.0` or `1.0`
/// if it lies within `epsilon` of either. Values elsewhere are left untouched.
pub fn normalize_component(number: &mut Number, epsilon: f64) -> Option<Canonical> {
    let value = number.value();
    let canonical = [Canonical::Zero, Canonical::One]
        .into_iter()
        .find(|c| (value - c.value()).abs() <= epsilon)?;
    *number = Number::canonical(canonical.value());
    Some(canonical)
}

/// Normalize `translation`, `scaling` and `rotation` of one object.
///
/// Components are snapped for every object, but only unlinked objects lose
/// arrays that are entirely at their default: a linked object's implicit
/// transform comes from its source file.
pub(super) fn clean_transforms(
    entry: &mut Object,
    object: &ObjectInfo,
    epsilon: f64,
) -> Result<(), CleanError> {
    for field in &TRANSFORM_FIELDS {
        let Some(value) = entry.get_mut(field.name) else {
            continue;
        };

        let malformed = |reason: String| CleanError::MalformedTransform {
            object: object.name.clone(),
            field: field.name,
            reason,
        };

        let found = value.kind_name();
        let array = value
            .as_array_mut()
            .ok_or_else(|| malformed(format!("expected an array, found {}", found)))?;
        if array.len() != field.default.len() {
            return Err(malformed(format!(
                "expected {} elements, found {}",
                field.default.len(),
                array.len()
            )));
        }

        let mut at_default = !object.linked;
        for (i, element) in array.iter_mut().enumerate() {
            let number = match element {
                Value::Number(n) => n,
                other => {
                    return Err(malformed(format!(
                        "element {} is {}, expected a number",
                        i,
                        other.kind_name()
                    )))
                }
            };
            if normalize_component(number, epsilon) != Some(field.default[i]) {
                at_default = false;
            }
        }

        if at_default {
            entry.remove(field.name);
            debug!(object = %object.name, field = field.name, "Removed default transform");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn info(linked: bool) -> ObjectInfo {
        ObjectInfo {
            name: "Thing".to_string(),
            linked,
        }
    }

    fn clean(text: &str, linked: bool) -> Result<String, CleanError> {
        let mut doc = Document::parse(text).unwrap();
        let entry = doc.root_mut().as_object_mut().unwrap();
        clean_transforms(entry, &info(linked), DEFAULT_EPSILON)?;
        Ok(doc.to_string())
    }

    fn number(raw: &str) -> Number {
        match Document::parse(raw).unwrap().root() {
            Value::Number(n) => n.clone(),
            other => panic!("not a number: {:?}", other),
        }
    }

    #[test]
    fn test_normalize_component() {
        let mut n = number("0.00009");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), Some(Canonical::Zero));
        assert_eq!(n.raw(), "0.0");

        let mut n = number("-0.00001");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), Some(Canonical::Zero));
        assert_eq!(n.raw(), "0.0");

        let mut n = number("0.99999");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), Some(Canonical::One));
        assert_eq!(n.raw(), "1.0");

        let mut n = number("1");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), Some(Canonical::One));
        assert_eq!(n.raw(), "1.0");

        let mut n = number("0.5");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), None);
        assert_eq!(n.raw(), "0.5");

        let mut n = number("0.001");
        assert_eq!(normalize_component(&mut n, DEFAULT_EPSILON), None);
        assert_eq!(n.raw(), "0.001");
    }

    #[test]
    fn test_default_transforms_removed_when_unlinked() {
        let out = clean(
            r#"{"name": "Thing", "translation": [0, 0, 0], "scaling": [1, 1, 1], "rotation": [0, 0, 0, 1]}"#,
            false,
        )
        .unwrap();
        assert_eq!(out, r#"{"name": "Thing"}"#);
    }

    #[test]
    fn test_default_transforms_kept_when_linked() {
        let out = clean(
            r#"{"translation": [0, 0, 0], "rotation": [0, 0, 0, 0.99999]}"#,
            true,
        )
        .unwrap();
        assert_eq!(out, r#"{"translation": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0]}"#);
    }

    #[test]
    fn test_near_default_rotation_becomes_canonical_and_removed() {
        let out = clean(r#"{"rotation": [0, 0, 0, 0.99999], "a": 1}"#, false).unwrap();
        assert_eq!(out, r#"{"a": 1}"#);
    }

    #[test]
    fn test_partial_snap_keeps_array() {
        let out = clean(r#"{"translation": [0.00001, 2.5, 0.99999]}"#, false).unwrap();
        assert_eq!(out, r#"{"translation": [0.0, 2.5, 1.0]}"#);
    }

    #[test]
    fn test_scaling_zero_is_not_default() {
        let out = clean(r#"{"scaling": [0, 0, 0]}"#, false).unwrap();
        assert_eq!(out, r#"{"scaling": [0.0, 0.0, 0.0]}"#);
    }

    #[test]
    fn test_wrong_length_is_fatal() {
        let err = clean(r#"{"rotation": [0, 0, 1]}"#, false).unwrap_err();
        match err {
            CleanError::MalformedTransform { object, field, reason } => {
                assert_eq!(object, "Thing");
                assert_eq!(field, "rotation");
                assert_eq!(reason, "expected 4 elements, found 3");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_element_is_fatal() {
        let err = clean(r#"{"translation": [0, "0", 0]}"#, false).unwrap_err();
        assert!(matches!(err, CleanError::MalformedTransform { field: "translation", .. }));

        let err = clean(r#"{"scaling": 1}"#, false).unwrap_err();
        assert!(matches!(err, CleanError::MalformedTransform { field: "scaling", .. }));
    }
}
