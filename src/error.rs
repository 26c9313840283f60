//! Fatal cleanup errors
//!
//! Object-level variants name the object they happened in: its resolved name, or its
//! id when no name could be resolved.

use thiserror::Error;

/// Errors that abort a cleanup run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    /// A required top-level section is absent
    #[error("project is missing the top-level \"{section}\" section")]
    MissingSection { section: &'static str },

    /// A top-level section has the wrong shape
    #[error("top-level \"{section}\" section must be {expected}, found {found}")]
    MalformedSection {
        section: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Object has no `name`, and no `link.name` to fall back on
    #[error("malformed object \"{id}\" ({})", missing_name_reason(.linked))]
    MissingName { id: String, linked: bool },

    /// Part of an object does not have the expected JSON shape
    #[error("unexpected {found} for {location} in object with name \"{object}\", expected {expected}")]
    Malformed {
        object: String,
        location: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `translation`, `scaling` or `rotation` is not a numeric array of the right length
    #[error("malformed \"{field}\" in object with name \"{object}\": {reason}")]
    MalformedTransform {
        object: String,
        field: &'static str,
        reason: String,
    },

    #[error("unexpected vector length (expected {expected}, got {found}) for component property \"{property}\" from component with type \"{component}\" from object with name \"{object}\"")]
    VectorLengthMismatch {
        object: String,
        component: String,
        property: String,
        expected: usize,
        found: usize,
    },

    /// Property value does not match its declared kind
    #[error("unexpected {found} value for component property \"{property}\" from component with type \"{component}\" from object with name \"{object}\", expected {expected}")]
    TypeMismatch {
        object: String,
        component: String,
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid \"active\" value for {} from object with name \"{object}\"", active_target(.component))]
    InvalidActiveValue {
        object: String,
        /// `None` for typeless components on linked objects
        component: Option<String>,
    },

    #[error("unexpected property type \"{kind}\" for component property \"{property}\" from component with type \"{component}\" from object with name \"{object}\"")]
    UnknownPropertyKind {
        object: String,
        component: String,
        property: String,
        kind: String,
    },

    /// Editor bundle declares a component that shadows a built-in one
    #[error("unexpected component with native name \"{component}\" in editor bundle")]
    SchemaConflict { component: String },

    #[error("invalid schema for property \"{property}\" of component \"{component}\": {reason}")]
    InvalidSchema {
        component: String,
        property: String,
        reason: String,
    },
}

fn active_target(component: &Option<String>) -> String {
    match component {
        Some(ty) => format!("component with type \"{}\"", ty),
        None => "linked component with unknown type".to_string(),
    }
}

fn missing_name_reason(linked: &bool) -> &'static str {
    if *linked {
        "linked object without a name, and its link has none either"
    } else {
        "missing name despite being unlinked"
    }
}
