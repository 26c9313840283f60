//! Project Cleanup
//!
//! Walks every object of a parsed project and removes what the engine would
//! reconstruct anyway:
//! - component properties equal to their declared default
//! - `active: true` flags
//! - transforms at identity (unlinked objects only)
//! - components of unknown type, undeclared properties, stale property groups
//!
//! then collapses top-level sections that ended up empty. Everything happens
//! in place on the [`Document`], so the result serializes with the original
//! formatting everywhere else.
//!
//! Any error aborts the run. The document may be partially cleaned at that
//! point and must not be written out.

mod component;
mod property;
mod transform;

#[cfg(test)]
mod testing;

pub use transform::{normalize_component, Canonical, DEFAULT_EPSILON};

use crate::document::{Document, Object, Value};
use crate::error::CleanError;
use crate::schema::SchemaTable;
use std::fmt;
use tracing::{debug, info};

/// Top-level sections keyed by id. All must be present, even if empty.
pub const OBJECT_SECTIONS: [&str; 12] = [
    "objects",
    "meshes",
    "textures",
    "images",
    "materials",
    "shaders",
    "settings",
    "animations",
    "skins",
    "pipelines",
    "fonts",
    "languages",
];

/// The one array-shaped top-level section
pub const FILES_SECTION: &str = "files";

/// Tunables for a cleanup run
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOptions {
    /// Tolerance for snapping transform components to 0 or 1
    pub epsilon: f64,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// What a run removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Properties and `active` flags equal to their default
    pub defaults_removed: usize,
    /// Unknown components, malformed components and undeclared properties
    pub invalid_removed: usize,
}

impl CleanupStats {
    /// True if the run changed nothing that is counted
    pub fn is_empty(&self) -> bool {
        self.defaults_removed == 0 && self.invalid_removed == 0
    }
}

impl fmt::Display for CleanupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleanup statistics:")?;
        writeln!(f, " - Default values removed: {}", self.defaults_removed)?;
        write!(f, " - Invalid components removed: {}", self.invalid_removed)
    }
}

/// Resolved identity of the object being cleaned
#[derive(Debug, Clone)]
pub(crate) struct ObjectInfo {
    /// Own name, or the name of the linked source object
    pub name: String,
    /// Has a `link`: content comes from another file, so implicit defaults
    /// are that file's, not the engine's
    pub linked: bool,
}

/// Walk state: the read-only schema and the running counters
struct Cleaner<'a> {
    schema: &'a SchemaTable,
    epsilon: f64,
    stats: CleanupStats,
}

impl<'a> Cleaner<'a> {
    fn new(schema: &'a SchemaTable, options: &CleanupOptions) -> Self {
        Self {
            schema,
            epsilon: options.epsilon,
            stats: CleanupStats::default(),
        }
    }

    fn clean_object(&mut self, id: &str, entry: &mut Value) -> Result<(), CleanError> {
        let found = entry.kind_name();
        let entry = entry.as_object_mut().ok_or_else(|| CleanError::Malformed {
            object: id.to_string(),
            location: "object entry".to_string(),
            expected: "object",
            found,
        })?;

        let object = resolve_object(id, entry)?;
        debug!(id, object = %object.name, linked = object.linked, "Cleaning object");

        self.clean_components(entry, &object)?;
        transform::clean_transforms(entry, &object, self.epsilon)
    }
}

/// Resolve the display name and linked status of an object entry
fn resolve_object(id: &str, entry: &Object) -> Result<ObjectInfo, CleanError> {
    let malformed = |location: &str, found: &'static str| CleanError::Malformed {
        object: id.to_string(),
        location: location.to_string(),
        expected: "string",
        found,
    };

    let mut name = None;

    let link = entry.get("link");
    if let Some(link) = link {
        let link = link.as_object().ok_or_else(|| CleanError::Malformed {
            object: id.to_string(),
            location: "\"link\"".to_string(),
            expected: "object",
            found: link.kind_name(),
        })?;
        if let Some(link_name) = link.get("name") {
            let link_name = link_name
                .as_str()
                .ok_or_else(|| malformed("\"link.name\"", link_name.kind_name()))?;
            name = Some(link_name.to_string());
        }
    }

    if let Some(own_name) = entry.get("name") {
        let own_name = own_name
            .as_str()
            .ok_or_else(|| malformed("\"name\"", own_name.kind_name()))?;
        name = Some(own_name.to_string());
    }

    let linked = link.is_some();
    let name = name.ok_or_else(|| CleanError::MissingName {
        id: id.to_string(),
        linked,
    })?;
    Ok(ObjectInfo { name, linked })
}

/// Fail early if the project root is missing a section or has one of the
/// wrong shape
fn check_sections(root: &Object) -> Result<(), CleanError> {
    for section in OBJECT_SECTIONS {
        match root.get(section) {
            None => return Err(CleanError::MissingSection { section }),
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(CleanError::MalformedSection {
                    section,
                    expected: "an object",
                    found: other.kind_name(),
                })
            }
        }
    }

    match root.get(FILES_SECTION) {
        None => Err(CleanError::MissingSection {
            section: FILES_SECTION,
        }),
        Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(CleanError::MalformedSection {
            section: FILES_SECTION,
            expected: "an array",
            found: other.kind_name(),
        }),
    }
}

/// Clean a parsed project in place.
///
/// The schema table is only read, so one table can serve any number of
/// documents.
pub fn cleanup_project(
    doc: &mut Document,
    schema: &SchemaTable,
    options: &CleanupOptions,
) -> Result<CleanupStats, CleanError> {
    let found = doc.root().kind_name();
    let root = doc
        .root_mut()
        .as_object_mut()
        .ok_or(CleanError::MalformedSection {
            section: "(root)",
            expected: "an object",
            found,
        })?;
    check_sections(root)?;

    let mut cleaner = Cleaner::new(schema, options);

    if let Some(objects) = root.get_mut("objects").and_then(Value::as_object_mut) {
        info!("Cleaning {} objects...", objects.len());
        for (id, entry) in objects.entries_mut() {
            cleaner.clean_object(id, entry)?;
        }
    }

    for section in OBJECT_SECTIONS {
        if let Some(obj) = root.get_mut(section).and_then(Value::as_object_mut) {
            if obj.compact_if_empty() {
                debug!(section, "Compacted empty section");
            }
        }
    }
    if let Some(files) = root.get_mut(FILES_SECTION).and_then(Value::as_array_mut) {
        files.compact_if_empty();
    }

    Ok(cleaner.stats)
}
