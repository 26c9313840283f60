//! Shared fixtures for cleanup tests

use super::{cleanup_project, CleanupOptions, CleanupStats};
use crate::document::{Document, Object};
use crate::error::CleanError;
use crate::schema::{DynamicSchemaMap, SchemaTable};
use serde_json::json;

/// Two user components covering every prunable kind, plus the native table
pub(crate) fn schema() -> SchemaTable {
    let dynamic: DynamicSchemaMap = serde_json::from_value(json!({
        "spinner": {
            "speed": { "type": 3, "default": 1 },
            "count": { "type": 2, "default": 3 },
            "clockwise": { "type": 1, "default": true },
            "label": { "type": 4, "default": "spin" },
            "ratio": { "type": 3 },
            "caption": { "type": 4 },
            "mode": { "type": 5, "values": ["fast", "slow"] },
            "tint": { "type": 12, "default": [1, 1, 1, 1] },
            "target": { "type": 7 },
            "handle": { "type": 0 },
            "nested": { "type": 6 },
            "weird": { "type": 99 }
        },
        "follower": {
            "offset": { "type": "vector3", "default": [1, 1, 1] }
        }
    }))
    .unwrap();
    SchemaTable::build(&dynamic).unwrap()
}

/// Complete project text around the given `objects` section
pub(crate) fn project(objects: &str) -> String {
    format!(
        r#"{{
    "objects": {},
    "meshes": {{}},
    "textures": {{}},
    "images": {{}},
    "materials": {{}},
    "shaders": {{}},
    "settings": {{
        "project": {{"name": "Test"}}
    }},
    "animations": {{}},
    "skins": {{}},
    "pipelines": {{}},
    "files": [],
    "fonts": {{}},
    "languages": {{}}
}}
"#,
        objects
    )
}

/// Parse and clean a project with the fixture schema
pub(crate) fn clean(text: &str) -> Result<(Document, CleanupStats), CleanError> {
    let table = schema();
    let mut doc = Document::parse(text).unwrap();
    let stats = cleanup_project(&mut doc, &table, &CleanupOptions::default())?;
    Ok((doc, stats))
}

/// Object entry by id
pub(crate) fn object<'a>(doc: &'a Document, id: &str) -> &'a Object {
    doc.root()
        .as_object()
        .unwrap()
        .get("objects")
        .unwrap()
        .as_object()
        .unwrap()
        .get(id)
        .unwrap()
        .as_object()
        .unwrap()
}
