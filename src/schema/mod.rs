//! Component Schema Registry
//!
//! Declared properties of every component type a project may use: the
//! user-defined components registered by the editor bundle, merged with the
//! fixed table of engine-native components.
//!
//! The table is built once per run and never mutated afterwards, so it can be
//! shared by reference across any number of documents.

mod native;

pub use native::NATIVE_COMPONENTS;

use crate::error::CleanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component type name -> property name -> raw declaration, as registered by
/// the editor bundle (or read from a pre-extracted schema file)
pub type DynamicSchemaMap = BTreeMap<String, BTreeMap<String, RawProperty>>;

/// Property declaration exactly as registered; validated by [`SchemaTable::build`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    #[serde(rename = "type")]
    pub kind: RawKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Property kind identifier: the editor API's numeric type id, or a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawKind {
    Id(i64),
    Name(String),
}

impl std::fmt::Display for RawKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawKind::Id(id) => write!(f, "{}", id),
            RawKind::Name(name) => f.write_str(name),
        }
    }
}

/// Asset references; never pruned since they carry dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Mesh,
    Texture,
    Material,
    Animation,
    Skin,
}

/// Fixed-length numeric arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    /// RGBA
    Color,
    /// RGB
    OpaqueColor,
    Vector3,
    Vector4,
}

impl VectorKind {
    pub fn len(self) -> usize {
        match self {
            VectorKind::Color | VectorKind::Vector4 => 4,
            VectorKind::OpaqueColor | VectorKind::Vector3 => 3,
        }
    }
}

/// Option groups of the native collision and physx components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    CollisionRadius,
    CollisionExtents,
    PhysxCapsule,
    PhysxMesh,
}

/// Validated property declaration: the kind plus whatever payload that kind
/// needs to judge defaultness
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySchema {
    /// Engine-managed value; defaultness can't be judged
    Native,
    Bool { default: Option<bool> },
    Int { default: Option<f64> },
    Float { default: Option<f64> },
    String { default: Option<String> },
    /// The default is always known: unset defaults fall back to the first value
    Enum { default: String },
    /// Nested nameless struct marker
    Object,
    Asset(AssetKind),
    Vector {
        kind: VectorKind,
        default: Option<Vec<f64>>,
    },
    Composite(CompositeKind),
    /// Kind id this tool doesn't know. Kept so the failure names the property
    /// that uses it, and only if a project actually does.
    Unrecognized { kind: String },
}

impl PropertySchema {
    /// Validate a registered declaration
    pub fn from_raw(
        component: &str,
        property: &str,
        raw: &RawProperty,
    ) -> Result<Self, CleanError> {
        let invalid = |reason: String| CleanError::InvalidSchema {
            component: component.to_string(),
            property: property.to_string(),
            reason,
        };
        let default = raw.default.as_ref().filter(|v| !v.is_null());

        let schema = match parse_kind(&raw.kind) {
            Some(Kind::Native) => PropertySchema::Native,
            Some(Kind::Bool) => PropertySchema::Bool {
                default: match default {
                    None => None,
                    Some(v) => Some(v.as_bool().ok_or_else(|| {
                        invalid(format!("default {} is not a boolean", v))
                    })?),
                },
            },
            Some(kind @ (Kind::Int | Kind::Float)) => {
                let default = match default {
                    None => None,
                    Some(v) => Some(v.as_f64().ok_or_else(|| {
                        invalid(format!("default {} is not a number", v))
                    })?),
                };
                if kind == Kind::Int {
                    PropertySchema::Int { default }
                } else {
                    PropertySchema::Float { default }
                }
            }
            Some(Kind::String) => PropertySchema::String {
                default: match default {
                    None => None,
                    Some(v) => Some(
                        v.as_str()
                            .ok_or_else(|| invalid(format!("default {} is not a string", v)))?
                            .to_string(),
                    ),
                },
            },
            Some(Kind::Enum) => {
                let values = raw.values.as_deref().unwrap_or_default();
                let default = match default {
                    None => values
                        .first()
                        .cloned()
                        .ok_or_else(|| invalid("enum property has no values".to_string()))?,
                    Some(serde_json::Value::String(s)) => s.clone(),
                    // Editor API allows the default to be given as an index
                    Some(v) => v
                        .as_u64()
                        .and_then(|i| values.get(i as usize))
                        .cloned()
                        .ok_or_else(|| {
                            invalid(format!("default {} is not one of the enum values", v))
                        })?,
                };
                PropertySchema::Enum { default }
            }
            Some(Kind::Object) => PropertySchema::Object,
            Some(Kind::Asset(kind)) => PropertySchema::Asset(kind),
            Some(Kind::Vector(kind)) => PropertySchema::Vector {
                kind,
                default: match default {
                    None => None,
                    Some(v) => Some(vector_default(v, kind).ok_or_else(|| {
                        invalid(format!(
                            "default {} is not an array of {} numbers",
                            v,
                            kind.len()
                        ))
                    })?),
                },
            },
            Some(Kind::Composite(kind)) => PropertySchema::Composite(kind),
            None => PropertySchema::Unrecognized {
                kind: raw.kind.to_string(),
            },
        };

        Ok(schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Native,
    Bool,
    Int,
    Float,
    String,
    Enum,
    Object,
    Asset(AssetKind),
    Vector(VectorKind),
    Composite(CompositeKind),
}

fn parse_kind(raw: &RawKind) -> Option<Kind> {
    // Numeric ids follow the editor API's `Type` enum
    let kind = match raw {
        RawKind::Id(0) => Kind::Native,
        RawKind::Id(1) => Kind::Bool,
        RawKind::Id(2) => Kind::Int,
        RawKind::Id(3) => Kind::Float,
        RawKind::Id(4) => Kind::String,
        RawKind::Id(5) => Kind::Enum,
        RawKind::Id(6) => Kind::Object,
        RawKind::Id(7) => Kind::Asset(AssetKind::Mesh),
        RawKind::Id(8) => Kind::Asset(AssetKind::Texture),
        RawKind::Id(9) => Kind::Asset(AssetKind::Material),
        RawKind::Id(10) => Kind::Asset(AssetKind::Animation),
        RawKind::Id(11) => Kind::Asset(AssetKind::Skin),
        RawKind::Id(12) => Kind::Vector(VectorKind::Color),
        RawKind::Id(_) => return None,
        RawKind::Name(name) => match name.as_str() {
            "native" => Kind::Native,
            "bool" => Kind::Bool,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "string" => Kind::String,
            "enum" => Kind::Enum,
            "object" => Kind::Object,
            "mesh" => Kind::Asset(AssetKind::Mesh),
            "texture" => Kind::Asset(AssetKind::Texture),
            "material" => Kind::Asset(AssetKind::Material),
            "animation" => Kind::Asset(AssetKind::Animation),
            "skin" => Kind::Asset(AssetKind::Skin),
            "color" => Kind::Vector(VectorKind::Color),
            "opaque-color" => Kind::Vector(VectorKind::OpaqueColor),
            "vector3" => Kind::Vector(VectorKind::Vector3),
            "vector4" => Kind::Vector(VectorKind::Vector4),
            "collision-radius" => Kind::Composite(CompositeKind::CollisionRadius),
            "collision-extents" => Kind::Composite(CompositeKind::CollisionExtents),
            "physx-capsule" => Kind::Composite(CompositeKind::PhysxCapsule),
            "physx-mesh" => Kind::Composite(CompositeKind::PhysxMesh),
            _ => return None,
        },
    };
    Some(kind)
}

fn vector_default(value: &serde_json::Value, kind: VectorKind) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    if items.len() != kind.len() {
        return None;
    }
    items.iter().map(|v| v.as_f64()).collect()
}

/// Properties of one component type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSchema {
    properties: BTreeMap<String, PropertySchema>,
}

impl ComponentSchema {
    pub fn get(&self, property: &str) -> Option<&PropertySchema> {
        self.properties.get(property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<(String, PropertySchema)> for ComponentSchema {
    fn from_iter<I: IntoIterator<Item = (String, PropertySchema)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

/// Every component type known for a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTable {
    components: BTreeMap<String, ComponentSchema>,
}

impl SchemaTable {
    /// Merge the bundle's components with the native ones.
    ///
    /// Fails if a bundle component reuses a native name, or if a declaration
    /// is invalid (enum without values, default of the wrong shape).
    pub fn build(dynamic: &DynamicSchemaMap) -> Result<Self, CleanError> {
        let mut components = BTreeMap::new();

        for (type_name, raw_properties) in dynamic {
            if NATIVE_COMPONENTS.contains(&type_name.as_str()) {
                return Err(CleanError::SchemaConflict {
                    component: type_name.clone(),
                });
            }

            let schema = raw_properties
                .iter()
                .map(|(prop, raw)| {
                    PropertySchema::from_raw(type_name, prop, raw).map(|s| (prop.clone(), s))
                })
                .collect::<Result<ComponentSchema, _>>()?;
            components.insert(type_name.clone(), schema);
        }

        for (type_name, schema) in native::native_components() {
            components.insert(type_name.to_string(), schema);
        }

        Ok(Self { components })
    }

    pub fn get(&self, component: &str) -> Option<&ComponentSchema> {
        self.components.get(component)
    }

    pub fn contains(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
