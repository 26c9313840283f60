//! Built-in engine components
//!
//! Native components declare their properties with the opaque "native" kind,
//! so their schemas can't be read from the editor bundle. They are written out
//! by hand here with the engine's defaults.

use super::{AssetKind, ComponentSchema, CompositeKind, PropertySchema, VectorKind};

/// Component type names reserved by the engine
pub const NATIVE_COMPONENTS: [&str; 8] = [
    "animation",
    "collision",
    "input",
    "light",
    "mesh",
    "physx",
    "text",
    "view",
];

fn boolean(default: bool) -> PropertySchema {
    PropertySchema::Bool {
        default: Some(default),
    }
}

fn int(default: f64) -> PropertySchema {
    PropertySchema::Int {
        default: Some(default),
    }
}

fn float(default: f64) -> PropertySchema {
    PropertySchema::Float {
        default: Some(default),
    }
}

fn choice(default: &str) -> PropertySchema {
    PropertySchema::Enum {
        default: default.to_string(),
    }
}

fn component(properties: Vec<(&str, PropertySchema)>) -> ComponentSchema {
    properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect()
}

pub(super) fn native_components() -> Vec<(&'static str, ComponentSchema)> {
    vec![
        (
            "animation",
            component(vec![
                ("animation", PropertySchema::Asset(AssetKind::Animation)),
                ("playCount", int(0.0)),
                ("speed", float(1.0)),
                ("autoplay", boolean(false)),
                ("retarget", boolean(false)),
                ("preview", boolean(false)),
            ]),
        ),
        (
            // sphere/aabb/box are option groups (radius or extents), not plain values
            "collision",
            component(vec![
                ("groups", int(255.0)),
                ("collider", choice("sphere")),
                ("sphere", PropertySchema::Composite(CompositeKind::CollisionRadius)),
                ("aabb", PropertySchema::Composite(CompositeKind::CollisionExtents)),
                ("box", PropertySchema::Composite(CompositeKind::CollisionExtents)),
            ]),
        ),
        (
            "input",
            component(vec![("type", choice("head"))]),
        ),
        (
            "light",
            component(vec![
                ("type", choice("point")),
                (
                    "color",
                    PropertySchema::Vector {
                        kind: VectorKind::OpaqueColor,
                        default: Some(vec![1.0, 1.0, 1.0]),
                    },
                ),
                ("intensity", float(1.0)),
                ("outerAngle", float(90.0)),
                ("innerAngle", float(45.0)),
                ("shadows", boolean(false)),
                ("shadowRange", float(10.0)),
                ("shadowBias", float(0.001)),
                ("shadowNormalBias", float(0.001)),
                ("shadowTexelSize", float(1.0)),
            ]),
        ),
        (
            "mesh",
            component(vec![
                ("mesh", PropertySchema::Asset(AssetKind::Mesh)),
                ("material", PropertySchema::Asset(AssetKind::Material)),
                ("skin", PropertySchema::Asset(AssetKind::Skin)),
            ]),
        ),
        (
            "physx",
            component(vec![
                ("shape", choice("sphere")),
                ("sphere", PropertySchema::Composite(CompositeKind::CollisionRadius)),
                ("capsule", PropertySchema::Composite(CompositeKind::PhysxCapsule)),
                ("box", PropertySchema::Composite(CompositeKind::CollisionExtents)),
                ("convexMesh", PropertySchema::Composite(CompositeKind::PhysxMesh)),
                ("triangleMesh", PropertySchema::Composite(CompositeKind::PhysxMesh)),
                ("allowSimulation", boolean(true)),
                ("trigger", boolean(false)),
                ("allowQuery", boolean(true)),
                ("simulate", boolean(true)),
                ("static", boolean(false)),
                ("gravity", boolean(true)),
                ("kinematic", boolean(false)),
                ("mass", float(1.0)),
                ("linearDamping", float(1.0)),
                ("angularDamping", float(0.05)),
                ("staticFriction", float(0.5)),
                ("dynamicFriction", float(0.5)),
                ("bounciness", float(0.5)),
                ("groups", int(255.0)),
                ("block", int(255.0)),
                ("lockAxis", int(0.0)),
                ("solverPositionIterations", int(4.0)),
                ("solverVelocityIterations", int(1.0)),
            ]),
        ),
        (
            "text",
            component(vec![
                ("alignment", choice("center")),
                ("justification", choice("middle")),
                ("characterSpacing", float(0.0)),
                ("lineSpacing", float(1.2)),
                ("effect", choice("none")),
                (
                    "text",
                    PropertySchema::String {
                        default: Some("Wonderland Engine".to_string()),
                    },
                ),
                // No engine default, so never auto-cleaned
                ("material", PropertySchema::Asset(AssetKind::Material)),
            ]),
        ),
        (
            "view",
            component(vec![
                ("fov", float(90.0)),
                ("near", float(0.01)),
                ("far", float(100.0)),
            ]),
        ),
    ]
}
