//! [`HierarchyEntry`] (§3): the unit of scene serialization, and its
//! on-disk JSON shape (§6: "Component-variant-specific subtrees keyed by
//! the type GUID string of the variant").
//!
//! Grounded on the teacher's `src/assets/loaders/gltf.rs`, which already
//! mutates a raw `serde_json::Value` prefab-metadata tree incrementally as
//! it walks a glTF node graph (ensuring children, inserting component
//! subtrees by key). This module generalises that pattern into a typed
//! struct with an explicit `to_value`/`from_value` pair instead of ad hoc
//! `Value` mutation, since the Hierarchy Model owns the whole document
//! shape rather than patching one loader's slice of it.

use serde_json::{json, Map, Value};

use crate::errors::{CompileError, Result};
use crate::guid::Guid;
use crate::hierarchy::component::{Component, PhysicsType};
use crate::hierarchy::transform::LocalTransform;

/// One node in the engine-neutral scene tree (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyEntry {
    /// Asset GUID; only populated on the root entry of a scene asset.
    pub guid: Option<Guid>,
    /// Stable per-instance identity (§3), unique within the document even
    /// for entries with no `guid`.
    pub instance_guid: Guid,
    pub name: String,
    pub source_name: String,
    pub local_transform: LocalTransform,
    pub physics_type: Option<PhysicsType>,
    pub component: Component,
    pub children: Vec<HierarchyEntry>,
}

impl HierarchyEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, source_name: impl Into<String>, component: Component) -> Self {
        Self {
            guid: None,
            instance_guid: Guid::new(),
            name: name.into(),
            source_name: source_name.into(),
            local_transform: LocalTransform::IDENTITY,
            physics_type: None,
            component,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_transform(mut self, t: LocalTransform) -> Self {
        self.local_transform = t;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<HierarchyEntry>) -> Self {
        self.children = children;
        self
    }

    /// Deduplicated flat list of every asset GUID referenced anywhere in
    /// this entry's subtree (including `self`), excluding `self.guid`
    /// (§3 invariant (i), §8 "Dependency closure": "equals the set of GUIDs
    /// referenced anywhere in its hierarchy, minus its own root GUID").
    #[must_use]
    pub fn dependencies(&self) -> Vec<Guid> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        self.collect_dependencies(&mut seen, &mut out);
        if let Some(root) = self.guid {
            out.retain(|g| *g != root);
        }
        out
    }

    fn collect_dependencies(&self, seen: &mut rustc_hash::FxHashSet<Guid>, out: &mut Vec<Guid>) {
        for guid in self.component.referenced_guids() {
            if seen.insert(guid) {
                out.push(guid);
            }
        }
        for child in &self.children {
            child.collect_dependencies(seen, out);
        }
    }

    /// Serializes to the on-disk metadata shape (§6). `is_root` controls
    /// whether `guid`/`dependencies` are emitted (root-only per §3
    /// invariant (i)).
    #[must_use]
    pub fn to_value(&self, is_root: bool) -> Value {
        let mut obj = Map::new();

        if is_root {
            if let Some(guid) = self.guid {
                obj.insert("guid".into(), json!(guid));
            }
            obj.insert("dependencies".into(), json!(self.dependencies()));
        }

        obj.insert("instanceGuid".into(), json!(self.instance_guid));
        obj.insert("name".into(), json!(self.name));
        obj.insert("sourceName".into(), json!(self.source_name));
        obj.insert("typeGuid".into(), json!(self.component.type_guid()));
        obj.insert("transform".into(), json!(self.local_transform));

        let mut data_components = Vec::new();
        if let Some(physics_type) = self.physics_type {
            data_components.push(json!({
                "typeGuid": crate::guid::TypeGuid::physics_body(),
                "type": physics_type,
            }));
        }
        if !data_components.is_empty() {
            obj.insert("data_components".into(), Value::Array(data_components));
        }

        let type_guid_key = self.component.type_guid().0.to_string();
        let component_value = serde_json::to_value(&self.component).unwrap_or(Value::Null);
        let fields = match component_value {
            Value::Object(map) => map.into_values().next().unwrap_or(Value::Object(Map::new())),
            _ => Value::Object(Map::new()),
        };
        obj.insert(type_guid_key, fields);

        obj.insert(
            "children".into(),
            Value::Array(self.children.iter().map(|c| c.to_value(false)).collect()),
        );

        Value::Object(obj)
    }

    /// Parses a [`HierarchyEntry`] back out of the shape [`Self::to_value`]
    /// produces (§8 "Round-trip of hierarchy").
    pub fn from_value(value: &Value, is_root: bool) -> Result<HierarchyEntry> {
        let obj = value
            .as_object()
            .ok_or_else(|| CompileError::JsonError(serde::de::Error::custom("hierarchy entry is not an object")))?;

        let guid = if is_root {
            obj.get("guid")
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?
        } else {
            None
        };

        let instance_guid = obj
            .get("instanceGuid")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();
        let name = obj.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        let source_name = obj
            .get("sourceName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let local_transform = obj
            .get("transform")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();

        let physics_type = obj
            .get("data_components")
            .and_then(Value::as_array)
            .and_then(|list| {
                list.iter()
                    .find(|c| c.get("typeGuid").and_then(Value::as_str) == Some(&crate::guid::TypeGuid::physics_body().0.to_string()))
            })
            .and_then(|c| c.get("type"))
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?;

        let type_guid_str = obj
            .get("typeGuid")
            .and_then(Value::as_str)
            .ok_or_else(|| CompileError::JsonError(serde::de::Error::custom("missing typeGuid")))?;
        let variant_name = Component::variant_name_for_type_guid(type_guid_str).ok_or_else(|| {
            CompileError::JsonError(serde::de::Error::custom(format!("unknown component type guid {type_guid_str}")))
        })?;
        let fields = obj.get(type_guid_str).cloned().unwrap_or(Value::Object(Map::new()));
        let wrapped = if variant_name == "Simple" {
            Value::String("Simple".into())
        } else {
            json!({ variant_name: fields })
        };
        let component: Component = serde_json::from_value(wrapped)?;

        let children = obj
            .get("children")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|v| HierarchyEntry::from_value(v, false))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(HierarchyEntry {
            guid,
            instance_guid,
            name,
            source_name,
            local_transform,
            physics_type,
            component,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::component::RenderStages;

    fn sample_tree() -> HierarchyEntry {
        let mesh_guid = Guid::new();
        let material_guid = Guid::new();
        let leaf = HierarchyEntry::new(
            "Cube",
            "Cube_raw",
            Component::StaticMesh {
                mesh: mesh_guid,
                material_instance: material_guid,
                stages: RenderStages(vec![Guid::new()]),
            },
        );
        HierarchyEntry {
            guid: Some(Guid::new()),
            ..HierarchyEntry::new("Root", "Root_raw", Component::Simple).with_children(vec![leaf])
        }
    }

    #[test]
    fn round_trip_preserves_structure_and_fields() {
        let entry = sample_tree();
        let value = entry.to_value(true);
        let back = HierarchyEntry::from_value(&value, true).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn dependencies_excludes_own_root_guid_and_dedups() {
        let shared = Guid::new();
        let material = Guid::new();
        let child_a = HierarchyEntry::new(
            "A",
            "A",
            Component::StaticMesh { mesh: shared, material_instance: material, stages: RenderStages::default() },
        );
        let child_b = HierarchyEntry::new(
            "B",
            "B",
            Component::StaticMesh { mesh: shared, material_instance: material, stages: RenderStages::default() },
        );
        let root_guid = Guid::new();
        let root = HierarchyEntry {
            guid: Some(root_guid),
            ..HierarchyEntry::new("Root", "Root", Component::Scene { scene: root_guid })
                .with_children(vec![child_a, child_b])
        };

        let deps = root.dependencies();
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&shared));
        assert!(deps.contains(&material));
        assert!(!deps.contains(&root_guid));
    }

    #[test]
    fn exactly_one_component_variant_round_trips_its_type_guid() {
        let entry = HierarchyEntry::new("Cam", "Cam", Component::Camera { fov: 60.0, near: 0.1, far: 1000.0 });
        let value = entry.to_value(false);
        assert_eq!(value["typeGuid"], json!(entry.component.type_guid()));
    }
}
