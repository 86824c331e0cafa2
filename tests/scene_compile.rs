//! End-to-end exercise of the Scene Compiler (§4.9) against a real,
//! hand-authored `.gltf` fixture, grouped with banner comments the way the
//! teacher's own `tests/asset_tests.rs` organizes its asset-loading
//! integration tests.

use std::path::Path;

use forge_assets::guid::Guid;
use forge_assets::hierarchy::HierarchyEntry;
use forge_assets::plugin::{AssetCompilerPlugin, CompileOutput, GltfScenePlugin};
use forge_assets::scene::compile_scene;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/triangle.gltf");

// ============================================================================
// Single-mesh scene compile (§8 scenario 1: "Single-mesh scene with no
// lights or animations")
// ============================================================================

#[test]
fn single_triangle_scene_compiles_and_writes_a_mesh_binary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let asset_dir = dir.path();

    let compiled = compile_scene(Path::new(FIXTURE), asset_dir, "mesh", None).expect("compile_scene");

    assert!(compiled.compiled, "a well-formed single-mesh fixture must compile cleanly");
    assert!(!compiled.root_guid.is_nil());

    let mesh_binary_count = std::fs::read_dir(asset_dir)
        .expect("read asset dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("mesh"))
        .count();
    assert_eq!(mesh_binary_count, 1, "exactly one mesh binary must be written for one foreign mesh");
}

// ============================================================================
// Determinism of identity (§8 "Universal invariants")
// ============================================================================

#[test]
fn recompiling_with_a_pinned_root_guid_preserves_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pinned = Guid::new();

    let first = compile_scene(Path::new(FIXTURE), dir.path(), "mesh", Some(pinned)).expect("first compile");
    let second = compile_scene(Path::new(FIXTURE), dir.path(), "mesh", Some(pinned)).expect("second compile");

    assert_eq!(first.root_guid, pinned);
    assert_eq!(second.root_guid, pinned);
    assert_eq!(first.root_guid, second.root_guid, "re-compiling must preserve the root asset's GUID");
}

// ============================================================================
// Hierarchy round-trip (§8 "Round-trip of hierarchy")
// ============================================================================

#[test]
fn hierarchy_round_trips_through_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let compiled = compile_scene(Path::new(FIXTURE), dir.path(), "mesh", None).expect("compile_scene");

    let value = compiled.root.to_value(true);
    let restored = HierarchyEntry::from_value(&value, true).expect("from_value");

    assert_eq!(restored.guid, compiled.root.guid);
    assert_eq!(restored.children.len(), compiled.root.children.len());
    assert_eq!(restored.dependencies(), compiled.root.dependencies());
}

// ============================================================================
// Plugin boundary (§4.11)
// ============================================================================

#[test]
fn gltf_plugin_dispatches_the_same_compile_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plugin = GltfScenePlugin::new("mesh");

    let output = plugin.compile(Path::new(FIXTURE), dir.path()).expect("plugin compile");
    match output {
        CompileOutput::Scene(scene) => assert!(scene.compiled),
        CompileOutput::Texture(_) => panic!("a .gltf source must never dispatch to the texture plugin"),
    }
}

#[test]
fn is_up_to_date_is_false_when_no_binaries_exist_yet() {
    let plugin = GltfScenePlugin::new("mesh");
    let missing = vec![Path::new("/nonexistent/does-not-exist.mesh").to_path_buf()];
    assert!(!plugin.is_up_to_date(Path::new(FIXTURE), &missing));
}
