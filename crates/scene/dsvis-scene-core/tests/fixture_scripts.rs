use dsvis_scene::json::commands_from_json;
use dsvis_scene::{SceneGraph, SceneSnapshot};
use dsvis_test_fixtures::{commands, scenes};
use dsvis_timeline_core::OpCode;

#[test]
fn command_fixtures_replay_cleanly() {
    for name in commands::keys() {
        let text = commands::json(&name).unwrap();
        let script = commands_from_json(&text).unwrap_or_else(|err| panic!("{name}: {err}"));
        let mut scene = SceneGraph::default();
        let tl = scene
            .apply_all(&script)
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        assert!(!tl.is_empty(), "{name} produced no steps");
        assert!(tl.count(OpCode::SetPos) > 0, "{name} was never laid out");
    }
}

#[test]
fn mixed_script_builds_every_kind() {
    let script = commands_from_json(&commands::json("mixed-scene").unwrap()).unwrap();
    let mut scene = SceneGraph::default();
    scene.apply_all(&script).unwrap();

    let ids: Vec<_> = scene.structure_ids().collect();
    assert_eq!(ids, vec!["list1", "stack1", "seq1", "bst1", "huff1", "repo"]);
    let snap = scene.export_scene();
    let repo = &snap.structure("repo").expect("repo exported").state;
    assert_eq!(repo["head"], "feature");
    assert_eq!(snap.structure("stack1").map(|s| s.state["values"].clone()), Some(serde_json::json!([10, 20])));
}

#[test]
fn scene_fixture_imports_and_reexports() {
    let snapshot: SceneSnapshot = scenes::load("mixed").unwrap();
    let mut scene = SceneGraph::default();
    scene.import_scene(&snapshot).unwrap();

    assert_eq!(scene.offset("huff1"), Some((0.0, 660.0)));
    let out = scene.export_scene();
    assert_eq!(out.structures.len(), snapshot.structures.len());
    for original in &snapshot.structures {
        let again = out.structure(&original.id).expect("structure kept");
        assert_eq!(again.kind, original.kind);
        assert_eq!(again.state, original.state, "{}", original.id);
    }
}
