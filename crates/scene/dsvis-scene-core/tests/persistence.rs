use dsvis_scene::json::{load_scene_from_file, save_scene_to_file, scene_from_json, scene_to_json};
use dsvis_scene::{Command, CommandError, CommandType, SceneGraph, SceneSnapshot, StructureSnapshot};
use dsvis_timeline_core::OpCode;
use serde_json::{json, Value};

fn run(scene: &mut SceneGraph, sid: &str, ty: CommandType, payload: Value) {
    scene
        .apply_command(&Command::new(sid, ty, payload))
        .unwrap_or_else(|err| panic!("{ty} on {sid} failed: {err}"));
}

fn populated() -> SceneGraph {
    let mut scene = SceneGraph::default();
    run(&mut scene, "l1", CommandType::CreateStructure, json!({"kind": "list", "values": [1, 2, 3]}));
    run(&mut scene, "s1", CommandType::CreateStructure, json!({"kind": "stack", "values": [7]}));
    run(&mut scene, "s1", CommandType::Insert, json!({"value": 8}));
    run(&mut scene, "b1", CommandType::CreateStructure, json!({"kind": "bst", "values": [5, 2, 8]}));
    run(&mut scene, "g1", CommandType::GitInit, json!({"kind": "git"}));
    run(&mut scene, "g1", CommandType::GitCommit, json!({"message": "init"}));
    scene
}

#[test]
fn export_import_round_trip() {
    let source = populated();
    let snapshot = source.export_scene();
    assert_eq!(snapshot.version, "1.0");
    assert_eq!(
        snapshot.structures.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec!["l1", "s1", "b1", "g1"]
    );
    assert_eq!(snapshot.structure("s1").map(|s| s.state["values"].clone()), Some(json!([7, 8])));
    assert_eq!(snapshot.structure("b1").map(|s| s.state["values"].clone()), Some(json!([5, 2, 8])));
    let git = &snapshot.structure("g1").expect("git exported").state;
    assert_eq!(git["head"], json!("main"));
    assert_eq!(git["branches"], json!({"main": "c2"}));

    let mut target = SceneGraph::default();
    let tl = target.import_scene(&snapshot).unwrap();
    assert!(tl.count(OpCode::CreateNode) > 0);
    assert_eq!(target.export_scene(), snapshot);
    assert_eq!(target.offset("g1"), Some((200.0, 800.0)));
}

#[test]
fn import_replaces_existing_scene() {
    let mut scene = populated();
    let snapshot = SceneSnapshot::new(vec![StructureSnapshot {
        id: "only".to_string(),
        kind: "list".to_string(),
        state: json!({"values": [9]}).as_object().cloned().unwrap_or_default(),
        offset: None,
        config: None,
    }]);
    let tl = scene.import_scene(&snapshot).unwrap();

    assert_eq!(tl.steps[0].label.as_deref(), Some("Clear scene"));
    assert!(tl.steps[0].ops.iter().all(|op| op.op != OpCode::CreateNode));
    assert_eq!(scene.structure_ids().collect::<Vec<_>>(), vec!["only"]);
    assert_eq!(scene.offset("only"), Some((0.0, 0.0)));
    let placed = tl
        .ops_of(OpCode::SetPos)
        .find(|op| op.target() == Some("only_node_0"))
        .and_then(|op| op.position());
    assert_eq!(placed, Some((50.0, 50.0)));
}

#[test]
fn failed_import_leaves_scene_untouched() {
    let mut scene = populated();
    let before = scene.export_scene();

    let mut bad = before.clone();
    bad.structures.push(StructureSnapshot {
        id: "broken".to_string(),
        kind: "non_existent_kind".to_string(),
        state: Default::default(),
        offset: None,
        config: None,
    });
    let err = scene.import_scene(&bad).unwrap_err();
    assert!(matches!(err.as_command(), Some(CommandError::UnknownKind { .. })));
    assert_eq!(scene.export_scene(), before);

    let mut bad = before.clone();
    bad.structures.push(StructureSnapshot {
        id: "repo".to_string(),
        kind: "git".to_string(),
        state: json!({"commits": [{"id": "c1", "parents": ["c0"]}]})
            .as_object()
            .cloned()
            .unwrap_or_default(),
        offset: None,
        config: None,
    });
    let err = scene.import_scene(&bad).unwrap_err();
    assert!(matches!(err.as_command(), Some(CommandError::RestoreFailed { .. })));
    assert_eq!(scene.export_scene(), before);
}

#[test]
fn invalid_snapshots_are_rejected() {
    let mut scene = SceneGraph::default();
    let mut snap = SceneSnapshot::default();
    snap.version = "0.9".to_string();
    assert!(matches!(
        scene.import_scene(&snap).unwrap_err().as_command(),
        Some(CommandError::InvalidSnapshot { .. })
    ));

    let entry = StructureSnapshot {
        id: "dup".to_string(),
        kind: "stack".to_string(),
        state: Default::default(),
        offset: None,
        config: None,
    };
    let snap = SceneSnapshot::new(vec![entry.clone(), entry]);
    assert!(matches!(
        scene.import_scene(&snap).unwrap_err().as_command(),
        Some(CommandError::InvalidSnapshot { .. })
    ));
}

#[test]
fn snapshot_survives_text_and_files() {
    let snapshot = populated().export_scene();
    let text = scene_to_json(&snapshot).unwrap();
    assert_eq!(scene_from_json(&text).unwrap(), snapshot);

    let path = std::env::temp_dir().join(format!("dsvis-scene-{}.json", std::process::id()));
    save_scene_to_file(&path, &snapshot).unwrap();
    let loaded = load_scene_from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, snapshot);
}
