//! The scene: live structure instances, command dispatch, offsets and layout
//! routing.
//!
//! A command is resolved to a kind, validated against the registry, checked
//! against the target structure and only then handed to the model. The
//! model's structural timeline is run through the engine its kind maps to.

use dsvis_layout_core::{engine_for, LayoutConfig, LayoutEngine, LayoutStrategy, Offsets, StructureConfigs};
use dsvis_models_core::{IdAllocator, Model, ModelOp, Payload, StructureKind};
use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::command::{Command, CommandType};
use crate::config::SceneConfig;
use crate::error::{CommandError, SceneError};
use crate::schema::{build_registry, Registry};
use crate::snapshot::{SceneSnapshot, StructureSnapshot, SNAPSHOT_VERSION};

#[derive(Debug)]
pub struct SceneGraph {
    registry: Registry,
    config: SceneConfig,
    structures: IndexMap<String, Model>,
    /// Id allocators of deleted structures, reused when the id comes back.
    retired: HashMap<String, IdAllocator>,
    offsets: Offsets,
    configs: StructureConfigs,
    rows: HashMap<LayoutStrategy, usize>,
    engines: IndexMap<LayoutStrategy, Box<dyn LayoutEngine>>,
}

/// Import state built without touching the live scene.
struct StagedImport {
    structures: IndexMap<String, Model>,
    offsets: Offsets,
    configs: StructureConfigs,
    replay: Vec<Timeline>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(build_registry())
    }
}

impl SceneGraph {
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, SceneConfig::default())
    }

    pub fn with_config(registry: Registry, config: SceneConfig) -> Self {
        let engines = LayoutStrategy::ALL
            .into_iter()
            .map(|strategy| (strategy, engine_for(strategy)))
            .collect();
        Self {
            registry,
            config,
            structures: IndexMap::new(),
            retired: HashMap::new(),
            offsets: Offsets::new(),
            configs: StructureConfigs::new(),
            rows: HashMap::new(),
            engines,
        }
    }

    /// Replace the engine used for `strategy`.
    pub fn with_engine(mut self, strategy: LayoutStrategy, engine: Box<dyn LayoutEngine>) -> Self {
        self.engines.insert(strategy, engine);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn structure(&self, id: &str) -> Option<&Model> {
        self.structures.get(id)
    }

    pub fn structure_ids(&self) -> impl Iterator<Item = &str> {
        self.structures.keys().map(String::as_str)
    }

    pub fn offset(&self, id: &str) -> Option<(f64, f64)> {
        self.offsets.get(id).copied()
    }

    pub fn layout_config(&self, id: &str) -> Option<&LayoutConfig> {
        self.configs.get(id)
    }

    /// Validate, dispatch and lay out one command.
    pub fn apply_command(&mut self, command: &Command) -> Result<Timeline, SceneError> {
        let raw = command.payload.as_object().ok_or(CommandError::PayloadNotMapping)?;
        let kind = self.resolve_kind(command, raw)?;

        let mut payload = raw.clone();
        payload.insert("kind".to_string(), JsonValue::from(kind.as_str()));
        let op = self.registry.resolve(command.command_type, kind, &payload)?;
        payload.remove("kind");

        let sid = command.structure_id.as_str();
        log::debug!("{} '{sid}' ({kind}) -> {op}", command.command_type);

        let structural = match command.command_type {
            ty if ty.is_create_like() => self.create_structure(ty, sid, kind, op, &payload)?,
            CommandType::DeleteStructure => self.delete_structure(sid, kind, op, &payload)?,
            ty => {
                let model = self.target_mut(sid, kind)?;
                check_bounds(ty, model, &payload)?;
                model.apply_operation(op, &payload)?
            }
        };
        Ok(self.layout(kind, &structural))
    }

    /// Apply commands in order and concatenate their timelines. Stops at the
    /// first failure; commands before it stay applied.
    pub fn apply_all<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) -> Result<Timeline, SceneError> {
        let mut timeline = Timeline::new();
        for command in commands {
            timeline.extend(self.apply_command(command)?);
        }
        Ok(timeline)
    }

    pub fn export_scene(&self) -> SceneSnapshot {
        let structures = self
            .structures
            .iter()
            .map(|(sid, model)| StructureSnapshot {
                id: sid.clone(),
                kind: model.kind().as_str().to_string(),
                state: model.export_state(),
                offset: self.offsets.get(sid).copied(),
                config: self.configs.get(sid).cloned(),
            })
            .collect();
        SceneSnapshot::new(structures)
    }

    /// Replace the scene with `snapshot`.
    ///
    /// Every incoming structure is built and replayed off to the side first;
    /// any failure returns an error with the live scene untouched. On success
    /// the result is one "Clear scene" step followed by the replay of every
    /// imported structure, laid out from scratch.
    pub fn import_scene(&mut self, snapshot: &SceneSnapshot) -> Result<Timeline, SceneError> {
        let staged = self.stage_import(snapshot).map_err(|err| {
            log::warn!("scene import aborted: {err}");
            err
        })?;

        let old = std::mem::replace(&mut self.structures, staged.structures);
        let mut clear_ops: Vec<AnimationOp> = Vec::new();
        for (sid, mut model) in old {
            match model.apply_operation(ModelOp::DeleteAll, &Payload::new()) {
                Ok(tl) => clear_ops.extend(tl.steps.into_iter().flat_map(|step| step.ops)),
                Err(err) => log::warn!("clearing '{sid}' during import failed: {err}"),
            }
            if !self.structures.contains_key(&sid) {
                self.retired.insert(sid, model.ids().clone());
            }
        }
        self.retired.retain(|sid, _| !self.structures.contains_key(sid));

        self.offsets = staged.offsets;
        self.configs = staged.configs;
        self.rows.clear();
        for (sid, model) in &self.structures {
            if self.offsets.contains_key(sid) {
                *self.rows.entry(self.config.strategy_for(model.kind())).or_insert(0) += 1;
            }
        }
        let placements: Vec<(String, StructureKind)> = self
            .structures
            .iter()
            .map(|(sid, model)| (sid.clone(), model.kind()))
            .collect();
        for (sid, kind) in &placements {
            self.assign_offset(sid, *kind);
            self.assign_layout_config(sid, *kind);
        }

        let mut timeline = Timeline::new();
        if !clear_ops.is_empty() {
            timeline.add_step(AnimationStep::labeled("Clear scene", clear_ops));
        }
        for replay in staged.replay {
            timeline.extend(replay);
        }
        log::debug!("imported {} structures", self.structures.len());
        Ok(self.layout_import(&timeline))
    }

    /// Drop every structure, offset, config and engine state. Id counters
    /// survive, so a structure recreated under an old id keeps counting.
    pub fn reset(&mut self) {
        for (sid, model) in self.structures.drain(..) {
            self.retired.insert(sid, model.ids().clone());
        }
        self.offsets.clear();
        self.configs.clear();
        self.rows.clear();
        for engine in self.engines.values_mut() {
            engine.reset();
        }
    }

    fn resolve_kind(&self, command: &Command, payload: &Payload) -> Result<StructureKind, CommandError> {
        match payload.get("kind") {
            Some(JsonValue::String(name)) => name
                .parse()
                .map_err(|_| CommandError::UnknownKind { kind: name.clone() }),
            Some(JsonValue::Null) | None => match self.structures.get(&command.structure_id) {
                Some(model) => Ok(model.kind()),
                None if command.command_type.is_create_like() => Err(CommandError::MissingKind {
                    command: command.command_type,
                }),
                None => Err(CommandError::StructureNotFound {
                    structure_id: command.structure_id.clone(),
                }),
            },
            Some(_) => Err(CommandError::WrongType {
                field: "kind".to_string(),
                expected: "str".to_string(),
            }),
        }
    }

    fn target_mut(&mut self, sid: &str, kind: StructureKind) -> Result<&mut Model, CommandError> {
        let model = self
            .structures
            .get_mut(sid)
            .ok_or_else(|| CommandError::StructureNotFound {
                structure_id: sid.to_string(),
            })?;
        if model.kind() != kind {
            return Err(CommandError::KindMismatch {
                structure_id: sid.to_string(),
                expected: kind,
                found: model.kind(),
            });
        }
        Ok(model)
    }

    fn create_structure(
        &mut self,
        command: CommandType,
        sid: &str,
        kind: StructureKind,
        op: ModelOp,
        args: &Payload,
    ) -> Result<Timeline, SceneError> {
        if let Some(existing) = self.structures.get_mut(sid) {
            if existing.kind() != kind {
                return Err(CommandError::KindMismatch {
                    structure_id: sid.to_string(),
                    expected: kind,
                    found: existing.kind(),
                }
                .into());
            }
            // stage on a copy so a failing create leaves the old state
            let mut staged = existing.clone();
            let mut timeline = staged.apply_operation(ModelOp::DeleteAll, &Payload::new())?;
            timeline.extend(staged.apply_operation(op, args)?);
            *existing = staged;
            log::debug!("recreated {kind} '{sid}'");
            return Ok(timeline);
        }

        let ids = self.retired.get(sid).cloned().unwrap_or_default();
        let mut model = self
            .registry
            .create_model(kind, sid, ids)
            .ok_or(CommandError::UnsupportedCombination { command, kind })?;
        let timeline = model.apply_operation(op, args)?;

        self.retired.remove(sid);
        self.structures.insert(sid.to_string(), model);
        self.assign_offset(sid, kind);
        self.assign_layout_config(sid, kind);
        log::debug!("created {kind} '{sid}' at {:?}", self.offsets.get(sid));
        Ok(timeline)
    }

    fn delete_structure(
        &mut self,
        sid: &str,
        kind: StructureKind,
        op: ModelOp,
        args: &Payload,
    ) -> Result<Timeline, SceneError> {
        let timeline = self.target_mut(sid, kind)?.apply_operation(op, args)?;
        if let Some(model) = self.structures.shift_remove(sid) {
            self.retired.insert(sid.to_string(), model.ids().clone());
        }
        log::debug!("deleted {kind} '{sid}'");
        Ok(timeline)
    }

    /// Next row offset of the kind's strategy, unless `sid` already has one.
    fn assign_offset(&mut self, sid: &str, kind: StructureKind) {
        if self.offsets.contains_key(sid) {
            return;
        }
        let strategy = self.config.strategy_for(kind);
        let row = self.rows.entry(strategy).or_insert(0);
        let offset = self.config.offset_for(strategy, *row);
        *row += 1;
        self.offsets.insert(sid.to_string(), offset);
    }

    fn assign_layout_config(&mut self, sid: &str, kind: StructureKind) {
        if self.configs.contains_key(sid) {
            return;
        }
        if let Some(cfg) = self.config.layout_for(kind) {
            self.configs.insert(sid.to_string(), cfg.clone());
        }
    }

    fn layout(&mut self, kind: StructureKind, timeline: &Timeline) -> Timeline {
        let strategy = self.config.strategy_for(kind);
        match self.engines.get_mut(&strategy) {
            Some(engine) => {
                engine.set_offsets(&self.offsets);
                engine.set_structure_config(&self.configs);
                engine.apply_layout(timeline)
            }
            None => timeline.clone(),
        }
    }

    /// Run every engine over a mixed timeline, each scoped to its own structures.
    fn layout_import(&mut self, timeline: &Timeline) -> Timeline {
        let mut out = timeline.clone();
        for strategy in LayoutStrategy::ALL {
            let members: HashSet<String> = self
                .structures
                .iter()
                .filter(|(_, model)| self.config.strategy_for(model.kind()) == strategy)
                .map(|(sid, _)| sid.clone())
                .collect();
            let Some(engine) = self.engines.get_mut(&strategy) else {
                continue;
            };
            engine.reset();
            engine.set_filter(Some(members));
            engine.set_offsets(&self.offsets);
            engine.set_structure_config(&self.configs);
            out = engine.apply_layout(&out);
            engine.set_filter(None);
        }
        out
    }

    fn stage_import(&self, snapshot: &SceneSnapshot) -> Result<StagedImport, CommandError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CommandError::snapshot(format!(
                "unsupported version '{}'",
                snapshot.version
            )));
        }
        let mut staged = StagedImport {
            structures: IndexMap::new(),
            offsets: Offsets::new(),
            configs: StructureConfigs::new(),
            replay: Vec::new(),
        };
        for entry in &snapshot.structures {
            if staged.structures.contains_key(&entry.id) {
                return Err(CommandError::snapshot(format!(
                    "duplicate structure id '{}'",
                    entry.id
                )));
            }
            let kind: StructureKind = entry
                .kind
                .parse()
                .map_err(|_| CommandError::UnknownKind {
                    kind: entry.kind.clone(),
                })?;
            let restore_failed = |reason: String| CommandError::RestoreFailed {
                structure_id: entry.id.clone(),
                kind: entry.kind.clone(),
                reason,
            };

            let mut state = entry.state.clone();
            state.insert("kind".to_string(), JsonValue::from(kind.as_str()));
            let op = self
                .registry
                .resolve(CommandType::CreateStructure, kind, &state)
                .map_err(|err| restore_failed(err.to_string()))?;
            state.remove("kind");

            let ids = self
                .structures
                .get(&entry.id)
                .map(|m| m.ids().clone())
                .or_else(|| self.retired.get(&entry.id).cloned())
                .unwrap_or_default();
            let mut model = self
                .registry
                .create_model(kind, &entry.id, ids)
                .ok_or_else(|| restore_failed("no model registered".to_string()))?;
            let replay = model
                .apply_operation(op, &state)
                .map_err(|err| restore_failed(err.to_string()))?;

            staged.replay.push(replay);
            if let Some(offset) = entry.offset {
                staged.offsets.insert(entry.id.clone(), offset);
            }
            if let Some(config) = &entry.config {
                staged.configs.insert(entry.id.clone(), config.clone());
            }
            staged.structures.insert(entry.id.clone(), model);
        }
        Ok(staged)
    }
}

/// Linear index bounds: `0..=len` for INSERT, `0..len` otherwise. Empty
/// structures skip the check so the model can answer with its empty message.
fn check_bounds(command: CommandType, model: &Model, payload: &Payload) -> Result<(), CommandError> {
    if !model.kind().is_linear() {
        return Ok(());
    }
    let Some(index) = payload.get("index").and_then(JsonValue::as_i64) else {
        return Ok(());
    };
    let len = model.node_count();
    let in_range = match command {
        CommandType::Insert => (0..=len as i64).contains(&index),
        _ if len == 0 => true,
        _ => (0..len as i64).contains(&index),
    };
    if in_range {
        Ok(())
    } else {
        Err(CommandError::IndexOutOfRange { command, index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvis_timeline_core::OpCode;
    use serde_json::json;

    fn cmd(sid: &str, ty: CommandType, payload: JsonValue) -> Command {
        Command::new(sid, ty, payload)
    }

    #[test]
    fn create_requires_kind() {
        let mut scene = SceneGraph::default();
        let err = scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"values": [1]})))
            .unwrap_err();
        assert_eq!(err.to_string(), "CREATE_STRUCTURE requires payload.kind");
    }

    #[test]
    fn unknown_structure_without_kind_is_not_found() {
        let mut scene = SceneGraph::default();
        let err = scene
            .apply_command(&cmd("ghost", CommandType::Insert, json!({"index": 0, "value": 1})))
            .unwrap_err();
        assert!(matches!(
            err.as_command(),
            Some(CommandError::StructureNotFound { .. })
        ));
    }

    #[test]
    fn kind_is_inferred_from_existing_structure() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("s", CommandType::CreateStructure, json!({"kind": "stack", "values": [1]})))
            .unwrap();
        let tl = scene
            .apply_command(&cmd("s", CommandType::Insert, json!({"value": 2})))
            .unwrap();
        assert!(tl.count(OpCode::CreateNode) >= 1);
        assert_eq!(scene.structure("s").map(Model::node_count), Some(2));
    }

    #[test]
    fn kind_mismatch() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("x", CommandType::CreateStructure, json!({"kind": "list"})))
            .unwrap();
        let err = scene
            .apply_command(&cmd("x", CommandType::Insert, json!({"kind": "bst", "value": 1})))
            .unwrap_err();
        assert!(matches!(err.as_command(), Some(CommandError::KindMismatch { .. })));
        let err = scene
            .apply_command(&cmd("x", CommandType::CreateStructure, json!({"kind": "stack"})))
            .unwrap_err();
        assert!(matches!(err.as_command(), Some(CommandError::KindMismatch { .. })));
    }

    #[test]
    fn index_bounds_checked_before_model() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"kind": "list", "values": [1, 2]})))
            .unwrap();
        let err = scene
            .apply_command(&cmd("l", CommandType::DeleteNode, json!({"index": 2})))
            .unwrap_err();
        assert!(matches!(
            err.as_command(),
            Some(CommandError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
        assert!(scene
            .apply_command(&cmd("l", CommandType::Insert, json!({"index": 2, "value": 3})))
            .is_ok());
        assert!(scene
            .apply_command(&cmd("l", CommandType::Insert, json!({"index": 5, "value": 3})))
            .is_err());
    }

    #[test]
    fn empty_structure_reports_through_model() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"kind": "list"})))
            .unwrap();
        let tl = scene
            .apply_command(&cmd("l", CommandType::DeleteNode, json!({"index": 3})))
            .unwrap();
        let messages: Vec<_> = tl.ops_of(OpCode::SetMessage).filter_map(|op| op.str_field("text")).collect();
        assert_eq!(messages, vec!["List empty"]);
    }

    #[test]
    fn offsets_pack_per_strategy() {
        let mut scene = SceneGraph::default();
        for (sid, kind) in [("a", "list"), ("b", "stack"), ("t1", "bst"), ("t2", "huffman"), ("g", "git")] {
            let payload = match kind {
                "huffman" => json!({"kind": kind, "values": [1]}),
                _ => json!({"kind": kind}),
            };
            scene
                .apply_command(&cmd(sid, CommandType::CreateStructure, payload))
                .unwrap();
        }
        assert_eq!(scene.offset("a"), Some((0.0, 0.0)));
        assert_eq!(scene.offset("b"), Some((0.0, 220.0)));
        assert_eq!(scene.offset("t1"), Some((0.0, 400.0)));
        assert_eq!(scene.offset("t2"), Some((0.0, 660.0)));
        assert_eq!(scene.offset("g"), Some((200.0, 800.0)));
        assert_eq!(scene.layout_config("b").and_then(|c| c.row_spacing), Some(200.0));
    }

    #[test]
    fn git_merge_is_unsupported() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("g", CommandType::GitInit, json!({"kind": "git"})))
            .unwrap();
        let err = scene
            .apply_command(&cmd("g", CommandType::GitMerge, json!({})))
            .unwrap_err();
        assert!(matches!(
            err.as_command(),
            Some(CommandError::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"kind": "list", "values": [1]})))
            .unwrap();
        scene.reset();
        assert_eq!(scene.structure_ids().count(), 0);
        assert_eq!(scene.offset("l"), None);
    }

    #[test]
    fn reset_keeps_id_counters() {
        let mut scene = SceneGraph::default();
        scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"kind": "list", "values": [1]})))
            .unwrap();
        scene.reset();
        let tl = scene
            .apply_command(&cmd("l", CommandType::CreateStructure, json!({"kind": "list", "values": [1]})))
            .unwrap();
        let created: Vec<_> = tl.ops_of(OpCode::CreateNode).filter_map(|op| op.target()).collect();
        assert_eq!(created, vec!["l_node_1"]);
        assert_eq!(scene.offset("l"), Some((0.0, 0.0)));
    }
}
