//! Commit-graph layout: commits on one lane in creation order, labels
//! (HEAD, branch tips) stacked above the commit named by their `attach_to`.

use dsvis_timeline_core::{AnimationOp, OpCode, Timeline};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::config::{LayoutConfig, Orientation};
use crate::engine::{admitted, layout_steps, LayoutEngine, LayoutStrategy, Offsets, StructureConfigs};

#[derive(Debug, Default, Clone)]
struct DagState {
    commits: Vec<String>,
    labels: Vec<String>,
    /// label -> commit
    attachments: HashMap<String, String>,
    positions: HashMap<String, (f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct DagLayoutEngine {
    pub spacing: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub label_offset: f64,
    pub label_stack_gap: f64,
    structures: IndexMap<String, DagState>,
    dirty: HashSet<String>,
    offsets: Offsets,
    configs: StructureConfigs,
    filter: Option<HashSet<String>>,
}

impl Default for DagLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DagLayoutEngine {
    pub fn new() -> Self {
        Self {
            spacing: 140.0,
            start_x: 50.0,
            start_y: 50.0,
            label_offset: 40.0,
            label_stack_gap: 26.0,
            structures: IndexMap::new(),
            dirty: HashSet::new(),
            offsets: Offsets::new(),
            configs: StructureConfigs::new(),
            filter: None,
        }
    }

    pub fn position(&self, structure_id: &str, node_id: &str) -> Option<(f64, f64)> {
        self.structures
            .get(structure_id)?
            .positions
            .get(node_id)
            .copied()
    }

    fn observe(&mut self, op: &AnimationOp) {
        let Some(sid) = admitted(op, self.filter.as_ref()) else {
            return;
        };
        let Some(target) = op.target() else {
            return;
        };
        let changed = match op.op {
            OpCode::CreateNode => {
                let state = self.structures.entry(sid.to_string()).or_default();
                let lane = if op.str_field("kind") == Some("commit") {
                    &mut state.commits
                } else {
                    &mut state.labels
                };
                if lane.iter().any(|n| n == target) {
                    false
                } else {
                    lane.push(target.to_string());
                    true
                }
            }
            OpCode::DeleteNode => match self.structures.get_mut(sid) {
                Some(state) => {
                    state.commits.retain(|c| c != target);
                    state.labels.retain(|l| l != target);
                    state
                        .attachments
                        .retain(|label, commit| label.as_str() != target && commit.as_str() != target);
                    state.positions.remove(target);
                    true
                }
                None => {
                    log::warn!("dag layout: DELETE_NODE {target} for unknown structure {sid}");
                    false
                }
            },
            OpCode::SetLabel => match op.str_field("attach_to") {
                Some(commit) => {
                    let state = self.structures.entry(sid.to_string()).or_default();
                    let previous = state.attachments.insert(target.to_string(), commit.to_string());
                    previous.as_deref() != Some(commit)
                }
                None => false,
            },
            _ => false,
        };
        if changed {
            self.dirty.insert(sid.to_string());
        }
    }

    fn emit(&mut self) -> Vec<AnimationOp> {
        if self.dirty.is_empty() {
            return Vec::new();
        }
        let mut ops = Vec::new();
        let dirty: Vec<String> = self
            .structures
            .keys()
            .filter(|sid| self.dirty.contains(sid.as_str()))
            .cloned()
            .collect();
        for sid in dirty {
            let default_cfg = LayoutConfig::default();
            let cfg = self.configs.get(&sid).cloned().unwrap_or(default_cfg);
            let (ox, oy) = self.offsets.get(&sid).copied().unwrap_or((0.0, 0.0));
            let spacing = cfg.spacing.unwrap_or(self.spacing);
            let start_x = cfg.start_x.unwrap_or(self.start_x) + ox;
            let start_y = cfg.start_y.unwrap_or(self.start_y) + oy;
            let label_offset = cfg.label_offset.unwrap_or(self.label_offset);
            let gap = cfg.label_stack_gap.unwrap_or(self.label_stack_gap);
            let orientation = cfg.orientation_or(Orientation::Vertical);

            let Some(state) = self.structures.get_mut(&sid) else {
                continue;
            };
            let mut placed: IndexMap<String, (f64, f64)> = IndexMap::new();
            for (idx, commit) in state.commits.iter().enumerate() {
                let along = spacing * idx as f64;
                let pos = match orientation {
                    Orientation::Vertical => (start_x, start_y + along),
                    Orientation::Horizontal => (start_x + along, start_y),
                };
                placed.insert(commit.clone(), pos);
            }

            // labels grouped by resolved anchor, in label creation order
            let mut stacks: IndexMap<Option<String>, Vec<&String>> = IndexMap::new();
            for label in &state.labels {
                let anchor = state
                    .attachments
                    .get(label)
                    .filter(|commit| placed.contains_key(commit.as_str()))
                    .cloned();
                stacks.entry(anchor).or_default().push(label);
            }
            let unanchored = (start_x, start_y - label_offset);
            let mut label_positions = Vec::new();
            for (anchor, labels) in &stacks {
                let base = anchor
                    .as_ref()
                    .and_then(|commit| placed.get(commit.as_str()).copied())
                    .unwrap_or(unanchored);
                for (stack_idx, label) in labels.iter().enumerate() {
                    let pos = (base.0, base.1 - label_offset - stack_idx as f64 * gap);
                    label_positions.push(((*label).clone(), pos));
                }
            }
            placed.extend(label_positions);

            for (id, pos) in &placed {
                if state.positions.get(id) != Some(pos) {
                    ops.push(AnimationOp::set_pos(&sid, id.as_str(), pos.0, pos.1));
                }
            }
            state.positions = placed.into_iter().collect();
        }
        log::trace!("dag layout: {} positions", ops.len());
        self.dirty.clear();
        ops
    }
}

impl LayoutEngine for DagLayoutEngine {
    fn strategy(&self) -> LayoutStrategy {
        LayoutStrategy::Dag
    }

    fn apply_layout(&mut self, timeline: &Timeline) -> Timeline {
        layout_steps(self, timeline, Self::observe, Self::emit)
    }

    fn reset(&mut self) {
        self.structures.clear();
        self.dirty.clear();
        self.offsets.clear();
        self.configs.clear();
        self.filter = None;
    }

    fn set_offsets(&mut self, offsets: &Offsets) {
        self.offsets = offsets.clone();
    }

    fn set_structure_config(&mut self, configs: &StructureConfigs) {
        self.configs = configs.clone();
    }

    fn set_filter(&mut self, filter: Option<HashSet<String>>) {
        self.filter = filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvis_timeline_core::AnimationStep;

    fn commit(id: &str) -> AnimationOp {
        AnimationOp::create_node("g", id).with("kind", "commit")
    }

    fn label(id: &str) -> AnimationOp {
        AnimationOp::create_node("g", id).with("kind", "label")
    }

    fn attach(label: &str, commit: &str) -> AnimationOp {
        AnimationOp::set_label("g", label, label).with("attach_to", commit)
    }

    #[test]
    fn labels_start_above_lane_origin() {
        let mut engine = DagLayoutEngine::new();
        let tl = Timeline {
            steps: vec![AnimationStep::new(vec![label("g_label_0"), label("g_label_1")])],
        };
        engine.apply_layout(&tl);
        assert_eq!(engine.position("g", "g_label_0"), Some((50.0, -30.0)));
        assert_eq!(engine.position("g", "g_label_1"), Some((50.0, -56.0)));
    }

    #[test]
    fn labels_follow_commits() {
        let mut engine = DagLayoutEngine::new();
        let tl = Timeline {
            steps: vec![
                AnimationStep::new(vec![label("g_label_0"), label("g_label_1")]),
                AnimationStep::new(vec![commit("c0"), attach("g_label_0", "c0"), attach("g_label_1", "c0")]),
                AnimationStep::new(vec![commit("c1"), attach("g_label_0", "c1"), attach("g_label_1", "c1")]),
            ],
        };
        let out = engine.apply_layout(&tl);
        assert_eq!(engine.position("g", "c1"), Some((50.0, 190.0)));
        assert_eq!(engine.position("g", "g_label_0"), Some((50.0, 150.0)));
        assert_eq!(engine.position("g", "g_label_1"), Some((50.0, 124.0)));
        // c0 did not move in the last step
        assert!(!out.steps[2]
            .ops
            .iter()
            .any(|op| op.op == OpCode::SetPos && op.target() == Some("c0")));
    }

    #[test]
    fn horizontal_lane_and_offsets() {
        let mut engine = DagLayoutEngine::new();
        engine.set_offsets(&Offsets::from([("g".to_string(), (200.0, 800.0))]));
        engine.set_structure_config(&StructureConfigs::from([(
            "g".to_string(),
            LayoutConfig::horizontal(100.0),
        )]));
        let tl = Timeline {
            steps: vec![AnimationStep::new(vec![commit("c0"), commit("c1")])],
        };
        engine.apply_layout(&tl);
        assert_eq!(engine.position("g", "c0"), Some((250.0, 850.0)));
        assert_eq!(engine.position("g", "c1"), Some((350.0, 850.0)));
    }

    #[test]
    fn deleting_anchor_drops_attachment() {
        let mut engine = DagLayoutEngine::new();
        let tl = Timeline {
            steps: vec![
                AnimationStep::new(vec![commit("c0"), label("g_label_1"), attach("g_label_1", "c0")]),
                AnimationStep::new(vec![AnimationOp::delete_node("g", "c0")]),
            ],
        };
        engine.apply_layout(&tl);
        assert_eq!(engine.position("g", "g_label_1"), Some((50.0, -30.0)));
        assert_eq!(engine.position("g", "c0"), None);
    }
}
