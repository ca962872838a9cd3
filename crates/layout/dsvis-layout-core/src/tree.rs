//! Tree layout driven purely by structural ops.
//!
//! Parent/child relations come from CREATE_EDGE `from`/`to` with an `L`/`R`
//! label. Roots (nodes without a parent) sit in a row, ordered by
//! `queue_index` when any node carries one; each subtree fans out below its
//! root with the horizontal span halved per level, bounded below by the base
//! spacing. Only positions that changed since the last pass are emitted.

use dsvis_timeline_core::{AnimationOp, OpCode, Timeline};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::config::LayoutConfig;
use crate::engine::{admitted, layout_steps, LayoutEngine, LayoutStrategy, Offsets, StructureConfigs};

#[derive(Debug, Default, Clone)]
struct TreeState {
    nodes: Vec<String>,
    /// child -> (parent, edge label)
    parents: IndexMap<String, (String, String)>,
    queue: HashMap<String, i64>,
    positions: HashMap<String, (f64, f64)>,
}

impl TreeState {
    fn child(&self, parent: &str, side: char) -> Option<&String> {
        self.parents.iter().find_map(|(child, (p, label))| {
            let matches = p == parent
                && label
                    .chars()
                    .next()
                    .map_or(false, |c| c.eq_ignore_ascii_case(&side));
            matches.then_some(child)
        })
    }

    fn roots(&self) -> Vec<&String> {
        let mut roots: Vec<&String> = self
            .nodes
            .iter()
            .filter(|n| !self.parents.contains_key(n.as_str()))
            .collect();
        if !self.queue.is_empty() {
            roots.sort_by_key(|n| self.queue.get(n.as_str()).copied().unwrap_or(i64::MAX));
        }
        roots
    }
}

#[derive(Debug, Clone)]
pub struct TreeLayoutEngine {
    pub spacing: f64,
    pub level_spacing: f64,
    pub start_x: f64,
    pub start_y: f64,
    structures: IndexMap<String, TreeState>,
    dirty: HashSet<String>,
    offsets: Offsets,
    configs: StructureConfigs,
    filter: Option<HashSet<String>>,
}

impl Default for TreeLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved per-structure parameters.
struct TreeGeometry {
    spacing: f64,
    root_x: f64,
    root_y: f64,
    queue_spacing: f64,
    child_dy: f64,
    span: f64,
}

impl TreeLayoutEngine {
    pub fn new() -> Self {
        Self {
            spacing: 140.0,
            level_spacing: 120.0,
            start_x: 50.0,
            start_y: 50.0,
            structures: IndexMap::new(),
            dirty: HashSet::new(),
            offsets: Offsets::new(),
            configs: StructureConfigs::new(),
            filter: None,
        }
    }

    /// Last emitted position of a node.
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
        let target = op.target().unwrap_or_default();
        let changed = match op.op {
            OpCode::CreateNode => {
                let state = self.structures.entry(sid.to_string()).or_default();
                if let Some(q) = op.i64_field("queue_index") {
                    state.queue.insert(target.to_string(), q);
                }
                if state.nodes.iter().any(|n| n == target) {
                    false
                } else {
                    state.nodes.push(target.to_string());
                    true
                }
            }
            OpCode::DeleteNode => match self.structures.get_mut(sid) {
                Some(state) => {
                    state.nodes.retain(|n| n != target);
                    state
                        .parents
                        .retain(|child, (parent, _)| child.as_str() != target && parent.as_str() != target);
                    state.queue.remove(target);
                    state.positions.remove(target);
                    true
                }
                None => {
                    log::warn!("tree layout: DELETE_NODE {target} for unknown structure {sid}");
                    false
                }
            },
            OpCode::CreateEdge => match (op.str_field("from"), op.str_field("to")) {
                (Some(from), Some(to)) => {
                    let label = op.str_field("label").unwrap_or_default();
                    self.structures
                        .entry(sid.to_string())
                        .or_default()
                        .parents
                        .insert(to.to_string(), (from.to_string(), label.to_string()));
                    true
                }
                _ => false,
            },
            OpCode::DeleteEdge => {
                let (from, to) = (op.str_field("from"), op.str_field("to"));
                match (self.structures.get_mut(sid), to) {
                    (Some(state), Some(to)) => {
                        let recorded = state.parents.get(to).map(|(p, _)| p.as_str());
                        if from.is_none() || recorded == from {
                            state.parents.shift_remove(to);
                            true
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            }
            OpCode::SetLabel => match (op.i64_field("queue_index"), self.structures.get_mut(sid)) {
                (Some(q), Some(state)) => {
                    state.queue.insert(target.to_string(), q);
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if changed {
            self.dirty.insert(sid.to_string());
        }
    }

    fn geometry(&self, sid: &str) -> TreeGeometry {
        let default_cfg = LayoutConfig::default();
        let cfg = self.configs.get(sid).unwrap_or(&default_cfg);
        let (ox, oy) = self.offsets.get(sid).copied().unwrap_or((0.0, 0.0));
        let spacing = cfg.spacing.unwrap_or(self.spacing);
        let level = cfg.level_spacing.unwrap_or(self.level_spacing);
        TreeGeometry {
            spacing,
            root_x: cfg.start_x.unwrap_or(self.start_x) + ox,
            root_y: cfg.queue_start_y.or(cfg.start_y).unwrap_or(self.start_y) + oy,
            queue_spacing: cfg.queue_spacing.unwrap_or(spacing),
            child_dy: cfg.tree_offset_y.unwrap_or(level),
            span: cfg.tree_span.unwrap_or(spacing * 2.0),
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
            let geometry = self.geometry(&sid);
            let Some(state) = self.structures.get_mut(&sid) else {
                continue;
            };
            let placed = place_forest(state, &geometry);
            for (id, pos) in &placed {
                if state.positions.get(id) != Some(pos) {
                    ops.push(AnimationOp::set_pos(&sid, id.as_str(), pos.0, pos.1));
                }
            }
            state.positions = placed.into_iter().collect();
        }
        log::trace!("tree layout: {} positions", ops.len());
        self.dirty.clear();
        ops
    }
}

/// Place every root and its subtree with an explicit stack.
fn place_forest(state: &TreeState, g: &TreeGeometry) -> IndexMap<String, (f64, f64)> {
    let mut placed: IndexMap<String, (f64, f64)> = IndexMap::new();
    for (idx, root) in state.roots().into_iter().enumerate() {
        let mut stack = vec![(root, g.root_x + idx as f64 * g.queue_spacing, g.root_y, g.span)];
        while let Some((id, x, y, span)) = stack.pop() {
            if placed.contains_key(id.as_str()) {
                continue;
            }
            placed.insert(id.clone(), (x, y));
            let next_span = (span / 2.0).max(g.spacing);
            if let Some(right) = state.child(id, 'R') {
                stack.push((right, x + next_span, y + g.child_dy, next_span));
            }
            if let Some(left) = state.child(id, 'L') {
                stack.push((left, x - next_span, y + g.child_dy, next_span));
            }
        }
    }
    placed
}

impl LayoutEngine for TreeLayoutEngine {
    fn strategy(&self) -> LayoutStrategy {
        LayoutStrategy::Tree
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
