//! Linear layout: each structure is an ordered row of slots.
//!
//! CREATE_NODE appends a node (or inserts it at its `index` hint), DELETE_NODE
//! closes the gap. Bucket containers do not take a slot; they are centred over
//! the structure's nodes. A step that changes a structure's node set emits
//! SET_POS only for the nodes of that structure whose slot moved.

use dsvis_timeline_core::{AnimationOp, OpCode, Timeline};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::config::{LayoutConfig, Orientation};
use crate::engine::{admitted, layout_steps, LayoutEngine, LayoutStrategy, Offsets, StructureConfigs};

#[derive(Debug, Default, Clone)]
struct LinearState {
    nodes: Vec<String>,
    buckets: Vec<String>,
    /// Cross-axis row, assigned only to structures without an offset.
    row: usize,
    /// Last emitted position per node and bucket.
    positions: HashMap<String, (f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct SimpleLayoutEngine {
    pub spacing: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub row_spacing: f64,
    structures: IndexMap<String, LinearState>,
    dirty: HashSet<String>,
    next_row: usize,
    offsets: Offsets,
    configs: StructureConfigs,
    filter: Option<HashSet<String>>,
}

impl Default for SimpleLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleLayoutEngine {
    pub fn new() -> Self {
        Self {
            spacing: 120.0,
            start_x: 50.0,
            start_y: 50.0,
            row_spacing: 220.0,
            structures: IndexMap::new(),
            dirty: HashSet::new(),
            next_row: 0,
            offsets: Offsets::new(),
            configs: StructureConfigs::new(),
            filter: None,
        }
    }

    pub fn with_spacing(mut self, spacing: f64, row_spacing: f64) -> Self {
        self.spacing = spacing;
        self.row_spacing = row_spacing;
        self
    }

    /// Slot order currently known for `structure_id`.
    pub fn nodes(&self, structure_id: &str) -> Option<&[String]> {
        self.structures.get(structure_id).map(|s| s.nodes.as_slice())
    }

    pub fn is_tracking(&self) -> bool {
        !self.structures.is_empty()
    }

    fn state_mut(&mut self, sid: &str) -> &mut LinearState {
        let anchored = self.offsets.contains_key(sid);
        let next_row = &mut self.next_row;
        self.structures.entry(sid.to_string()).or_insert_with(|| {
            let row = if anchored {
                0
            } else {
                *next_row += 1;
                *next_row - 1
            };
            LinearState {
                row,
                ..LinearState::default()
            }
        })
    }

    fn observe(&mut self, op: &AnimationOp) {
        let Some(sid) = admitted(op, self.filter.as_ref()) else {
            return;
        };
        let Some(target) = op.target() else {
            return;
        };
        match op.op {
            OpCode::CreateNode => {
                let is_bucket = op.str_field("shape") == Some("bucket");
                let index = op.i64_field("index");
                let state = self.state_mut(sid);
                let changed = if is_bucket {
                    if state.buckets.iter().any(|b| b == target) {
                        false
                    } else {
                        state.buckets.push(target.to_string());
                        true
                    }
                } else if state.nodes.iter().any(|n| n == target) {
                    false
                } else {
                    let slot = index
                        .map(|i| i.clamp(0, state.nodes.len() as i64) as usize)
                        .unwrap_or(state.nodes.len());
                    state.nodes.insert(slot, target.to_string());
                    true
                };
                if changed {
                    self.dirty.insert(sid.to_string());
                }
            }
            OpCode::DeleteNode => {
                let Some(state) = self.structures.get_mut(sid) else {
                    log::warn!("linear layout: DELETE_NODE {target} for unknown structure {sid}");
                    return;
                };
                let before = state.nodes.len() + state.buckets.len();
                state.nodes.retain(|n| n != target);
                state.buckets.retain(|b| b != target);
                if state.nodes.len() + state.buckets.len() != before {
                    self.dirty.insert(sid.to_string());
                }
            }
            _ => {}
        }
    }

    fn emit(&mut self) -> Vec<AnimationOp> {
        if self.dirty.is_empty() {
            return Vec::new();
        }
        let geometries: Vec<(String, Geometry)> = self
            .structures
            .iter()
            .filter(|(sid, _)| self.dirty.contains(sid.as_str()))
            .map(|(sid, state)| (sid.clone(), Geometry::resolve(self, sid, state.row)))
            .collect();

        let mut ops = Vec::new();
        for (sid, geometry) in geometries {
            let Some(state) = self.structures.get_mut(&sid) else {
                continue;
            };
            let mut placed: Vec<(String, (f64, f64))> = state
                .nodes
                .iter()
                .enumerate()
                .map(|(slot, id)| (id.clone(), geometry.at(slot as f64)))
                .collect();
            if !state.buckets.is_empty() {
                let centre = geometry.at(state.nodes.len().saturating_sub(1) as f64 / 2.0);
                placed.extend(state.buckets.iter().map(|bucket| (bucket.clone(), centre)));
            }

            for (id, pos) in &placed {
                if state.positions.get(id) != Some(pos) {
                    ops.push(AnimationOp::set_pos(&sid, id.as_str(), pos.0, pos.1));
                }
            }
            state.positions = placed.into_iter().collect();
        }
        log::trace!(
            "linear layout: {} positions for {} structures",
            ops.len(),
            self.dirty.len()
        );
        self.dirty.clear();
        ops
    }
}

/// Resolved per-structure geometry.
struct Geometry {
    orientation: Orientation,
    spacing: f64,
    main_start: f64,
    cross: f64,
}

impl Geometry {
    fn resolve(engine: &SimpleLayoutEngine, sid: &str, row: usize) -> Self {
        let default_cfg = LayoutConfig::default();
        let cfg = engine.configs.get(sid).unwrap_or(&default_cfg);
        let (ox, oy) = engine.offsets.get(sid).copied().unwrap_or((0.0, 0.0));
        let orientation = cfg.orientation_or(Orientation::Horizontal);
        let spacing = cfg.spacing.unwrap_or(engine.spacing);
        let row_spacing = cfg.row_spacing.unwrap_or(engine.row_spacing);
        let start_x = cfg.start_x.unwrap_or(engine.start_x) + ox;
        let start_y = cfg.start_y.unwrap_or(engine.start_y) + oy;
        let row_shift = row as f64 * row_spacing;
        match orientation {
            Orientation::Horizontal => Self {
                orientation,
                spacing,
                main_start: start_x,
                cross: start_y + row_shift,
            },
            Orientation::Vertical => Self {
                orientation,
                spacing,
                main_start: start_y,
                cross: start_x + row_shift,
            },
        }
    }

    fn at(&self, slot: f64) -> (f64, f64) {
        let main = self.main_start + self.spacing * slot;
        match self.orientation {
            Orientation::Horizontal => (main, self.cross),
            Orientation::Vertical => (self.cross, main),
        }
    }
}

impl LayoutEngine for SimpleLayoutEngine {
    fn strategy(&self) -> LayoutStrategy {
        LayoutStrategy::Linear
    }

    fn apply_layout(&mut self, timeline: &Timeline) -> Timeline {
        layout_steps(self, timeline, Self::observe, Self::emit)
    }

    fn reset(&mut self) {
        self.structures.clear();
        self.dirty.clear();
        self.next_row = 0;
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
