//! The layout engine contract and helpers shared by the engines.

use std::fmt;
use std::str::FromStr;

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline};
use hashbrown::HashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Structure id -> base offset `(x, y)`.
pub type Offsets = IndexMap<String, (f64, f64)>;

/// Structure id -> layout overrides.
pub type StructureConfigs = IndexMap<String, LayoutConfig>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayoutStrategy {
    Linear,
    Tree,
    Dag,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 3] = [LayoutStrategy::Linear, LayoutStrategy::Tree, LayoutStrategy::Dag];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutStrategy::Linear => "LINEAR",
            LayoutStrategy::Tree => "TREE",
            LayoutStrategy::Dag => "DAG",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutStrategy::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown layout strategy '{s}'"))
    }
}

/// Stateful, incremental position injection.
///
/// `apply_layout` returns a copy of the input where every step keeps its
/// structural ops untouched and gains SET_POS ops appended at the end. Engine
/// state persists across calls, so a timeline only needs to describe what
/// changed since the previous call.
pub trait LayoutEngine: fmt::Debug {
    fn strategy(&self) -> LayoutStrategy;

    fn apply_layout(&mut self, timeline: &Timeline) -> Timeline;

    /// Forget every structure seen so far, including offsets, configs and filter.
    fn reset(&mut self);

    fn set_offsets(&mut self, _offsets: &Offsets) {}

    fn set_structure_config(&mut self, _configs: &StructureConfigs) {}

    /// Restrict processing to the given structures; `None` accepts all.
    fn set_filter(&mut self, _filter: Option<HashSet<String>>) {}
}

/// Copy of `step` with `positions` appended.
pub(crate) fn with_positions(step: &AnimationStep, positions: Vec<AnimationOp>) -> AnimationStep {
    let mut out = step.clone();
    out.ops.extend(positions);
    out
}

/// Run `observe` then `emit` for each step, collecting the laid-out timeline.
pub(crate) fn layout_steps<E>(
    engine: &mut E,
    timeline: &Timeline,
    mut observe: impl FnMut(&mut E, &AnimationOp),
    mut emit: impl FnMut(&mut E) -> Vec<AnimationOp>,
) -> Timeline {
    let mut out = Timeline::new();
    for step in &timeline.steps {
        for op in &step.ops {
            observe(engine, op);
        }
        let positions = emit(engine);
        out.add_step(with_positions(step, positions));
    }
    out
}

/// `structure_id` of `op` if the filter admits it.
pub(crate) fn admitted<'a>(op: &'a AnimationOp, filter: Option<&HashSet<String>>) -> Option<&'a str> {
    let sid = op.structure_id()?;
    match filter {
        Some(allowed) if !allowed.contains(sid) => None,
        _ => Some(sid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        assert_eq!("tree".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Tree);
        assert_eq!(serde_json::to_value(LayoutStrategy::Dag).unwrap(), serde_json::json!("DAG"));
        assert!("radial".parse::<LayoutStrategy>().is_err());
    }
}
