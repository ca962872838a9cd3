//! Steps and timelines.
//!
//! A Timeline is a simple `Vec<AnimationStep>`: append-only, consumed in
//! order. Ops inside one step are simultaneous; the only ordering consumers may
//! rely on is that structural ops precede same-step ops referencing them.

use serde::{Deserialize, Serialize};

use crate::ops::{AnimationOp, OpCode};

/// Default duration of a micro-step.
pub const DEFAULT_STEP_MS: u32 = 500;

fn default_duration() -> u32 {
    DEFAULT_STEP_MS
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationStep {
    #[serde(default = "default_duration")]
    pub duration_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub ops: Vec<AnimationOp>,
}

impl AnimationStep {
    pub fn new(ops: Vec<AnimationOp>) -> Self {
        Self {
            duration_ms: DEFAULT_STEP_MS,
            label: None,
            ops,
        }
    }

    pub fn labeled(label: impl Into<String>, ops: Vec<AnimationOp>) -> Self {
        Self {
            duration_ms: DEFAULT_STEP_MS,
            label: Some(label.into()),
            ops,
        }
    }

    /// Copy of this step's timing/label with an empty op list.
    pub fn empty_like(&self) -> Self {
        Self {
            duration_ms: self.duration_ms,
            label: self.label.clone(),
            ops: Vec::new(),
        }
    }

    pub fn count(&self, code: OpCode) -> usize {
        self.ops.iter().filter(|op| op.op == code).count()
    }
}

impl Default for AnimationStep {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub steps: Vec<AnimationStep>,
}

impl Timeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, step: AnimationStep) {
        self.steps.push(step);
    }

    /// Append a step only when it has ops.
    pub fn add_ops(&mut self, label: &str, ops: Vec<AnimationOp>) {
        if !ops.is_empty() {
            self.steps.push(AnimationStep::labeled(label, ops));
        }
    }

    /// Append every step of `other` (in order).
    pub fn extend(&mut self, other: Timeline) {
        self.steps.extend(other.steps);
    }

    /// Concatenate timelines in order.
    pub fn merge(timelines: impl IntoIterator<Item = Timeline>) -> Timeline {
        let mut merged = Timeline::new();
        for tl in timelines {
            merged.extend(tl);
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every op of every step, in consumption order.
    pub fn ops(&self) -> impl Iterator<Item = &AnimationOp> {
        self.steps.iter().flat_map(|s| s.ops.iter())
    }

    pub fn ops_of(&self, code: OpCode) -> impl Iterator<Item = &AnimationOp> {
        self.ops().filter(move |op| op.op == code)
    }

    pub fn count(&self, code: OpCode) -> usize {
        self.ops_of(code).count()
    }
}
