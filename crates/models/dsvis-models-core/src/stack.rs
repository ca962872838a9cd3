//! Stack: rectangular cells inside a bucket container, top at index 0.

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use serde_json::Value as JsonValue;

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::steps;
use crate::value::Scalar;
use crate::{ModelOp, Payload, StructureKind};

const CELL_SPACING: f64 = 80.0;
const BUCKET_WIDTH: f64 = 80.0;
const BUCKET_PADDING: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct StackModel {
    structure_id: String,
    ids: IdAllocator,
    /// top -> bottom
    values: Vec<Scalar>,
    node_ids: Vec<String>,
    container: Option<String>,
}

impl StackModel {
    pub fn new(structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        Self {
            structure_id: structure_id.into(),
            ids,
            values: Vec::new(),
            node_ids: Vec::new(),
            container: None,
        }
    }

    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Values top first.
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn apply_operation(&mut self, op: ModelOp, payload: &Payload) -> Result<Timeline, ModelError> {
        let name = op.as_str();
        match op {
            ModelOp::Create => {
                let values = args::values(payload, name)?;
                Ok(self.create(values))
            }
            ModelOp::DeleteAll => Ok(self.delete_all()),
            ModelOp::Push => {
                let index = args::opt_index(payload, name)?;
                let value = args::req_scalar(payload, "value", name)?;
                self.push(value, index)
            }
            ModelOp::Pop => {
                let index = args::opt_index(payload, name)?;
                self.pop(index)
            }
            ModelOp::Search => {
                let value = args::req_scalar(payload, "value", name)?;
                Ok(self.search(&value))
            }
            other => Err(ModelError::UnsupportedOperation {
                kind: StructureKind::Stack.as_str().to_string(),
                op: other.as_str().to_string(),
            }),
        }
    }

    /// Values bottom -> top, so replaying `create` rebuilds the same stack.
    pub fn export_state(&self) -> Payload {
        let mut state = Payload::new();
        state.insert(
            "values".into(),
            JsonValue::Array(self.values.iter().rev().map(Scalar::to_json).collect()),
        );
        state
    }

    /// `values` is a push sequence: the last one ends on top.
    pub fn create(&mut self, values: Vec<Scalar>) -> Timeline {
        let mut tl = self.delete_all();
        let sid = self.structure_id.clone();
        self.values = values.into_iter().rev().collect();

        let mut ops = vec![self.create_container(self.values.len())];
        for (idx, value) in self.values.iter().enumerate() {
            let id = self.ids.alloc_node(&sid, "node");
            ops.push(cell_op(&sid, &id, value, idx));
            self.node_ids.push(id);
        }
        tl.add_step(AnimationStep::labeled("Create", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    pub fn delete_all(&mut self) -> Timeline {
        let mut tl = Timeline::new();
        if self.node_ids.is_empty() && self.container.is_none() {
            return tl;
        }
        let sid = &self.structure_id;
        let mut ops = vec![AnimationOp::message("Delete all")];
        ops.extend(self.node_ids.iter().map(|id| AnimationOp::delete_node(sid, id.as_str())));
        if let Some(container) = self.container.take() {
            ops.push(AnimationOp::delete_node(sid, container));
        }
        self.values.clear();
        self.node_ids.clear();
        tl.add_step(AnimationStep::labeled("Delete all", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    pub fn push(&mut self, value: Scalar, index: Option<i64>) -> Result<Timeline, ModelError> {
        check_top(index, ModelOp::Push)?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();

        let mut entry = Vec::new();
        if self.container.is_none() {
            entry.push(self.create_container(self.values.len()));
        }
        entry.push(AnimationOp::message(format!("Push {value}")));
        if let Some(container) = &self.container {
            entry.push(AnimationOp::set_state(&sid, container.as_str(), VisualState::Active));
        }
        tl.add_step(AnimationStep::labeled("Highlight entry", entry));

        let id = self.ids.alloc_node(&sid, "node");
        tl.add_step(AnimationStep::labeled("Create node", vec![cell_op(&sid, &id, &value, 0)]));
        self.values.insert(0, value);
        self.node_ids.insert(0, id);

        let resize = self.resize_container();
        tl.add_step(AnimationStep::labeled("Resize container", resize));
        tl.add_step(AnimationStep::labeled("Restore", self.restore_all()));
        Ok(tl)
    }

    pub fn pop(&mut self, index: Option<i64>) -> Result<Timeline, ModelError> {
        check_top(index, ModelOp::Pop)?;
        if self.node_ids.is_empty() {
            return Ok(steps::message_only("Empty", "Stack empty"));
        }
        let sid = self.structure_id.clone();
        let top = self.node_ids.remove(0);
        self.values.remove(0);

        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled(
            "Highlight top",
            vec![
                AnimationOp::message("Pop top"),
                AnimationOp::set_state(&sid, top.as_str(), VisualState::Highlight),
            ],
        ));
        tl.add_step(AnimationStep::labeled("Delete top", vec![AnimationOp::delete_node(&sid, top)]));
        let resize = self.resize_container();
        tl.add_step(AnimationStep::labeled("Resize container", resize));
        tl.add_step(AnimationStep::labeled("Restore", self.restore_all()));
        Ok(tl)
    }

    /// Linear scan from the top.
    pub fn search(&mut self, value: &Scalar) -> Timeline {
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        for (idx, (id, current)) in self.node_ids.iter().zip(&self.values).enumerate() {
            tl.add_step(AnimationStep::labeled(
                "Compare",
                vec![
                    AnimationOp::message(format!("Compare top-{idx}")),
                    AnimationOp::set_state(&sid, id.as_str(), VisualState::Highlight),
                ],
            ));
            if current.loose_eq(value) {
                tl.add_step(AnimationStep::labeled(
                    "Found",
                    vec![AnimationOp::message(format!("Found at top-{idx}"))],
                ));
                tl.add_step(AnimationStep::labeled("Restore", self.restore_all()));
                return tl;
            }
            tl.add_step(AnimationStep::labeled(
                "Mark visited",
                vec![AnimationOp::set_state(&sid, id.as_str(), VisualState::Secondary)],
            ));
        }
        tl.add_step(AnimationStep::labeled("Miss", vec![AnimationOp::message("Not found")]));
        tl.add_step(AnimationStep::labeled("Restore", self.restore_all()));
        tl
    }

    fn create_container(&mut self, count: usize) -> AnimationOp {
        let id = self.ids.alloc_node(&self.structure_id, "bucket");
        let height = count.max(1) as f64 * CELL_SPACING + BUCKET_PADDING;
        let op = AnimationOp::create_node(&self.structure_id, id.as_str())
            .with("shape", "bucket")
            .with("width", BUCKET_WIDTH)
            .with("height", height);
        self.container = Some(id);
        op
    }

    /// Delete and recreate the bucket for the current element count.
    fn resize_container(&mut self) -> Vec<AnimationOp> {
        let mut ops = Vec::new();
        if let Some(old) = self.container.take() {
            ops.push(AnimationOp::delete_node(&self.structure_id, old));
        }
        ops.push(self.create_container(self.node_ids.len()));
        ops
    }

    fn restore_all(&self) -> Vec<AnimationOp> {
        steps::restore(&self.structure_id, self.container.iter().chain(&self.node_ids))
    }
}

fn check_top(index: Option<i64>, op: ModelOp) -> Result<(), ModelError> {
    match index {
        None | Some(0) => Ok(()),
        Some(_) => Err(ModelError::invalid(op.as_str(), "index", "only index 0 (top) is supported")),
    }
}

fn cell_op(structure_id: &str, id: &str, value: &Scalar, index: usize) -> AnimationOp {
    AnimationOp::create_node(structure_id, id)
        .with("label", value.label())
        .with("shape", "rect")
        .with("index", index as u64)
}
