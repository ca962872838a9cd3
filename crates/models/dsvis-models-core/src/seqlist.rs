//! Sequential (array-backed) list: cells only, no edges, resizable bucket.

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use serde_json::Value as JsonValue;

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::steps;
use crate::value::Scalar;
use crate::{ModelOp, Payload, StructureKind};

const CELL_WIDTH: f64 = 80.0;
const BUCKET_PADDING: f64 = 40.0;
const BUCKET_HEIGHT: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct SeqListModel {
    structure_id: String,
    ids: IdAllocator,
    values: Vec<Scalar>,
    node_ids: Vec<String>,
    container: Option<String>,
}

impl SeqListModel {
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

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
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
            ModelOp::Insert => {
                let index = args::req_index(payload, name)?;
                let value = args::req_scalar(payload, "value", name)?;
                self.insert(index, value)
            }
            ModelOp::DeleteIndex => {
                let index = args::req_index(payload, name)?;
                self.delete_index(index)
            }
            ModelOp::Search => {
                let index = args::opt_index(payload, name)?;
                let value = args::opt_scalar(payload, "value", name)?;
                self.search(index, value)
            }
            ModelOp::Update => {
                let new_value = args::req_scalar(payload, "new_value", name)?;
                let index = args::opt_index(payload, name)?;
                let value = args::opt_scalar(payload, "value", name)?;
                self.update(index, value, new_value)
            }
            other => Err(ModelError::UnsupportedOperation {
                kind: StructureKind::SeqList.as_str().to_string(),
                op: other.as_str().to_string(),
            }),
        }
    }

    pub fn export_state(&self) -> Payload {
        let mut state = Payload::new();
        state.insert(
            "values".into(),
            JsonValue::Array(self.values.iter().map(Scalar::to_json).collect()),
        );
        state
    }

    pub fn create(&mut self, values: Vec<Scalar>) -> Timeline {
        let mut tl = self.delete_all();
        let sid = self.structure_id.clone();
        let mut ops = vec![self.create_container(values.len())];
        for value in &values {
            let id = self.ids.alloc_node(&sid, "node");
            ops.push(cell_op(&sid, &id, value, None));
            self.node_ids.push(id);
        }
        self.values = values;
        tl.add_step(AnimationStep::labeled("Create", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    /// Removes every cell and the bucket, even when the list is empty.
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

    pub fn insert(&mut self, index: i64, value: Scalar) -> Result<Timeline, ModelError> {
        let idx = args::insertion_point(index, self.values.len(), ModelOp::Insert.as_str())?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();

        let mut highlight = vec![AnimationOp::message(format!("Insert {value} at index {idx}"))];
        if let Some(id) = self.node_ids.get(idx) {
            highlight.push(AnimationOp::set_state(&sid, id.as_str(), VisualState::Highlight));
        }
        tl.add_step(AnimationStep::labeled("Highlight target", highlight));
        tl.add_ops(
            "Shift range",
            steps::states(&sid, &self.node_ids[idx..], VisualState::Secondary),
        );

        let id = self.ids.alloc_node(&sid, "node");
        tl.add_step(AnimationStep::labeled(
            "Create node",
            vec![cell_op(&sid, &id, &value, Some(idx))],
        ));
        self.values.insert(idx, value);
        self.node_ids.insert(idx, id);

        let resize = self.resize_container();
        tl.add_step(AnimationStep::labeled("Resize container", resize));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &self.node_ids)));
        Ok(tl)
    }

    pub fn delete_index(&mut self, index: i64) -> Result<Timeline, ModelError> {
        if self.node_ids.is_empty() {
            return Ok(steps::message_only("Empty", "Seqlist empty"));
        }
        let idx = args::slot(index, self.values.len(), ModelOp::DeleteIndex.as_str())?;
        let sid = self.structure_id.clone();
        let target = self.node_ids.remove(idx);
        self.values.remove(idx);

        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled(
            "Highlight",
            vec![
                AnimationOp::message(format!("Delete index {idx}")),
                AnimationOp::set_state(&sid, target.as_str(), VisualState::Highlight),
            ],
        ));
        tl.add_step(AnimationStep::labeled("Delete", vec![AnimationOp::delete_node(&sid, target)]));
        let resize = self.resize_container();
        tl.add_step(AnimationStep::labeled("Resize container", resize));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &self.node_ids)));
        Ok(tl)
    }

    pub fn search(&mut self, index: Option<i64>, value: Option<Scalar>) -> Result<Timeline, ModelError> {
        let op = ModelOp::Search.as_str();
        if index.is_none() && value.is_none() {
            return Err(ModelError::missing(op, "index or value"));
        }
        let target_idx = match index {
            Some(i) if !self.node_ids.is_empty() => Some(args::slot(i, self.node_ids.len(), op)?),
            _ => None,
        };
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();

        for (idx, id) in self.node_ids.iter().enumerate() {
            let text = match (&value, target_idx) {
                (Some(v), None) => format!("Compare {} with {v}", self.values[idx]),
                _ => format!("Compare idx {idx}"),
            };
            tl.add_step(AnimationStep::labeled(
                "Compare",
                vec![
                    AnimationOp::message(text),
                    AnimationOp::set_state(&sid, id.as_str(), VisualState::Highlight),
                ],
            ));
            let hit = match (target_idx, &value) {
                (Some(t), _) => t == idx,
                (None, Some(v)) => self.values[idx].loose_eq(v),
                (None, None) => false,
            };
            if hit {
                tl.add_step(AnimationStep::labeled(
                    "Found",
                    vec![AnimationOp::message(format!("Found at index {idx}"))],
                ));
                tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &self.node_ids)));
                return Ok(tl);
            }
            tl.add_step(AnimationStep::labeled(
                "Mark visited",
                vec![AnimationOp::set_state(&sid, id.as_str(), VisualState::Secondary)],
            ));
        }
        tl.add_step(AnimationStep::labeled("Miss", vec![AnimationOp::message("Not found")]));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &self.node_ids)));
        Ok(tl)
    }

    pub fn update(
        &mut self,
        index: Option<i64>,
        value: Option<Scalar>,
        new_value: Scalar,
    ) -> Result<Timeline, ModelError> {
        let op = ModelOp::Update.as_str();
        let target_idx = match (index, &value) {
            (Some(i), _) => Some(args::slot(i, self.values.len(), op)?),
            (None, Some(v)) => self.values.iter().position(|x| x.loose_eq(v)),
            (None, None) => return Err(ModelError::missing(op, "index or value")),
        };
        let Some(idx) = target_idx else {
            return Ok(steps::message_only("Miss", "Update target not found"));
        };

        let sid = self.structure_id.clone();
        let id = self.node_ids[idx].clone();
        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled(
            "Highlight",
            vec![
                AnimationOp::message(format!("Update index {idx} to {new_value}")),
                AnimationOp::set_state(&sid, id.as_str(), VisualState::Highlight),
            ],
        ));
        tl.add_step(AnimationStep::labeled(
            "Set label",
            vec![AnimationOp::set_label(&sid, id.as_str(), new_value.label())],
        ));
        self.values[idx] = new_value;
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &self.node_ids)));
        Ok(tl)
    }

    fn create_container(&mut self, count: usize) -> AnimationOp {
        let id = self.ids.alloc_node(&self.structure_id, "bucket");
        let width = count.max(1) as f64 * CELL_WIDTH + BUCKET_PADDING;
        let op = AnimationOp::create_node(&self.structure_id, id.as_str())
            .with("shape", "bucket")
            .with("width", width)
            .with("height", BUCKET_HEIGHT);
        self.container = Some(id);
        op
    }

    fn resize_container(&mut self) -> Vec<AnimationOp> {
        let mut ops = Vec::new();
        if let Some(old) = self.container.take() {
            ops.push(AnimationOp::delete_node(&self.structure_id, old));
        }
        ops.push(self.create_container(self.node_ids.len()));
        ops
    }
}

fn cell_op(structure_id: &str, id: &str, value: &Scalar, index: Option<usize>) -> AnimationOp {
    let op = AnimationOp::create_node(structure_id, id)
        .with("label", value.label())
        .with("shape", "rect");
    match index {
        Some(i) => op.with("index", i as u64),
        None => op,
    }
}
