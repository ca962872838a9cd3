//! Huffman tree construction over a weight list.
//!
//! The queue is a min-heap ordered by (weight, insertion order). Each merge
//! re-tags the remaining queue with `queue_index` so the tree layout can keep
//! the roots sorted.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::steps;
use crate::value::{format_number, Scalar};
use crate::{ModelOp, Payload, StructureKind};

const EDGE_KIND: &str = "huff";

#[derive(Clone, Debug, PartialEq)]
pub struct HuffmanNode {
    pub weight: f64,
    pub left: Option<String>,
    pub right: Option<String>,
}

#[derive(Clone, Debug)]
struct QueueEntry {
    weight: f64,
    order: u64,
    id: String,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.order.cmp(&other.order))
    }
}

#[derive(Debug, Clone)]
pub struct HuffmanModel {
    structure_id: String,
    ids: IdAllocator,
    nodes: IndexMap<String, HuffmanNode>,
    root: Option<String>,
    weights: Vec<f64>,
}

impl HuffmanModel {
    pub fn new(structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        Self {
            structure_id: structure_id.into(),
            ids,
            nodes: IndexMap::new(),
            root: None,
            weights: Vec::new(),
        }
    }

    pub fn structure_id(&self) -> &str {
        &self.structure_id
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn node(&self, id: &str) -> Option<&HuffmanNode> {
        self.nodes.get(id)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn apply_operation(&mut self, op: ModelOp, payload: &Payload) -> Result<Timeline, ModelError> {
        let name = op.as_str();
        match op {
            ModelOp::Build | ModelOp::Create => {
                if payload.get("values").map_or(true, JsonValue::is_null) {
                    return Err(ModelError::missing(name, "values"));
                }
                let values = args::values(payload, name)?;
                self.build(&values)
            }
            ModelOp::DeleteAll => Ok(self.delete_all()),
            other => Err(ModelError::UnsupportedOperation {
                kind: StructureKind::Huffman.as_str().to_string(),
                op: other.as_str().to_string(),
            }),
        }
    }

    /// `{values: weights of the last build}`
    pub fn export_state(&self) -> Payload {
        let mut state = Payload::new();
        state.insert(
            "values".into(),
            JsonValue::Array(self.weights.iter().map(|w| JsonValue::from(*w)).collect()),
        );
        state
    }

    pub fn build(&mut self, values: &[Scalar]) -> Result<Timeline, ModelError> {
        let weights = values
            .iter()
            .map(|v| match v {
                Scalar::Int(_) | Scalar::Float(_) => v.as_f64().ok_or_else(|| not_a_weight(v)),
                _ => Err(not_a_weight(v)),
            })
            .collect::<Result<Vec<f64>, ModelError>>()?;

        let mut tl = self.delete_all();
        if weights.is_empty() {
            tl.extend(steps::message_only("Empty", "Empty weights for Huffman build"));
            return Ok(tl);
        }

        let sid = self.structure_id.clone();
        let mut heap = BinaryHeap::with_capacity(weights.len());
        for (order, weight) in weights.iter().copied().enumerate() {
            let id = self.ids.alloc_node(&sid, "node");
            self.nodes.insert(
                id.clone(),
                HuffmanNode {
                    weight,
                    left: None,
                    right: None,
                },
            );
            heap.push(Reverse(QueueEntry {
                weight,
                order: order as u64,
                id,
            }));
        }
        self.weights = weights;

        let mut init = vec![AnimationOp::message("Init Huffman queue")];
        for (idx, entry) in sorted_queue(&heap).into_iter().enumerate() {
            init.push(
                self.node_op(&entry.id, entry.weight)
                    .with("queue_index", idx as u64),
            );
        }
        tl.add_step(AnimationStep::labeled("Init", init));

        let mut order = self.weights.len() as u64;
        let mut merge = 0usize;
        while heap.len() > 1 {
            let (Some(Reverse(first)), Some(Reverse(second))) = (heap.pop(), heap.pop()) else {
                break;
            };
            merge += 1;
            tl.add_step(AnimationStep::labeled(
                "Pick two",
                vec![
                    AnimationOp::message(format!(
                        "Merge step {merge}: pick {} & {}",
                        format_number(first.weight),
                        format_number(second.weight)
                    )),
                    AnimationOp::set_state(&sid, first.id.as_str(), VisualState::Highlight),
                    AnimationOp::set_state(&sid, second.id.as_str(), VisualState::Highlight),
                ],
            ));

            let weight = first.weight + second.weight;
            let parent = self.ids.alloc_node(&sid, "node");
            tl.add_step(AnimationStep::labeled(
                "Create parent",
                vec![
                    self.node_op(&parent, weight),
                    self.edge_op(&parent, &first.id, "L"),
                    self.edge_op(&parent, &second.id, "R"),
                ],
            ));
            self.nodes.insert(
                parent.clone(),
                HuffmanNode {
                    weight,
                    left: Some(first.id),
                    right: Some(second.id),
                },
            );
            self.root = Some(parent.clone());
            heap.push(Reverse(QueueEntry {
                weight,
                order,
                id: parent,
            }));
            order += 1;

            let mut requeue = Vec::new();
            for (idx, entry) in sorted_queue(&heap).into_iter().enumerate() {
                requeue.push(
                    AnimationOp::set_label(&sid, entry.id.as_str(), format_number(entry.weight))
                        .with("queue_index", idx as u64),
                );
                requeue.push(AnimationOp::set_state(&sid, entry.id.as_str(), VisualState::Normal));
            }
            requeue.push(AnimationOp::clear_message());
            tl.add_step(AnimationStep::labeled("Requeue", requeue));
        }

        if let Some(Reverse(root)) = heap.peek() {
            self.root = Some(root.id.clone());
            tl.add_step(AnimationStep::labeled(
                "Complete",
                vec![
                    AnimationOp::message(format!("Done: root weight={}", format_number(root.weight))),
                    AnimationOp::set_state(&sid, root.id.as_str(), VisualState::Active),
                ],
            ));
        }
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        Ok(tl)
    }

    pub fn delete_all(&mut self) -> Timeline {
        let mut tl = Timeline::new();
        if self.nodes.is_empty() {
            self.weights.clear();
            return tl;
        }
        let sid = &self.structure_id;
        let mut ops = vec![AnimationOp::message("Delete all Huffman nodes")];
        for (id, node) in &self.nodes {
            for child in node.left.iter().chain(node.right.iter()) {
                let edge = IdAllocator::edge_id(sid, EDGE_KIND, id, child);
                ops.push(AnimationOp::delete_edge(sid, edge, id, child));
            }
        }
        ops.extend(self.nodes.keys().map(|id| AnimationOp::delete_node(sid, id.as_str())));
        self.nodes.clear();
        self.root = None;
        self.weights.clear();
        tl.add_step(AnimationStep::labeled("Delete all", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    fn node_op(&self, id: &str, weight: f64) -> AnimationOp {
        AnimationOp::create_node(&self.structure_id, id)
            .with("label", format_number(weight))
            .with("shape", "circle")
    }

    fn edge_op(&self, parent: &str, child: &str, side: &str) -> AnimationOp {
        let edge = IdAllocator::edge_id(&self.structure_id, EDGE_KIND, parent, child);
        AnimationOp::create_edge(&self.structure_id, edge, parent, child).with("label", side)
    }
}

fn sorted_queue(heap: &BinaryHeap<Reverse<QueueEntry>>) -> Vec<&QueueEntry> {
    let mut entries: Vec<&QueueEntry> = heap.iter().map(|Reverse(e)| e).collect();
    entries.sort();
    entries
}

fn not_a_weight(value: &Scalar) -> ModelError {
    ModelError::invalid(
        ModelOp::Build.as_str(),
        "values",
        format!("Huffman weights must be numbers, got {value}"),
    )
}
