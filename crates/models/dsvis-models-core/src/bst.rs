//! Binary search tree without rebalancing.
//!
//! Nodes live in a map keyed by node id. Deleting a node with two children
//! copies the in-order successor's key onto it, so the node keeps its id and
//! only the successor's node is removed.

use std::cmp::Ordering;

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::steps;
use crate::value::Scalar;
use crate::{ModelOp, Payload, StructureKind};

const EDGE_KIND: &str = "bst";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BstNode {
    pub key: Scalar,
    pub left: Option<String>,
    pub right: Option<String>,
    pub parent: Option<String>,
}

impl BstNode {
    fn leaf(key: Scalar, parent: Option<String>) -> Self {
        Self {
            key,
            left: None,
            right: None,
            parent,
        }
    }

    fn child(&self, side: Side) -> Option<&String> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    fn set_child(&mut self, side: Side, child: Option<String>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

/// Result of walking down from the root towards a key.
struct Descent {
    /// Node ids compared, in order.
    path: Vec<String>,
    /// Edge ids traversed, in order.
    edges: Vec<String>,
    /// Node holding an equal key.
    hit: Option<String>,
    /// Where a missing key would be attached.
    slot: Option<(String, Side)>,
}

#[derive(Debug, Clone)]
pub struct BstModel {
    structure_id: String,
    ids: IdAllocator,
    nodes: HashMap<String, BstNode>,
    root: Option<String>,
}

impl BstModel {
    pub fn new(structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        Self {
            structure_id: structure_id.into(),
            ids,
            nodes: HashMap::new(),
            root: None,
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

    pub fn node(&self, id: &str) -> Option<&BstNode> {
        self.nodes.get(id)
    }

    /// Id of the node holding `key`.
    pub fn find_id(&self, key: &Scalar) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, n)| n.key.loose_eq(key))
            .map(|(id, _)| id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn apply_operation(&mut self, op: ModelOp, payload: &Payload) -> Result<Timeline, ModelError> {
        let name = op.as_str();
        match op {
            ModelOp::Create => {
                let values = args::values(payload, name)?;
                self.create(values)
            }
            ModelOp::DeleteAll => Ok(self.delete_all()),
            ModelOp::Insert => {
                let value = args::req_scalar(payload, "value", name)?;
                self.insert(value)
            }
            ModelOp::Search => {
                let value = args::req_scalar(payload, "value", name)?;
                self.search(&value)
            }
            ModelOp::DeleteValue => {
                let value = args::req_scalar(payload, "value", name)?;
                self.delete_value(&value)
            }
            other => Err(ModelError::UnsupportedOperation {
                kind: StructureKind::Bst.as_str().to_string(),
                op: other.as_str().to_string(),
            }),
        }
    }

    /// `{values: pre-order keys}`; replaying them through `create` rebuilds the same shape.
    pub fn export_state(&self) -> Payload {
        let mut state = Payload::new();
        state.insert(
            "values".into(),
            JsonValue::Array(
                self.pre_order()
                    .iter()
                    .filter_map(|id| self.nodes.get(id))
                    .map(|n| n.key.to_json())
                    .collect(),
            ),
        );
        state
    }

    /// Node ids in pre-order.
    pub fn pre_order(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<String> = self.root.iter().cloned().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                if let Some(r) = &node.right {
                    stack.push(r.clone());
                }
                if let Some(l) = &node.left {
                    stack.push(l.clone());
                }
            }
            out.push(id);
        }
        out
    }

    /// Keys in sorted order.
    pub fn in_order_keys(&self) -> Vec<Scalar> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&String> = Vec::new();
        let mut cursor = self.root.as_ref();
        while cursor.is_some() || !stack.is_empty() {
            while let Some(id) = cursor {
                stack.push(id);
                cursor = self.nodes.get(id).and_then(|n| n.left.as_ref());
            }
            if let Some(id) = stack.pop() {
                if let Some(node) = self.nodes.get(id) {
                    out.push(node.key.clone());
                    cursor = node.right.as_ref();
                }
            }
        }
        out
    }

    /// Insert every value in order as one structural step. Duplicates are skipped.
    pub fn create(&mut self, values: Vec<Scalar>) -> Result<Timeline, ModelError> {
        ensure_comparable(&values)?;
        let mut tl = self.delete_all();
        let mut ops = Vec::new();
        for value in values {
            let descent = self.descend(&value)?;
            if descent.hit.is_some() {
                continue;
            }
            let (_, create_ops) = self.attach(value, descent.slot);
            ops.extend(create_ops);
        }
        if ops.is_empty() {
            ops.push(AnimationOp::message("Create empty tree"));
        }
        tl.add_step(AnimationStep::labeled("Create", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        Ok(tl)
    }

    pub fn delete_all(&mut self) -> Timeline {
        let mut tl = Timeline::new();
        if self.nodes.is_empty() {
            return tl;
        }
        let sid = self.structure_id.clone();
        let order = self.pre_order();
        let mut ops = vec![AnimationOp::message("Delete all")];
        for id in &order {
            if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent.as_ref()) {
                ops.push(AnimationOp::delete_edge(&sid, self.edge_id(parent, id), parent, id));
            }
        }
        ops.extend(order.iter().rev().map(|id| AnimationOp::delete_node(&sid, id.as_str())));
        self.nodes.clear();
        self.root = None;
        tl.add_step(AnimationStep::labeled("Delete all", ops));
        tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
        tl
    }

    pub fn insert(&mut self, value: Scalar) -> Result<Timeline, ModelError> {
        let descent = self.descend(&value)?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        let mut touched = self.compare_steps(&mut tl, &value, &descent);

        if descent.hit.is_some() {
            tl.add_step(AnimationStep::labeled(
                "Key exists",
                vec![AnimationOp::message(format!("Key exists: {value}"))],
            ));
        } else {
            let text = format!("Insert {value}");
            let (new_id, mut ops) = self.attach(value, descent.slot);
            ops.insert(0, AnimationOp::message(text));
            ops.push(AnimationOp::set_state(&sid, new_id.as_str(), VisualState::Highlight));
            tl.add_step(AnimationStep::labeled("Insert node", ops));
            touched.push(new_id);
        }
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &touched)));
        Ok(tl)
    }

    pub fn search(&mut self, value: &Scalar) -> Result<Timeline, ModelError> {
        let descent = self.descend(value)?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        let touched = self.compare_steps(&mut tl, value, &descent);
        let text = if descent.hit.is_some() {
            format!("Found {value}")
        } else {
            format!("Value {value} not found")
        };
        tl.add_step(AnimationStep::labeled("Result", vec![AnimationOp::message(text)]));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &touched)));
        Ok(tl)
    }

    pub fn delete_value(&mut self, value: &Scalar) -> Result<Timeline, ModelError> {
        let descent = self.descend(value)?;
        let sid = self.structure_id.clone();
        let mut tl = Timeline::new();
        let mut touched = self.compare_steps(&mut tl, value, &descent);

        let Some(target) = descent.hit else {
            tl.add_step(AnimationStep::labeled(
                "Result",
                vec![AnimationOp::message(format!("Value {value} not found"))],
            ));
            tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &touched)));
            return Ok(tl);
        };

        tl.add_step(AnimationStep::labeled(
            "Found",
            vec![AnimationOp::message(format!("Delete {value}"))],
        ));

        let two_children = self
            .nodes
            .get(&target)
            .map(|n| n.left.is_some() && n.right.is_some())
            .unwrap_or(false);

        if two_children {
            let successor = self.successor_of(&target);
            let successor_key = self
                .nodes
                .get(&successor)
                .map(|n| n.key.clone())
                .ok_or_else(|| ModelError::state("successor missing from tree"))?;

            tl.add_step(AnimationStep::labeled(
                "Find successor",
                vec![
                    AnimationOp::message(format!("Successor {successor_key}")),
                    AnimationOp::set_state(&sid, successor.as_str(), VisualState::Secondary),
                ],
            ));
            tl.add_step(AnimationStep::labeled(
                "Copy key",
                vec![AnimationOp::set_label(&sid, target.as_str(), successor_key.label())],
            ));
            if let Some(node) = self.nodes.get_mut(&target) {
                node.key = successor_key;
            }
            let ops = self.detach(&successor);
            tl.add_step(AnimationStep::labeled("Remove successor", ops));
            steps::touch(&mut touched, &target);
        } else {
            let ops = self.detach(&target);
            tl.add_step(AnimationStep::labeled("Remove node", ops));
        }

        touched.retain(|id| self.is_live(id));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &touched)));
        Ok(tl)
    }

    /// Walk from the root; errors if the key cannot be ordered against the tree.
    fn descend(&self, key: &Scalar) -> Result<Descent, ModelError> {
        let mut descent = Descent {
            path: Vec::new(),
            edges: Vec::new(),
            hit: None,
            slot: None,
        };
        let mut cursor = self.root.clone();
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else {
                return Err(ModelError::state(format!("dangling node id {id}")));
            };
            descent.path.push(id.clone());
            let side = match key.try_cmp(&node.key)? {
                Ordering::Equal => {
                    descent.hit = Some(id);
                    return Ok(descent);
                }
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(child) => {
                    descent.edges.push(self.edge_id(&id, child));
                    cursor = Some(child.clone());
                }
                None => {
                    descent.slot = Some((id, side));
                    cursor = None;
                }
            }
        }
        Ok(descent)
    }

    /// One compare step per visited node, each followed by the edge taken.
    fn compare_steps(&self, tl: &mut Timeline, key: &Scalar, descent: &Descent) -> Vec<String> {
        let sid = &self.structure_id;
        let mut touched = Vec::new();
        for (hop, id) in descent.path.iter().enumerate() {
            let label = self.nodes.get(id).map(|n| n.key.label()).unwrap_or_default();
            tl.add_step(AnimationStep::labeled(
                "Compare",
                vec![
                    AnimationOp::message(format!("Compare {key} with {label}")),
                    AnimationOp::set_state(sid, id.as_str(), VisualState::Highlight),
                ],
            ));
            touched.push(id.clone());
            if let Some(edge) = descent.edges.get(hop) {
                tl.add_step(AnimationStep::labeled(
                    "Move",
                    vec![AnimationOp::set_state(sid, edge.as_str(), VisualState::Highlight)],
                ));
                touched.push(edge.clone());
            }
        }
        touched
    }

    /// Create a node for `key` at `slot` (or as root) and return its id and ops.
    fn attach(&mut self, key: Scalar, slot: Option<(String, Side)>) -> (String, Vec<AnimationOp>) {
        let sid = self.structure_id.clone();
        let id = self.ids.alloc_node(&sid, "node");
        let mut ops = vec![AnimationOp::create_node(&sid, id.as_str()).with("label", key.label())];
        match slot {
            Some((parent, side)) => {
                ops.push(self.edge_op(&parent, &id, side));
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.set_child(side, Some(id.clone()));
                }
                self.nodes.insert(id.clone(), BstNode::leaf(key, Some(parent)));
            }
            None => {
                self.nodes.insert(id.clone(), BstNode::leaf(key, None));
                self.root = Some(id.clone());
            }
        }
        (id, ops)
    }

    /// Leftmost node of the right subtree.
    fn successor_of(&self, id: &str) -> String {
        let mut cursor = self.nodes.get(id).and_then(|n| n.right.clone());
        let mut last = id.to_string();
        while let Some(next) = cursor {
            cursor = self.nodes.get(&next).and_then(|n| n.left.clone());
            last = next;
        }
        last
    }

    fn side_of(&self, parent: &str, child: &str) -> Side {
        match self.nodes.get(parent) {
            Some(p) if p.left.as_deref() == Some(child) => Side::Left,
            _ => Side::Right,
        }
    }

    /// Remove a node with at most one child, splicing the child into its slot.
    fn detach(&mut self, id: &str) -> Vec<AnimationOp> {
        let sid = self.structure_id.clone();
        let Some(node) = self.nodes.remove(id) else {
            return Vec::new();
        };
        let child = node.left.clone().or_else(|| node.right.clone());
        let mut ops = Vec::new();

        if let Some(c) = &child {
            ops.push(AnimationOp::delete_edge(&sid, self.edge_id(id, c), id, c));
        }
        match &node.parent {
            Some(p) => {
                let side = self.side_of(p, id);
                ops.push(AnimationOp::delete_edge(&sid, self.edge_id(p, id), p, id));
                if let Some(c) = &child {
                    ops.push(self.edge_op(p, c, side));
                }
                if let Some(parent) = self.nodes.get_mut(p) {
                    parent.set_child(side, child.clone());
                }
            }
            None => self.root = child.clone(),
        }
        if let Some(c) = &child {
            if let Some(child_node) = self.nodes.get_mut(c) {
                child_node.parent = node.parent.clone();
            }
        }
        ops.push(AnimationOp::delete_node(&sid, id));
        ops
    }

    /// Whether a node or edge id still refers to something in the tree.
    fn is_live(&self, id: &str) -> bool {
        if self.nodes.contains_key(id) {
            return true;
        }
        self.nodes.iter().any(|(child, node)| {
            node.parent
                .as_deref()
                .map_or(false, |parent| self.edge_id(parent, child) == id)
        })
    }

    fn edge_id(&self, parent: &str, child: &str) -> String {
        IdAllocator::edge_id(&self.structure_id, EDGE_KIND, parent, child)
    }

    fn edge_op(&self, parent: &str, child: &str, side: Side) -> AnimationOp {
        AnimationOp::create_edge(&self.structure_id, self.edge_id(parent, child), parent, child)
            .with("label", side.label())
    }
}

/// Keys must be all numeric or all text.
fn ensure_comparable(values: &[Scalar]) -> Result<(), ModelError> {
    if let Some(first) = values.first() {
        for v in &values[1..] {
            first.try_cmp(v)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvis_timeline_core::OpCode;

    fn tree(sid: &str, keys: &[i64]) -> BstModel {
        let mut m = BstModel::new(sid, IdAllocator::new());
        m.create(keys.iter().copied().map(Scalar::Int).collect()).unwrap();
        m
    }

    #[test]
    fn create_builds_one_structural_step() {
        let mut m = BstModel::new("tree1", IdAllocator::new());
        let tl = m.create(vec![Scalar::Int(2), Scalar::Int(1), Scalar::Int(3)]).unwrap();
        assert_eq!(m.node_count(), 3);
        assert_eq!(tl.steps[0].count(OpCode::CreateNode), 3);
        assert_eq!(tl.steps[0].count(OpCode::CreateEdge), 2);
    }

    #[test]
    fn insert_labels_edges_by_side() {
        let mut m = tree("tree2", &[5]);
        let left = m.insert(Scalar::Int(3)).unwrap();
        let right = m.insert(Scalar::Int(7)).unwrap();
        assert_eq!(m.node_count(), 3);
        assert_eq!(left.ops_of(OpCode::CreateEdge).next().unwrap().str_field("label"), Some("L"));
        assert_eq!(right.ops_of(OpCode::CreateEdge).next().unwrap().str_field("label"), Some("R"));
        assert_eq!(
            right.ops_of(OpCode::CreateEdge).next().unwrap().target(),
            Some("tree2|bst|tree2_node_0->tree2_node_2")
        );
    }

    #[test]
    fn insert_duplicate_emits_message_only() {
        let mut m = tree("t", &[5, 3]);
        let tl = m.insert(Scalar::Int(3)).unwrap();
        assert_eq!(m.node_count(), 2);
        assert_eq!(tl.count(OpCode::CreateNode), 0);
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text").map_or(false, |t| t.contains("Key exists"))));
    }

    #[test]
    fn insert_highlights_traversed_edges_then_restores() {
        let mut m = tree("t", &[5, 3]);
        let tl = m.insert(Scalar::Int(4)).unwrap();
        let edge = "t|bst|t_node_0->t_node_1";
        let edge_states: Vec<&str> = tl
            .ops_of(OpCode::SetState)
            .filter(|op| op.target() == Some(edge))
            .filter_map(|op| op.str_field("state"))
            .collect();
        assert_eq!(edge_states, vec!["highlight", "normal"]);
    }

    #[test]
    fn search_hit_and_miss() {
        let mut m = tree("t", &[5, 3, 7]);
        let hit = m.search(&Scalar::Int(7)).unwrap();
        assert!(hit
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text").map_or(false, |t| t.contains("Found"))));
        let miss = m.search(&Scalar::Int(10)).unwrap();
        assert!(miss
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text").map_or(false, |t| t.to_lowercase().contains("not found"))));
    }

    #[test]
    fn delete_leaf_and_single_child() {
        let mut m = tree("t", &[5, 3, 7]);
        let tl = m.delete_value(&Scalar::Int(3)).unwrap();
        assert_eq!(m.node_count(), 2);
        assert_eq!(tl.count(OpCode::DeleteNode), 1);

        m.insert(Scalar::Int(2)).unwrap();
        m.insert(Scalar::Int(1)).unwrap();
        let tl = m.delete_value(&Scalar::Int(2)).unwrap();
        assert_eq!(tl.count(OpCode::DeleteNode), 1);
        let spliced = tl.ops_of(OpCode::CreateEdge).next().unwrap();
        assert_eq!(spliced.str_field("label"), Some("L"));
        let one = m.find_id(&Scalar::Int(1)).unwrap().to_string();
        assert_eq!(m.node(&one).unwrap().parent.as_deref(), m.root_id());
    }

    #[test]
    fn delete_root_with_single_child_moves_root() {
        let mut m = tree("t", &[5, 7]);
        m.delete_value(&Scalar::Int(5)).unwrap();
        let root = m.root_id().unwrap().to_string();
        assert_eq!(m.node(&root).unwrap().key, Scalar::Int(7));
        assert_eq!(m.node(&root).unwrap().parent, None);
    }

    #[test]
    fn two_children_delete_keeps_identity() {
        let mut m = tree("t", &[5, 3, 7, 8]);
        let root_before = m.root_id().unwrap().to_string();
        let tl = m.delete_value(&Scalar::Int(5)).unwrap();

        assert_eq!(m.root_id(), Some(root_before.as_str()));
        let root = m.node(&root_before).unwrap();
        assert_eq!(root.key, Scalar::Int(7));
        let eight = m.find_id(&Scalar::Int(8)).unwrap().to_string();
        assert_eq!(root.right.as_deref(), Some(eight.as_str()));
        assert_eq!(m.node(&eight).unwrap().parent.as_deref(), Some(root_before.as_str()));
        assert!(tl
            .ops_of(OpCode::SetLabel)
            .any(|op| op.target() == Some(root_before.as_str()) && op.str_field("label") == Some("7")));
        assert!(!tl.ops_of(OpCode::DeleteNode).any(|op| op.target() == Some(root_before.as_str())));
    }

    #[test]
    fn delete_missing_value_is_message() {
        let mut m = tree("t", &[5]);
        let tl = m.delete_value(&Scalar::Int(9)).unwrap();
        assert_eq!(m.node_count(), 1);
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text").map_or(false, |t| t.contains("not found"))));
    }

    #[test]
    fn mixed_keys_are_rejected_before_mutation() {
        let mut m = tree("t", &[5]);
        assert!(matches!(
            m.insert(Scalar::Text("x".into())),
            Err(ModelError::Incomparable { .. })
        ));
        assert!(m.create(vec![Scalar::Int(1), Scalar::Text("a".into())]).is_err());
        assert_eq!(m.node_count(), 1);
    }

    #[test]
    fn export_is_pre_order() {
        let m = tree("t", &[10, 5, 15, 3]);
        assert_eq!(m.export_state()["values"], serde_json::json!([10, 5, 3, 15]));
        let keys: Vec<String> = m.in_order_keys().iter().map(Scalar::label).collect();
        assert_eq!(keys, vec!["3", "5", "10", "15"]);
    }
}
