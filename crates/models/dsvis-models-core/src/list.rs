//! Singly linked list with a sentinel placeholder while empty.

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};
use serde_json::Value as JsonValue;

use crate::args;
use crate::error::ModelError;
use crate::ids::IdAllocator;
use crate::steps;
use crate::value::Scalar;
use crate::{ModelOp, Payload, StructureKind};

const EDGE_KIND: &str = "next";

#[derive(Debug, Clone)]
pub struct ListModel {
    structure_id: String,
    ids: IdAllocator,
    values: Vec<Scalar>,
    node_ids: Vec<String>,
    /// Present only while the list is empty and has been created.
    sentinel: Option<String>,
}

impl ListModel {
    pub fn new(structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        Self {
            structure_id: structure_id.into(),
            ids,
            values: Vec::new(),
            node_ids: Vec::new(),
            sentinel: None,
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

    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    /// Live elements; the sentinel is not counted.
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
            ModelOp::DeleteIndex => {
                let index = args::req_index(payload, name)?;
                self.delete_index(index)
            }
            ModelOp::Insert => {
                let index = args::req_index(payload, name)?;
                let value = args::req_scalar(payload, "value", name)?;
                self.insert(index, value)
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
                kind: StructureKind::List.as_str().to_string(),
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

    /// Populate the list. Existing visuals are deleted first; ids keep counting.
    pub fn create(&mut self, values: Vec<Scalar>) -> Timeline {
        let mut tl = self.delete_all();
        let sid = self.structure_id.clone();
        let mut ops = Vec::new();

        if values.is_empty() {
            let sentinel = self.ids.alloc_node(&sid, "sentinel");
            ops.push(self.sentinel_op(&sentinel));
            self.sentinel = Some(sentinel);
        } else {
            let mut prev: Option<String> = None;
            for value in &values {
                let id = self.ids.alloc_node(&sid, "node");
                ops.push(self.node_op(&id, value, None));
                if let Some(p) = &prev {
                    ops.push(self.edge_op(p, &id));
                }
                self.node_ids.push(id.clone());
                prev = Some(id);
            }
        }
        self.values = values;
        tl.add_step(AnimationStep::labeled("Create", ops));
        tl
    }

    pub fn delete_all(&mut self) -> Timeline {
        let mut tl = Timeline::new();
        if self.node_ids.is_empty() && self.sentinel.is_none() {
            return tl;
        }
        let sid = &self.structure_id;
        let mut ops: Vec<AnimationOp> = self
            .node_ids
            .windows(2)
            .map(|pair| {
                AnimationOp::delete_edge(sid, self.edge_id(&pair[0], &pair[1]), &pair[0], &pair[1])
            })
            .collect();
        ops.extend(self.node_ids.iter().rev().map(|id| AnimationOp::delete_node(sid, id.as_str())));
        if let Some(sentinel) = self.sentinel.take() {
            ops.push(AnimationOp::delete_node(sid, sentinel));
        }
        self.node_ids.clear();
        self.values.clear();
        tl.add_step(AnimationStep::labeled("Delete all", ops));
        tl
    }

    pub fn delete_index(&mut self, index: i64) -> Result<Timeline, ModelError> {
        if self.node_ids.is_empty() {
            return Ok(steps::message_only("Empty", "List empty"));
        }
        let idx = args::slot(index, self.node_ids.len(), ModelOp::DeleteIndex.as_str())?;
        let sid = self.structure_id.clone();
        let target = self.node_ids[idx].clone();
        let prev = idx.checked_sub(1).map(|i| self.node_ids[i].clone());
        let next = self.node_ids.get(idx + 1).cloned();

        let mut tl = Timeline::new();
        tl.add_step(AnimationStep::labeled(
            "Highlight target",
            vec![
                AnimationOp::message(format!("Delete index {idx}")),
                AnimationOp::set_state(&sid, target.as_str(), VisualState::Highlight),
            ],
        ));

        let mut ops = Vec::new();
        if let Some(p) = &prev {
            ops.push(AnimationOp::delete_edge(&sid, self.edge_id(p, &target), p, &target));
        }
        if let Some(n) = &next {
            ops.push(AnimationOp::delete_edge(&sid, self.edge_id(&target, n), &target, n));
        }
        ops.push(AnimationOp::delete_node(&sid, target.as_str()));
        if let (Some(p), Some(n)) = (&prev, &next) {
            ops.push(self.edge_op(p, n));
        }

        self.node_ids.remove(idx);
        self.values.remove(idx);
        if self.node_ids.is_empty() {
            let sentinel = self.ids.alloc_node(&sid, "sentinel");
            ops.push(self.sentinel_op(&sentinel));
            self.sentinel = Some(sentinel);
        }
        tl.add_step(AnimationStep::labeled("Unlink node", ops));

        let neighbours: Vec<String> = prev.into_iter().chain(next).collect();
        tl.add_step(AnimationStep::labeled("Restore state", steps::restore(&sid, &neighbours)));
        Ok(tl)
    }

    /// Highlight neighbours, swap the old link for the new node, rewire, restore.
    pub fn insert(&mut self, index: i64, value: Scalar) -> Result<Timeline, ModelError> {
        let idx = args::insertion_point(index, self.node_ids.len(), ModelOp::Insert.as_str())?;
        let sid = self.structure_id.clone();
        let prev = idx.checked_sub(1).map(|i| self.node_ids[i].clone());
        let next = self.node_ids.get(idx).cloned();
        let neighbours: Vec<String> = prev.iter().chain(next.iter()).cloned().collect();

        let mut tl = Timeline::new();
        let mut highlight = vec![AnimationOp::message(format!("Insert {value} at index {idx}"))];
        highlight.extend(steps::states(&sid, &neighbours, VisualState::Highlight));
        tl.add_step(AnimationStep::labeled("Highlight neighbors", highlight));

        let new_id = self.ids.alloc_node(&sid, "node");
        let mut ops = Vec::new();
        if let Some(sentinel) = self.sentinel.take() {
            ops.push(AnimationOp::delete_node(&sid, sentinel));
        }
        if let (Some(p), Some(n)) = (&prev, &next) {
            ops.push(AnimationOp::delete_edge(&sid, self.edge_id(p, n), p, n));
        }
        ops.push(self.node_op(&new_id, &value, Some(idx)));
        ops.push(AnimationOp::set_state(&sid, new_id.as_str(), VisualState::Highlight));
        tl.add_step(AnimationStep::labeled("Create new node", ops));

        let mut rewire = Vec::new();
        if let Some(p) = &prev {
            rewire.push(self.edge_op(p, &new_id));
        }
        if let Some(n) = &next {
            rewire.push(self.edge_op(&new_id, n));
        }
        tl.add_ops("Rewire links", rewire);

        self.node_ids.insert(idx, new_id.clone());
        self.values.insert(idx, value);

        let mut restore_targets = neighbours;
        restore_targets.push(new_id);
        tl.add_step(AnimationStep::labeled("Restore state", steps::restore(&sid, &restore_targets)));
        Ok(tl)
    }

    /// Walk from the head comparing each node; stops at the index or first value match.
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
        let mut visited: Vec<String> = Vec::new();

        for (i, id) in self.node_ids.iter().enumerate() {
            let text = match &value {
                Some(v) if index.is_none() => format!("Compare {} with {v}", self.values[i]),
                _ => format!("Visit index {i}"),
            };
            tl.add_step(AnimationStep::labeled(
                "Compare",
                vec![
                    AnimationOp::message(text),
                    AnimationOp::set_state(&sid, id.as_str(), VisualState::Highlight),
                ],
            ));
            visited.push(id.clone());
            let hit = match (target_idx, &value) {
                (Some(t), _) => t == i,
                (None, Some(v)) => self.values[i].loose_eq(v),
                (None, None) => false,
            };
            if hit {
                tl.add_step(AnimationStep::labeled(
                    "Found",
                    vec![AnimationOp::message(format!("Found at index {i}"))],
                ));
                tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &visited)));
                return Ok(tl);
            }
            tl.add_step(AnimationStep::labeled(
                "Mark visited",
                vec![AnimationOp::set_state(&sid, id.as_str(), VisualState::Secondary)],
            ));
        }

        tl.add_step(AnimationStep::labeled("Miss", vec![AnimationOp::message("Not found")]));
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, &visited)));
        Ok(tl)
    }

    /// Relabel the node at `index`, or the first node equal to `value`.
    pub fn update(
        &mut self,
        index: Option<i64>,
        value: Option<Scalar>,
        new_value: Scalar,
    ) -> Result<Timeline, ModelError> {
        let op = ModelOp::Update.as_str();
        let target_idx = match (index, &value) {
            (Some(i), _) => Some(args::slot(i, self.node_ids.len(), op)?),
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
        tl.add_step(AnimationStep::labeled("Restore", steps::restore(&sid, [&id])));
        Ok(tl)
    }

    fn edge_id(&self, src: &str, dst: &str) -> String {
        IdAllocator::edge_id(&self.structure_id, EDGE_KIND, src, dst)
    }

    fn edge_op(&self, src: &str, dst: &str) -> AnimationOp {
        AnimationOp::create_edge(&self.structure_id, self.edge_id(src, dst), src, dst)
            .with("directed", true)
            .with("label", EDGE_KIND)
    }

    fn node_op(&self, id: &str, value: &Scalar, index: Option<usize>) -> AnimationOp {
        let op = AnimationOp::create_node(&self.structure_id, id)
            .with("kind", "list_node")
            .with("label", value.label());
        match index {
            Some(i) => op.with("index", i as u64),
            None => op,
        }
    }

    fn sentinel_op(&self, id: &str) -> AnimationOp {
        AnimationOp::create_node(&self.structure_id, id)
            .with("kind", "list_sentinel")
            .with("label", "head")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvis_timeline_core::OpCode;

    fn list(values: &[i64]) -> ListModel {
        let mut m = ListModel::new("lst", IdAllocator::new());
        m.create(values.iter().copied().map(Scalar::Int).collect());
        m
    }

    fn targets(tl: &Timeline, code: OpCode) -> Vec<String> {
        tl.ops_of(code).filter_map(|op| op.target.clone()).collect()
    }

    #[test]
    fn create_uses_monotonic_ids_and_edge_keys() {
        let mut m = ListModel::new("lst", IdAllocator::new());
        let tl = m.create(vec![Scalar::Int(1), Scalar::Int(2)]);
        assert_eq!(targets(&tl, OpCode::CreateNode), vec!["lst_node_0", "lst_node_1"]);
        assert_eq!(targets(&tl, OpCode::CreateEdge), vec!["lst|next|lst_node_0->lst_node_1"]);

        let again = m.create(vec![Scalar::Int(9)]);
        assert_eq!(targets(&again, OpCode::DeleteNode).len(), 2);
        assert_eq!(targets(&again, OpCode::CreateNode), vec!["lst_node_2"]);
    }

    #[test]
    fn empty_list_shows_sentinel_but_counts_zero() {
        let mut m = ListModel::new("lst", IdAllocator::new());
        let tl = m.create(Vec::new());
        assert_eq!(m.node_count(), 0);
        assert!(tl.ops_of(OpCode::CreateNode).any(|op| op.str_field("kind") == Some("list_sentinel")));
        assert_eq!(m.sentinel(), Some("lst_sentinel_0"));

        let tl = m.insert(0, Scalar::Int(4)).unwrap();
        assert!(targets(&tl, OpCode::DeleteNode).contains(&"lst_sentinel_0".to_string()));
        assert_eq!(m.sentinel(), None);
        assert_eq!(m.node_count(), 1);

        let tl = m.delete_index(0).unwrap();
        assert!(tl.ops_of(OpCode::CreateNode).any(|op| op.str_field("kind") == Some("list_sentinel")));
        assert_eq!(m.sentinel(), Some("lst_sentinel_2"));
    }

    #[test]
    fn insert_middle_rewires_with_stable_ids() {
        let mut m = list(&[1, 3]);
        let tl = m.insert(1, Scalar::Int(2)).unwrap();
        let values: Vec<String> = m.values().iter().map(Scalar::label).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
        assert_eq!(
            targets(&tl, OpCode::CreateEdge),
            vec!["lst|next|lst_node_0->lst_node_2", "lst|next|lst_node_2->lst_node_1"]
        );
        assert_eq!(targets(&tl, OpCode::DeleteEdge), vec!["lst|next|lst_node_0->lst_node_1"]);
        let created = tl.ops_of(OpCode::CreateNode).next().unwrap();
        assert_eq!(created.i64_field("index"), Some(1));
    }

    #[test]
    fn insert_at_head_and_tail() {
        let mut m = list(&[2, 3]);
        let tl = m.insert(0, Scalar::Int(1)).unwrap();
        assert_eq!(targets(&tl, OpCode::CreateEdge), vec!["lst|next|lst_node_2->lst_node_0"]);
        assert_eq!(m.node_ids(), &["lst_node_2", "lst_node_0", "lst_node_1"]);

        let tl = m.insert(3, Scalar::Int(4)).unwrap();
        assert_eq!(targets(&tl, OpCode::CreateEdge), vec!["lst|next|lst_node_1->lst_node_3"]);
    }

    #[test]
    fn insert_without_prior_create_starts_at_zero() {
        let mut m = ListModel::new("lst", IdAllocator::new());
        let tl = m.insert(0, Scalar::Int(42)).unwrap();
        assert_eq!(targets(&tl, OpCode::CreateNode), vec!["lst_node_0"]);
        assert_eq!(m.node_count(), 1);
    }

    #[test]
    fn out_of_range_and_missing_arguments_are_errors() {
        let mut m = list(&[1]);
        assert!(matches!(m.insert(-1, Scalar::Int(0)), Err(ModelError::IndexOutOfRange { .. })));
        assert!(matches!(m.insert(3, Scalar::Int(0)), Err(ModelError::IndexOutOfRange { .. })));
        assert!(matches!(m.delete_index(5), Err(ModelError::IndexOutOfRange { .. })));
        assert!(m.search(None, None).is_err());
        assert!(m.update(None, None, Scalar::Int(2)).is_err());

        let mut payload = Payload::new();
        payload.insert("index".into(), serde_json::json!(0));
        assert!(matches!(
            m.apply_operation(ModelOp::Insert, &payload),
            Err(ModelError::MissingArgument { .. })
        ));
    }

    #[test]
    fn delete_from_empty_is_a_message() {
        let mut m = list(&[]);
        let tl = m.delete_index(0).unwrap();
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text") == Some("List empty")));
    }

    #[test]
    fn search_reports_hits_and_restores() {
        let mut m = list(&[1, 2, 3]);
        let tl = m.search(None, Some(Scalar::Int(2))).unwrap();
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text") == Some("Found at index 1")));
        assert!(tl.ops_of(OpCode::SetState).any(|op| op.str_field("state") == Some("highlight")));
        assert!(tl.ops_of(OpCode::SetState).any(|op| op.str_field("state") == Some("normal")));

        let tl = m.search(None, Some(Scalar::Int(7))).unwrap();
        assert!(tl.ops_of(OpCode::SetMessage).any(|op| op.str_field("text") == Some("Not found")));

        let tl = m.search(Some(2), None).unwrap();
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text") == Some("Found at index 2")));
    }

    #[test]
    fn update_by_index_or_first_value_match() {
        let mut m = list(&[4, 5, 6, 5]);
        let tl = m.update(None, Some(Scalar::Int(5)), Scalar::Int(8)).unwrap();
        let labels: Vec<String> = m.values().iter().map(Scalar::label).collect();
        assert_eq!(labels, vec!["4", "8", "6", "5"]);
        let label = tl.ops_of(OpCode::SetLabel).next().unwrap();
        assert_eq!(label.target(), Some("lst_node_1"));
        assert_eq!(label.str_field("text"), Some("8"));

        let tl = m.update(None, Some(Scalar::Int(99)), Scalar::Int(1)).unwrap();
        assert!(tl
            .ops_of(OpCode::SetMessage)
            .any(|op| op.str_field("text") == Some("Update target not found")));
    }
}
