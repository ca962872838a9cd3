//! Primitive visual operations.
//!
//! AnimationOp serializes to JSON as:
//!   { "op": "CREATE_NODE", "target": "lst_node_0", "data": { "structure_id": "lst", "label": "1" } }
//!
//! Structural ops (CREATE/DELETE NODE/EDGE) and visual ops (SET_STATE, SET_LABEL,
//! SET_MESSAGE) never carry coordinates; only SET_POS does.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::state::VisualState;

/// Free-form key/value payload of an op.
pub type OpData = Map<String, JsonValue>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpCode {
    CreateNode,
    DeleteNode,
    CreateEdge,
    DeleteEdge,
    SetPos,
    SetState,
    SetLabel,
    SetMessage,
    ClearMessage,
}

impl OpCode {
    /// Wire name of the op code.
    pub fn as_str(self) -> &'static str {
        match self {
            OpCode::CreateNode => "CREATE_NODE",
            OpCode::DeleteNode => "DELETE_NODE",
            OpCode::CreateEdge => "CREATE_EDGE",
            OpCode::DeleteEdge => "DELETE_EDGE",
            OpCode::SetPos => "SET_POS",
            OpCode::SetState => "SET_STATE",
            OpCode::SetLabel => "SET_LABEL",
            OpCode::SetMessage => "SET_MESSAGE",
            OpCode::ClearMessage => "CLEAR_MESSAGE",
        }
    }

    /// True for ops that change topology.
    #[inline]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            OpCode::CreateNode | OpCode::DeleteNode | OpCode::CreateEdge | OpCode::DeleteEdge
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationOp {
    pub op: OpCode,
    pub target: Option<String>,
    #[serde(default)]
    pub data: OpData,
}

impl AnimationOp {
    pub fn new(op: OpCode, target: Option<String>, data: OpData) -> Self {
        Self { op, target, data }
    }

    fn scoped(op: OpCode, structure_id: &str, target: impl Into<String>) -> Self {
        let mut data = OpData::new();
        data.insert("structure_id".into(), JsonValue::from(structure_id));
        Self::new(op, Some(target.into()), data)
    }

    pub fn create_node(structure_id: &str, node_id: impl Into<String>) -> Self {
        Self::scoped(OpCode::CreateNode, structure_id, node_id)
    }

    pub fn delete_node(structure_id: &str, node_id: impl Into<String>) -> Self {
        Self::scoped(OpCode::DeleteNode, structure_id, node_id)
    }

    /// Directed edge `from -> to`. Edge ops always carry both endpoints so
    /// consumers can maintain adjacency without a lookup table.
    pub fn create_edge(structure_id: &str, edge_id: impl Into<String>, from: &str, to: &str) -> Self {
        Self::scoped(OpCode::CreateEdge, structure_id, edge_id)
            .with("from", from)
            .with("to", to)
    }

    pub fn delete_edge(structure_id: &str, edge_id: impl Into<String>, from: &str, to: &str) -> Self {
        Self::scoped(OpCode::DeleteEdge, structure_id, edge_id)
            .with("from", from)
            .with("to", to)
    }

    pub fn set_state(structure_id: &str, target: impl Into<String>, state: VisualState) -> Self {
        Self::scoped(OpCode::SetState, structure_id, target).with("state", state.as_str())
    }

    /// SET_LABEL writes both `label` and `text` so renderers can read either key.
    pub fn set_label(structure_id: &str, target: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::scoped(OpCode::SetLabel, structure_id, target)
            .with("label", text.clone())
            .with("text", text)
    }

    pub fn set_pos(structure_id: &str, target: impl Into<String>, x: f64, y: f64) -> Self {
        Self::scoped(OpCode::SetPos, structure_id, target)
            .with("x", x)
            .with("y", y)
    }

    pub fn message(text: impl Into<String>) -> Self {
        let mut data = OpData::new();
        data.insert("text".into(), JsonValue::from(text.into()));
        Self::new(OpCode::SetMessage, None, data)
    }

    pub fn clear_message() -> Self {
        Self::new(OpCode::ClearMessage, None, OpData::new())
    }

    /// Builder-style data insertion.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    #[inline]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    #[inline]
    pub fn structure_id(&self) -> Option<&str> {
        self.str_field("structure_id")
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(JsonValue::as_i64)
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(JsonValue::as_f64)
    }

    /// `(x, y)` for SET_POS ops.
    pub fn position(&self) -> Option<(f64, f64)> {
        if self.op != OpCode::SetPos {
            return None;
        }
        Some((self.f64_field("x")?, self.f64_field("y")?))
    }
}
