//! Logical data-structure models.
//!
//! Every model owns its logical state and an [`IdAllocator`], takes typed
//! operations ([`ModelOp`]) with a JSON payload, and answers with a
//! structural [`Timeline`]. Models never emit positions.

use std::fmt;
use std::str::FromStr;

use dsvis_timeline_core::Timeline;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod bst;
pub mod error;
pub mod git;
pub mod huffman;
pub mod ids;
pub mod list;
pub mod seqlist;
pub mod stack;
pub mod value;

mod args;
mod steps;

pub use bst::BstModel;
pub use error::ModelError;
pub use git::GitGraphModel;
pub use huffman::HuffmanModel;
pub use ids::IdAllocator;
pub use list::ListModel;
pub use seqlist::SeqListModel;
pub use stack::StackModel;
pub use value::{format_number, Scalar, ScalarKind};

/// Operation arguments as received from a command payload.
pub type Payload = serde_json::Map<String, JsonValue>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {what} '{value}'")]
pub struct ParseNameError {
    pub what: &'static str,
    pub value: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    List,
    Stack,
    #[serde(rename = "seqlist")]
    SeqList,
    Bst,
    Huffman,
    Git,
}

impl StructureKind {
    pub const ALL: [StructureKind; 6] = [
        StructureKind::List,
        StructureKind::Stack,
        StructureKind::SeqList,
        StructureKind::Bst,
        StructureKind::Huffman,
        StructureKind::Git,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StructureKind::List => "list",
            StructureKind::Stack => "stack",
            StructureKind::SeqList => "seqlist",
            StructureKind::Bst => "bst",
            StructureKind::Huffman => "huffman",
            StructureKind::Git => "git",
        }
    }

    /// Kinds whose nodes occupy linear slots addressed by `index`.
    pub fn is_linear(self) -> bool {
        matches!(self, StructureKind::List | StructureKind::Stack | StructureKind::SeqList)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructureKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StructureKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseNameError {
                what: "structure kind",
                value: s.to_string(),
            })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOp {
    Create,
    DeleteAll,
    DeleteIndex,
    Insert,
    Search,
    Update,
    Push,
    Pop,
    DeleteValue,
    Build,
    Init,
    Commit,
    Checkout,
    Branch,
}

impl ModelOp {
    pub const ALL: [ModelOp; 14] = [
        ModelOp::Create,
        ModelOp::DeleteAll,
        ModelOp::DeleteIndex,
        ModelOp::Insert,
        ModelOp::Search,
        ModelOp::Update,
        ModelOp::Push,
        ModelOp::Pop,
        ModelOp::DeleteValue,
        ModelOp::Build,
        ModelOp::Init,
        ModelOp::Commit,
        ModelOp::Checkout,
        ModelOp::Branch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelOp::Create => "create",
            ModelOp::DeleteAll => "delete_all",
            ModelOp::DeleteIndex => "delete_index",
            ModelOp::Insert => "insert",
            ModelOp::Search => "search",
            ModelOp::Update => "update",
            ModelOp::Push => "push",
            ModelOp::Pop => "pop",
            ModelOp::DeleteValue => "delete_value",
            ModelOp::Build => "build",
            ModelOp::Init => "init",
            ModelOp::Commit => "commit",
            ModelOp::Checkout => "checkout",
            ModelOp::Branch => "branch",
        }
    }

    /// Ops that rebuild the structure from scratch.
    pub fn is_create_like(self) -> bool {
        matches!(self, ModelOp::Create | ModelOp::Build | ModelOp::Init)
    }
}

impl fmt::Display for ModelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelOp {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseNameError {
                what: "model operation",
                value: s.to_string(),
            })
    }
}

/// Closed set of structure models.
#[derive(Debug, Clone)]
pub enum Model {
    List(ListModel),
    Stack(StackModel),
    SeqList(SeqListModel),
    Bst(BstModel),
    Huffman(HuffmanModel),
    Git(GitGraphModel),
}

macro_rules! each_model {
    ($model:expr, $m:ident => $body:expr) => {
        match $model {
            Model::List($m) => $body,
            Model::Stack($m) => $body,
            Model::SeqList($m) => $body,
            Model::Bst($m) => $body,
            Model::Huffman($m) => $body,
            Model::Git($m) => $body,
        }
    };
}

impl Model {
    /// Empty model of `kind`. `ids` carries the counter of any earlier
    /// instance that used the same structure id.
    pub fn new(kind: StructureKind, structure_id: impl Into<String>, ids: IdAllocator) -> Self {
        let sid = structure_id.into();
        match kind {
            StructureKind::List => Model::List(ListModel::new(sid, ids)),
            StructureKind::Stack => Model::Stack(StackModel::new(sid, ids)),
            StructureKind::SeqList => Model::SeqList(SeqListModel::new(sid, ids)),
            StructureKind::Bst => Model::Bst(BstModel::new(sid, ids)),
            StructureKind::Huffman => Model::Huffman(HuffmanModel::new(sid, ids)),
            StructureKind::Git => Model::Git(GitGraphModel::new(sid, ids)),
        }
    }

    pub fn kind(&self) -> StructureKind {
        match self {
            Model::List(_) => StructureKind::List,
            Model::Stack(_) => StructureKind::Stack,
            Model::SeqList(_) => StructureKind::SeqList,
            Model::Bst(_) => StructureKind::Bst,
            Model::Huffman(_) => StructureKind::Huffman,
            Model::Git(_) => StructureKind::Git,
        }
    }

    pub fn structure_id(&self) -> &str {
        each_model!(self, m => m.structure_id())
    }

    /// Logically live nodes; sentinels, containers and labels are excluded.
    pub fn node_count(&self) -> usize {
        each_model!(self, m => m.node_count())
    }

    pub fn ids(&self) -> &IdAllocator {
        each_model!(self, m => m.ids())
    }

    pub fn apply_operation(&mut self, op: ModelOp, payload: &Payload) -> Result<Timeline, ModelError> {
        log::trace!("{} {}: {}", self.kind(), self.structure_id(), op);
        each_model!(self, m => m.apply_operation(op, payload))
    }

    pub fn export_state(&self) -> Payload {
        each_model!(self, m => m.export_state())
    }
}
