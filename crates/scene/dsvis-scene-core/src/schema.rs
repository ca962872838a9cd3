//! Payload schemas and the routing registry.
//!
//! [`build_registry`] assembles one immutable [`Registry`] holding, per
//! `(CommandType, StructureKind)`, the payload schema and the model operation
//! it routes to, plus one model factory per kind.

use std::fmt;

use dsvis_models_core::{IdAllocator, Model, ModelOp, Payload, StructureKind};
use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::command::CommandType;
use crate::error::CommandError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Str,
    Int,
    Number,
    Bool,
    List,
    Map,
    Any,
}

impl FieldType {
    pub fn matches(self, value: &JsonValue) -> bool {
        match self {
            FieldType::Str => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::List => value.is_array(),
            FieldType::Map => value.is_object(),
            FieldType::Any => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Map => "map",
            FieldType::Any => "any",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type Validator = fn(&Payload) -> Result<(), CommandError>;

#[derive(Clone, Debug)]
pub enum CrossFieldRule {
    /// At least one of `fields` must be present and non-null.
    AnyOf {
        fields: &'static [&'static str],
        message: &'static str,
    },
    Custom(Validator),
}

impl CrossFieldRule {
    fn check(&self, payload: &Payload) -> Result<(), CommandError> {
        match self {
            CrossFieldRule::AnyOf { fields, message } => {
                if fields.iter().any(|f| present(payload, f).is_some()) {
                    Ok(())
                } else {
                    Err(CommandError::Rule {
                        message: (*message).to_string(),
                    })
                }
            }
            CrossFieldRule::Custom(validate) => validate(payload),
        }
    }
}

fn present<'a>(payload: &'a Payload, key: &str) -> Option<&'a JsonValue> {
    payload.get(key).filter(|v| !v.is_null())
}

#[derive(Clone, Debug, Default)]
pub struct CommandSchema {
    pub required: Vec<(&'static str, FieldType)>,
    pub optional: Vec<(&'static str, Vec<FieldType>)>,
    pub allow_extra: bool,
    pub rules: Vec<CrossFieldRule>,
}

impl CommandSchema {
    /// Schema requiring only `kind`.
    pub fn new() -> Self {
        Self::default().require("kind", FieldType::Str)
    }

    pub fn require(mut self, field: &'static str, ty: FieldType) -> Self {
        self.required.push((field, ty));
        self
    }

    pub fn optional(mut self, field: &'static str, types: &[FieldType]) -> Self {
        self.optional.push((field, types.to_vec()));
        self
    }

    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn validate(&self, payload: &JsonValue) -> Result<(), CommandError> {
        let map = payload.as_object().ok_or(CommandError::PayloadNotMapping)?;
        self.validate_map(map)
    }

    /// Checks run in order and the first failure wins: required fields,
    /// optional fields, undeclared fields, then cross-field rules.
    pub fn validate_map(&self, payload: &Payload) -> Result<(), CommandError> {
        for (field, ty) in &self.required {
            let value = payload.get(*field).ok_or_else(|| CommandError::MissingField {
                field: (*field).to_string(),
            })?;
            if !ty.matches(value) {
                return Err(CommandError::WrongType {
                    field: (*field).to_string(),
                    expected: ty.name().to_string(),
                });
            }
        }

        for (field, types) in &self.optional {
            if let Some(value) = present(payload, field) {
                if !types.iter().any(|ty| ty.matches(value)) {
                    let names: Vec<&str> = types.iter().map(|ty| ty.name()).collect();
                    return Err(CommandError::WrongType {
                        field: (*field).to_string(),
                        expected: format!("{} when present", names.join(" or ")),
                    });
                }
            }
        }

        if !self.allow_extra {
            let mut unknown: Vec<String> = payload
                .keys()
                .filter(|k| !self.declares(k))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                unknown.sort();
                return Err(CommandError::UnexpectedFields { fields: unknown });
            }
        }

        self.rules.iter().try_for_each(|rule| rule.check(payload))
    }

    fn declares(&self, key: &str) -> bool {
        self.required.iter().any(|(f, _)| *f == key) || self.optional.iter().any(|(f, _)| *f == key)
    }
}

/// Builds an empty model for a structure id, continuing from `ids`.
pub type ModelFactory = fn(&str, IdAllocator) -> Model;

type Route = (CommandType, StructureKind);

#[derive(Clone, Debug, Default)]
pub struct Registry {
    schemas: HashMap<Route, CommandSchema>,
    ops: HashMap<Route, ModelOp>,
    factories: HashMap<StructureKind, ModelFactory>,
}

impl Registry {
    pub fn schema(&self, command: CommandType, kind: StructureKind) -> Option<&CommandSchema> {
        self.schemas.get(&(command, kind))
    }

    pub fn model_op(&self, command: CommandType, kind: StructureKind) -> Option<ModelOp> {
        self.ops.get(&(command, kind)).copied()
    }

    pub fn factory(&self, kind: StructureKind) -> Option<ModelFactory> {
        self.factories.get(&kind).copied()
    }

    pub fn supports(&self, command: CommandType, kind: StructureKind) -> bool {
        self.schemas.contains_key(&(command, kind)) && self.ops.contains_key(&(command, kind))
    }

    /// Validate `payload` for the route and return the model op it maps to.
    pub fn resolve(&self, command: CommandType, kind: StructureKind, payload: &Payload) -> Result<ModelOp, CommandError> {
        let unsupported = || CommandError::UnsupportedCombination { command, kind };
        let schema = self.schema(command, kind).ok_or_else(unsupported)?;
        schema.validate_map(payload)?;
        self.model_op(command, kind).ok_or_else(unsupported)
    }

    /// Fresh model for `kind` through its registered factory.
    pub fn create_model(&self, kind: StructureKind, structure_id: &str, ids: IdAllocator) -> Option<Model> {
        self.factory(kind).map(|factory| factory(structure_id, ids))
    }

    fn route(&mut self, command: CommandType, kind: StructureKind, op: ModelOp, schema: CommandSchema) {
        self.schemas.insert((command, kind), schema);
        self.ops.insert((command, kind), op);
    }
}

const SEARCH_RULE: CrossFieldRule = CrossFieldRule::AnyOf {
    fields: &["index", "value"],
    message: "SEARCH requires index or value",
};

const UPDATE_RULE: CrossFieldRule = CrossFieldRule::AnyOf {
    fields: &["index", "value"],
    message: "UPDATE requires index or value",
};

fn values_schema() -> CommandSchema {
    CommandSchema::new().optional("values", &[FieldType::List])
}

fn git_init_schema() -> CommandSchema {
    CommandSchema::new()
        .optional("commits", &[FieldType::List])
        .optional("branches", &[FieldType::Map])
        .optional("head", &[FieldType::Str])
}

fn git_commit_schema() -> CommandSchema {
    CommandSchema::new()
        .optional("message", &[FieldType::Str])
        .optional("value", &[FieldType::Any])
}

fn git_checkout_schema() -> CommandSchema {
    CommandSchema::new().require("target", FieldType::Str)
}

/// Index-addressed routes shared by `list` and `seqlist`.
fn route_indexed(reg: &mut Registry, kind: StructureKind) {
    use CommandType::*;

    reg.route(CreateStructure, kind, ModelOp::Create, values_schema());
    reg.route(DeleteStructure, kind, ModelOp::DeleteAll, CommandSchema::new());
    reg.route(
        Insert,
        kind,
        ModelOp::Insert,
        CommandSchema::new()
            .require("index", FieldType::Int)
            .require("value", FieldType::Any),
    );
    reg.route(
        DeleteNode,
        kind,
        ModelOp::DeleteIndex,
        CommandSchema::new().require("index", FieldType::Int),
    );
    reg.route(
        Search,
        kind,
        ModelOp::Search,
        CommandSchema::new()
            .optional("index", &[FieldType::Int])
            .optional("value", &[FieldType::Any])
            .rule(SEARCH_RULE),
    );
    reg.route(
        Update,
        kind,
        ModelOp::Update,
        CommandSchema::new()
            .require("new_value", FieldType::Any)
            .optional("index", &[FieldType::Int])
            .optional("value", &[FieldType::Any])
            .rule(UPDATE_RULE),
    );
}

/// The registry of every supported command/kind route.
pub fn build_registry() -> Registry {
    use CommandType::*;
    use StructureKind as K;

    let mut reg = Registry::default();
    reg.factories.insert(K::List, |sid, ids| Model::new(K::List, sid, ids));
    reg.factories.insert(K::Stack, |sid, ids| Model::new(K::Stack, sid, ids));
    reg.factories.insert(K::SeqList, |sid, ids| Model::new(K::SeqList, sid, ids));
    reg.factories.insert(K::Bst, |sid, ids| Model::new(K::Bst, sid, ids));
    reg.factories.insert(K::Huffman, |sid, ids| Model::new(K::Huffman, sid, ids));
    reg.factories.insert(K::Git, |sid, ids| Model::new(K::Git, sid, ids));

    route_indexed(&mut reg, K::List);
    route_indexed(&mut reg, K::SeqList);

    reg.route(CreateStructure, K::Stack, ModelOp::Create, values_schema());
    reg.route(DeleteStructure, K::Stack, ModelOp::DeleteAll, CommandSchema::new());
    reg.route(
        Insert,
        K::Stack,
        ModelOp::Push,
        CommandSchema::new()
            .require("value", FieldType::Any)
            .optional("index", &[FieldType::Int]),
    );
    reg.route(
        DeleteNode,
        K::Stack,
        ModelOp::Pop,
        CommandSchema::new().optional("index", &[FieldType::Int]),
    );
    reg.route(
        Search,
        K::Stack,
        ModelOp::Search,
        CommandSchema::new().require("value", FieldType::Any),
    );

    reg.route(CreateStructure, K::Bst, ModelOp::Create, values_schema());
    reg.route(DeleteStructure, K::Bst, ModelOp::DeleteAll, CommandSchema::new());
    for (command, op) in [
        (Insert, ModelOp::Insert),
        (DeleteNode, ModelOp::DeleteValue),
        (Search, ModelOp::Search),
    ] {
        reg.route(command, K::Bst, op, CommandSchema::new().require("value", FieldType::Any));
    }

    reg.route(
        CreateStructure,
        K::Huffman,
        ModelOp::Build,
        CommandSchema::new().require("values", FieldType::List),
    );
    reg.route(DeleteStructure, K::Huffman, ModelOp::DeleteAll, CommandSchema::new());

    reg.route(CreateStructure, K::Git, ModelOp::Init, git_init_schema());
    reg.route(GitInit, K::Git, ModelOp::Init, git_init_schema());
    reg.route(DeleteStructure, K::Git, ModelOp::DeleteAll, CommandSchema::new());
    reg.route(Insert, K::Git, ModelOp::Commit, git_commit_schema());
    reg.route(GitCommit, K::Git, ModelOp::Commit, git_commit_schema());
    reg.route(Search, K::Git, ModelOp::Checkout, git_checkout_schema());
    reg.route(GitCheckout, K::Git, ModelOp::Checkout, git_checkout_schema());
    reg.route(
        GitBranch,
        K::Git,
        ModelOp::Branch,
        CommandSchema::new().require("name", FieldType::Str),
    );

    reg
}
