//! The command envelope consumed from UI, DSL or persistence replay.

use std::fmt;
use std::str::FromStr;

use dsvis_models_core::ParseNameError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    CreateStructure,
    Insert,
    DeleteStructure,
    DeleteNode,
    Search,
    Update,
    GitInit,
    GitCommit,
    GitBranch,
    GitCheckout,
    /// Accepted on the wire; no kind routes it.
    GitMerge,
}

impl CommandType {
    pub const ALL: [CommandType; 11] = [
        CommandType::CreateStructure,
        CommandType::Insert,
        CommandType::DeleteStructure,
        CommandType::DeleteNode,
        CommandType::Search,
        CommandType::Update,
        CommandType::GitInit,
        CommandType::GitCommit,
        CommandType::GitBranch,
        CommandType::GitCheckout,
        CommandType::GitMerge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::CreateStructure => "CREATE_STRUCTURE",
            CommandType::Insert => "INSERT",
            CommandType::DeleteStructure => "DELETE_STRUCTURE",
            CommandType::DeleteNode => "DELETE_NODE",
            CommandType::Search => "SEARCH",
            CommandType::Update => "UPDATE",
            CommandType::GitInit => "GIT_INIT",
            CommandType::GitCommit => "GIT_COMMIT",
            CommandType::GitBranch => "GIT_BRANCH",
            CommandType::GitCheckout => "GIT_CHECKOUT",
            CommandType::GitMerge => "GIT_MERGE",
        }
    }

    /// Commands that (re)build a structure and may introduce a new id.
    pub fn is_create_like(self) -> bool {
        matches!(self, CommandType::CreateStructure | CommandType::GitInit)
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseNameError {
                what: "command type",
                value: s.to_string(),
            })
    }
}

/// `{structure_id, type, payload}`. The payload stays raw JSON until the
/// registry has validated it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub structure_id: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default = "empty_payload")]
    pub payload: JsonValue,
}

fn empty_payload() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl Command {
    pub fn new(structure_id: impl Into<String>, command_type: CommandType, payload: JsonValue) -> Self {
        Self {
            structure_id: structure_id.into(),
            command_type,
            payload,
        }
    }

    /// `payload.kind` when it is a string.
    pub fn payload_kind(&self) -> Option<&str> {
        self.payload.get("kind").and_then(JsonValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let cmd = Command::new("l1", CommandType::CreateStructure, json!({"kind": "list", "values": [1]}));
        let wire = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            wire,
            json!({"structure_id": "l1", "type": "CREATE_STRUCTURE", "payload": {"kind": "list", "values": [1]}})
        );
        let back: Command = serde_json::from_value(wire).unwrap();
        assert_eq!(back, cmd);
        assert_eq!(back.payload_kind(), Some("list"));
    }

    #[test]
    fn type_names_parse() {
        for ty in CommandType::ALL {
            assert_eq!(ty.as_str().parse::<CommandType>().unwrap(), ty);
        }
        assert!("GIT_REBASE".parse::<CommandType>().is_err());
        assert!(CommandType::GitInit.is_create_like());
        assert!(!CommandType::Insert.is_create_like());
    }
}
