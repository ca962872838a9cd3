//! JSON persistence for command scripts and scene snapshots.
//!
//! Command lists are validated on load: every entry must carry a string
//! `payload.kind` and pass the registry's schema for its command. Loading a
//! script therefore never needs a live scene.

use std::fs;
use std::path::Path;

use dsvis_models_core::StructureKind;
use serde_json::Value as JsonValue;

use crate::command::Command;
use crate::error::CommandError;
use crate::schema::{build_registry, Registry};
use crate::snapshot::SceneSnapshot;

/// Parse and validate a JSON array of commands.
pub fn commands_from_json(text: &str) -> Result<Vec<Command>, CommandError> {
    let raw: JsonValue = serde_json::from_str(text)?;
    let JsonValue::Array(items) = raw else {
        return Err(CommandError::Json("command list must be a JSON array".to_string()));
    };
    let registry = build_registry();
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let command: Command = serde_json::from_value(item)
                .map_err(|err| CommandError::Json(format!("command {i}: {err}")))?;
            validate_stored(&registry, &command)?;
            Ok(command)
        })
        .collect()
}

pub fn commands_to_json(commands: &[Command]) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(commands)?)
}

pub fn scene_from_json(text: &str) -> Result<SceneSnapshot, CommandError> {
    Ok(serde_json::from_str(text)?)
}

pub fn scene_to_json(snapshot: &SceneSnapshot) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn load_commands_from_file(path: impl AsRef<Path>) -> Result<Vec<Command>, CommandError> {
    commands_from_json(&read(path.as_ref())?)
}

pub fn save_commands_to_file(path: impl AsRef<Path>, commands: &[Command]) -> Result<(), CommandError> {
    write(path.as_ref(), &commands_to_json(commands)?)
}

pub fn load_scene_from_file(path: impl AsRef<Path>) -> Result<SceneSnapshot, CommandError> {
    scene_from_json(&read(path.as_ref())?)
}

pub fn save_scene_to_file(path: impl AsRef<Path>, snapshot: &SceneSnapshot) -> Result<(), CommandError> {
    write(path.as_ref(), &scene_to_json(snapshot)?)
}

/// Stored commands cannot lean on a live structure, so `kind` is mandatory.
fn validate_stored(registry: &Registry, command: &Command) -> Result<(), CommandError> {
    let payload = command.payload.as_object().ok_or(CommandError::PayloadNotMapping)?;
    let kind: StructureKind = match payload.get("kind") {
        Some(JsonValue::String(name)) => name
            .parse()
            .map_err(|_| CommandError::UnknownKind { kind: name.clone() })?,
        Some(_) => {
            return Err(CommandError::WrongType {
                field: "kind".to_string(),
                expected: "str".to_string(),
            })
        }
        None => {
            return Err(CommandError::MissingKind {
                command: command.command_type,
            })
        }
    };
    registry.resolve(command.command_type, kind, payload).map(|_| ())
}

fn read(path: &Path) -> Result<String, CommandError> {
    fs::read_to_string(path).map_err(|err| CommandError::io(path, &err))
}

fn write(path: &Path, text: &str) -> Result<(), CommandError> {
    fs::write(path, text).map_err(|err| CommandError::io(path, &err))
}
