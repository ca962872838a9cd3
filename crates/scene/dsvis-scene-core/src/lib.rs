//! dsvis-scene-core: the command boundary of dsvis.
//!
//! [`SceneGraph`] owns every live structure. Commands are validated against a
//! [`Registry`] of per-route schemas, dispatched to the target model, and the
//! resulting structural timeline is positioned by the layout engine mapped to
//! the structure's kind. Whole scenes export to and import from
//! [`SceneSnapshot`]s.

pub mod command;
pub mod config;
pub mod error;
pub mod json;
pub mod scene_graph;
pub mod schema;
pub mod snapshot;

pub use command::{Command, CommandType};
pub use config::{OffsetRule, SceneConfig};
pub use error::{CommandError, SceneError};
pub use scene_graph::SceneGraph;
pub use schema::{build_registry, CommandSchema, CrossFieldRule, FieldType, ModelFactory, Registry};
pub use snapshot::{SceneSnapshot, StructureSnapshot, SNAPSHOT_VERSION};
