//! Scene snapshot: the stable export/import shape.

use dsvis_layout_core::LayoutConfig;
use dsvis_models_core::Payload;
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub version: String,
    #[serde(default)]
    pub structures: Vec<StructureSnapshot>,
}

/// One structure in a snapshot. `kind` stays a plain string so that a
/// snapshot naming an unknown kind still parses and is rejected on import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub state: Payload,
    #[serde(default)]
    pub offset: Option<(f64, f64)>,
    #[serde(default)]
    pub config: Option<LayoutConfig>,
}

impl SceneSnapshot {
    pub fn new(structures: Vec<StructureSnapshot>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            structures,
        }
    }

    pub fn structure(&self, id: &str) -> Option<&StructureSnapshot> {
        self.structures.iter().find(|s| s.id == id)
    }
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
