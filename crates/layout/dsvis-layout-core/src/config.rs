//! Per-structure layout configuration.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Optional overrides for an engine's defaults, keyed per structure.
///
/// Every field is optional; an engine falls back to its own default for any
/// field left unset and ignores fields it has no use for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Distance between consecutive slots (linear), siblings (tree) or commits (dag).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
    /// Cross-axis distance between rows of unanchored linear structures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f64>,
    /// Horizontal distance between tree roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_spacing: Option<f64>,
    /// y of the root row; replaces `start_y` for trees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_start_y: Option<f64>,
    /// Vertical distance between a node and its children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_offset_y: Option<f64>,
    /// Initial horizontal span between a root and its children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_span: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_stack_gap: Option<f64>,
}

impl LayoutConfig {
    pub fn horizontal(spacing: f64) -> Self {
        Self {
            orientation: Some(Orientation::Horizontal),
            spacing: Some(spacing),
            ..Self::default()
        }
    }

    pub fn vertical(spacing: f64) -> Self {
        Self {
            orientation: Some(Orientation::Vertical),
            spacing: Some(spacing),
            ..Self::default()
        }
    }

    pub fn with_row_spacing(mut self, row_spacing: f64) -> Self {
        self.row_spacing = Some(row_spacing);
        self
    }

    pub fn with_level_spacing(mut self, level_spacing: f64) -> Self {
        self.level_spacing = Some(level_spacing);
        self
    }

    pub fn with_start(mut self, x: f64, y: f64) -> Self {
        self.start_x = Some(x);
        self.start_y = Some(y);
        self
    }

    /// Root queue and subtree geometry for forests such as Huffman queues.
    pub fn with_queue(mut self, queue_spacing: f64, queue_start_y: f64, tree_offset_y: f64, tree_span: f64) -> Self {
        self.queue_spacing = Some(queue_spacing);
        self.queue_start_y = Some(queue_start_y);
        self.tree_offset_y = Some(tree_offset_y);
        self.tree_span = Some(tree_span);
        self
    }

    pub fn orientation_or(&self, default: Orientation) -> Orientation {
        self.orientation.unwrap_or(default)
    }
}
