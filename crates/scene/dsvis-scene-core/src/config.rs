//! Scene-level configuration: layout routing per kind, per-kind layout
//! defaults and offset packing per strategy.

use dsvis_layout_core::{LayoutConfig, LayoutStrategy};
use dsvis_models_core::StructureKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Base offset of the first structure laid out by a strategy, and the shift
/// applied for each further structure.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffsetRule {
    pub base: (f64, f64),
    pub row_step: (f64, f64),
}

impl OffsetRule {
    pub fn at(&self, row: usize) -> (f64, f64) {
        let r = row as f64;
        (self.base.0 + r * self.row_step.0, self.base.1 + r * self.row_step.1)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub layout_map: IndexMap<StructureKind, LayoutStrategy>,
    pub kind_layout: IndexMap<StructureKind, LayoutConfig>,
    pub offsets: IndexMap<LayoutStrategy, OffsetRule>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let layout_map = IndexMap::from([
            (StructureKind::List, LayoutStrategy::Linear),
            (StructureKind::Stack, LayoutStrategy::Linear),
            (StructureKind::SeqList, LayoutStrategy::Linear),
            (StructureKind::Bst, LayoutStrategy::Tree),
            (StructureKind::Huffman, LayoutStrategy::Tree),
            (StructureKind::Git, LayoutStrategy::Dag),
        ]);
        let kind_layout = IndexMap::from([
            (StructureKind::SeqList, LayoutConfig::horizontal(80.0)),
            (StructureKind::List, LayoutConfig::horizontal(120.0)),
            (StructureKind::Stack, LayoutConfig::vertical(80.0).with_row_spacing(200.0)),
            (StructureKind::Git, LayoutConfig::vertical(140.0)),
            (
                StructureKind::Bst,
                LayoutConfig {
                    spacing: Some(120.0),
                    ..LayoutConfig::default()
                }
                .with_level_spacing(100.0),
            ),
            (
                StructureKind::Huffman,
                LayoutConfig::default().with_queue(80.0, 0.0, 180.0, 240.0),
            ),
        ]);
        let offsets = IndexMap::from([
            (
                LayoutStrategy::Linear,
                OffsetRule {
                    base: (0.0, 0.0),
                    row_step: (0.0, 220.0),
                },
            ),
            (
                LayoutStrategy::Tree,
                OffsetRule {
                    base: (0.0, 400.0),
                    row_step: (0.0, 260.0),
                },
            ),
            (
                LayoutStrategy::Dag,
                OffsetRule {
                    base: (200.0, 800.0),
                    row_step: (260.0, 0.0),
                },
            ),
        ]);
        Self {
            layout_map,
            kind_layout,
            offsets,
        }
    }
}

impl SceneConfig {
    /// Strategy for `kind`; unmapped kinds are laid out linearly.
    pub fn strategy_for(&self, kind: StructureKind) -> LayoutStrategy {
        self.layout_map.get(&kind).copied().unwrap_or(LayoutStrategy::Linear)
    }

    pub fn layout_for(&self, kind: StructureKind) -> Option<&LayoutConfig> {
        self.kind_layout.get(&kind)
    }

    /// Offset of the `row`-th structure placed under `strategy`.
    pub fn offset_for(&self, strategy: LayoutStrategy, row: usize) -> (f64, f64) {
        self.offsets
            .get(&strategy)
            .map(|rule| rule.at(row))
            .unwrap_or((0.0, 0.0))
    }
}
