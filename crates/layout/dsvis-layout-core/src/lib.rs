//! dsvis-layout-core: engines that turn structural timelines into positioned
//! ones.
//!
//! An engine reads CREATE/DELETE ops (and a few SET_LABEL hints) per step and
//! appends SET_POS ops for whatever moved. Engines are incremental: state
//! survives between [`LayoutEngine::apply_layout`] calls until
//! [`LayoutEngine::reset`].

pub mod config;
pub mod dag;
pub mod engine;
pub mod simple;
pub mod tree;

pub use config::{LayoutConfig, Orientation};
pub use dag::DagLayoutEngine;
pub use engine::{LayoutEngine, LayoutStrategy, Offsets, StructureConfigs};
pub use simple::SimpleLayoutEngine;
pub use tree::TreeLayoutEngine;

/// Fresh engine with default geometry for `strategy`.
pub fn engine_for(strategy: LayoutStrategy) -> Box<dyn LayoutEngine> {
    match strategy {
        LayoutStrategy::Linear => Box::new(SimpleLayoutEngine::new()),
        LayoutStrategy::Tree => Box::new(TreeLayoutEngine::new()),
        LayoutStrategy::Dag => Box::new(DagLayoutEngine::new()),
    }
}
