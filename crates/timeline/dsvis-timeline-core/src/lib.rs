//! dsvis-timeline-core: the op/timeline vocabulary shared by models, layout
//! engines and renderers.
//!
//! Models emit structural and visual ops (never coordinates), layout engines
//! append `SET_POS` ops, and a renderer replays the resulting [`Timeline`]
//! step by step.

pub mod ops;
pub mod state;
pub mod timeline;

pub use ops::{AnimationOp, OpCode, OpData};
pub use state::VisualState;
pub use timeline::{AnimationStep, Timeline, DEFAULT_STEP_MS};
