//! Micro-step helpers shared by the models.

use dsvis_timeline_core::{AnimationOp, AnimationStep, Timeline, VisualState};

pub(crate) fn states<'a>(
    structure_id: &str,
    targets: impl IntoIterator<Item = &'a String>,
    state: VisualState,
) -> Vec<AnimationOp> {
    targets
        .into_iter()
        .map(|t| AnimationOp::set_state(structure_id, t.as_str(), state))
        .collect()
}

/// CLEAR_MESSAGE followed by `normal` for every target.
pub(crate) fn restore<'a>(
    structure_id: &str,
    targets: impl IntoIterator<Item = &'a String>,
) -> Vec<AnimationOp> {
    let mut ops = vec![AnimationOp::clear_message()];
    ops.extend(states(structure_id, targets, VisualState::Normal));
    ops
}

/// A message step followed by a bare restore.
pub(crate) fn message_only(label: &str, text: impl Into<String>) -> Timeline {
    let mut tl = Timeline::new();
    tl.add_step(AnimationStep::labeled(label, vec![AnimationOp::message(text)]));
    tl.add_step(AnimationStep::labeled("Restore", vec![AnimationOp::clear_message()]));
    tl
}

/// Push `id` unless it is already listed.
pub(crate) fn touch(touched: &mut Vec<String>, id: &str) {
    if !touched.iter().any(|t| t == id) {
        touched.push(id.to_string());
    }
}
