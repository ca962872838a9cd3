use serde::{Deserialize, Serialize};

/// Visual state carried by SET_STATE ops.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    #[default]
    Normal,
    Highlight,
    Secondary,
    Active,
}

impl VisualState {
    pub fn as_str(self) -> &'static str {
        match self {
            VisualState::Normal => "normal",
            VisualState::Highlight => "highlight",
            VisualState::Secondary => "secondary",
            VisualState::Active => "active",
        }
    }
}
