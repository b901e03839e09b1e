use std::fmt;

use serde::{Deserialize, Serialize};

/// The reference-carrying binding command verbs. `empty_binding` also appears
/// in layout files but takes no set/layer reference, so it is not represented
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingVerb {
    ChangePreset,
    AddLayer,
    RemoveLayer,
    HoldLayer,
}

impl BindingVerb {
    pub const ALL: [BindingVerb; 4] = [
        Self::ChangePreset,
        Self::AddLayer,
        Self::RemoveLayer,
        Self::HoldLayer,
    ];

    /// Verbs whose reference names an action layer rather than a set.
    pub const LAYER_VERBS: [BindingVerb; 3] = [Self::AddLayer, Self::RemoveLayer, Self::HoldLayer];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::ChangePreset => "CHANGE_PRESET",
            Self::AddLayer => "add_layer",
            Self::RemoveLayer => "remove_layer",
            Self::HoldLayer => "hold_layer",
        }
    }
}

impl fmt::Display for BindingVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
