use serde::{Deserialize, Serialize};

use crate::mappings::slots::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvertDirection {
    ToTitles,
    ToIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub slots: Vec<Slot>,
    pub action_set_count: usize,
    pub action_layer_count: usize,
    pub preset_count: usize,
    pub group_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeletedSlot {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemapEntry {
    pub old: u32,
    pub new: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteReport {
    pub deleted_set: DeletedSlot,
    pub deleted_layers: Vec<DeletedSlot>,
    pub presets_deleted: usize,
    pub groups_deleted: usize,
    pub group_bindings_removed: usize,
    pub remap: Vec<RemapEntry>,
    pub references_rewritten: usize,
    pub presets_renumbered: usize,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertReport {
    pub direction: ConvertDirection,
    pub action_sets: usize,
    pub action_layers: usize,
    pub references_converted: usize,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupClone {
    pub old_id: String,
    pub new_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateReport {
    pub source_key: String,
    pub source_title: String,
    pub source_runtime_id: u32,
    pub new_key: String,
    pub new_title: String,
    pub new_runtime_id: u32,
    pub groups_cloned: Vec<GroupClone>,
    pub preset_array_id: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameReport {
    pub key: String,
    pub old_title: String,
    pub new_title: String,
    pub references_rewritten: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanionReport {
    pub bindings_modified: usize,
    pub insertions: usize,
    pub already_present: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftReport {
    pub delta: i32,
    pub references_matched: usize,
    pub references_changed: usize,
    pub references_clamped: usize,
}
