use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    ActionSet,
    ActionLayer,
}

/// One enumerated action set or layer.
///
/// `runtime_id` is the 1-based position in the concatenated sequence
/// [all sets in order, then all layers in order]. It is never stored in the
/// file; binding command strings reference it positionally, which is why it
/// is recomputed from scratch after every structural change instead of being
/// patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slot {
    pub key: String,
    pub kind: SlotKind,
    pub runtime_id: u32,
    pub title: String,
    pub parent_key: Option<String>,
}

pub fn entry_title(entry: &Value) -> &str {
    entry.get("title").and_then(Value::as_str).unwrap_or("Unknown")
}

pub fn entry_parent_key(entry: &Value) -> Option<&str> {
    entry.get("parent_set_name").and_then(Value::as_str)
}

/// Enumerate all sets and layers in runtime ID order.
pub fn enumerate_slots(doc: &Document) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut position = 1u32;

    if let Some(actions) = doc.actions() {
        for (key, entry) in actions {
            slots.push(Slot {
                key: key.clone(),
                kind: SlotKind::ActionSet,
                runtime_id: position,
                title: entry_title(entry).to_string(),
                parent_key: None,
            });
            position += 1;
        }
    }

    if let Some(layers) = doc.action_layers() {
        for (key, entry) in layers {
            slots.push(Slot {
                key: key.clone(),
                kind: SlotKind::ActionLayer,
                runtime_id: position,
                title: entry_title(entry).to_string(),
                parent_key: entry_parent_key(entry).map(str::to_string),
            });
            position += 1;
        }
    }

    slots
}

/// Pure slot-key -> runtime ID mapping over the current document state.
pub fn runtime_ids(doc: &Document) -> HashMap<String, u32> {
    enumerate_slots(doc)
        .into_iter()
        .map(|slot| (slot.key, slot.runtime_id))
        .collect()
}

/// Derive the old -> new runtime ID remap after a structural change.
///
/// Only surviving keys whose ID actually moved get an entry; unchanged IDs
/// are omitted so the later text substitution touches nothing it does not
/// have to. Deleted keys never appear on either side.
pub fn derive_remap(
    before: &HashMap<String, u32>,
    after: &HashMap<String, u32>,
    deleted: &HashSet<String>,
) -> BTreeMap<u32, u32> {
    for key in deleted {
        debug_assert!(
            !after.contains_key(key),
            "deleted slot key {key:?} still present after pruning"
        );
    }

    let mut remap = BTreeMap::new();
    for (key, &old_id) in before {
        if deleted.contains(key) {
            continue;
        }
        if let Some(&new_id) = after.get(key) {
            if old_id != new_id {
                remap.insert(old_id, new_id);
            }
        }
    }
    remap
}
