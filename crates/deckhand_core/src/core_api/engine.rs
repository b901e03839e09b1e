use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde_json::{Map, Value};

use crate::mappings::slots::{derive_remap, entry_title, enumerate_slots, SlotKind};
use crate::mappings::{id_string, Document};
use crate::refs::{self, IdRewriter};
use crate::titles::TitleCatalog;
use crate::verb::BindingVerb;

use super::error::{CoreError, CoreErrorCode};
use super::types::{
    CompanionReport, ConvertDirection, ConvertReport, DeleteReport, DeletedSlot, DuplicateReport,
    GroupClone, RemapEntry, RenameReport, ShiftReport, Snapshot,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

#[derive(Debug)]
pub struct Session {
    text: String,
    document: Document,
    snapshot: Snapshot,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let text = std::str::from_utf8(bytes.as_ref()).map_err(|e| {
            CoreError::new(CoreErrorCode::Parse, format!("input is not UTF-8: {e}"))
        })?;
        let document = Document::parse(text).map_err(|e| {
            CoreError::new(CoreErrorCode::Parse, format!("failed to parse layout: {e}"))
        })?;
        let snapshot = snapshot_of(&document);

        Ok(Session {
            text: text.to_string(),
            document,
            snapshot,
        })
    }
}

impl Session {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.text.clone().into_bytes()
    }

    pub fn delete_action_set(&mut self, key: &str) -> Result<DeleteReport, CoreError> {
        {
            let Some(actions) = self.document.actions() else {
                return Err(CoreError::new(
                    CoreErrorCode::NotFound,
                    "layout has no 'actions' block",
                ));
            };
            if !actions.contains_key(key) {
                return Err(CoreError::new(
                    CoreErrorCode::NotFound,
                    format!(
                        "action set '{key}' not found; available action sets: {}",
                        join_keys(actions.keys())
                    ),
                ));
            }
        }

        let slots = enumerate_slots(&self.document);
        let before: HashMap<String, u32> = slots
            .iter()
            .map(|slot| (slot.key.clone(), slot.runtime_id))
            .collect();

        let deleted_set = DeletedSlot {
            key: key.to_string(),
            title: slots
                .iter()
                .find(|slot| slot.key == key)
                .map(|slot| slot.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        };
        let deleted_layers: Vec<DeletedSlot> = slots
            .iter()
            .filter(|slot| {
                slot.kind == SlotKind::ActionLayer && slot.parent_key.as_deref() == Some(key)
            })
            .map(|slot| DeletedSlot {
                key: slot.key.clone(),
                title: slot.title.clone(),
            })
            .collect();

        let mut doomed: HashSet<String> = HashSet::new();
        doomed.insert(key.to_string());
        for layer in &deleted_layers {
            doomed.insert(layer.key.clone());
        }

        if let Some(actions) = self.document.actions_mut() {
            actions.shift_remove(key);
        }
        if let Some(layers) = self.document.action_layers_mut() {
            for layer in &deleted_layers {
                layers.shift_remove(layer.key.as_str());
            }
        }

        // Presets belonging to the doomed slots go away; every group they
        // referenced is doomed with them, shared or not.
        let mut notes = Vec::new();
        let mut orphan_order: Vec<String> = Vec::new();
        let mut orphan_ids: HashSet<String> = HashSet::new();
        let mut presets_deleted = 0usize;
        if let Some(presets) = self.document.presets_mut() {
            presets.retain(|preset| {
                let name = preset.get("name").and_then(Value::as_str).unwrap_or("");
                if !doomed.contains(name) {
                    return true;
                }
                if let Some(bindings) = preset
                    .get("group_source_bindings")
                    .and_then(Value::as_object)
                {
                    for group_id in bindings.keys() {
                        if orphan_ids.insert(group_id.clone()) {
                            orphan_order.push(group_id.clone());
                        }
                    }
                }
                presets_deleted += 1;
                false
            });
        }

        let mut groups_deleted = 0usize;
        let mut removed_groups: HashSet<String> = HashSet::new();
        if let Some(groups) = self.document.groups_mut() {
            groups.retain(|group| match group.get("id").and_then(id_string) {
                Some(id) if orphan_ids.contains(&id) => {
                    removed_groups.insert(id);
                    groups_deleted += 1;
                    false
                }
                _ => true,
            });
        }
        for id in &orphan_order {
            if !removed_groups.contains(id) {
                notes.push(format!(
                    "group {id} referenced by a deleted preset does not exist"
                ));
            }
        }

        let mut group_bindings_removed = 0usize;
        if let Some(presets) = self.document.presets_mut() {
            for preset in presets.iter_mut() {
                let name = preset
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let Some(bindings) = preset
                    .get_mut("group_source_bindings")
                    .and_then(Value::as_object_mut)
                else {
                    continue;
                };
                for id in &orphan_order {
                    if bindings.shift_remove(id.as_str()).is_some() {
                        group_bindings_removed += 1;
                        notes.push(format!(
                            "group {id} was shared with surviving preset '{name}'; binding removed"
                        ));
                    }
                }
            }
        }

        let mut presets_renumbered = 0usize;
        if let Some(presets) = self.document.presets_mut() {
            for (index, preset) in presets.iter_mut().enumerate() {
                let Some(preset) = preset.as_object_mut() else {
                    continue;
                };
                let next = Value::String(index.to_string());
                if preset.get("id") != Some(&next) {
                    presets_renumbered += 1;
                }
                preset.insert("id".to_string(), next);
            }
        }

        let after: HashMap<String, u32> = enumerate_slots(&self.document)
            .into_iter()
            .map(|slot| (slot.key, slot.runtime_id))
            .collect();
        let remap = derive_remap(&before, &after, &doomed);
        let rewriter = IdRewriter::new(&remap);
        let references_rewritten = rewriter.rewrite_value(self.document.root_mut());
        let remap = remap
            .iter()
            .map(|(&old, &new)| RemapEntry { old, new })
            .collect();

        self.refresh_from_document()?;

        Ok(DeleteReport {
            deleted_set,
            deleted_layers,
            presets_deleted,
            groups_deleted,
            group_bindings_removed,
            remap,
            references_rewritten,
            presets_renumbered,
            notes,
        })
    }

    pub fn convert_refs(&mut self, direction: ConvertDirection) -> Result<ConvertReport, CoreError> {
        let catalog = TitleCatalog::from_document(&self.document);
        let action_sets = self.snapshot.action_set_count;
        let action_layers = self.snapshot.action_layer_count;

        let (text, references_converted, notes) = match direction {
            ConvertDirection::ToTitles => {
                let (text, converted) = refs::ids_to_titles(&self.text, &catalog);
                (text, converted, Vec::new())
            }
            ConvertDirection::ToIds => refs::titles_to_ids(&self.text, &catalog),
        };

        self.text = text;
        self.refresh_from_text()?;

        Ok(ConvertReport {
            direction,
            action_sets,
            action_layers,
            references_converted,
            notes,
        })
    }

    pub fn duplicate_layer(
        &mut self,
        source_key: &str,
        new_title: Option<&str>,
    ) -> Result<DuplicateReport, CoreError> {
        let source_layer = self
            .document
            .action_layers()
            .and_then(|layers| layers.get(source_key))
            .cloned();
        let Some(source_layer) = source_layer else {
            if self
                .document
                .actions()
                .is_some_and(|actions| actions.contains_key(source_key))
            {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!("'{source_key}' is an action set; only action layers can be duplicated"),
                ));
            }
            let available = self
                .document
                .action_layers()
                .map(|layers| join_keys(layers.keys()))
                .unwrap_or_else(|| "(none)".to_string());
            return Err(CoreError::new(
                CoreErrorCode::NotFound,
                format!("action layer '{source_key}' not found; available action layers: {available}"),
            ));
        };

        let source_runtime_id = runtime_id_of(&self.document, source_key);
        let source_title = entry_title(&source_layer).to_string();
        let new_title = new_title
            .map(str::to_string)
            .unwrap_or_else(|| format!("{source_title} (Copy)"));
        let new_key = next_preset_key(&self.document);

        let mut cloned_layer = source_layer;
        if let Some(entry) = cloned_layer.as_object_mut() {
            entry.insert("title".to_string(), Value::String(new_title.clone()));
        }
        if let Some(layers) = self.document.action_layers_mut() {
            layers.insert(new_key.clone(), cloned_layer);
        }

        let mut notes = Vec::new();
        let source_preset = self.document.presets().and_then(|presets| {
            presets
                .iter()
                .find(|preset| preset.get("name").and_then(Value::as_str) == Some(source_key))
                .cloned()
        });
        let source_bindings: Vec<(String, Value)> = match &source_preset {
            Some(preset) => preset
                .get("group_source_bindings")
                .and_then(Value::as_object)
                .map(|bindings| {
                    bindings
                        .iter()
                        .map(|(id, mode)| (id.clone(), mode.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            None => {
                notes.push(format!(
                    "no preset named '{source_key}'; duplicating with an empty binding set"
                ));
                Vec::new()
            }
        };

        // New group ids are allocated up front, one per source binding, so
        // the remapped binding set keeps its shape even when a source group
        // turns out to be missing.
        let mut next_group_id = max_numeric_id(self.document.groups());
        let mut new_bindings: Vec<(String, Value)> = Vec::with_capacity(source_bindings.len());
        let mut groups_cloned: Vec<GroupClone> = Vec::new();
        let mut cloned_groups: Vec<Value> = Vec::new();
        for (old_id, mode) in &source_bindings {
            next_group_id += 1;
            let new_id = next_group_id.to_string();
            match find_group(&self.document, old_id) {
                Some(group) => {
                    let mut clone = group.clone();
                    if let Some(entry) = clone.as_object_mut() {
                        entry.insert("id".to_string(), Value::String(new_id.clone()));
                    }
                    cloned_groups.push(clone);
                    groups_cloned.push(GroupClone {
                        old_id: old_id.clone(),
                        new_id: new_id.clone(),
                    });
                }
                None => {
                    notes.push(format!(
                        "group {old_id} not found; new binding {new_id} has no cloned group"
                    ));
                }
            }
            new_bindings.push((new_id, mode.clone()));
        }
        if let Some(groups) = self.document.groups_mut() {
            groups.extend(cloned_groups);
        }

        let preset_array_id = (max_numeric_id(self.document.presets()) + 1).to_string();
        let mut bindings_object = Map::new();
        for (id, mode) in new_bindings {
            bindings_object.insert(id, mode);
        }
        let mut new_preset = Map::new();
        new_preset.insert("id".to_string(), Value::String(preset_array_id.clone()));
        new_preset.insert("name".to_string(), Value::String(new_key.clone()));
        new_preset.insert(
            "group_source_bindings".to_string(),
            Value::Object(bindings_object),
        );
        self.document
            .presets_mut_or_default()
            .map_err(|e| {
                CoreError::new(CoreErrorCode::Io, format!("failed to update presets: {e}"))
            })?
            .push(Value::Object(new_preset));

        let new_runtime_id = runtime_id_of(&self.document, &new_key);
        self.refresh_from_document()?;

        Ok(DuplicateReport {
            source_key: source_key.to_string(),
            source_title,
            source_runtime_id,
            new_key,
            new_title,
            new_runtime_id,
            groups_cloned,
            preset_array_id,
            notes,
        })
    }

    pub fn rename_slot(&mut self, key: &str, new_title: &str) -> Result<RenameReport, CoreError> {
        let slots = enumerate_slots(&self.document);
        let Some(slot) = slots.iter().find(|slot| slot.key == key).cloned() else {
            return Err(CoreError::new(
                CoreErrorCode::NotFound,
                format!("no action set or layer named '{key}'"),
            ));
        };
        let old_title = slot.title.clone();

        let mut substitutions: Vec<(String, String)> = Vec::new();
        match slot.kind {
            SlotKind::ActionSet => {
                substitutions.push((symbolic(&old_title), symbolic(new_title)));
                for child in slots
                    .iter()
                    .filter(|slot| slot.parent_key.as_deref() == Some(key))
                {
                    substitutions.push((
                        symbolic(&format!("{old_title}::{}", child.title)),
                        symbolic(&format!("{new_title}::{}", child.title)),
                    ));
                }
            }
            SlotKind::ActionLayer => match slot.parent_key.as_deref() {
                Some(parent) => {
                    let parent_title = slots
                        .iter()
                        .find(|slot| slot.kind == SlotKind::ActionSet && slot.key == parent)
                        .map(|slot| slot.title.as_str())
                        .unwrap_or(parent);
                    substitutions.push((
                        symbolic(&format!("{parent_title}::{old_title}")),
                        symbolic(&format!("{parent_title}::{new_title}")),
                    ));
                }
                None => {
                    substitutions.push((symbolic(&old_title), symbolic(new_title)));
                }
            },
        }

        match slot.kind {
            SlotKind::ActionSet => {
                set_entry_title(self.document.actions_mut(), key, new_title);
            }
            SlotKind::ActionLayer => {
                set_entry_title(self.document.action_layers_mut(), key, new_title);
            }
        }

        let mut references_rewritten = 0usize;
        refs::for_each_string_mut(self.document.root_mut(), &mut |text| {
            for (old, new) in &substitutions {
                if !text.contains(old.as_str()) {
                    continue;
                }
                references_rewritten += text.matches(old.as_str()).count();
                *text = text.replace(old.as_str(), new);
            }
        });

        self.refresh_from_document()?;

        Ok(RenameReport {
            key: key.to_string(),
            old_title,
            new_title: new_title.to_string(),
            references_rewritten,
        })
    }

    pub fn insert_companion(
        &mut self,
        trigger_verb: BindingVerb,
        trigger_ref: &str,
        companion_verb: BindingVerb,
        companion_ref: &str,
    ) -> Result<CompanionReport, CoreError> {
        let counts = refs::insert_companion_bindings(
            self.document.root_mut(),
            trigger_verb,
            trigger_ref,
            companion_verb,
            companion_ref,
        );
        self.refresh_from_document()?;

        Ok(CompanionReport {
            bindings_modified: counts.modified,
            insertions: counts.inserted,
            already_present: counts.already_present,
        })
    }

    pub fn shift_layer_refs(&mut self, delta: i32) -> Result<ShiftReport, CoreError> {
        let (text, counts) = refs::shift_layer_refs(&self.text, delta);
        self.text = text;
        self.refresh_from_text()?;

        Ok(ShiftReport {
            delta,
            references_matched: counts.matched,
            references_changed: counts.changed,
            references_clamped: counts.clamped,
        })
    }

    fn refresh_from_document(&mut self) -> Result<(), CoreError> {
        self.text = self
            .document
            .emit()
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("failed to emit layout: {e}")))?;
        self.snapshot = snapshot_of(&self.document);
        Ok(())
    }

    fn refresh_from_text(&mut self) -> Result<(), CoreError> {
        self.document = Document::parse(&self.text).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("layout no longer parses after text rewrite: {e}"),
            )
        })?;
        self.snapshot = snapshot_of(&self.document);
        Ok(())
    }
}

fn snapshot_of(document: &Document) -> Snapshot {
    let slots = enumerate_slots(document);
    let action_set_count = slots
        .iter()
        .filter(|slot| slot.kind == SlotKind::ActionSet)
        .count();
    let action_layer_count = slots.len() - action_set_count;

    Snapshot {
        action_set_count,
        action_layer_count,
        preset_count: document.presets().map_or(0, Vec::len),
        group_count: document.groups().map_or(0, Vec::len),
        slots,
    }
}

fn runtime_id_of(document: &Document, key: &str) -> u32 {
    enumerate_slots(document)
        .iter()
        .find(|slot| slot.key == key)
        .map(|slot| slot.runtime_id)
        .unwrap_or(0)
}

fn join_keys<'a, I: Iterator<Item = &'a String>>(keys: I) -> String {
    let keys: Vec<&str> = keys.map(String::as_str).collect();
    if keys.is_empty() {
        "(none)".to_string()
    } else {
        keys.join(", ")
    }
}

fn next_preset_key(document: &Document) -> String {
    let pattern = Regex::new(r"^Preset_(\d+)$").expect("key pattern is valid");
    let mut max = 0u64;
    let mut scan = |map: Option<&Map<String, Value>>| {
        let Some(map) = map else { return };
        for key in map.keys() {
            if let Some(caps) = pattern.captures(key) {
                if let Ok(number) = caps[1].parse::<u64>() {
                    max = max.max(number);
                }
            }
        }
    };
    scan(document.actions());
    scan(document.action_layers());
    format!("Preset_{}", max + 1)
}

fn max_numeric_id(entries: Option<&Vec<Value>>) -> u64 {
    entries
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("id").and_then(id_string))
                .filter_map(|id| id.parse::<u64>().ok())
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0)
}

fn find_group<'a>(document: &'a Document, id: &str) -> Option<&'a Value> {
    document
        .groups()?
        .iter()
        .find(|group| group.get("id").and_then(id_string).as_deref() == Some(id))
}

fn set_entry_title(map: Option<&mut Map<String, Value>>, key: &str, title: &str) {
    if let Some(entry) = map
        .and_then(|map| map.get_mut(key))
        .and_then(Value::as_object_mut)
    {
        entry.insert("title".to_string(), Value::String(title.to_string()));
    }
}

fn symbolic(reference: &str) -> String {
    format!("{{{{{reference}}}}}")
}
