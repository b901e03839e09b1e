use std::fmt::Write as _;

use deckhand_core::core_api::{
    CompanionReport, ConvertDirection, ConvertReport, DeleteReport, DuplicateReport, RemapEntry,
    RenameReport, ShiftReport, Slot, SlotKind, Snapshot,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const KEY_COL_WIDTH: usize = 24;
const TITLE_COL_WIDTH: usize = 28;

pub fn render_overview_table(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    writeln!(&mut out, " ::: Action Sets :::").expect("writing to String cannot fail");
    let sets: Vec<&Slot> = snapshot
        .slots
        .iter()
        .filter(|slot| slot.kind == SlotKind::ActionSet)
        .collect();
    if sets.is_empty() {
        writeln!(&mut out, "  none").expect("writing to String cannot fail");
    }
    for slot in sets {
        writeln!(&mut out, "{}", slot_line(slot, None).trim_end())
            .expect("writing to String cannot fail");
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, " ::: Action Layers :::").expect("writing to String cannot fail");
    let layers: Vec<&Slot> = snapshot
        .slots
        .iter()
        .filter(|slot| slot.kind == SlotKind::ActionLayer)
        .collect();
    if layers.is_empty() {
        writeln!(&mut out, "  none").expect("writing to String cannot fail");
    }
    for slot in layers {
        let parent = slot.parent_key.as_deref().map(|key| {
            match snapshot
                .slots
                .iter()
                .find(|candidate| candidate.kind == SlotKind::ActionSet && candidate.key == key)
            {
                Some(parent) => format!("(parent: {key} \"{}\")", parent.title),
                None => format!("(parent: {key})"),
            }
        });
        writeln!(&mut out, "{}", slot_line(slot, parent.as_deref()).trim_end())
            .expect("writing to String cannot fail");
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(
        &mut out,
        " Presets: {:<6}Groups: {}",
        snapshot.preset_count, snapshot.group_count
    )
    .expect("writing to String cannot fail");

    out
}

pub fn render_overview_json(snapshot: &Snapshot) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "action_set_count".to_string(),
        JsonValue::from(snapshot.action_set_count),
    );
    out.insert(
        "action_layer_count".to_string(),
        JsonValue::from(snapshot.action_layer_count),
    );
    out.insert(
        "preset_count".to_string(),
        JsonValue::from(snapshot.preset_count),
    );
    out.insert(
        "group_count".to_string(),
        JsonValue::from(snapshot.group_count),
    );
    out.insert(
        "slots".to_string(),
        JsonValue::Array(snapshot.slots.iter().map(slot_to_json).collect()),
    );
    JsonValue::Object(out)
}

pub fn render_delete_summary(report: &DeleteReport) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "Deleted action set {} \"{}\"",
        report.deleted_set.key, report.deleted_set.title
    )
    .expect("writing to String cannot fail");
    for layer in &report.deleted_layers {
        writeln!(&mut out, "Deleted layer {} \"{}\"", layer.key, layer.title)
            .expect("writing to String cannot fail");
    }
    writeln!(&mut out, "Presets removed: {}", report.presets_deleted)
        .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Groups removed: {} ({} dangling bindings stripped)",
        report.groups_deleted, report.group_bindings_removed
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Preset ids renumbered: {}",
        report.presets_renumbered
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out, "Runtime ID remap: {}", render_remap(&report.remap))
        .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "References rewritten: {}",
        report.references_rewritten
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_convert_summary(report: &ConvertReport) -> String {
    let direction = match report.direction {
        ConvertDirection::ToTitles => "titles",
        ConvertDirection::ToIds => "runtime IDs",
    };
    format!(
        "Converted {} references to {} ({} action sets, {} action layers)\n",
        report.references_converted, direction, report.action_sets, report.action_layers
    )
}

pub fn render_duplicate_summary(report: &DuplicateReport) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "Duplicated layer {} \"{}\" (runtime ID {})",
        report.source_key, report.source_title, report.source_runtime_id
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "New layer {} \"{}\" (runtime ID {})",
        report.new_key, report.new_title, report.new_runtime_id
    )
    .expect("writing to String cannot fail");
    let cloned = if report.groups_cloned.is_empty() {
        "none".to_string()
    } else {
        report
            .groups_cloned
            .iter()
            .map(|clone| format!("{} -> {}", clone.old_id, clone.new_id))
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(&mut out, "Groups cloned: {cloned}").expect("writing to String cannot fail");
    writeln!(&mut out, "New preset array id: {}", report.preset_array_id)
        .expect("writing to String cannot fail");
    out
}

pub fn render_rename_summary(report: &RenameReport) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "Renamed {} \"{}\" -> \"{}\"",
        report.key, report.old_title, report.new_title
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "References rewritten: {}",
        report.references_rewritten
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_companion_summary(report: &CompanionReport) -> String {
    format!(
        "Bindings modified: {} ({} insertions, {} already present)\n",
        report.bindings_modified, report.insertions, report.already_present
    )
}

pub fn render_shift_summary(report: &ShiftReport) -> String {
    format!(
        "Shifted layer references by {}: {} matched, {} changed, {} clamped at zero\n",
        report.delta, report.references_matched, report.references_changed,
        report.references_clamped
    )
}

fn slot_line(slot: &Slot, parent: Option<&str>) -> String {
    format!(
        " [{:>3}] {:<k$}{:<t$}{}",
        slot.runtime_id,
        fit_column(&slot.key, KEY_COL_WIDTH),
        fit_column(&slot.title, TITLE_COL_WIDTH),
        parent.unwrap_or(""),
        k = KEY_COL_WIDTH,
        t = TITLE_COL_WIDTH
    )
}

fn slot_to_json(slot: &Slot) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("runtime_id".to_string(), JsonValue::from(slot.runtime_id));
    out.insert("key".to_string(), JsonValue::String(slot.key.clone()));
    out.insert(
        "kind".to_string(),
        JsonValue::String(
            match slot.kind {
                SlotKind::ActionSet => "action_set",
                SlotKind::ActionLayer => "action_layer",
            }
            .to_string(),
        ),
    );
    out.insert("title".to_string(), JsonValue::String(slot.title.clone()));
    if let Some(parent) = &slot.parent_key {
        out.insert("parent".to_string(), JsonValue::String(parent.clone()));
    }
    JsonValue::Object(out)
}

fn render_remap(remap: &[RemapEntry]) -> String {
    if remap.is_empty() {
        return "none".to_string();
    }
    remap
        .iter()
        .map(|entry| format!("{} -> {}", entry.old, entry.new))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}
