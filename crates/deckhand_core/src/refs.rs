//! Bounded rewriting of `controller_action` command references.
//!
//! Binding commands are plain strings of the form
//! `controller_action <verb> <ref> <p1> <p2>[, <suffix>...]`. Every rewrite
//! here anchors on the full `controller_action <verb> ` prefix and the
//! ` <p1> <p2>` parameter tail, so a reference is only ever replaced as a
//! whole token and trailing suffixes survive byte for byte.

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::titles::TitleCatalog;
use crate::verb::BindingVerb;

fn verb_alternation(verbs: &[BindingVerb]) -> String {
    let mut alternation = String::new();
    for (index, verb) in verbs.iter().enumerate() {
        if index > 0 {
            alternation.push('|');
        }
        alternation.push_str(verb.as_str());
    }
    alternation
}

fn command_regex(verbs: &[BindingVerb], reference: &str) -> Regex {
    let pattern = format!(
        r"(controller_action (?:{}) ){}( \d+ \d+)",
        verb_alternation(verbs),
        reference
    );
    Regex::new(&pattern).expect("command pattern is valid")
}

/// Apply `f` to every string leaf under `value`, depth first.
pub fn for_each_string_mut<F: FnMut(&mut String)>(value: &mut Value, f: &mut F) {
    match value {
        Value::String(text) => f(text),
        Value::Array(items) => {
            for item in items {
                for_each_string_mut(item, f);
            }
        }
        Value::Object(map) => {
            for child in map.values_mut() {
                for_each_string_mut(child, f);
            }
        }
        _ => {}
    }
}

struct RewritePass {
    pattern: Regex,
    replacement: String,
    placeholder: String,
    target: String,
}

/// Renumbers runtime ID references according to an old -> new map.
///
/// Substitution runs in two passes. Pass one parks every match behind a
/// placeholder unique to its (old, new) pair; pass two resolves the
/// placeholders. A chained remap such as {3 -> 2, 2 -> 1} therefore never
/// cascades a freshly written 2 into a 1.
pub struct IdRewriter {
    passes: Vec<RewritePass>,
}

impl IdRewriter {
    pub fn new(remap: &BTreeMap<u32, u32>) -> Self {
        let passes = remap
            .iter()
            .rev()
            .map(|(&old, &new)| {
                let placeholder = format!("__RUNTIME_ID_{old}_TO_{new}__");
                RewritePass {
                    pattern: command_regex(&BindingVerb::ALL, &old.to_string()),
                    replacement: format!("${{1}}{placeholder}${{2}}"),
                    placeholder,
                    target: new.to_string(),
                }
            })
            .collect();
        IdRewriter { passes }
    }

    /// Rewrite one string, returning the new text and the match count.
    pub fn rewrite(&self, text: &str) -> (String, usize) {
        let mut text = text.to_string();
        let mut rewritten = 0;

        for pass in &self.passes {
            let matches = pass.pattern.find_iter(&text).count();
            if matches == 0 {
                continue;
            }
            rewritten += matches;
            text = pass
                .pattern
                .replace_all(&text, pass.replacement.as_str())
                .into_owned();
        }

        for pass in &self.passes {
            if text.contains(&pass.placeholder) {
                text = text.replace(&pass.placeholder, &pass.target);
            }
        }

        (text, rewritten)
    }

    /// Rewrite every string leaf under `value`, returning total matches.
    pub fn rewrite_value(&self, value: &mut Value) -> usize {
        if self.passes.is_empty() {
            return 0;
        }
        let mut total = 0;
        for_each_string_mut(value, &mut |text| {
            if !text.contains("controller_action ") {
                return;
            }
            let (rewritten, count) = self.rewrite(text);
            if count > 0 {
                total += count;
                *text = rewritten;
            }
        });
        total
    }
}

/// Replace numeric references with `{{Qualified Title}}` forms.
///
/// Same two-pass placeholder scheme as [`IdRewriter`], highest ID first,
/// so ID 12 is never half-eaten by the pattern for ID 1.
pub fn ids_to_titles(text: &str, catalog: &TitleCatalog) -> (String, usize) {
    let mut text = text.to_string();
    let mut converted = 0;

    for entry in catalog.entries().iter().rev() {
        let pattern = command_regex(&BindingVerb::ALL, &entry.runtime_id.to_string());
        let matches = pattern.find_iter(&text).count();
        if matches == 0 {
            continue;
        }
        converted += matches;
        let replacement = format!("${{1}}__TITLE_PLACEHOLDER_{}__${{2}}", entry.runtime_id);
        text = pattern.replace_all(&text, replacement.as_str()).into_owned();
    }

    for entry in catalog.entries() {
        let placeholder = format!("__TITLE_PLACEHOLDER_{}__", entry.runtime_id);
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, &format!("{{{{{}}}}}", entry.qualified));
        }
    }

    (text, converted)
}

/// Replace `{{Qualified Title}}` references with numeric runtime IDs.
///
/// Unknown titles are left untouched and reported as notes.
pub fn titles_to_ids(text: &str, catalog: &TitleCatalog) -> (String, usize, Vec<String>) {
    let pattern = format!(
        r"(controller_action (?:{}) )\{{\{{([^}}]+)\}}\}}( \d+ \d+)",
        verb_alternation(&BindingVerb::ALL)
    );
    let pattern = Regex::new(&pattern).expect("command pattern is valid");

    let mut converted = 0;
    let mut notes = Vec::new();
    let result = pattern.replace_all(text, |caps: &Captures<'_>| {
        let title = &caps[2];
        match catalog.id_for(title) {
            Some(runtime_id) => {
                converted += 1;
                format!("{}{}{}", &caps[1], runtime_id, &caps[3])
            }
            None => {
                notes.push(format!("could not find runtime ID for '{title}'"));
                caps[0].to_string()
            }
        }
    });

    (result.into_owned(), converted, notes)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftCounts {
    pub matched: usize,
    pub changed: usize,
    pub clamped: usize,
}

/// Add `delta` to every layer-verb numeric reference, flooring at zero.
///
/// CHANGE_PRESET references are deliberately out of scope: action sets keep
/// their absolute slots when layers are re-stacked.
pub fn shift_layer_refs(text: &str, delta: i32) -> (String, ShiftCounts) {
    let pattern = format!(
        r"(controller_action (?:{}) )(\d+)( \d+ \d+)",
        verb_alternation(&BindingVerb::LAYER_VERBS)
    );
    let pattern = Regex::new(&pattern).expect("command pattern is valid");

    let mut counts = ShiftCounts::default();
    let result = pattern.replace_all(text, |caps: &Captures<'_>| {
        counts.matched += 1;
        let Ok(current) = caps[2].parse::<i64>() else {
            return caps[0].to_string();
        };
        let mut next = current + i64::from(delta);
        if next < 0 {
            next = 0;
            counts.clamped += 1;
        }
        if next != current {
            counts.changed += 1;
        }
        format!("{}{}{}", &caps[1], next, &caps[3])
    });

    (result.into_owned(), counts)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanionCounts {
    pub modified: usize,
    pub inserted: usize,
    pub already_present: usize,
}

/// The full command text inserted for a companion reference.
pub fn companion_command(verb: BindingVerb, reference: &str) -> String {
    format!("controller_action {verb} {reference} 0 0, , ")
}

/// Marker that identifies a command by verb and reference regardless of its
/// parameters. The trailing space keeps reference 1 from matching 10.
fn command_marker(verb: BindingVerb, reference: &str) -> String {
    format!("controller_action {verb} {reference} ")
}

/// Insert a companion command after every trigger command in the tree.
///
/// Visits every `"binding"` value. A plain string that matches the trigger
/// is promoted to a two-element list; a list gets the companion inserted
/// after its last trigger entry. Bindings that already carry the companion
/// are skipped, which makes the operation idempotent.
pub fn insert_companion_bindings(
    value: &mut Value,
    trigger_verb: BindingVerb,
    trigger_ref: &str,
    companion_verb: BindingVerb,
    companion_ref: &str,
) -> CompanionCounts {
    let trigger = command_marker(trigger_verb, trigger_ref);
    let companion = command_marker(companion_verb, companion_ref);
    let command = companion_command(companion_verb, companion_ref);

    let mut counts = CompanionCounts::default();
    visit_bindings(value, &mut |binding| match binding {
        Value::String(current) => {
            if !current.contains(&trigger) {
                return;
            }
            if current.contains(&companion) {
                counts.already_present += 1;
                return;
            }
            let promoted = vec![
                Value::String(current.clone()),
                Value::String(command.clone()),
            ];
            *binding = Value::Array(promoted);
            counts.modified += 1;
            counts.inserted += 1;
        }
        Value::Array(items) => {
            let mut last_trigger = None;
            let mut present = false;
            for (index, item) in items.iter().enumerate() {
                let Some(text) = item.as_str() else { continue };
                if text.contains(&trigger) {
                    last_trigger = Some(index);
                }
                if text.contains(&companion) {
                    present = true;
                }
            }
            let Some(last) = last_trigger else { return };
            if present {
                counts.already_present += 1;
                return;
            }
            items.insert(last + 1, Value::String(command.clone()));
            counts.modified += 1;
            counts.inserted += 1;
        }
        _ => {}
    });
    counts
}

fn visit_bindings<F: FnMut(&mut Value)>(value: &mut Value, f: &mut F) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key.as_str() == "binding" {
                    f(child);
                } else {
                    visit_bindings(child, f);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_bindings(item, f);
            }
        }
        _ => {}
    }
}
