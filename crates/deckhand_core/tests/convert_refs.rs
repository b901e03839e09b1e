use std::fs;
use std::path::PathBuf;

use deckhand_core::core_api::{ConvertDirection, Engine, Session};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn open_layout(name: &str) -> Session {
    let path = workspace_root().join("tests/layouts").join(name);
    let bytes = fs::read(&path).expect("failed to read layout fixture");
    Engine::new()
        .open_bytes(&bytes)
        .expect("failed to open layout fixture")
}

#[test]
fn ids_become_qualified_titles() {
    let mut session = open_layout("deck_sample.json");
    let report = session
        .convert_refs(ConvertDirection::ToTitles)
        .expect("failed to convert references");

    assert_eq!(report.direction, ConvertDirection::ToTitles);
    assert_eq!(report.action_sets, 2);
    assert_eq!(report.action_layers, 3);
    assert_eq!(report.references_converted, 7);
    assert!(report.notes.is_empty());

    let text = session.text();
    assert!(text.contains("controller_action CHANGE_PRESET {{Combat}} 0 0, , "));
    assert!(text.contains("controller_action CHANGE_PRESET {{Default}} 0 0, , "));
    assert!(text.contains("controller_action add_layer {{Default::Menu}} 0 0, Open Menu, "));
    assert!(text.contains("controller_action hold_layer {{Combat::Sniper Mode}} 0 0, , "));
    assert!(text.contains("controller_action remove_layer {{Combat::Sniper Mode}} 0 0, , "));
    assert!(text.contains("controller_action remove_layer {{Combat::Gyro}} 0 0, , "));
    assert!(text.contains("controller_action add_layer {{Combat::Gyro}} 0 0, , "));
    // Plain key bindings are not commands and must not change.
    assert!(text.contains("key_press ESCAPE, , "));
}

#[test]
fn conversion_roundtrips_byte_for_byte() {
    let path = workspace_root().join("tests/layouts/deck_sample.json");
    let original = fs::read_to_string(&path).expect("failed to read layout fixture");

    let mut session = Engine::new()
        .open_bytes(original.as_bytes())
        .expect("failed to open layout fixture");
    let forward = session
        .convert_refs(ConvertDirection::ToTitles)
        .expect("failed to convert to titles");
    let back = session
        .convert_refs(ConvertDirection::ToIds)
        .expect("failed to convert to runtime IDs");

    assert_eq!(forward.references_converted, 7);
    assert_eq!(back.references_converted, 7);
    assert!(back.notes.is_empty());
    assert_eq!(session.text(), original);
    assert_eq!(session.to_bytes(), original.as_bytes());
}

#[test]
fn conversion_does_not_disturb_untouched_bytes() {
    let mut session = open_layout("deck_sample.json");
    let before = session.text().to_string();
    session
        .convert_refs(ConvertDirection::ToTitles)
        .expect("failed to convert references");

    // Everything outside the rewritten commands keeps its exact bytes,
    // including indentation and the settings block.
    let text = session.text();
    assert!(text.contains("\t\t\"settings\": {\n\t\t\t\"left_trackpad_mode\": \"0\""));
    assert_eq!(text.lines().count(), before.lines().count());
}

#[test]
fn unknown_title_becomes_a_note_and_stays_in_place() {
    let layout = r#"{"controller_mappings":{
	"actions":{"Preset_1":{"title":"Base"}},
	"group":[{"id":"1","inputs":{"click":{"activators":{"Full_Press":{"bindings":{"binding":"controller_action add_layer {{Ghost}} 0 0, , "}}}}}}]
}}"#;
    let mut session = Engine::new()
        .open_bytes(layout)
        .expect("failed to open layout");

    let report = session
        .convert_refs(ConvertDirection::ToIds)
        .expect("conversion itself should not fail");
    assert_eq!(report.references_converted, 0);
    assert_eq!(report.notes, vec!["could not find runtime ID for 'Ghost'"]);
    assert!(session
        .text()
        .contains("controller_action add_layer {{Ghost}} 0 0, , "));
}

#[test]
fn duplicate_titles_resolve_to_the_later_slot() {
    let layout = r#"{"controller_mappings":{
	"actions":{"Preset_1":{"title":"Base"},"Preset_2":{"title":"Base"}},
	"group":[{"id":"1","inputs":{"click":{"activators":{"Full_Press":{"bindings":{"binding":"controller_action CHANGE_PRESET {{Base}} 0 0, , "}}}}}}]
}}"#;
    let mut session = Engine::new()
        .open_bytes(layout)
        .expect("failed to open layout");

    let report = session
        .convert_refs(ConvertDirection::ToIds)
        .expect("failed to convert references");
    assert_eq!(report.references_converted, 1);
    assert!(session
        .text()
        .contains("controller_action CHANGE_PRESET 2 0 0, , "));
}
