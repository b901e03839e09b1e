use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn sample_layout_path() -> PathBuf {
    workspace_root().join("tests/layouts/deck_sample.json")
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_deckhand"))
        .args(args)
        .output()
        .expect("failed to run deckhand CLI")
}

fn temp_output_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.json", std::process::id(), nanos))
}

fn temp_layout_copy(prefix: &str) -> PathBuf {
    let path = temp_output_path(prefix);
    fs::copy(sample_layout_path(), &path).expect("failed to copy layout fixture");
    path
}

fn backup_path_beside(path: &Path, op: &str) -> PathBuf {
    let s = path.to_string_lossy();
    let stem = s.strip_suffix(".json").expect("temp layout should end in .json");
    PathBuf::from(format!("{stem}_backup_before_{op}.json"))
}

#[test]
fn list_prints_overview_table() {
    let path = sample_layout_path();
    let path = path.to_string_lossy().to_string();
    let output = run_cli(&["list", &path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" ::: Action Sets :::"));
    assert!(stdout.contains(" [  1] Preset_1000001          Default"));
    assert!(stdout.contains(" ::: Action Layers :::"));
    assert!(stdout.contains(" Presets: 5     Groups: 9"));
}

#[test]
fn list_json_prints_overview_object() {
    let path = sample_layout_path();
    let path = path.to_string_lossy().to_string();
    let output = run_cli(&["list", "--json", &path]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(value["action_set_count"], 2);
    assert_eq!(value["action_layer_count"], 3);
    assert_eq!(value["slots"][0]["key"], "Preset_1000001");
}

#[test]
fn delete_set_writes_output_file() {
    let path = sample_layout_path();
    let original = fs::read(&path).expect("failed to read fixture");
    let path_s = path.to_string_lossy().to_string();
    let out_path = temp_output_path("deckhand_delete_output");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--output", &out_path_s]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted action set Preset_1000002 \"Combat\""));
    assert!(stdout.contains("Runtime ID remap: 4 -> 2"));
    assert!(stdout.contains("Wrote edited layout to"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: group 20 was shared with surviving preset"));

    let written = fs::read_to_string(&out_path).expect("expected output file to be created");
    let value: Value = serde_json::from_str(&written).expect("output should be JSON");
    let actions = value["controller_mappings"]["actions"]
        .as_object()
        .expect("actions should survive");
    assert!(actions.get("Preset_1000002").is_none());
    assert!(actions.get("Preset_1000001").is_some());

    // The input file is untouched when --output is given.
    assert_eq!(fs::read(&path).expect("failed to re-read fixture"), original);

    let _ = fs::remove_file(&out_path);
}

#[test]
fn in_place_edit_creates_backup_by_default() {
    let path = temp_layout_copy("deckhand_inplace");
    let original = fs::read(&path).expect("failed to read temp layout");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002"]);
    assert!(output.status.success());

    let backup = backup_path_beside(&path, "delete");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Backup saved to"));
    assert_eq!(
        fs::read(&backup).expect("expected backup beside the input"),
        original
    );
    assert_ne!(fs::read(&path).expect("failed to re-read layout"), original);

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&backup);
}

#[test]
fn no_backup_skips_the_backup_file() {
    let path = temp_layout_copy("deckhand_no_backup");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--no-backup"]);
    assert!(output.status.success());

    let backup = backup_path_beside(&path, "delete");
    assert!(!backup.exists());

    let _ = fs::remove_file(&path);
}

#[test]
fn output_refuses_to_overwrite_without_force() {
    let path = sample_layout_path();
    let path_s = path.to_string_lossy().to_string();
    let out_path = temp_output_path("deckhand_no_clobber");
    fs::write(&out_path, b"precious").expect("failed to seed output file");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--output", &out_path_s]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("refusing to overwrite existing file"));
    assert_eq!(
        fs::read(&out_path).expect("failed to re-read output file"),
        b"precious"
    );

    let _ = fs::remove_file(&out_path);
}

#[test]
fn force_overwrite_with_backup_keeps_bak_copy() {
    let path = sample_layout_path();
    let path_s = path.to_string_lossy().to_string();
    let out_path = temp_output_path("deckhand_clobber");
    fs::write(&out_path, b"previous contents").expect("failed to seed output file");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "delete-set",
        &path_s,
        "Preset_1000002",
        "--output",
        &out_path_s,
        "--force-overwrite",
        "--backup",
    ]);
    assert!(output.status.success());

    let bak = PathBuf::from(format!("{out_path_s}.bak"));
    assert_eq!(
        fs::read(&bak).expect("expected .bak beside the output"),
        b"previous contents"
    );
    let written = fs::read_to_string(&out_path).expect("failed to read output");
    assert!(written.contains("\"controller_mappings\""));

    let _ = fs::remove_file(&out_path);
    let _ = fs::remove_file(&bak);
}

#[test]
fn dry_run_leaves_every_file_untouched() {
    let path = temp_layout_copy("deckhand_dry_run");
    let original = fs::read(&path).expect("failed to read temp layout");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--dry-run"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted action set Preset_1000002 \"Combat\""));
    assert!(stdout.contains("Dry run: no files written"));
    assert_eq!(fs::read(&path).expect("failed to re-read layout"), original);
    assert!(!backup_path_beside(&path, "delete").exists());

    let _ = fs::remove_file(&path);
}

#[test]
fn json_flag_prints_the_report_only() {
    let path = sample_layout_path();
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--dry-run", "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: Value = serde_json::from_str(&stdout).expect("stdout should be the report JSON");
    assert_eq!(report["deleted_set"]["key"], "Preset_1000002");
    assert_eq!(report["presets_deleted"], 3);
    assert_eq!(report["groups_deleted"], 5);
    assert_eq!(report["remap"][0]["old"], 4);
    assert_eq!(report["remap"][0]["new"], 2);
}

#[test]
fn unknown_set_exits_with_an_error() {
    let path = sample_layout_path();
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["delete-set", &path_s, "Preset_404", "--dry-run"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("available action sets: Preset_1000001, Preset_1000002"));
}

#[test]
fn flag_conflicts_exit_with_usage_error() {
    let path = sample_layout_path();
    let path_s = path.to_string_lossy().to_string();

    // --force-overwrite is only meaningful together with --output.
    let output = run_cli(&["delete-set", &path_s, "Preset_1000002", "--force-overwrite"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn duplicate_layer_with_title_flag() {
    let path = temp_layout_copy("deckhand_duplicate");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&[
        "duplicate-layer",
        &path_s,
        "Preset_1000005",
        "--title",
        "Night Scope",
        "--no-backup",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("New layer Preset_1000008 \"Night Scope\" (runtime ID 6)"));
    assert!(stdout.contains("Groups cloned: 15 -> 21, 20 -> 22"));

    let written = fs::read_to_string(&path).expect("failed to read layout");
    assert!(written.contains("Preset_1000008"));
    assert!(written.contains("Night Scope"));

    let _ = fs::remove_file(&path);
}

#[test]
fn rename_updates_the_layer_title() {
    let path = temp_layout_copy("deckhand_rename");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["rename", &path_s, "Preset_1000005", "Precision", "--no-backup"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Renamed Preset_1000005 \"Sniper Mode\" -> \"Precision\""));

    let written = fs::read_to_string(&path).expect("failed to read layout");
    assert!(written.contains("\"Precision\""));
    assert!(!written.contains("Sniper Mode"));

    let _ = fs::remove_file(&path);
}

#[test]
fn add_companion_promotes_trigger_binding() {
    let path = temp_layout_copy("deckhand_companion");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&[
        "add-companion",
        &path_s,
        "--trigger-verb",
        "add-layer",
        "--trigger-ref",
        "5",
        "--companion-verb",
        "hold-layer",
        "--companion-ref",
        "3",
        "--no-backup",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bindings modified: 1 (1 insertions, 0 already present)"));

    let written = fs::read_to_string(&path).expect("failed to read layout");
    assert!(written.contains("controller_action hold_layer 3 0 0, , "));

    let _ = fs::remove_file(&path);
}

#[test]
fn shift_accepts_a_negative_delta() {
    let path = temp_layout_copy("deckhand_shift");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["shift-layer-refs", &path_s, "--by", "-1", "--no-backup"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(
        "Shifted layer references by -1: 5 matched, 5 changed, 0 clamped at zero"
    ));

    let written = fs::read_to_string(&path).expect("failed to read layout");
    assert!(written.contains("controller_action add_layer 3 0 0, Open Menu, "));
    assert!(written.contains("controller_action CHANGE_PRESET 2 0 0, , "));

    let _ = fs::remove_file(&path);
}

#[test]
fn convert_roundtrip_restores_the_exact_file() {
    let path = temp_layout_copy("deckhand_convert");
    let original = fs::read(&path).expect("failed to read temp layout");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["convert", &path_s, "to-titles", "--no-backup"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Converted 7 references to titles (2 action sets, 3 action layers)"));

    let titled = fs::read_to_string(&path).expect("failed to read layout");
    assert!(titled.contains("{{Combat::Sniper Mode}}"));

    let output = run_cli(&["convert", &path_s, "to-ids", "--no-backup"]);
    assert!(output.status.success());
    assert_eq!(fs::read(&path).expect("failed to re-read layout"), original);

    let _ = fs::remove_file(&path);
}
