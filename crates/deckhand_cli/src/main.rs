use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use deckhand_core::core_api::{BindingVerb, ConvertDirection, Engine, Session};
use deckhand_render::{
    render_companion_summary, render_convert_summary, render_delete_summary,
    render_duplicate_summary, render_overview_json, render_overview_table, render_rename_summary,
    render_shift_summary,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum VerbArg {
    ChangePreset,
    AddLayer,
    RemoveLayer,
    HoldLayer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DirectionArg {
    ToTitles,
    ToIds,
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every action set and layer with its runtime ID
    List(ListArgs),
    /// Delete an action set together with its layers, presets, and groups
    DeleteSet(DeleteSetArgs),
    /// Copy an action layer, cloning its groups and preset entry
    DuplicateLayer(DuplicateLayerArgs),
    /// Change a set or layer title and update references to it
    Rename(RenameArgs),
    /// Insert a companion command next to every matching trigger binding
    AddCompanion(AddCompanionArgs),
    /// Add a signed offset to every layer command reference
    ShiftLayerRefs(ShiftLayerRefsArgs),
    /// Rewrite binding references between runtime IDs and titles
    Convert(ConvertArgs),
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Layout file to read
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Print the overview as JSON instead of an aligned table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct DeleteSetArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Key of the action set to delete, for example Preset_1000001
    #[arg(value_name = "SET_KEY")]
    set: String,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct DuplicateLayerArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Key of the action layer to duplicate
    #[arg(value_name = "LAYER_KEY")]
    layer: String,
    /// Title for the copy instead of deriving one from the source
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct RenameArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Key of the action set or layer to retitle
    #[arg(value_name = "SLOT_KEY")]
    key: String,
    /// Replacement title
    #[arg(value_name = "NEW_TITLE")]
    new_title: String,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct AddCompanionArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Command that marks a binding as a trigger
    #[arg(long, value_name = "VERB")]
    trigger_verb: VerbArg,
    /// Reference the trigger command must carry
    #[arg(long, value_name = "REF")]
    trigger_ref: String,
    /// Command inserted next to each trigger
    #[arg(long, value_name = "VERB")]
    companion_verb: VerbArg,
    /// Reference carried by the inserted command
    #[arg(long, value_name = "REF")]
    companion_ref: String,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ShiftLayerRefsArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Signed amount added to every layer command reference
    #[arg(long, value_name = "DELTA", allow_hyphen_values = true)]
    by: i32,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct ConvertArgs {
    /// Layout file to edit
    #[arg(value_name = "LAYOUT.JSON")]
    path: PathBuf,
    /// Rewrite direction
    #[arg(value_name = "to-titles|to-ids")]
    direction: DirectionArg,
    /// Write the result here instead of editing the layout in place
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Replace the --output file when it already exists
    #[arg(long, requires = "output")]
    force_overwrite: bool,
    /// Copy an existing --output file to <PATH>.bak before replacing it
    #[arg(long, requires = "output")]
    backup: bool,
    /// Skip the automatic backup taken before an in-place edit
    #[arg(long, conflicts_with = "output")]
    no_backup: bool,
    /// Apply the edit in memory and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Print the change report as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::List(args) => run_list(args),
        Commands::DeleteSet(args) => run_delete_set(args),
        Commands::DuplicateLayer(args) => run_duplicate_layer(args),
        Commands::Rename(args) => run_rename(args),
        Commands::AddCompanion(args) => run_add_companion(args),
        Commands::ShiftLayerRefs(args) => run_shift_layer_refs(args),
        Commands::Convert(args) => run_convert(args),
    };
    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_list(args: ListArgs) -> Result<(), String> {
    let session = open_layout(&args.path)?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&render_overview_json(session.snapshot()))
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_overview_table(session.snapshot()));
    Ok(())
}

fn run_delete_set(args: DeleteSetArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session
        .delete_action_set(&args.set)
        .map_err(|e| e.to_string())?;
    for note in &report.notes {
        eprintln!("Warning: {note}");
    }
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "delete",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_delete_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

fn run_duplicate_layer(args: DuplicateLayerArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session
        .duplicate_layer(&args.layer, args.title.as_deref())
        .map_err(|e| e.to_string())?;
    for note in &report.notes {
        eprintln!("Warning: {note}");
    }
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "duplicate",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_duplicate_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

fn run_rename(args: RenameArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session
        .rename_slot(&args.key, &args.new_title)
        .map_err(|e| e.to_string())?;
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "rename",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_rename_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

fn run_add_companion(args: AddCompanionArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session
        .insert_companion(
            to_core_verb(args.trigger_verb),
            &args.trigger_ref,
            to_core_verb(args.companion_verb),
            &args.companion_ref,
        )
        .map_err(|e| e.to_string())?;
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "companion",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_companion_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

fn run_shift_layer_refs(args: ShiftLayerRefsArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session.shift_layer_refs(args.by).map_err(|e| e.to_string())?;
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "shift",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_shift_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let mut session = open_layout(&args.path)?;
    let report = session
        .convert_refs(to_core_direction(args.direction))
        .map_err(|e| e.to_string())?;
    for note in &report.notes {
        eprintln!("Warning: {note}");
    }
    let outcome = write_layout(
        &session,
        &WriteOptions {
            input: &args.path,
            output: args.output.as_deref(),
            force_overwrite: args.force_overwrite,
            backup: args.backup,
            no_backup: args.no_backup,
            dry_run: args.dry_run,
            op: "convert",
        },
    )?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error rendering JSON output: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }
    print!("{}", render_convert_summary(&report));
    report_outcome(&outcome);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

struct WriteOptions<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    force_overwrite: bool,
    backup: bool,
    no_backup: bool,
    dry_run: bool,
    op: &'a str,
}

enum WriteOutcome {
    DryRun,
    Wrote {
        path: PathBuf,
        backup: Option<PathBuf>,
    },
}

fn write_layout(session: &Session, opts: &WriteOptions<'_>) -> Result<WriteOutcome, String> {
    if opts.dry_run {
        return Ok(WriteOutcome::DryRun);
    }
    let bytes = session.to_bytes();
    match opts.output {
        Some(out_path) => {
            let mut backup = None;
            if out_path.exists() {
                if !opts.force_overwrite {
                    return Err(format!(
                        "refusing to overwrite existing file {}; pass --force-overwrite",
                        out_path.display()
                    ));
                }
                if opts.backup {
                    let backup_path = appended_extension(out_path, "bak");
                    fs::copy(out_path, &backup_path).map_err(|e| {
                        format!("Error creating backup {}: {e}", backup_path.display())
                    })?;
                    backup = Some(backup_path);
                }
            }
            fs::write(out_path, &bytes)
                .map_err(|e| format!("Error writing {}: {e}", out_path.display()))?;
            Ok(WriteOutcome::Wrote {
                path: out_path.to_path_buf(),
                backup,
            })
        }
        None => {
            let mut backup = None;
            if !opts.no_backup {
                let backup_path = backup_path_for(opts.input, opts.op);
                fs::copy(opts.input, &backup_path).map_err(|e| {
                    format!("Error creating backup {}: {e}", backup_path.display())
                })?;
                backup = Some(backup_path);
            }
            fs::write(opts.input, &bytes)
                .map_err(|e| format!("Error writing {}: {e}", opts.input.display()))?;
            Ok(WriteOutcome::Wrote {
                path: opts.input.to_path_buf(),
                backup,
            })
        }
    }
}

fn backup_path_for(input: &Path, op: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layout");
    input.with_file_name(format!("{stem}_backup_before_{op}.json"))
}

fn appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn report_outcome(outcome: &WriteOutcome) {
    match outcome {
        WriteOutcome::DryRun => println!("Dry run: no files written"),
        WriteOutcome::Wrote { path, backup } => {
            if let Some(backup) = backup {
                println!("Backup saved to {}", backup.display());
            }
            println!("Wrote edited layout to {}", path.display());
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_layout(path: &Path) -> Result<Session, String> {
    let bytes = fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let engine = Engine::new();
    engine
        .open_bytes(bytes)
        .map_err(|e| format!("Error opening {}: {e}", path.display()))
}

fn to_core_verb(verb: VerbArg) -> BindingVerb {
    match verb {
        VerbArg::ChangePreset => BindingVerb::ChangePreset,
        VerbArg::AddLayer => BindingVerb::AddLayer,
        VerbArg::RemoveLayer => BindingVerb::RemoveLayer,
        VerbArg::HoldLayer => BindingVerb::HoldLayer,
    }
}

fn to_core_direction(direction: DirectionArg) -> ConvertDirection {
    match direction {
        DirectionArg::ToTitles => ConvertDirection::ToTitles,
        DirectionArg::ToIds => ConvertDirection::ToIds,
    }
}
