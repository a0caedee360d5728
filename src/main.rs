use std::io;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use is_terminal::IsTerminal;

mod batch;
mod commands;
mod mount;

use commands::{
    MountOptions, Outcome, RunOptions, SetlineOptions, default_mount_options, report, run_mount,
    run_setline,
};
use mount::SystemMount;

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn should_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Setline(cmd) => handle_setline(cmd),
        Command::Mount(cmd) => handle_mount(cmd),
        Command::Batch(cmd) => handle_batch(cmd),
    }
}

fn handle_setline(cmd: SetlineCommand) -> Result<()> {
    let run = cmd.common.run_options();
    let opts = SetlineOptions {
        file: cmd.file,
        name: cmd.name,
        value: cmd.value,
        separator: cmd.separator,
        compare_values: cmd.compare_values,
    };
    let outcome = run_setline(&opts, &run)?;
    finish_command(&outcome, &run);
    Ok(())
}

fn handle_mount(cmd: MountCommand) -> Result<()> {
    let run = cmd.common.run_options();
    let opts = MountOptions {
        filesystem: cmd.filesystem,
        mount_point: cmd.mount_point,
        fs_type: cmd.fs_type,
        fstab: cmd.fstab,
        options: cmd.options,
        dump: cmd.dump,
        pass: cmd.pass,
        skip_mount: cmd.skip_mount,
    };
    let outcome = run_mount(&opts, &run, &SystemMount)?;
    finish_command(&outcome, &run);
    Ok(())
}

fn handle_batch(cmd: BatchCommand) -> Result<()> {
    let run = cmd.common.run_options();
    let plan = batch::load_plan(&cmd.plan)?;
    if plan.steps.is_empty() {
        bail!("plan {} does not contain any steps", cmd.plan.display());
    }
    let mut stats = CommandStats::default();
    let total = plan.steps.len();
    for (idx, step) in plan.steps.iter().enumerate() {
        println!("\n=== Batch Step {}/{}: {} ===", idx + 1, total, step.kind());
        let outcome = match step {
            batch::PlanEntry::Setline(opts) => run_setline(opts, &run)?,
            batch::PlanEntry::Mount(opts) => run_mount(opts, &run, &SystemMount)?,
        };
        report(&outcome, &run);
        stats.count(&outcome);
    }
    stats.print("batch");
    println!("changed: {}", stats.changed());
    Ok(())
}

fn finish_command(outcome: &Outcome, run: &RunOptions) {
    report(outcome, run);
    println!("changed: {}", outcome.changed());
}

#[derive(Default)]
struct CommandStats {
    applied: usize,
    check: usize,
    no_op: usize,
}

impl CommandStats {
    fn count(&mut self, outcome: &Outcome) {
        match outcome.action {
            commands::Action::Applied => self.applied += 1,
            commands::Action::Check => self.check += 1,
            commands::Action::NoOp => self.no_op += 1,
        }
    }

    fn changed(&self) -> bool {
        self.applied + self.check > 0
    }

    fn print(&self, label: &str) {
        println!(
            "{label} summary: applied={}, check={}, no-op={}",
            self.applied, self.check, self.no_op
        );
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "fsedit",
    version,
    about = "Idempotent edits to fstab and name/value config files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ensure a `name value` line is present in a config file.
    Setline(SetlineCommand),
    /// Ensure an fstab entry is present and the file system is mounted.
    Mount(MountCommand),
    /// Run setline and mount steps from a YAML or JSON plan.
    Batch(BatchCommand),
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Report what would change without writing or mounting anything.
    #[arg(long, action = ArgAction::SetTrue)]
    check: bool,
    #[arg(long = "no-backup", action = ArgAction::SetTrue)]
    no_backup: bool,
    /// Print a line diff of each pending change.
    #[arg(long, action = ArgAction::SetTrue)]
    diff: bool,
    #[arg(long, default_value_t = 3)]
    context: usize,
    #[arg(long = "color", value_enum, default_value = "auto")]
    color: ColorChoice,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Append one JSONL record per command outcome to FILE.
    #[arg(long = "change-log", value_name = "FILE", value_hint = ValueHint::FilePath)]
    change_log: Option<PathBuf>,
}

impl CommonArgs {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            check: self.check,
            no_backup: self.no_backup,
            diff: self.diff,
            context: self.context,
            colorize: self.color.should_color(),
            json: self.json,
            change_log: self.change_log.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct SetlineCommand {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    file: PathBuf,
    #[arg(value_name = "NAME")]
    name: String,
    #[arg(value_name = "VALUE")]
    value: String,
    /// Text between name and value, e.g. " = ".
    #[arg(short, long, default_value = " ", allow_hyphen_values = true)]
    separator: String,
    /// Match existing lines by value instead of by name.
    #[arg(short = 'm', long = "compare-values", action = ArgAction::SetTrue)]
    compare_values: bool,
}

#[derive(Debug, Args)]
struct MountCommand {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(value_name = "FILESYSTEM")]
    filesystem: String,
    #[arg(value_name = "MOUNT_POINT")]
    mount_point: String,
    #[arg(value_name = "TYPE")]
    fs_type: String,
    #[arg(long, default_value = "/etc/fstab", value_hint = ValueHint::FilePath)]
    fstab: PathBuf,
    #[arg(short, long, default_value_t = default_mount_options())]
    options: String,
    #[arg(short, long, value_name = "N")]
    dump: Option<u32>,
    #[arg(short, long, value_name = "N")]
    pass: Option<u32>,
    /// Only edit fstab; leave the mount state alone.
    #[arg(long = "skip-mount", action = ArgAction::SetTrue)]
    skip_mount: bool,
}

#[derive(Debug, Args)]
struct BatchCommand {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(value_name = "PLAN", value_hint = ValueHint::FilePath)]
    plan: PathBuf,
}
