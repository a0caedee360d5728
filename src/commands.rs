use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use fsedit::logging::{ChangeLogEntry, record_change};
use fsedit::{Fstab, FstabEntry, Layout, LineFile, NameValueFile, NameValueLayout, backup, diff};
use serde::Deserialize;
use serde_json::json;

use crate::mount::MountControl;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub check: bool,
    pub no_backup: bool,
    pub diff: bool,
    pub context: usize,
    pub colorize: bool,
    pub json: bool,
    pub change_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Applied,
    Check,
    NoOp,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Applied => "applied",
            Action::Check => "check",
            Action::NoOp => "no-op",
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub command: &'static str,
    pub path: PathBuf,
    pub action: Action,
    pub backup: Option<PathBuf>,
    pub detail: String,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        self.action != Action::NoOp
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetlineOptions {
    pub file: PathBuf,
    pub name: String,
    pub value: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub compare_values: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountOptions {
    pub filesystem: String,
    pub mount_point: String,
    #[serde(rename = "type")]
    pub fs_type: String,
    #[serde(default = "default_fstab")]
    pub fstab: PathBuf,
    #[serde(default = "default_mount_options")]
    pub options: String,
    #[serde(default)]
    pub dump: Option<u32>,
    #[serde(default)]
    pub pass: Option<u32>,
    #[serde(default)]
    pub skip_mount: bool,
}

pub fn default_separator() -> String {
    " ".to_string()
}

pub fn default_fstab() -> PathBuf {
    PathBuf::from("/etc/fstab")
}

pub fn default_mount_options() -> String {
    "defaults".to_string()
}

struct Commit {
    action: Action,
    backup: Option<PathBuf>,
    detail: String,
}

pub fn run_setline(opts: &SetlineOptions, run: &RunOptions) -> Result<Outcome> {
    if !opts.file.exists() {
        bail!("the file {} does not exist", opts.file.display());
    }
    let layout = NameValueLayout::new(opts.separator.clone()).compare_by_value(opts.compare_values);
    let mut file = NameValueFile::open_name_value(&opts.file, layout)
        .with_context(|| format!("cannot set a line in {}", opts.file.display()))?;
    file.set_line(&opts.name, &opts.value)
        .with_context(|| format!("cannot set a line in {}", opts.file.display()))?;

    let commit = commit(&mut file, run)?;
    let line = format!("{}{}{}", opts.name, opts.separator, opts.value);
    match commit.action {
        Action::NoOp => println!("{} already has the line \"{line}\"", opts.file.display()),
        Action::Check => println!("check: would set \"{line}\" in {}", opts.file.display()),
        Action::Applied => println!("set \"{line}\" in {}", opts.file.display()),
    }
    Ok(Outcome {
        command: "setline",
        path: opts.file.clone(),
        action: commit.action,
        backup: commit.backup,
        detail: commit.detail,
    })
}

pub fn run_mount(
    opts: &MountOptions,
    run: &RunOptions,
    control: &dyn MountControl,
) -> Result<Outcome> {
    let context = || format!("cannot add an entry to the fstab file {}", opts.fstab.display());
    let mut entry = FstabEntry::new(&opts.filesystem, &opts.mount_point, &opts.fs_type)
        .options(&opts.options);
    if let Some(dump) = opts.dump {
        entry = entry.dump(dump);
    }
    if let Some(pass) = opts.pass {
        entry = entry.pass(pass);
    }
    let mut fstab = Fstab::open_fstab(&opts.fstab).with_context(context)?;
    fstab.add_entry(&entry).with_context(context)?;

    let commit = commit(&mut fstab, run)?;
    let entry_changed = commit.action != Action::NoOp;
    let entry_label = format!("{} {}", opts.filesystem, opts.mount_point);
    match commit.action {
        Action::NoOp => println!(
            "{} already has the entry \"{entry_label}\"",
            opts.fstab.display()
        ),
        Action::Check => println!("check: would update \"{entry_label}\" in {}", opts.fstab.display()),
        Action::Applied => println!("updated \"{entry_label}\" in {}", opts.fstab.display()),
    }

    let mut detail = commit.detail;
    let mount_changed = if opts.skip_mount {
        println!("skipping mount of {}", opts.mount_point);
        false
    } else {
        let step = sync_mount(&opts.mount_point, entry_changed, run.check, control)?;
        if let Some(step) = step {
            if detail.is_empty() {
                detail = step.to_string();
            } else {
                detail = format!("{detail}; {step}");
            }
        }
        step.is_some()
    };

    let action = if !entry_changed && !mount_changed {
        Action::NoOp
    } else if run.check {
        Action::Check
    } else {
        Action::Applied
    };
    Ok(Outcome {
        command: "mount",
        path: opts.fstab.clone(),
        action,
        backup: commit.backup,
        detail,
    })
}

/// Bring the mount point in line with its fstab entry. Returns the step
/// taken (or predicted, in check mode), if any.
fn sync_mount(
    mount_point: &str,
    entry_changed: bool,
    check: bool,
    control: &dyn MountControl,
) -> Result<Option<&'static str>> {
    let mounted = control
        .is_mounted(mount_point)
        .with_context(|| format!("cannot tell whether {mount_point} is mounted"))?;
    match (mounted, entry_changed) {
        (true, false) => {
            println!("{mount_point} is mounted and its entry is unchanged");
            Ok(None)
        }
        (true, true) => {
            if check {
                println!("check: would remount {mount_point}");
            } else {
                println!("entry changed; remounting {mount_point}");
                control.umount(mount_point)?;
                control.mount(mount_point)?;
            }
            Ok(Some("remount"))
        }
        (false, _) => {
            if check {
                println!("check: would mount {mount_point}");
            } else {
                println!("mounting {mount_point}");
                control.mount(mount_point)?;
            }
            Ok(Some("mount"))
        }
    }
}

fn commit<L: Layout>(session: &mut LineFile<L>, run: &RunOptions) -> Result<Commit> {
    let path = session.path().to_path_buf();
    let Some(new_text) = session.render()? else {
        return Ok(Commit {
            action: Action::NoOp,
            backup: None,
            detail: String::new(),
        });
    };
    let old_text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let detail = diff::summarize_lines(&old_text, &new_text);
    if run.diff {
        println!("--- preview: {} ---", path.display());
        print!(
            "{}",
            diff::render_diff(&old_text, &new_text, run.context, run.colorize)
        );
    }
    if run.check {
        return Ok(Commit {
            action: Action::Check,
            backup: None,
            detail,
        });
    }

    let backup = if run.no_backup {
        None
    } else {
        let target = backup::free_backup_path(&path, backup::now());
        session.backup(&target)?;
        println!("backup saved: {} -> {}", path.display(), target.display());
        Some(target)
    };
    session.finish()?;
    Ok(Commit {
        action: Action::Applied,
        backup,
        detail,
    })
}

/// Log the outcome to the change log and, with `--json`, as an event.
pub fn report(outcome: &Outcome, run: &RunOptions) {
    if let Some(log_path) = &run.change_log {
        let entry = ChangeLogEntry::now(
            outcome.command,
            &outcome.path,
            outcome.action.label(),
            &outcome.detail,
        );
        if let Err(err) = record_change(log_path, &entry) {
            eprintln!(
                "warning: could not write change log {}: {err}",
                log_path.display()
            );
        }
    }
    if run.json {
        println!("{}", json_event(outcome));
    }
}

fn json_event(outcome: &Outcome) -> serde_json::Value {
    json!({
        "command": outcome.command,
        "path": outcome.path.display().to_string(),
        "action": outcome.action.label(),
        "changed": outcome.changed(),
        "backup": outcome.backup.as_ref().map(|p| p.display().to_string()),
        "detail": outcome.detail,
    })
}
