use similar::{ChangeTag, TextDiff};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Line diff of a pending change, grouped with `context` unchanged lines.
pub fn render_diff(old: &str, new: &str, context: usize, colorize: bool) -> String {
    let diff = TextDiff::configure()
        .algorithm(similar::Algorithm::Myers)
        .diff_lines(old, new);

    let mut out = String::new();
    for (idx, group) in diff.grouped_ops(context).iter().enumerate() {
        if idx > 0 {
            out.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (marker, color) = match change.tag() {
                    ChangeTag::Delete => ("- ", RED),
                    ChangeTag::Insert => ("+ ", GREEN),
                    ChangeTag::Equal => ("  ", ""),
                };
                let line = change.to_string_lossy();
                let line = line.trim_end_matches('\n');
                if colorize && !color.is_empty() {
                    out.push_str(&format!("{color}{marker}{line}{RESET}\n"));
                } else {
                    out.push_str(&format!("{marker}{line}\n"));
                }
            }
        }
    }
    out
}

/// Short `+added -removed` summary for logs.
pub fn summarize_lines(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut added = 0usize;
    let mut removed = 0usize;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    format!("+{added} -{removed}")
}
