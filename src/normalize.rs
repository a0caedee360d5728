use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("static whitespace pattern"));

/// Line classification ahead of field parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Empty,
    Comment,
    Data,
}

pub fn classify(line: &str) -> LineKind {
    let trimmed = trim_horizontal(line);
    if trimmed.is_empty() {
        LineKind::Empty
    } else if trimmed.starts_with('#') {
        LineKind::Comment
    } else {
        LineKind::Data
    }
}

pub fn trim_horizontal(text: &str) -> &str {
    text.trim_matches([' ', '\t'])
}

/// Replace every run of spaces and tabs with a single space.
pub fn collapse_horizontal_whitespace(text: &str) -> Cow<'_, str> {
    HORIZONTAL_RUN.replace_all(text, " ")
}

/// Split a table-style line (fstab) on runs of horizontal whitespace.
pub fn split_columns(line: &str) -> Vec<&str> {
    let trimmed = trim_horizontal(line);
    if trimmed.is_empty() {
        return Vec::new();
    }
    HORIZONTAL_RUN.split(trimmed).collect()
}

/// Split a name-value line on a literal separator after both sides have had
/// their whitespace collapsed, so `" = "` matches `"a\t =  b"`.
pub fn split_on_separator(line: &str, separator: &str) -> Vec<String> {
    let data = collapse_horizontal_whitespace(trim_horizontal(line));
    let separator = collapse_horizontal_whitespace(separator);
    if separator.is_empty() {
        return vec![data.into_owned()];
    }
    data.split(separator.as_ref()).map(str::to_string).collect()
}

/// Strip exactly one pair of surrounding double quotes.
pub fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_blank_and_comment_lines() {
        assert_eq!(classify(""), LineKind::Empty);
        assert_eq!(classify(" \t "), LineKind::Empty);
        assert_eq!(classify("# comment"), LineKind::Comment);
        assert_eq!(classify("   # indented"), LineKind::Comment);
        assert_eq!(classify("/dev/sda1 / ext4 rw"), LineKind::Data);
    }

    #[test]
    fn columns_ignore_mixed_whitespace() {
        assert_eq!(
            split_columns("/dev/sda1\t\t\t/mnt/point1      ext3  \t\t  rw       "),
            vec!["/dev/sda1", "/mnt/point1", "ext3", "rw"]
        );
    }

    #[test]
    fn separator_with_spaces_matches_as_token() {
        assert_eq!(
            split_on_separator("SomeOption\t\t \t\t=          \t        SomeValue", " = "),
            vec!["SomeOption", "SomeValue"]
        );
    }

    #[test]
    fn tab_separator_behaves_like_space() {
        assert_eq!(
            split_on_separator("SomeOption\tSomeValue", "\t"),
            vec!["SomeOption", "SomeValue"]
        );
    }

    #[test]
    fn strip_quotes_removes_one_pair() {
        assert_eq!(strip_quotes("\"\"x\"\""), "\"x\"");
        assert_eq!(strip_quotes("\"half"), "\"half");
        assert_eq!(strip_quotes("\""), "\"");
    }
}
