use std::path::Path;

use crate::error::EditError;
use crate::file::LineFile;
use crate::layout::{Field, Layout};
use crate::normalize::split_columns;
use crate::record::Record;

const MIN_COLUMNS: usize = 4;
const DEFAULT_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FstabField {
    FileSystem,
    MountPoint,
    FileSystemType,
    Options,
    Dump,
    Pass,
}

impl Field for FstabField {
    const ALL: &'static [Self] = &[
        FstabField::FileSystem,
        FstabField::MountPoint,
        FstabField::FileSystemType,
        FstabField::Options,
        FstabField::Dump,
        FstabField::Pass,
    ];

    fn position(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            FstabField::FileSystem => "fileSystem",
            FstabField::MountPoint => "mountPoint",
            FstabField::FileSystemType => "fileSystemType",
            FstabField::Options => "options",
            FstabField::Dump => "dump",
            FstabField::Pass => "pass",
        }
    }
}

impl FstabField {
    fn is_numeric(self) -> bool {
        matches!(self, FstabField::Dump | FstabField::Pass)
    }
}

/// `/etc/fstab` table: six whitespace-separated columns, the last two
/// optional, keyed by file system and mount point.
#[derive(Debug, Clone)]
pub struct FstabLayout {
    separator: String,
}

impl Default for FstabLayout {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl FstabLayout {
    /// Separator used when rendering changed or new lines. Parsing always
    /// accepts any mix of spaces and tabs.
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Layout for FstabLayout {
    type Field = FstabField;

    const MIN_FIELDS: usize = MIN_COLUMNS;

    fn separator(&self) -> &str {
        &self.separator
    }

    fn parse_fields(&self, line: &str) -> Result<Vec<Option<String>>, EditError> {
        let columns = split_columns(line);
        if columns.len() < Self::MIN_FIELDS {
            return Err(EditError::malformed(
                line,
                format!("expected a well-formed line of {MIN_COLUMNS} or more fields"),
            ));
        }

        let mut values = Vec::with_capacity(FstabField::ALL.len());
        for field in FstabField::ALL {
            let Some(column) = columns.get(field.position()) else {
                values.push(None);
                continue;
            };
            if field.is_numeric() {
                let number = parse_count(column).map_err(|reason| {
                    EditError::malformed(line, format!("\"{}\" {reason}", field.name()))
                })?;
                values.push(Some(number.to_string()));
            } else {
                values.push(Some((*column).to_string()));
            }
        }
        Ok(values)
    }

    fn key_fields(&self) -> Vec<FstabField> {
        vec![FstabField::FileSystem, FstabField::MountPoint]
    }

    fn default_value(&self, field: FstabField) -> Option<&'static str> {
        field.is_numeric().then_some("0")
    }

    fn check_value(&self, field: FstabField, value: &str) -> Result<String, EditError> {
        if field.is_numeric() {
            return parse_count(value)
                .map(|number| number.to_string())
                .map_err(|reason| EditError::invalid(field.name(), value, reason));
        }
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(EditError::invalid(
                field.name(),
                value,
                "not a non-empty string without whitespace",
            ));
        }
        Ok(value.to_string())
    }
}

fn parse_count(value: &str) -> Result<u32, &'static str> {
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err("is not numeric");
    }
    value.parse().map_err(|_| "is out of range")
}

/// Desired state of one fstab entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    pub file_system: String,
    pub mount_point: String,
    pub file_system_type: String,
    pub options: String,
    pub dump: Option<u32>,
    pub pass: Option<u32>,
}

impl FstabEntry {
    pub fn new(
        file_system: impl Into<String>,
        mount_point: impl Into<String>,
        file_system_type: impl Into<String>,
    ) -> Self {
        Self {
            file_system: file_system.into(),
            mount_point: mount_point.into(),
            file_system_type: file_system_type.into(),
            options: "defaults".to_string(),
            dump: None,
            pass: None,
        }
    }

    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    pub fn dump(mut self, dump: u32) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn pass(mut self, pass: u32) -> Self {
        self.pass = Some(pass);
        self
    }

    /// Build the record to upsert. Dump and pass are only given when
    /// requested; a new line still renders their defaults.
    pub fn to_record(&self, layout: &FstabLayout) -> Result<Record<FstabLayout>, EditError> {
        let mut record = Record::new(layout.clone());
        record
            .set(FstabField::FileSystem, &self.file_system)?
            .set(FstabField::MountPoint, &self.mount_point)?
            .set(FstabField::FileSystemType, &self.file_system_type)?
            .set(FstabField::Options, &self.options)?;
        if let Some(dump) = self.dump {
            record.set(FstabField::Dump, &dump.to_string())?;
        }
        if let Some(pass) = self.pass {
            record.set(FstabField::Pass, &pass.to_string())?;
        }
        Ok(record)
    }
}

pub type Fstab = LineFile<FstabLayout>;

impl LineFile<FstabLayout> {
    pub fn open_fstab(path: impl AsRef<Path>) -> Result<Self, EditError> {
        LineFile::open(path, FstabLayout::default())
    }

    /// Queue a new entry, or an update to the entry with the same file
    /// system and mount point.
    pub fn add_entry(&mut self, entry: &FstabEntry) -> Result<&mut Self, EditError> {
        let record = entry.to_record(self.layout())?;
        self.upsert(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(line: &str) -> Record<FstabLayout> {
        Record::parse(line, FstabLayout::default()).expect("parse line")
    }

    fn values(record: &Record<FstabLayout>) -> Vec<Option<&str>> {
        FstabField::ALL
            .iter()
            .map(|field| record.field(*field))
            .collect()
    }

    #[test]
    fn key_is_file_system_and_mount_point() {
        let record = parse("/dev/sda1 /mnt/point ext3 rw 1 2");
        assert_eq!(
            FstabLayout::default().key_of(&record),
            vec![Some("/dev/sda1".to_string()), Some("/mnt/point".to_string())]
        );
    }

    #[test]
    fn parses_minimum_and_optional_columns() {
        assert_eq!(
            values(&parse("/dev/sda1 /mnt/point1 ext3 rw")),
            vec![Some("/dev/sda1"), Some("/mnt/point1"), Some("ext3"), Some("rw"), None, None]
        );
        assert_eq!(
            values(&parse("/dev/sda1 /mnt/point1 ext3 rw 1")),
            vec![Some("/dev/sda1"), Some("/mnt/point1"), Some("ext3"), Some("rw"), Some("1"), None]
        );
        assert_eq!(
            values(&parse("/dev/sda1\t\t\t/mnt/point1      ext3  \t\t  rw 1 1   ")),
            vec![
                Some("/dev/sda1"),
                Some("/mnt/point1"),
                Some("ext3"),
                Some("rw"),
                Some("1"),
                Some("1")
            ]
        );
    }

    #[test]
    fn rejects_short_and_non_numeric_lines() {
        let short = Record::parse("/dev/sda1 /mnt/point1 ext3", FstabLayout::default());
        assert!(matches!(short, Err(EditError::MalformedLine { .. })));

        let dump = Record::parse("/dev/sda1 /mnt/point1 ext3 rw x", FstabLayout::default())
            .expect_err("dump must be numeric");
        assert!(dump.to_string().contains("\"dump\" is not numeric"));

        let pass = Record::parse("/dev/sda1 /mnt/point1 ext3 rw 0 x", FstabLayout::default())
            .expect_err("pass must be numeric");
        assert!(pass.to_string().contains("\"pass\" is not numeric"));
    }

    #[test]
    fn oversized_counts_are_out_of_range() {
        let huge = "99999999999999999999";
        let err = Record::parse(
            &format!("/dev/sda1 /mnt/point1 ext3 rw {huge} 0"),
            FstabLayout::default(),
        )
        .expect_err("dump overflows");
        assert!(err.to_string().contains("\"dump\" is out of range"));

        let err = Record::new(FstabLayout::default())
            .with(FstabField::Pass, huge)
            .expect_err("pass overflows");
        assert!(err.to_string().contains("is out of range"));
    }

    #[test]
    fn setters_validate_values() {
        let mut record = Record::new(FstabLayout::default());
        for (field, value) in [
            (FstabField::FileSystem, ""),
            (FstabField::MountPoint, "/mnt/with space"),
            (FstabField::FileSystemType, ""),
            (FstabField::Options, ""),
            (FstabField::Dump, ""),
            (FstabField::Dump, "z"),
            (FstabField::Pass, "-1"),
        ] {
            let err = record.set(field, value).expect_err("invalid value");
            assert!(matches!(err, EditError::InvalidFieldValue { .. }));
        }
    }

    #[test]
    fn defaults_do_not_fill_unset_columns() {
        let mut record = parse("/dev/sda1 /mnt/point ext3 rw");
        record
            .set(FstabField::Dump, "0")
            .unwrap()
            .set(FstabField::Pass, "0")
            .unwrap();
        assert!(!record.changed());
        assert_eq!(record.field(FstabField::Dump), None);
    }

    #[test]
    fn default_replacing_explicit_value_is_a_change() {
        let mut record = parse("/dev/sda1 /mnt/point ext3 rw 1 1");
        record.set(FstabField::Dump, "0").unwrap();
        assert!(record.changed());
        assert_eq!(record.render(), "/dev/sda1 /mnt/point ext3 rw 0 1");
    }

    #[test]
    fn values_equal_to_originals_and_defaults_are_ignored() {
        let mut record = parse("/dev/sda1 /mnt/point ext3 rw 0 0");
        record
            .set(FstabField::Dump, "0")
            .unwrap()
            .set(FstabField::Pass, "0")
            .unwrap();
        assert!(!record.changed());
    }

    #[test]
    fn new_entry_renders_default_counts() {
        let record = FstabEntry::new("/dev/sdb1", "/mnt/point2", "ext4")
            .options("rw,remount")
            .to_record(&FstabLayout::default())
            .unwrap();
        assert_eq!(record.render(), "/dev/sdb1 /mnt/point2 ext4 rw,remount 0 0");
    }

    #[test]
    fn add_entry_updates_options_in_place() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("fstab");
        fs::write(&path, "/dev/sda1 /mnt/point1 ext3 rw 1 2\n").expect("seed fstab");

        let mut fstab = Fstab::open_fstab(&path).expect("open fstab");
        fstab
            .add_entry(
                &FstabEntry::new("/dev/sda1", "/mnt/point1", "ext3")
                    .options("ro")
                    .dump(1)
                    .pass(2),
            )
            .expect("add entry");
        assert!(fstab.changed());
        fstab.finish().expect("finish");

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "/dev/sda1 /mnt/point1 ext3 ro 1 2\n"
        );
    }

    #[test]
    fn add_entry_without_counts_keeps_existing_counts() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("fstab");
        fs::write(&path, "/dev/sda1 /mnt/point1 ext3 defaults 1 2\n").expect("seed fstab");

        let mut fstab = Fstab::open_fstab(&path).expect("open fstab");
        fstab
            .add_entry(&FstabEntry::new("/dev/sda1", "/mnt/point1", "ext3"))
            .expect("add entry");
        assert!(!fstab.changed());
    }
}
