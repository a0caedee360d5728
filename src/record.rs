use std::fmt;

use crate::error::EditError;
use crate::layout::{Field, Layout};
use crate::normalize::{LineKind, classify};

/// Where a record sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Nothing parsed and nothing given.
    Unset,
    /// A blank or comment line.
    NotData,
    /// A parsed data line with no effective changes.
    Unchanged,
    /// A parsed data line with at least one field delta.
    Changed,
    /// Built from given fields only; will be appended.
    New,
}

/// One logical line of a structured file.
///
/// Values live in fixed positional slots, one per field of the layout, so
/// rendering walks the layout's field order instead of any map ordering.
#[derive(Debug, Clone)]
pub struct Record<L: Layout> {
    layout: L,
    original_raw: Option<String>,
    original: Vec<Option<String>>,
    /// Given values in the form a parse would read back.
    given: Vec<Option<String>>,
    /// Given values as the caller spelled them; this is what gets rendered.
    written: Vec<Option<String>>,
}

impl<L: Layout> Record<L> {
    pub fn new(layout: L) -> Self {
        let slots = L::Field::ALL.len();
        Self {
            layout,
            original_raw: None,
            original: vec![None; slots],
            given: vec![None; slots],
            written: vec![None; slots],
        }
    }

    /// Parse a source line (without its `\n`). Blank and comment lines are
    /// kept as non-data records.
    pub fn parse(raw: &str, layout: L) -> Result<Self, EditError> {
        let mut record = Self::new(layout);
        let line = raw.trim_end();
        if classify(line) == LineKind::Data {
            let mut parsed = record.layout.parse_fields(line)?;
            parsed.resize(record.original.len(), None);
            record.original = parsed;
        }
        record.original_raw = Some(raw.to_string());
        Ok(record)
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Assign a field. Assignments that would not change the line are
    /// dropped, along with any delta previously stored for the field.
    pub fn set(&mut self, field: L::Field, value: &str) -> Result<&mut Self, EditError> {
        let written = self.layout.check_value(field, value)?;
        let canonical = self.layout.canonical_value(field, &written);
        self.assign(field, canonical, written);
        Ok(self)
    }

    fn assign(&mut self, field: L::Field, canonical: String, written: String) {
        let slot = field.position();
        let keep = !self.is_data()
            || should_store(
                self.original[slot].as_deref(),
                self.layout.default_value(field),
                &canonical,
            );
        if keep {
            self.given[slot] = Some(canonical);
            self.written[slot] = Some(written);
        } else {
            self.given[slot] = None;
            self.written[slot] = None;
        }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: L::Field, value: &str) -> Result<Self, EditError> {
        self.set(field, value)?;
        Ok(self)
    }

    /// The given value if any, else the original value.
    pub fn field(&self, field: L::Field) -> Option<&str> {
        let slot = field.position();
        self.given[slot]
            .as_deref()
            .or(self.original[slot].as_deref())
    }

    pub fn is_data(&self) -> bool {
        self.original.iter().any(Option::is_some)
    }

    pub(crate) fn has_given(&self) -> bool {
        self.given.iter().any(Option::is_some)
    }

    pub fn changed(&self) -> bool {
        self.is_data() && self.has_given()
    }

    pub fn state(&self) -> RecordState {
        match (self.is_data(), self.has_given(), self.original_raw.is_some()) {
            (true, true, _) => RecordState::Changed,
            (true, false, _) => RecordState::Unchanged,
            (false, _, true) => RecordState::NotData,
            (false, true, false) => RecordState::New,
            (false, false, false) => RecordState::Unset,
        }
    }

    /// Copy every given value onto `target`, which applies its own no-op
    /// suppression.
    pub fn merge_into(&self, target: &mut Record<L>) {
        for field in L::Field::ALL {
            let slot = field.position();
            if let (Some(canonical), Some(written)) = (&self.given[slot], &self.written[slot]) {
                target.assign(*field, canonical.clone(), written.clone());
            }
        }
    }

    pub fn render(&self) -> String {
        let has_given = self.has_given();
        if self.is_data() && has_given {
            return self.join_slots(false);
        }
        if let Some(raw) = &self.original_raw {
            return match classify(raw) {
                LineKind::Empty => String::new(),
                _ => raw.clone(),
            };
        }
        if has_given {
            return self.join_slots(true);
        }
        String::new()
    }

    /// Overlay given values on original ones in field order. A brand-new
    /// line takes defaults for unset fields; an updated line only takes them
    /// to fill a gap before a later set field.
    fn join_slots(&self, fresh: bool) -> String {
        let mut slots: Vec<Option<&str>> = L::Field::ALL
            .iter()
            .map(|field| {
                let slot = field.position();
                let value = self.written[slot]
                    .as_deref()
                    .or(self.original[slot].as_deref());
                if fresh {
                    value.or(self.layout.default_value(*field))
                } else {
                    value
                }
            })
            .collect();
        while matches!(slots.last(), Some(None)) {
            slots.pop();
        }
        let values: Vec<&str> = L::Field::ALL
            .iter()
            .zip(slots)
            .map(|(field, value)| {
                value
                    .or(self.layout.default_value(*field))
                    .unwrap_or_default()
            })
            .collect();
        values.join(self.layout.separator())
    }
}

impl<L: Layout> fmt::Display for Record<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Decide whether an assignment to a field of a parsed line is a real delta.
///
/// | given vs original | given vs default | store |
/// |---|---|---|
/// | equal | any | no |
/// | differs from a set original | any | yes |
/// | original unset | equal | no |
/// | original unset | differs | yes |
pub fn should_store(original: Option<&str>, default: Option<&str>, given: &str) -> bool {
    match original {
        Some(original) => original != given,
        None => default != Some(given),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fstab::{FstabField, FstabLayout};
    use crate::name_value::{NameValueField, NameValueLayout};

    #[test]
    fn decision_table_covers_every_branch() {
        assert!(!should_store(Some("1"), Some("0"), "1"));
        assert!(should_store(Some("1"), Some("0"), "0"));
        assert!(!should_store(None, Some("0"), "0"));
        assert!(should_store(None, Some("0"), "2"));
        assert!(should_store(None, None, "x"));
        assert!(should_store(Some("rw"), None, "ro"));
    }

    #[test]
    fn states_follow_record_lifecycle() {
        let layout = FstabLayout::default();
        assert_eq!(Record::new(layout.clone()).state(), RecordState::Unset);
        assert_eq!(
            Record::parse("# comment", layout.clone()).unwrap().state(),
            RecordState::NotData
        );
        assert_eq!(
            Record::parse("", layout.clone()).unwrap().state(),
            RecordState::NotData
        );

        let mut parsed = Record::parse("/dev/sda1 /mnt ext4 rw", layout.clone()).unwrap();
        assert_eq!(parsed.state(), RecordState::Unchanged);
        parsed.set(FstabField::Options, "ro").unwrap();
        assert_eq!(parsed.state(), RecordState::Changed);
        parsed.set(FstabField::Options, "rw").unwrap();
        assert_eq!(parsed.state(), RecordState::Unchanged);

        let fresh = Record::new(layout)
            .with(FstabField::FileSystem, "/dev/sdb1")
            .unwrap();
        assert_eq!(fresh.state(), RecordState::New);
    }

    #[test]
    fn unchanged_data_line_renders_raw_bytes() {
        let raw = "/dev/sda1\t\t/mnt   ext4 rw";
        let record = Record::parse(raw, FstabLayout::default()).unwrap();
        assert_eq!(record.render(), raw);
    }

    #[test]
    fn whitespace_only_line_renders_empty() {
        let record = Record::parse(" \t ", FstabLayout::default()).unwrap();
        assert_eq!(record.render(), "");
    }

    #[test]
    fn updated_line_fills_gap_before_later_field() {
        let mut record = Record::parse("/dev/sda1 /mnt ext4 rw", FstabLayout::default()).unwrap();
        record.set(FstabField::Pass, "2").unwrap();
        assert_eq!(record.render(), "/dev/sda1 /mnt ext4 rw 0 2");
    }

    #[test]
    fn given_equal_to_original_is_discarded() {
        let layout = NameValueLayout::default();
        let mut record = Record::parse("timeout 30", layout).unwrap();
        record.set(NameValueField::Value, "60").unwrap();
        assert!(record.changed());
        record.set(NameValueField::Value, "30").unwrap();
        assert!(!record.changed());
        assert!(record.given.iter().all(Option::is_none));
    }

    #[test]
    fn field_prefers_given_value() {
        let mut record = Record::parse("timeout 30", NameValueLayout::default()).unwrap();
        record.set(NameValueField::Value, "45").unwrap();
        assert_eq!(record.field(NameValueField::Value), Some("45"));
        assert_eq!(record.original[NameValueField::Value.position()].as_deref(), Some("30"));
    }
}
