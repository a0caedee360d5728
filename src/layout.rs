use std::fmt::Debug;

use crate::error::EditError;
use crate::record::Record;

/// Identity of a logical entry: the values of the layout's key fields.
pub type Key = Vec<Option<String>>;

/// A named column with a fixed position in its layout.
pub trait Field: Copy + Eq + Debug + 'static {
    /// Every field, in rendering order.
    const ALL: &'static [Self];

    fn position(self) -> usize;

    fn name(self) -> &'static str;
}

/// A file format: how a data line splits into fields and which fields
/// identify an entry.
pub trait Layout: Clone + Debug {
    type Field: Field;

    /// Fields a data line must carry to be well formed.
    const MIN_FIELDS: usize;

    fn separator(&self) -> &str;

    /// Split a data line into one slot per field. Absent optional fields are
    /// `None`.
    fn parse_fields(&self, line: &str) -> Result<Vec<Option<String>>, EditError>;

    fn key_fields(&self) -> Vec<Self::Field>;

    /// Value assumed for a field a line leaves unset.
    fn default_value(&self, _field: Self::Field) -> Option<&'static str> {
        None
    }

    /// Validate a caller-supplied value and return the text to write.
    fn check_value(&self, field: Self::Field, value: &str) -> Result<String, EditError>;

    /// The value a parse of the written text yields. Comparisons and keys
    /// use this form.
    fn canonical_value(&self, _field: Self::Field, written: &str) -> String {
        written.to_string()
    }

    fn key_of(&self, record: &Record<Self>) -> Key {
        self.key_fields()
            .into_iter()
            .map(|field| record.field(field).map(str::to_string))
            .collect()
    }
}
