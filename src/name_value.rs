use std::path::Path;

use crate::error::EditError;
use crate::file::LineFile;
use crate::layout::{Field, Layout};
use crate::normalize::{
    collapse_horizontal_whitespace, split_on_separator, strip_quotes, trim_horizontal,
};
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameValueField {
    Name,
    Value,
}

impl Field for NameValueField {
    const ALL: &'static [Self] = &[NameValueField::Name, NameValueField::Value];

    fn position(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            NameValueField::Name => "name",
            NameValueField::Value => "value",
        }
    }
}

/// Generic `name<separator>value` config lines.
#[derive(Debug, Clone)]
pub struct NameValueLayout {
    pub separator: String,
    /// Identify entries by their value instead of their name.
    pub compare_by_value: bool,
}

impl Default for NameValueLayout {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            compare_by_value: false,
        }
    }
}

impl NameValueLayout {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    pub fn compare_by_value(mut self, enabled: bool) -> Self {
        self.compare_by_value = enabled;
        self
    }

    pub fn record(&self, name: &str, value: &str) -> Result<Record<Self>, EditError> {
        Record::new(self.clone())
            .with(NameValueField::Name, name)?
            .with(NameValueField::Value, value)
    }
}

impl Layout for NameValueLayout {
    type Field = NameValueField;

    const MIN_FIELDS: usize = 2;

    fn separator(&self) -> &str {
        &self.separator
    }

    fn parse_fields(&self, line: &str) -> Result<Vec<Option<String>>, EditError> {
        let mut parts = split_on_separator(line, &self.separator);
        if parts.len() < Self::MIN_FIELDS {
            return Err(EditError::malformed(
                line,
                format!(
                    "expected a well-formed line of two fields \"name{}value\"",
                    self.separator
                ),
            ));
        }
        let name = parts.remove(0);
        let value = parts.join(&self.separator);
        Ok(vec![Some(name), Some(strip_quotes(&value).to_string())])
    }

    fn key_fields(&self) -> Vec<NameValueField> {
        if self.compare_by_value {
            vec![NameValueField::Value]
        } else {
            vec![NameValueField::Name]
        }
    }

    fn check_value(&self, field: NameValueField, value: &str) -> Result<String, EditError> {
        if value.is_empty() {
            return Err(EditError::invalid(field.name(), value, "must not be empty"));
        }
        if value.contains(['\n', '\r']) {
            return Err(EditError::invalid(
                field.name(),
                value,
                "must fit on a single line",
            ));
        }
        match field {
            NameValueField::Name => self.check_name(value),
            NameValueField::Value => {
                self.read_back_value(value)?;
                Ok(value.to_string())
            }
        }
    }

    fn canonical_value(&self, field: NameValueField, written: &str) -> String {
        match field {
            NameValueField::Name => written.to_string(),
            NameValueField::Value => self
                .read_back_value(written)
                .unwrap_or_else(|_| written.to_string()),
        }
    }
}

impl NameValueLayout {
    /// Names are written in the collapsed form a parse reads back.
    fn check_name(&self, value: &str) -> Result<String, EditError> {
        let name = collapse_horizontal_whitespace(trim_horizontal(value)).into_owned();
        if name.is_empty() {
            return Err(EditError::invalid("name", value, "must not be blank"));
        }
        if name.starts_with('#') {
            return Err(EditError::invalid(
                "name",
                value,
                "would be read back as a comment",
            ));
        }
        let sample_line = format!("{name}{}{}", self.separator, self.placeholder());
        if split_on_separator(&sample_line, &self.separator).first() != Some(&name) {
            return Err(EditError::invalid(
                "name",
                value,
                format!("must not contain the separator \"{}\"", self.separator),
            ));
        }
        Ok(name)
    }

    /// The value a parse yields once `value` is written after a name.
    fn read_back_value(&self, value: &str) -> Result<String, EditError> {
        let line = format!("{}{}{value}", self.placeholder(), self.separator);
        self.parse_fields(&line)
            .ok()
            .and_then(|mut fields| fields.pop().flatten())
            .ok_or_else(|| EditError::invalid("value", value, "would not be read back as a value"))
    }

    /// A one-letter stand-in that cannot form part of a separator match.
    fn placeholder(&self) -> char {
        ('a'..='z')
            .find(|letter| !self.separator.contains(*letter))
            .unwrap_or('a')
    }
}

pub type NameValueFile = LineFile<NameValueLayout>;

impl LineFile<NameValueLayout> {
    pub fn open_name_value(
        path: impl AsRef<Path>,
        layout: NameValueLayout,
    ) -> Result<Self, EditError> {
        LineFile::open(path, layout)
    }

    /// Queue `name<separator>value`, replacing the value of an existing
    /// entry with the same key.
    pub fn set_line(&mut self, name: &str, value: &str) -> Result<&mut Self, EditError> {
        let record = self.layout().record(name, value)?;
        self.upsert(record)
    }
}
