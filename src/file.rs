use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::EditError;
use crate::index::{LineIndex, PendingChanges};
use crate::layout::{Field, Layout};
use crate::record::Record;
use crate::write::write_via_temp;

/// One editing session over a line-based file.
///
/// The file is parsed on the first upsert and every later upsert reuses
/// that index. Nothing is written until [`LineFile::finish`].
#[derive(Debug)]
pub struct LineFile<L: Layout> {
    path: PathBuf,
    layout: L,
    file: File,
    index: Option<LineIndex<L>>,
    pending: PendingChanges<L>,
}

impl<L: Layout> LineFile<L> {
    /// Open `path` for read+write. Fails with `UnusableFile` before any
    /// parsing when that is not possible.
    pub fn open(path: impl AsRef<Path>, layout: L) -> Result<Self, EditError> {
        let path = path.as_ref().to_path_buf();
        let file = open_read_write(&path)?;
        Ok(Self {
            path,
            layout,
            file,
            index: None,
            pending: PendingChanges::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Insert `record` if no line carries its key, otherwise merge its given
    /// fields into that line. A record with no given fields is ignored; a
    /// new line must give every required field.
    pub fn upsert(&mut self, record: Record<L>) -> Result<&mut Self, EditError> {
        if !record.has_given() {
            return Ok(self);
        }
        let key = self.layout.key_of(&record);
        if self.index.is_none() {
            let content = self.read_content()?;
            self.index = Some(LineIndex::build(&content, &self.layout, &self.path)?);
        }
        let Some(index) = self.index.as_mut() else {
            return Ok(self);
        };

        match index.find(&key) {
            Some(line) => {
                if let Some(existing) = index.record_mut(line) {
                    record.merge_into(existing);
                    self.pending.track_update(line, existing);
                }
            }
            None => {
                require_fields(&record)?;
                self.pending.queue_insert(key, record);
            }
        }
        Ok(self)
    }

    pub fn changed(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Copy the current on-disk content to `target`. Call before `finish`.
    pub fn backup(&mut self, target: impl AsRef<Path>) -> Result<&mut Self, EditError> {
        let target = target.as_ref();
        fs::copy(&self.path, target).map_err(|err| EditError::io("creating backup", target, err))?;
        Ok(self)
    }

    /// The content `finish` would write, or `None` when nothing changed.
    pub fn render(&self) -> Result<Option<String>, EditError> {
        if !self.changed() {
            return Ok(None);
        }
        let original = self.read_content()?;
        Ok(Some(self.pending.rewrite(&original)))
    }

    /// Write pending changes. Returns whether anything was written. The
    /// session starts over afterwards: the next upsert re-reads the file.
    pub fn finish(&mut self) -> Result<bool, EditError> {
        let Some(content) = self.render()? else {
            return Ok(false);
        };
        write_via_temp(&self.path, content.as_bytes())
            .map_err(|err| EditError::io("writing", &self.path, err))?;
        self.file = open_read_write(&self.path)?;
        self.index = None;
        self.pending.clear();
        Ok(true)
    }

    fn read_content(&self) -> Result<String, EditError> {
        let mut handle = &self.file;
        let mut content = String::new();
        handle
            .seek(SeekFrom::Start(0))
            .and_then(|_| handle.read_to_string(&mut content))
            .map_err(|err| {
                let reason = if err.kind() == ErrorKind::InvalidData {
                    "expected UTF-8 text"
                } else {
                    "expected the file to be readable"
                };
                EditError::unusable(&self.path, reason, err)
            })?;
        Ok(content)
    }
}

/// A new line is rendered from the record alone, so every field a parse
/// requires must be given.
fn require_fields<L: Layout>(record: &Record<L>) -> Result<(), EditError> {
    let missing = L::Field::ALL
        .iter()
        .filter(|field| field.position() < L::MIN_FIELDS)
        .find(|field| record.field(**field).is_none());
    match missing {
        Some(field) => Err(EditError::invalid(
            field.name(),
            "",
            "is required for a new line",
        )),
        None => Ok(()),
    }
}

fn open_read_write(path: &Path) -> Result<File, EditError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|err| {
            EditError::unusable(path, "expected the file to be readable and writable", err)
        })?;
    let is_file = file
        .metadata()
        .map_err(|err| EditError::unusable(path, "unable to read metadata", err))?
        .is_file();
    if !is_file {
        return Err(EditError::UnusableFile {
            path: path.to_path_buf(),
            reason: "expected a regular file".to_string(),
            source: None,
        });
    }
    Ok(file)
}
