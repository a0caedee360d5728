//! Idempotent editing of line-based structured files such as `/etc/fstab`
//! and `name value` config files.
//!
//! Open a [`LineFile`] with a layout, upsert the records you want, check
//! [`LineFile::changed`], then optionally [`LineFile::backup`] and
//! [`LineFile::finish`]. Lines the session did not touch are written back
//! byte for byte.

pub mod backup;
pub mod diff;
pub mod error;
pub mod file;
pub mod fstab;
pub mod index;
pub mod layout;
pub mod logging;
pub mod name_value;
pub mod normalize;
pub mod record;
pub mod write;

pub use error::EditError;
pub use file::LineFile;
pub use fstab::{Fstab, FstabEntry, FstabField, FstabLayout};
pub use layout::{Field, Key, Layout};
pub use name_value::{NameValueField, NameValueFile, NameValueLayout};
pub use record::{Record, RecordState};
