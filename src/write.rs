use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

/// Replace `path` with `data` so readers see either the old or the new
/// content. The temp file lives beside the target and takes over its
/// permissions before the rename.
pub fn write_via_temp(path: &Path, data: &[u8]) -> io::Result<()> {
    let target = resolve_target(path);
    let base_dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let unique = format!(
        ".fsedit-tmp-{}-{}",
        std::process::id(),
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    );
    let temp_path = base_dir.join(unique);
    let result = write_temp(&temp_path, &target, data).and_then(|()| fs::rename(&temp_path, &target));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let metadata = fs::metadata(target).ok();
    let mut file = create_temp(temp_path, metadata.as_ref())?;
    file.write_all(data)?;
    file.sync_all()?;
    if let Some(metadata) = &metadata {
        fs::set_permissions(temp_path, metadata.permissions())?;
        copy_ownership(temp_path, metadata);
    }
    Ok(())
}

/// The temp file is never more permissive than the target, even before the
/// content lands in it.
#[cfg(unix)]
fn create_temp(temp_path: &Path, target: Option<&fs::Metadata>) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mode = target.map_or(0o600, |metadata| metadata.permissions().mode() & 0o7777);
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(temp_path)
}

#[cfg(not(unix))]
fn create_temp(temp_path: &Path, _target: Option<&fs::Metadata>) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
}

#[cfg(unix)]
fn copy_ownership(temp_path: &Path, metadata: &fs::Metadata) {
    use std::os::unix::fs::MetadataExt;

    // Fails unless we are root or already the owner.
    let _ = std::os::unix::fs::chown(temp_path, Some(metadata.uid()), Some(metadata.gid()));
}

#[cfg(not(unix))]
fn copy_ownership(_temp_path: &Path, _metadata: &fs::Metadata) {}

/// Follow a symlinked target so the rename replaces the real file rather
/// than the link.
fn resolve_target(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replaces_content_and_leaves_no_temp_files() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("target.conf");
        fs::write(&path, "old contents that are longer\n").expect("seed");

        write_via_temp(&path, b"new\n").expect("write");

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".fsedit-tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn keeps_permissions_of_the_target() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("fstab");
        fs::write(&path, "x\n").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");

        write_via_temp(&path, b"y\n").expect("write");

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_starts_with_target_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("temp dir");
        let target = dir.path().join("secrets.conf");
        fs::write(&target, "token abc\n").expect("seed");
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).expect("chmod");
        let metadata = fs::metadata(&target).expect("metadata");

        let temp = dir.path().join(".fsedit-tmp-test");
        drop(create_temp(&temp, Some(&metadata)).expect("create temp"));

        let mode = fs::metadata(&temp).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn writes_through_symlink() {
        let dir = tempdir().expect("temp dir");
        let real = dir.path().join("real.conf");
        let link = dir.path().join("link.conf");
        fs::write(&real, "a\n").expect("seed");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        write_via_temp(&link, b"b\n").expect("write");

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "b\n");
    }
}
