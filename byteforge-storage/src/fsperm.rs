//! File-creation helpers shared by every table-owned file (data, index,
//! WAL, last-commit pointer). Centralizes the 0666-permission policy the
//! engine design calls for so each file kind doesn't reimplement it.

use byteforge_core::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Opens `path` for read-write, creating it if absent, without
/// truncating existing content. Used whenever a table reopens its files.
pub fn open_rw(path: &Path) -> Result<File> {
    let file = OpenOptions::new().create(true).read(true).write(true).open(path)?;
    set_permissive_mode(&file);
    Ok(file)
}

/// Creates a brand-new, empty file at `path`. Used by table creation,
/// which has already checked the file doesn't exist.
pub fn create_new(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .read(true)
        .write(true)
        .open(path)?;
    set_permissive_mode(&file);
    Ok(file)
}

#[cfg(unix)]
fn set_permissive_mode(file: &File) {
    use std::os::unix::fs::PermissionsExt;
    let _ = file.set_permissions(std::fs::Permissions::from_mode(0o666));
}

#[cfg(not(unix))]
fn set_permissive_mode(_file: &File) {}
