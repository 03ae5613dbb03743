//! A database: a directory holding zero or more tables.
//!
//! The base directory is an explicit parameter on every operation here,
//! never a process-wide default — see the engine's global-state design
//! note. Opening a database enumerates its directory and opens every
//! table found there, which in turn replays that table's WAL tail.

use byteforge_core::{Error, Result};
use crate::column::Column;
use crate::table::Table;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An open database: a directory plus every table handle opened from it.
pub struct Database {
    path: PathBuf,
    tables: HashMap<String, Table>,
}

impl Database {
    /// Creates a new, empty database directory. Fails with
    /// [`Error::DatabaseAlreadyExists`] if `path` already exists.
    pub fn create(path: impl Into<PathBuf>) -> Result<Database> {
        let path = path.into();
        if path.exists() {
            return Err(Error::DatabaseAlreadyExists(path));
        }
        std::fs::create_dir_all(&path)?;
        set_permissive_dir_mode(&path);
        Ok(Database {
            path,
            tables: HashMap::new(),
        })
    }

    /// Opens an existing database directory, opening every table file it
    /// finds. Entries whose name contains `_wal` or `_idx` are auxiliary
    /// files and are skipped — only `<name>.bin` files are tables.
    pub fn open(path: impl Into<PathBuf>) -> Result<Database> {
        let path = path.into();
        if !path.is_dir() {
            return Err(Error::DatabaseNotFound(path));
        }
        let mut tables = HashMap::new();
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(name) = table_name_of(&file_name) else {
                continue;
            };
            let table = Table::open(&path, &name)?;
            tables.insert(name, table);
        }
        Ok(Database { path, tables })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a new table in this database. Fails with
    /// [`Error::TableAlreadyExists`] if a table by this name is already
    /// open or already has files on disk.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let table = Table::create(&self.path, name, columns)?;
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn table(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Closes every open table, flushing their data and index files.
    pub fn close(self) -> Result<()> {
        for (_, table) in self.tables {
            table.close()?;
        }
        Ok(())
    }
}

/// `T.bin` -> `Some("T")`; anything containing `_wal` or `_idx`, or not
/// ending in `.bin`, -> `None`.
fn table_name_of(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".bin")?;
    if stem.contains("_wal") || stem.contains("_idx") {
        return None;
    }
    Some(stem.to_string())
}

#[cfg(unix)]
fn set_permissive_dir_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777));
}

#[cfg(not(unix))]
fn set_permissive_dir_mode(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use byteforge_core::{ColumnType, Value};
    use crate::predicate::Predicate;
    use crate::record::Record;

    fn users_columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Int64, false).unwrap(),
            Column::new("username", ColumnType::String, false).unwrap(),
        ]
    }

    #[test]
    fn create_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");
        let _db = Database::create(&db_path).unwrap();
        assert!(matches!(
            Database::create(&db_path),
            Err(Error::DatabaseAlreadyExists(_))
        ));
    }

    #[test]
    fn open_missing_database_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Database::open(dir.path().join("ghost")),
            Err(Error::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn create_table_then_reopen_finds_it() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");
        {
            let mut db = Database::create(&db_path).unwrap();
            db.create_table("users", users_columns()).unwrap();
            db.table("users")
                .unwrap()
                .insert(
                    &Record::from_pairs(vec![
                        ("id".into(), Value::Int64(1)),
                        ("username".into(), Value::String("user1".into())),
                    ]),
                    true,
                )
                .unwrap();
            db.close().unwrap();
        }

        let mut reopened = Database::open(&db_path).unwrap();
        assert_eq!(reopened.table_names().collect::<Vec<_>>(), vec!["users"]);
        let rows = reopened
            .table("users")
            .unwrap()
            .select(&Predicate::new())
            .unwrap();
        assert_eq!(rows.rows.len(), 1);
    }

    #[test]
    fn auxiliary_files_are_not_enumerated_as_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");
        {
            let mut db = Database::create(&db_path).unwrap();
            db.create_table("users", users_columns()).unwrap();
            db.close().unwrap();
        }
        let reopened = Database::open(&db_path).unwrap();
        let names: Vec<&str> = reopened.table_names().collect();
        assert_eq!(names, vec!["users"]);
    }
}
