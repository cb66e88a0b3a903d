//! JSON export of record sequences.
//!
//! Records are written as one JSON array of field/value objects, in the
//! order the caller yields them, indented by four spaces.

use crate::error::{Result, StoreError};
use crate::types::Record;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const JSON_SUFFIX: &str = ".json";

/// Append `.json` unless the name already ends with it.
pub fn ensure_json_suffix(name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidOperation(
            "export filename must not be empty".into(),
        ));
    }
    if name.ends_with(JSON_SUFFIX) {
        Ok(PathBuf::from(name))
    } else {
        Ok(PathBuf::from(format!("{}{}", name, JSON_SUFFIX)))
    }
}

/// Serialize records into any writer.
///
/// Returns the number of records written.
pub fn write_records<'a, W, I>(writer: W, records: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    let mut writer = ser.into_inner();
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(records.len())
}

/// Write records to `name`, adding the `.json` suffix when missing.
///
/// Returns the path written and the record count. An unwritable target is
/// reported as `StoreError::File` naming the path.
pub fn export_json<'a, I>(name: &str, records: I) -> Result<(PathBuf, usize)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let path = ensure_json_suffix(name)?;
    let file = File::create(&path).map_err(|e| StoreError::file(&path, e))?;
    let count = write_records(BufWriter::new(file), records).map_err(|e| match e {
        StoreError::Io(source) => StoreError::file(&path, source),
        other => other,
    })?;
    Ok((path, count))
}

/// Read back a file written by [`export_json`].
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StoreError::file(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
