use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::utils::Result;

/// Read a JSON document
pub fn read_json(path: &Path) -> Result<Value> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write a JSON document with 4-space indentation and raw (unescaped)
/// non-ASCII text, creating parent directories as needed.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    writer.flush()?;
    Ok(())
}

/// Compact single-line form, used for change detection
pub fn to_compact(value: &Value) -> String {
    value.to_string()
}
