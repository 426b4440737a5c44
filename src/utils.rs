use std::path::PathBuf;

use thiserror::Error;

/// Library error type
#[derive(Error, Debug)]
pub enum TlError {
    #[error("Invalid translation file shape: {0}")]
    InvalidShape(String),

    #[error("Missing key `{key}` in {path:?}")]
    MissingKey { key: &'static str, path: PathBuf },

    #[error("Unknown text type: {0}")]
    UnknownType(String),

    #[error("No index provided for list-format file {0}")]
    NoIndex(String),

    #[error("Unsupported operation on version {version} file: {what}")]
    Unsupported { version: i64, what: &'static str },

    #[error("No file path set")]
    NoFile,

    #[error("Story id has no {0} part")]
    MissingIdPart(&'static str),

    #[error("Replacement rule {index} failed to compile: {source}")]
    Regex {
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TlError>;

/// Characters Windows refuses in file names, besides control characters
const ILLEGAL_FILENAME_CHARS: &[char] = &['"', '*', '/', ':', '<', '>', '?', '\\', '|'];

/// Remove characters that are invalid in file names (Windows rules)
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|&c| (c as u32) > 31 && !ILLEGAL_FILENAME_CHARS.contains(&c))
        .collect()
}

/// Current UTC time in epoch seconds
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Python-style char slicing: negative bounds count from the end and
/// out-of-range bounds are clamped, so malformed input yields short or
/// empty pieces instead of panicking.
pub(crate) fn py_slice(s: &str, start: isize, end: Option<isize>) -> String {
    let len = s.chars().count() as isize;
    let resolve = |i: isize| -> usize {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len) as usize
    };
    let from = resolve(start);
    let to = end.map(resolve).unwrap_or(len as usize);
    if to <= from {
        return String::new();
    }
    s.chars().skip(from).take(to - from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("001 (A: New Day?).json"), "001 (A New Day).json");
        assert_eq!(sanitize_filename("a/b\\c|d"), "abcd");
        assert_eq!(sanitize_filename("tab\there"), "tabhere");
        assert_eq!(sanitize_filename("ウマ娘"), "ウマ娘");
    }

    #[test]
    fn test_py_slice() {
        assert_eq!(py_slice("0123456789", 2, Some(6)), "2345");
        assert_eq!(py_slice("0123456789", -4, None), "6789");
        assert_eq!(py_slice("0123456789", -11, Some(-7)), "012");
        assert_eq!(py_slice("01", 2, Some(6)), "");
        assert_eq!(py_slice("01", 0, Some(5)), "01");
    }

    #[test]
    fn test_current_timestamp() {
        // after 2020-01-01
        assert!(current_timestamp() > 1_577_836_800);
    }
}
