use std::path::Path;

use serde_json::{Map, Value};

use crate::text_type::TextType;

/// Schema version band of a translation file
///
/// Each band decides where the identifying fields come from:
/// - `Flat` (-2): bare `jpText -> enText` map, no envelope
/// - `Wrapped` (1): single key (the bundle name) holding the block list
/// - `Enveloped(n)` (2..100): explicit envelope; `type` and `storyId` from 3,
///   `modified` tracking from 4
/// - `Mdb(n)` (100+): flat term map inside an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVersion {
    Flat,
    Wrapped,
    Enveloped(i64),
    Mdb(i64),
}

/// Placeholder id written by one historical export batch
const EMPTY_STORY_ID: &str = "000000000";

impl FileVersion {
    /// Current version for narrative content
    pub const LATEST: i64 = 6;
    /// First version of the mdb family
    pub const MDB_OFFSET: i64 = 100;

    /// Version band of a `version` number
    pub fn from_number(n: i64) -> Self {
        match n {
            -2 => FileVersion::Flat,
            1 => FileVersion::Wrapped,
            n if n >= Self::MDB_OFFSET => FileVersion::Mdb(n),
            n => FileVersion::Enveloped(n),
        }
    }

    /// Detect the version of a loaded document. Documents without a
    /// `version` key are version 1 when their first value is a list and
    /// unversioned flat maps otherwise.
    pub fn detect(root: &Map<String, Value>) -> Self {
        let ver = root.get("version").and_then(Value::as_i64).unwrap_or(1);
        if ver == 1 && !matches!(root.values().next(), Some(Value::Array(_))) {
            return FileVersion::Flat;
        }
        Self::from_number(ver)
    }

    pub fn number(&self) -> i64 {
        match *self {
            FileVersion::Flat => -2,
            FileVersion::Wrapped => 1,
            FileVersion::Enveloped(n) | FileVersion::Mdb(n) => n,
        }
    }

    /// Blocks live under an explicit `text` key
    pub fn has_envelope(&self) -> bool {
        self.number() > 1
    }

    /// `type` is stored in the document
    pub fn stores_type(&self) -> bool {
        self.number() > 2
    }

    /// Saving stamps a `modified` timestamp
    pub fn tracks_modified(&self) -> bool {
        let n = self.number();
        3 < n && n < Self::MDB_OFFSET
    }

    /// Text data is written back as a flat map
    pub fn is_flat_family(&self) -> bool {
        matches!(self, FileVersion::Flat | FileVersion::Mdb(_))
    }

    /// Envelope keys that must be present for this version
    pub fn required_keys(&self) -> &'static [&'static str] {
        match *self {
            FileVersion::Flat | FileVersion::Wrapped => &[],
            FileVersion::Mdb(_) => &["text", "type"],
            FileVersion::Enveloped(n) if n >= 4 => &["text", "bundle", "type", "storyId"],
            FileVersion::Enveloped(3) => &["text", "bundle", "type"],
            FileVersion::Enveloped(_) => &["text", "bundle"],
        }
    }

    /// Raw type string of a document, before parsing
    pub fn type_str<'a>(&self, header: &'a Map<String, Value>) -> Option<&'a str> {
        match self {
            FileVersion::Flat => Some(TextType::Dict.as_str()),
            _ if self.stores_type() => header.get("type").and_then(Value::as_str),
            _ => Some(TextType::Legacy.as_str()),
        }
    }

    /// Bundle name, from the envelope or the version 1 wrapper key
    pub fn bundle<'a>(
        &self,
        header: &'a Map<String, Value>,
        wrapper_key: Option<&'a str>,
    ) -> Option<&'a str> {
        match self {
            FileVersion::Flat => None,
            FileVersion::Wrapped => wrapper_key,
            _ => header.get("bundle").and_then(Value::as_str),
        }
    }

    /// Story id string. Versions before explicit ids derive it from the last
    /// three path segments (group dir, id dir, file name).
    pub fn story_id(&self, header: &Map<String, Value>, path: Option<&Path>) -> Option<String> {
        let stored = header.get("storyId").and_then(Value::as_str);
        match *self {
            FileVersion::Flat => None,
            FileVersion::Mdb(_) => stored.map(str::to_string),
            FileVersion::Enveloped(n) if n > 3 => stored.map(str::to_string),
            FileVersion::Enveloped(3) => match stored {
                Some(sid) if sid != EMPTY_STORY_ID => Some(sid.to_string()),
                _ => path.map(story_id_from_path),
            },
            _ => path.map(story_id_from_path),
        }
    }
}

/// `s` when it starts with a digit, else empty
fn numeric(s: &str) -> &str {
    if leading_digits(s).is_empty() {
        ""
    } else {
        s
    }
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

/// Best effort: non-numeric segments become empty strings
fn story_id_from_path(path: &Path) -> String {
    let segments: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let tail: Vec<&str> = segments.iter().rev().take(3).rev().map(String::as_str).collect();
    let (group, id, idx) = match tail.as_slice() {
        [g, i, x] => (*g, *i, *x),
        [i, x] => ("", *i, *x),
        [x] => ("", "", *x),
        _ => ("", "", ""),
    };
    format!("{}{}{}", numeric(group), numeric(id), leading_digits(idx))
}
