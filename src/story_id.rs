use std::fmt;
use std::path::PathBuf;

use crate::text_type::TextType;
use crate::utils::{py_slice, Result, TlError};

/// Structured story identifier
///
/// The canonical form is the plain concatenation of the populated parts in
/// the order set, group, id, idx (e.g. `"041026003"` for story 04/1026/003).
/// This is what version 4+ translation files store in `storyId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoryId {
    pub text_type: TextType,
    /// 5 chars, home only
    pub set: Option<String>,
    /// 2 chars
    pub group: Option<String>,
    /// 4 chars
    pub id: Option<String>,
    /// 3 chars
    pub idx: Option<String>,
}

impl StoryId {
    pub const SET_LEN: usize = 5;
    pub const GROUP_LEN: usize = 2;
    pub const ID_LEN: usize = 4;
    pub const IDX_LEN: usize = 3;

    /// Create a story id, normalizing id-only types (lyrics, preview) so that
    /// only `id` is kept.
    pub fn new(
        text_type: TextType,
        set: Option<String>,
        group: Option<String>,
        id: Option<String>,
        idx: Option<String>,
    ) -> Self {
        let mut sid = StoryId {
            text_type,
            set,
            group,
            id,
            idx,
        };
        if text_type.is_id_only() {
            if sid.id.as_deref().map_or(true, str::is_empty) && sid.idx.is_some() {
                sid.id = sid.idx.take();
            }
            sid.idx = None;
            sid.group = None;
            sid.set = None;
        }
        sid
    }

    /// Decode a concatenated id string for the given type.
    ///
    /// Lenient: a string of the wrong length gives short or empty parts
    /// instead of an error. Callers validate the length beforehand.
    pub fn parse(text_type: TextType, s: &str) -> Self {
        if text_type.is_id_only() {
            Self::new(text_type, None, None, Some(s.to_string()), None)
        } else if text_type == TextType::Home && s.chars().count() > 9 {
            Self::new(
                text_type,
                Some(py_slice(s, 0, Some(5))),
                Some(py_slice(s, 5, Some(7))),
                Some(py_slice(s, 7, Some(11))),
                Some(py_slice(s, 11, None)),
            )
        } else {
            Self::new(
                text_type,
                None,
                Some(py_slice(s, 0, Some(2))),
                Some(py_slice(s, 2, Some(6))),
                Some(py_slice(s, 6, None)),
            )
        }
    }

    /// Extract the parts from the fixed-width tail of a game data path.
    pub fn parse_from_path(text_type: TextType, path: &str) -> Self {
        match text_type {
            TextType::Home => {
                let tail = py_slice(path, -16, None);
                Self::new(
                    text_type,
                    Some(py_slice(&tail, 0, Some(5))),
                    Some(py_slice(&tail, 6, Some(8))),
                    Some(py_slice(&tail, 9, Some(13))),
                    Some(py_slice(&tail, 13, None)),
                )
            }
            TextType::Lyrics => {
                Self::new(text_type, None, None, Some(py_slice(path, -11, Some(-7))), None)
            }
            TextType::Preview => Self::new(text_type, None, None, Some(py_slice(path, -4, None)), None),
            _ => {
                let tail = py_slice(path, -9, None);
                Self::new(
                    text_type,
                    None,
                    Some(py_slice(&tail, 0, Some(2))),
                    Some(py_slice(&tail, 2, Some(6))),
                    Some(py_slice(&tail, 6, Some(9))),
                )
            }
        }
    }

    /// Story id from the separate group, id and index arguments of older
    /// tools
    pub fn from_legacy(group: &str, id: &str, idx: &str) -> Self {
        Self::new(
            TextType::Story,
            None,
            Some(group.to_string()),
            Some(id.to_string()),
            Some(idx.to_string()),
        )
    }

    /// `(group, id, idx)` parts
    pub fn as_legacy(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (self.group.as_deref(), self.id.as_deref(), self.idx.as_deref())
    }

    /// Copy with every absent part replaced by an underscore run of the
    /// part's width, for SQL `LIKE` lookups against the asset name index.
    pub fn queryfy(&self) -> Self {
        let fill = |part: &Option<String>, width: usize| {
            Some(part.clone().unwrap_or_else(|| "_".repeat(width)))
        };
        Self::new(
            self.text_type,
            fill(&self.set, Self::SET_LEN),
            fill(&self.group, Self::GROUP_LEN),
            fill(&self.id, Self::ID_LEN),
            fill(&self.idx, Self::IDX_LEN),
        )
    }

    /// Populated parts, in canonical order
    pub fn parts(&self) -> Vec<&str> {
        [&self.set, &self.group, &self.id, &self.idx]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }

    /// Storage directory for this id (group/id, or set/group/id for home).
    /// The last populated part is treated as the file index and dropped
    /// unless `include_idx` is set.
    pub fn as_path(&self, include_idx: bool) -> PathBuf {
        let mut parts = self.parts();
        if !include_idx {
            parts.pop();
        }
        parts.into_iter().collect()
    }

    /// Part used to name the file inside its directory
    pub fn filename_idx(&self) -> Result<&str> {
        if self.text_type.is_id_only() {
            self.id.as_deref().ok_or(TlError::MissingIdPart("id"))
        } else {
            match self.idx.as_deref() {
                Some(idx) if !idx.is_empty() => Ok(idx),
                _ => Err(TlError::MissingIdPart("idx")),
            }
        }
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.parts() {
            f.write_str(part)?;
        }
        Ok(())
    }
}
