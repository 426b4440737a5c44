use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::block::{TextContainer, TextContainerMut};
use super::io::{read_json, to_compact, write_json};
use super::text_data::{json_kind, TextData};
use super::version::FileVersion;
use crate::story_id::StoryId;
use crate::text_type::TextType;
use crate::utils::{current_timestamp, sanitize_filename, Result, TlError};

/// Directory holding mdb texts that use literal newlines
pub const CHARACTER_SYSTEM_TEXT: &str = "character_system_text";

/// Default path given to files built in memory
const DUMP_FILE_NAME: &str = "tl_file_dump.json";

/// Translation file: one story chapter (or one mdb table) of dialogue
///
/// Loading keeps a compact snapshot of the document; [`TranslationFile::save`]
/// only writes when the serialized content differs from it.
#[derive(Debug, Clone)]
pub struct TranslationFile {
    /// File path
    path: PathBuf,
    /// File name
    name: String,
    /// Schema version band
    version: FileVersion,
    /// Envelope fields in document order, `text` held as a placeholder
    header: Map<String, Value>,
    /// Bundle key of version 1 wrappers
    wrapper_key: Option<String>,
    /// Dialogue blocks
    text: TextData,
    text_type: TextType,
    escape_newline: bool,
    snapshot: Option<String>,
    file_exists: bool,
    read_only: bool,
}

/// Translation progress of a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Translatable containers
    pub containers: usize,
    /// Containers with a non-empty translation
    pub translated: usize,
}

impl FileStats {
    /// Every container has a translation
    pub fn is_complete(&self) -> bool {
        self.containers == self.translated
    }
}

impl TranslationFile {
    /// Load a translation file from disk
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path, false)
    }

    /// Load a file that is never snapshotted or written
    pub fn load_read_only(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path, true)
    }

    fn open(path: impl Into<PathBuf>, read_only: bool) -> Result<Self> {
        let path = path.into();
        let root = read_json(&path)?;
        let mut file = Self::from_value(root, path, read_only)?;
        file.file_exists = true;
        file.snapshot();
        Ok(file)
    }

    /// Build a new file (at the latest version unless `data` names one) from
    /// envelope fields, e.g. freshly extracted content. The file counts as
    /// not yet on disk, so the first save always writes.
    pub fn from_data(
        data: Map<String, Value>,
        path: Option<PathBuf>,
        snapshot: bool,
    ) -> Result<Self> {
        let mut root = Map::new();
        root.insert("version".to_string(), Value::from(FileVersion::LATEST));
        root.extend(data);
        let path = path.unwrap_or_else(|| PathBuf::from(DUMP_FILE_NAME));
        let mut file = Self::from_value(Value::Object(root), path, false)?;
        if snapshot {
            file.snapshot();
        }
        Ok(file)
    }

    fn from_value(root: Value, path: PathBuf, read_only: bool) -> Result<Self> {
        let mut root = match root {
            Value::Object(map) => map,
            other => {
                return Err(TlError::InvalidShape(format!(
                    "{:?}: top level must be a map, got {}",
                    path,
                    json_kind(&other)
                )))
            }
        };
        let version = FileVersion::detect(&root);
        for &key in version.required_keys() {
            if !root.contains_key(key) {
                return Err(TlError::MissingKey { key, path });
            }
        }

        let (header, wrapper_key, text) = match version {
            FileVersion::Flat => (Map::new(), None, TextData::from_value(Value::Object(root))?),
            FileVersion::Wrapped => {
                let (key, blocks) = root
                    .into_iter()
                    .next()
                    .ok_or_else(|| TlError::InvalidShape("empty version 1 wrapper".to_string()))?;
                (Map::new(), Some(key), TextData::from_value(blocks)?)
            }
            FileVersion::Enveloped(_) | FileVersion::Mdb(_) => {
                // keeps the key position for serialization
                let blocks = root.insert("text".to_string(), Value::Null).unwrap_or(Value::Null);
                (root, None, TextData::from_value(blocks)?)
            }
        };

        let text_type: TextType = match version.type_str(&header) {
            Some(t) => t.parse()?,
            None => return Err(TlError::MissingKey { key: "type", path }),
        };
        let in_system_text = parent_dir_name(&path) == Some(CHARACTER_SYSTEM_TEXT);
        let escape_newline = text_type.escapes_newline() && !(text_type == TextType::Mdb && in_system_text);
        let name = file_name(&path);

        Ok(TranslationFile {
            path,
            name,
            version,
            header,
            wrapper_key,
            text,
            text_type,
            escape_newline,
            snapshot: None,
            file_exists: false,
            read_only,
        })
    }

    /// Re-read the file from disk, discarding in-memory changes
    pub fn reload(&mut self) -> Result<()> {
        let fresh = Self::open(self.path.clone(), self.read_only)?;
        *self = fresh;
        Ok(())
    }

    /// Document as written to disk
    pub fn to_value(&self) -> Value {
        let flat = self.version.is_flat_family();
        match self.version {
            FileVersion::Flat => self.text.to_native(true),
            FileVersion::Wrapped => {
                let mut root = Map::new();
                root.insert(
                    self.wrapper_key.clone().unwrap_or_default(),
                    self.text.to_native(false),
                );
                Value::Object(root)
            }
            FileVersion::Enveloped(_) | FileVersion::Mdb(_) => {
                let mut root = self.header.clone();
                root.insert("text".to_string(), self.text.to_native(flat));
                Value::Object(root)
            }
        }
    }

    /// Record the current content as the saved state
    pub fn snapshot(&mut self) {
        if self.read_only {
            return;
        }
        self.snapshot = Some(to_compact(&self.to_value()));
    }

    /// Take over the saved state of another instance of the same file,
    /// including its `modified` stamp
    pub fn snapshot_from(&mut self, other: &TranslationFile) {
        if self.read_only {
            return;
        }
        self.snapshot = other.snapshot.clone();
        self.file_exists = other.file_exists;
        if let Some(modified) = other.header.get("modified") {
            if self.version.has_envelope() {
                self.header.insert("modified".to_string(), modified.clone());
            }
        }
    }

    /// Content differs from the last snapshot
    pub fn is_dirty(&self) -> bool {
        match &self.snapshot {
            Some(snap) => *snap != to_compact(&self.to_value()),
            None => true,
        }
    }

    /// Save, stamping `modified` where the version tracks it.
    /// Returns whether anything was written.
    pub fn save(&mut self) -> Result<bool> {
        self.save_with(true)
    }

    /// Save the file if it is new or has changed since the last snapshot
    ///
    /// # Arguments
    /// * `update_modified` - stamp `modified` with the current time, for
    ///   versions that track it
    ///
    /// # Returns
    /// `true` when the file was written. Read-only and unchanged files are
    /// left alone and return `false`.
    ///
    /// # Errors
    /// [`TlError::NoFile`] for a file without a path, and any I/O or JSON
    /// error from writing.
    pub fn save_with(&mut self, update_modified: bool) -> Result<bool> {
        if self.read_only {
            warn!("Refusing to save read-only file {}", self.name);
            return Ok(false);
        }
        if self.file_exists && !self.is_dirty() {
            debug!("Unchanged, not saving {}", self.name);
            return Ok(false);
        }
        if self.path.as_os_str().is_empty() {
            return Err(TlError::NoFile);
        }
        if update_modified && self.version.tracks_modified() {
            self.header
                .insert("modified".to_string(), Value::from(current_timestamp()));
        }
        write_json(&self.path, &self.to_value())?;
        self.file_exists = true;
        self.snapshot();
        Ok(true)
    }

    /// Rename the file inside its directory. Without a name, uses
    /// `"{idx} ({title}).json"` or `"{idx}.json"`.
    pub fn rename(&mut self, new_name: Option<&str>) -> Result<()> {
        if !self.file_exists {
            return Ok(());
        }
        let new_name = match new_name {
            Some(n) => n.to_string(),
            None => {
                let sid = self.story_id().unwrap_or_default();
                let sid = StoryId::parse(self.text_type, &sid);
                let idx = sid.filename_idx()?;
                match self.title() {
                    Some(title) => format!("{idx} ({title}).json"),
                    None => format!("{idx}.json"),
                }
            }
        };
        let dir = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let target = dir.join(sanitize_filename(&new_name));
        fs::rename(&self.path, &target)?;
        self.set_path(target);
        Ok(())
    }

    /// Point the file at a new path without touching the disk
    pub fn set_path(&mut self, path: PathBuf) {
        self.name = file_name(&path);
        self.path = path;
    }

    /// Path the file was loaded from and saves to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of `path`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detected on-disk format
    pub fn version(&self) -> FileVersion {
        self.version
    }

    /// Text type from the envelope, or [`TextType::Legacy`] for older
    /// versions
    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    /// Texts store line breaks as a literal `\n`
    pub fn escape_newline(&self) -> bool {
        self.escape_newline
    }

    /// The file is on disk
    pub fn exists(&self) -> bool {
        self.file_exists
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Name of the directory holding the file
    pub fn parent_dir_name(&self) -> Option<&str> {
        parent_dir_name(&self.path)
    }

    /// Asset bundle the texts belong to. Wrapped files keep it as their
    /// only key; flat maps have none.
    pub fn bundle(&self) -> Option<&str> {
        self.version.bundle(&self.header, self.wrapper_key.as_deref())
    }

    /// Canonical story id string; `None` for unversioned flat maps
    pub fn story_id(&self) -> Option<String> {
        self.version.story_id(&self.header, Some(&self.path))
    }

    /// Story id parsed according to the file type
    pub fn parsed_story_id(&self) -> Option<StoryId> {
        self.story_id().map(|sid| StoryId::parse(self.text_type, &sid))
    }

    /// Envelope field
    pub fn field(&self, key: &str) -> Option<&Value> {
        match key {
            "text" => None,
            _ => self.header.get(key),
        }
    }

    /// Set an envelope field. Files without an envelope have none.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<()> {
        if !self.version.has_envelope() || key == "text" {
            return Err(TlError::Unsupported {
                version: self.version.number(),
                what: "setting envelope fields",
            });
        }
        self.header.insert(key.to_string(), value);
        Ok(())
    }

    /// Story title from the envelope
    pub fn title(&self) -> Option<&str> {
        self.field("title").and_then(Value::as_str)
    }

    /// Line length stored in the file, if any
    pub fn line_length(&self) -> Option<i64> {
        self.field("lineLength").and_then(Value::as_i64)
    }

    /// Font size for the `<size>` wrapper
    pub fn text_size(&self) -> Option<i64> {
        self.field("textSize").and_then(Value::as_i64)
    }

    /// Unix time of the last processing save
    pub fn modified(&self) -> Option<i64> {
        self.field("modified").and_then(Value::as_i64)
    }

    /// Text blocks in file order
    pub fn text_blocks(&self) -> &TextData {
        &self.text
    }

    pub fn text_blocks_mut(&mut self) -> &mut TextData {
        &mut self.text
    }

    /// Replace the whole block collection
    pub fn set_text_blocks(&mut self, text: TextData) -> Result<()> {
        if self.version == FileVersion::Wrapped {
            return Err(TlError::Unsupported {
                version: 1,
                what: "replacing text blocks",
            });
        }
        self.text = text;
        Ok(())
    }

    /// Every translatable container in file order: each block (blacklisted
    /// source texts excluded), then its colored text, then its choices
    pub fn text_containers(&self) -> impl Iterator<Item = TextContainer<'_>> {
        self.text.containers()
    }

    /// Mutable form of [`TranslationFile::text_containers`]
    pub fn text_containers_mut(&mut self) -> impl Iterator<Item = TextContainerMut<'_>> {
        self.text.containers_mut()
    }

    /// Count translatable and translated containers
    pub fn stats(&self) -> FileStats {
        self.text_containers().fold(FileStats::default(), |mut stats, c| {
            stats.containers += 1;
            if !c.en_text.is_empty() {
                stats.translated += 1;
            }
            stats
        })
    }

    /// Newline sequence stored in this file's texts
    pub fn newline(&self) -> &'static str {
        if self.escape_newline {
            "\\n"
        } else {
            "\n"
        }
    }
}

fn parent_dir_name(path: &Path) -> Option<&str> {
    path.parent()?.file_name()?.to_str()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
