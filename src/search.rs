//! Locating translation files on disk
//!
//! Files live under `<root>/<type>/`:
//! - story, race: `<group>/<id>/<idx>*.json`
//! - home: `<set>/<group>/<id>/<idx>*.json`
//! - lyrics, preview: `<id>.json`

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::story_id::StoryId;
use crate::text_type::TextType;

/// Default root of the translation tree
pub const TRANSLATION_FOLDER: &str = "translations";

/// A populated id part
fn part(p: &Option<String>) -> Option<&str> {
    p.as_deref().filter(|s| !s.is_empty())
}

/// Filters of the directory levels of a type, outermost first
fn dir_filters(query: &StoryId) -> Vec<Option<&str>> {
    match query.text_type {
        TextType::Home => vec![part(&query.set), part(&query.group), part(&query.id)],
        t if t.is_id_only() => Vec::new(),
        _ => vec![part(&query.group), part(&query.id)],
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn name_of(entry: &DirEntry) -> &str {
    entry.file_name().to_str().unwrap_or_default()
}

/// Translation files matching the populated parts of `query`, sorted by
/// path. Missing directories give no results.
pub fn search_files(root: &Path, query: &StoryId) -> Vec<PathBuf> {
    let type_dir = root.join(query.text_type.as_str());
    let filters = dir_filters(query);
    let file_depth = filters.len() + 1;
    let id_only = query.text_type.is_id_only();
    let wanted_id = part(&query.id);
    let wanted_idx = part(&query.idx);

    let walker = WalkDir::new(&type_dir)
        .min_depth(1)
        .max_depth(file_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            match filters.get(entry.depth() - 1) {
                Some(Some(want)) => name_of(entry) == *want,
                _ => true,
            }
        });

    let mut found = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || entry.depth() != file_depth || !is_json(entry.path()) {
            continue;
        }
        let matches = if id_only {
            wanted_id.map_or(true, |id| {
                entry.path().file_stem().and_then(|s| s.to_str()) == Some(id)
            })
        } else {
            wanted_idx.map_or(true, |idx| name_of(&entry).starts_with(idx))
        };
        if matches {
            found.push(entry.into_path());
        }
    }
    debug!("Found {} files for {query:?}", found.len());
    found
}

/// The file of one fully specified story id
pub fn locate(root: &Path, sid: &StoryId) -> Option<PathBuf> {
    search_files(root, sid).into_iter().next()
}
