//! Translation file integration tests
//!
//! Scenarios:
//! - every on-disk version shape loads and reports its blocks
//! - saving an unchanged file leaves it untouched
//! - a processed file stamps `modified`, and the bundle trailer carries it

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

use umatl::io::{read_patch_state, trailer_for, BundleStore, FsBundleStore};
use umatl::{FileVersion, TextType, TranslationFile};

fn write_doc(dir: &Path, rel: &str, doc: &Value) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    path
}

fn blocks() -> Value {
    json!([
        {"jpName": "トレーナー", "enName": "Trainer", "jpText": "よろしく", "enText": "Nice to meet you.", "blockIdx": 1},
        {"jpName": "スペ", "enName": "", "jpText": "はい", "enText": "", "blockIdx": 2}
    ])
}

#[test]
fn test_every_version_shape_loads() {
    let dir = TempDir::new().unwrap();
    let cases = [
        (
            "story/04/1026/001.json",
            json!({"version": 6, "bundle": "B1", "type": "story", "storyId": "041026001", "text": blocks()}),
            FileVersion::Enveloped(6),
            TextType::Story,
        ),
        (
            "story/04/1026/002.json",
            json!({"version": 2, "bundle": "B2", "text": blocks()}),
            FileVersion::Enveloped(2),
            TextType::Legacy,
        ),
        (
            "story/04/1026/003.json",
            json!({"B3": blocks()}),
            FileVersion::Wrapped,
            TextType::Legacy,
        ),
    ];

    for (rel, doc, version, text_type) in cases {
        let path = write_doc(dir.path(), rel, &doc);
        let file = TranslationFile::load(&path).unwrap();
        println!("{rel}: {:?}", file.version());
        assert_eq!(file.version(), version, "{rel}");
        assert_eq!(file.text_blocks().len(), 2, "{rel}");
        assert_eq!(file.text_type(), text_type, "{rel}");
        assert_eq!(file.stats().translated, 1, "{rel}");
    }

    let flat = write_doc(dir.path(), "mdb/race_jikkyo_message.json", &json!({"一": "One", "二": ""}));
    let file = TranslationFile::load(&flat).unwrap();
    assert_eq!(file.version(), FileVersion::Flat);
    assert!(file.text_blocks().is_keyed());
    assert_eq!(file.text_blocks().get_by_key("一"), Some("One"));
}

#[test]
fn test_unchanged_save_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let doc = json!({
        "version": 6, "bundle": "B1", "type": "story", "storyId": "041026001",
        "modified": 1_600_000_000, "text": blocks()
    });
    let path = write_doc(dir.path(), "story/04/1026/001.json", &doc);
    let before = fs::read(&path).unwrap();

    let mut file = TranslationFile::load(&path).unwrap();
    assert!(!file.is_dirty());
    assert!(!file.save().unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_edit_save_and_patch_trailer() {
    let dir = TempDir::new().unwrap();
    let doc = json!({
        "version": 6, "bundle": "AB12CD", "type": "story", "storyId": "041026001",
        "text": blocks()
    });
    let path = write_doc(dir.path(), "translations/story/04/1026/001.json", &doc);

    let mut file = TranslationFile::load(&path).unwrap();
    file.text_blocks_mut().get_mut(1).unwrap().en_text = "Yes!".to_string();
    assert!(file.is_dirty());
    assert!(file.save().unwrap());
    let modified = file.modified().expect("save stamps modified");

    let reloaded = TranslationFile::load(&path).unwrap();
    assert_eq!(reloaded.text_blocks().get(1).unwrap().en_text, "Yes!");
    assert_eq!(reloaded.modified(), Some(modified));

    let store = FsBundleStore::new(dir.path().join("dat"));
    let bundle = reloaded.bundle().unwrap();
    store
        .write_with_trailer(bundle, b"UnityFS-payload", &trailer_for(&reloaded))
        .unwrap();
    let state = read_patch_state(&store.bundle_path(bundle));
    assert!(state.patched);
    assert_eq!(state.timestamp, Some(modified as u64));
}
