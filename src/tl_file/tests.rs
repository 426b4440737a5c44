use super::*;
use crate::text_type::TextType;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a raw document under `dir/rel` and return its path
fn write_fixture(dir: &Path, rel: &str, doc: &Value) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string(doc).unwrap()).unwrap();
    path
}

fn story_doc(version: i64) -> Value {
    json!({
        "version": version,
        "bundle": "ABCDEF0123",
        "type": "story",
        "storyId": "041026003",
        "title": "A Title",
        "text": [
            {"jpName": "スペ", "enName": "", "jpText": "こんにちは", "enText": "", "nextBlock": 2},
            {"jpText": "選んで", "enText": "Choose", "nextBlock": 3,
             "choices": [{"jpText": "はい", "enText": "", "nextBlockIdx": 3}]}
        ]
    })
}

#[test]
fn test_load_v6() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "story/04/1026/003 (A Title).json", &story_doc(6));
    let file = TranslationFile::load(&path).unwrap();

    assert_eq!(file.version(), FileVersion::Enveloped(6));
    assert_eq!(file.text_type(), TextType::Story);
    assert_eq!(file.bundle(), Some("ABCDEF0123"));
    assert_eq!(file.story_id().as_deref(), Some("041026003"));
    assert_eq!(file.title(), Some("A Title"));
    assert_eq!(file.text_blocks().len(), 2);
    assert!(!file.escape_newline());
    assert_eq!(file.name(), "003 (A Title).json");
}

#[test]
fn test_load_v1_wrapper() {
    let dir = TempDir::new().unwrap();
    let doc = json!({"BUNDLEHASH": [{"jpText": "あ", "enText": "A"}]});
    let path = write_fixture(dir.path(), "02/0001/005.json", &doc);
    let file = TranslationFile::load(&path).unwrap();

    assert_eq!(file.version(), FileVersion::Wrapped);
    assert_eq!(file.bundle(), Some("BUNDLEHASH"));
    assert_eq!(file.text_type(), TextType::Legacy);
    assert_eq!(file.story_id().as_deref(), Some("020001005"));
    assert_eq!(file.to_value(), doc);
}

#[test]
fn test_load_v2_and_v3() {
    let dir = TempDir::new().unwrap();
    let v2 = json!({"version": 2, "bundle": "B", "text": [{"jpText": "あ", "enText": ""}]});
    let path = write_fixture(dir.path(), "07/0100/012.json", &v2);
    let file = TranslationFile::load(&path).unwrap();
    assert_eq!(file.text_type(), TextType::Legacy);
    assert_eq!(file.story_id().as_deref(), Some("070100012"));

    let v3 = json!({"version": 3, "bundle": "B", "type": "race", "storyId": "000000000", "text": []});
    let path = write_fixture(dir.path(), "race/07/0100/012.json", &v3);
    let file = TranslationFile::load(&path).unwrap();
    assert_eq!(file.text_type(), TextType::Race);
    assert!(file.escape_newline());
    assert_eq!(file.story_id().as_deref(), Some("070100012"));
}

#[test]
fn test_load_flat_dict() {
    let dir = TempDir::new().unwrap();
    let doc = json!({"はい": "Yes", "いいえ": "No"});
    let path = write_fixture(dir.path(), "dict.json", &doc);
    let file = TranslationFile::load(&path).unwrap();

    assert_eq!(file.version(), FileVersion::Flat);
    assert_eq!(file.text_type(), TextType::Dict);
    assert_eq!(file.bundle(), None);
    assert_eq!(file.story_id(), None);
    assert_eq!(file.text_blocks().get_by_key("いいえ"), Some("No"));
    assert_eq!(file.to_value(), doc);
}

#[test]
fn test_load_mdb() {
    let dir = TempDir::new().unwrap();
    let doc = json!({"version": 101, "type": "mdb", "lineLength": 0, "text": {"A": "B"}});
    let path = write_fixture(dir.path(), "mdb/race_jikkyo_message.json", &doc);
    let file = TranslationFile::load(&path).unwrap();

    assert_eq!(file.version(), FileVersion::Mdb(101));
    assert!(file.text_blocks().is_keyed());
    assert!(file.escape_newline());
    assert_eq!(file.to_value(), doc);

    let path = write_fixture(dir.path(), "mdb/character_system_text/1001.json", &doc);
    let file = TranslationFile::load(&path).unwrap();
    assert!(!file.escape_newline());
    assert_eq!(file.parent_dir_name(), Some(CHARACTER_SYSTEM_TEXT));
}

#[test]
fn test_missing_keys_rejected() {
    let dir = TempDir::new().unwrap();
    let doc = json!({"version": 6, "bundle": "B", "type": "story", "text": []});
    let path = write_fixture(dir.path(), "bad.json", &doc);
    let err = TranslationFile::load(&path).unwrap_err();
    assert!(matches!(err, crate::TlError::MissingKey { key: "storyId", .. }));

    let path = write_fixture(dir.path(), "list.json", &json!([1, 2]));
    assert!(TranslationFile::load(&path).is_err());

    let doc = json!({"version": 6, "bundle": "B", "type": "novel", "storyId": "", "text": []});
    let path = write_fixture(dir.path(), "type.json", &doc);
    assert!(matches!(
        TranslationFile::load(&path).unwrap_err(),
        crate::TlError::UnknownType(_)
    ));
}

#[test]
fn test_unchanged_save_is_noop() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "story/04/1026/003.json", &story_doc(6));
    let before = fs::read(&path).unwrap();
    let mtime = fs::metadata(&path).unwrap().modified().unwrap();

    let mut file = TranslationFile::load(&path).unwrap();
    assert!(!file.is_dirty());
    assert!(!file.save().unwrap());

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);
}

#[test]
fn test_save_stamps_modified() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "story/04/1026/003.json", &story_doc(6));
    let mut file = TranslationFile::load(&path).unwrap();

    file.text_blocks_mut().get_mut(0).unwrap().en_text = "Hello".to_string();
    assert!(file.is_dirty());
    assert!(file.save().unwrap());
    assert!(file.modified().unwrap() > 0);
    // second save has nothing new
    assert!(!file.save().unwrap());

    let reloaded = TranslationFile::load(&path).unwrap();
    assert_eq!(reloaded.text_blocks().get(0).unwrap().en_text, "Hello");
    assert_eq!(reloaded.modified(), file.modified());
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("{\n    \"version\": 6,"));
    assert!(raw.contains("こんにちは"));
}

#[test]
fn test_v3_save_has_no_modified() {
    let dir = TempDir::new().unwrap();
    let mut doc = story_doc(3);
    doc.as_object_mut().unwrap().remove("storyId");
    let path = write_fixture(dir.path(), "story/04/1026/003.json", &doc);
    let mut file = TranslationFile::load(&path).unwrap();

    file.text_blocks_mut().get_mut(0).unwrap().en_text = "Hi".to_string();
    assert!(file.save().unwrap());
    assert_eq!(file.modified(), None);
    assert_eq!(file.story_id().as_deref(), Some("041026003"));
}

#[test]
fn test_save_without_stamp() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &story_doc(5));
    let mut file = TranslationFile::load(&path).unwrap();
    file.text_blocks_mut().get_mut(0).unwrap().en_text = "Hi".to_string();
    assert!(file.save_with(false).unwrap());
    assert_eq!(file.modified(), None);
}

#[test]
fn test_from_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new/001.json");
    let data = json!({
        "bundle": "B",
        "type": "story",
        "storyId": "021234001",
        "text": [{"jpText": "あ", "enText": ""}]
    });
    let Value::Object(map) = data else { unreachable!() };
    let mut file = TranslationFile::from_data(map, Some(path.clone()), true).unwrap();

    assert_eq!(file.version(), FileVersion::Enveloped(FileVersion::LATEST));
    assert!(!file.exists());
    // new files are written even without changes
    assert!(file.save().unwrap());
    assert!(path.exists());
    assert_eq!(TranslationFile::load(&path).unwrap().story_id().as_deref(), Some("021234001"));
}

#[test]
fn test_read_only_never_saves() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &story_doc(6));
    let before = fs::read(&path).unwrap();
    let mut file = TranslationFile::load_read_only(&path).unwrap();
    file.text_blocks_mut().get_mut(0).unwrap().en_text = "Changed".to_string();
    assert!(!file.save().unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_snapshot_from() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &story_doc(6));
    let original = TranslationFile::load(&path).unwrap();

    let mut copy = TranslationFile::load(&path).unwrap();
    copy.text_blocks_mut().get_mut(0).unwrap().en_text = "x".to_string();
    copy.snapshot();
    assert!(!copy.is_dirty());
    copy.snapshot_from(&original);
    assert!(copy.is_dirty());
}

#[test]
fn test_reload_discards_changes() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &story_doc(6));
    let mut file = TranslationFile::load(&path).unwrap();
    file.text_blocks_mut().get_mut(0).unwrap().en_text = "x".to_string();
    file.reload().unwrap();
    assert_eq!(file.text_blocks().get(0).unwrap().en_text, "");
}

#[test]
fn test_containers_and_stats() {
    let dir = TempDir::new().unwrap();
    let mut doc = story_doc(6);
    doc["text"]
        .as_array_mut()
        .unwrap()
        .push(json!({"jpText": "タイトルコール", "enText": ""}));
    let path = write_fixture(dir.path(), "a.json", &doc);
    let mut file = TranslationFile::load(&path).unwrap();

    let texts: Vec<&str> = file.text_containers().map(|c| c.jp_text).collect();
    assert_eq!(texts, vec!["こんにちは", "選んで", "はい"]);
    assert_eq!(file.stats(), FileStats { containers: 3, translated: 1 });

    for c in file.text_containers_mut() {
        if c.en_text.is_empty() {
            c.en_text.push_str("done");
        }
    }
    assert!(file.stats().is_complete());
}

#[test]
fn test_rename() {
    let dir = TempDir::new().unwrap();
    let mut doc = story_doc(6);
    doc["title"] = json!("Who: me?");
    let path = write_fixture(dir.path(), "04/1026/003.json", &doc);
    let mut file = TranslationFile::load(&path).unwrap();

    file.rename(None).unwrap();
    let expected = dir.path().join("04/1026/003 (Who me).json");
    assert_eq!(file.path(), expected.as_path());
    assert!(expected.exists());
    assert!(!path.exists());
}

#[test]
fn test_envelope_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &story_doc(6));
    let mut file = TranslationFile::load(&path).unwrap();
    file.set_field("textSize", json!(20)).unwrap();
    assert_eq!(file.text_size(), Some(20));
    assert!(file.set_field("text", json!([])).is_err());

    let flat = write_fixture(dir.path(), "flat.json", &json!({"A": "B"}));
    let mut flat = TranslationFile::load(&flat).unwrap();
    assert!(flat.set_field("title", json!("x")).is_err());
}

#[test]
fn test_wrapper_rejects_block_replacement() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "a.json", &json!({"B": []}));
    let mut file = TranslationFile::load(&path).unwrap();
    assert!(file.set_text_blocks(TextData::default()).is_err());
}

#[test]
fn test_save_keeps_block_key_order() {
    let dir = TempDir::new().unwrap();
    let doc = json!({
        "version": 6, "bundle": "B", "type": "story", "storyId": "041026003",
        "text": [
            {"jpName": "スペ", "enName": "", "jpText": "一", "enText": "",
             "nextBlock": 2, "origClipLength": 40, "animData": [{"origLen": 40, "pathId": 1}],
             "choices": [{"jpText": "はい", "enText": "", "nextBlockIdx": 2}],
             "pathId": 9, "blockIdx": 1},
            {"jpText": "二", "enText": "", "nextBlock": -1, "blockIdx": 2}
        ]
    });
    let path = write_fixture(dir.path(), "story/04/1026/003.json", &doc);

    let mut file = TranslationFile::load(&path).unwrap();
    file.text_blocks_mut().get_mut(1).unwrap().en_text = "Two".to_string();
    assert!(file.save().unwrap());

    let saved = read_json(&path).unwrap();
    let order = |v: &Value| -> Vec<String> { v.as_object().unwrap().keys().cloned().collect() };
    assert_eq!(order(&saved["text"][0]), order(&doc["text"][0]));
    assert_eq!(order(&saved["text"][1]), order(&doc["text"][1]));
    assert_eq!(saved["text"][1]["enText"], "Two");
    assert_eq!(saved["text"][0], doc["text"][0]);
}
