use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Source texts that are placeholders or staging instructions, never translated
static TEXT_BLACKLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:タイトルコール$|イベントタイトルロゴ表示.*|※*ダミーテキスト|欠番$)")
        .expect("blacklist pattern is valid")
});

/// Whether a source text is excluded from translation
pub fn is_blacklisted(jp_text: &str) -> bool {
    TEXT_BLACKLIST.is_match(jp_text)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Key layout of a record as it was read
///
/// Holds the shape of the raw JSON (keys in document order, nested lists and
/// maps, leaves nulled) so the record is written back with its keys where
/// they were. Layouts never take part in equality.
#[derive(Debug, Clone, Default)]
pub struct KeyLayout(Option<Value>);

impl PartialEq for KeyLayout {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl KeyLayout {
    /// Record the key layout of a raw record
    pub fn capture(raw: &Value) -> Self {
        Self(Some(skeleton(raw)))
    }

    /// Reorder the keys of `value` to follow the captured layout. Keys
    /// the layout does not know are appended in their current order.
    pub fn apply(&self, value: Value) -> Value {
        match &self.0 {
            Some(template) => order_like(value, template),
            None => value,
        }
    }
}

fn skeleton(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), skeleton(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(skeleton).collect()),
        _ => Value::Null,
    }
}

fn order_like(value: Value, template: &Value) -> Value {
    match (value, template) {
        (Value::Object(mut map), Value::Object(layout)) => {
            let mut out = Map::new();
            for (key, sub) in layout {
                if let Some(v) = map.shift_remove(key) {
                    out.insert(key.clone(), order_like(v, sub));
                }
            }
            out.extend(map);
            Value::Object(out)
        }
        (Value::Array(items), Value::Array(layout)) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| match layout.get(i) {
                    Some(sub) => order_like(v, sub),
                    None => v,
                })
                .collect(),
        ),
        (value, _) => value,
    }
}

/// One dialogue screen
///
/// Fields the tools do not interpret (`animData`, `skip`, ...) are kept in
/// `extra` so a load/save cycle does not drop them. Blocks read with
/// [`TextBlock::from_raw`] are written back in their original key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jp_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub en_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_idx: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_block: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_clip_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_clip_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<TextEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colored_text: Option<Vec<TextEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub layout: KeyLayout,
}

/// A choice option or a colored-text span inside a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jp_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub en_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextEntry {
    pub fn new(jp_text: impl Into<String>, en_text: impl Into<String>) -> Self {
        Self {
            jp_text: jp_text.into(),
            en_text: en_text.into(),
            extra: Map::new(),
        }
    }

    /// Entry flagged `skip` on its own
    pub fn is_skipped(&self) -> bool {
        self.extra.contains_key("skip")
    }
}

/// Where a text container sits inside its block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Block,
    ColoredText,
    Choice,
}

/// Read view of any record carrying a `jpText`/`enText` pair
#[derive(Debug, Clone, Copy)]
pub struct TextContainer<'a> {
    pub kind: ContainerKind,
    pub jp_text: &'a str,
    pub en_text: &'a str,
    /// The record itself is flagged `skip`; sub-entries do not inherit
    /// the flag of their block
    pub skip: bool,
}

/// Write view of a text container; only the translation is mutable
#[derive(Debug)]
pub struct TextContainerMut<'a> {
    pub kind: ContainerKind,
    pub jp_text: &'a str,
    pub en_text: &'a mut String,
    pub skip: bool,
}

impl TextBlock {
    /// Block with only the source text and translation set
    pub fn new(jp_text: impl Into<String>, en_text: impl Into<String>) -> Self {
        Self {
            jp_text: jp_text.into(),
            en_text: en_text.into(),
            ..Default::default()
        }
    }

    /// Parse a raw block record, remembering its key layout
    ///
    /// # Errors
    /// `JsonError` when the record does not have the block shape
    pub fn from_raw(raw: Value) -> crate::utils::Result<Self> {
        let layout = KeyLayout::capture(&raw);
        let mut block: TextBlock = serde_json::from_value(raw)?;
        block.layout = layout;
        Ok(block)
    }

    /// Record as written to disk, keys in their original order
    pub fn to_value(&self) -> Value {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        self.layout.apply(value)
    }

    /// Block flagged `skip`
    pub fn is_skipped(&self) -> bool {
        self.extra.contains_key("skip")
    }

    /// Translatable containers of this block: the block itself, then its
    /// colored text, then its choices. A blacklisted block yields nothing.
    pub fn containers(&self) -> Vec<TextContainer<'_>> {
        let mut out = Vec::new();
        if !self.jp_text.is_empty() {
            if is_blacklisted(&self.jp_text) {
                return out;
            }
            out.push(TextContainer {
                kind: ContainerKind::Block,
                jp_text: &self.jp_text,
                en_text: &self.en_text,
                skip: self.is_skipped(),
            });
        }
        let subs = [
            (ContainerKind::ColoredText, &self.colored_text),
            (ContainerKind::Choice, &self.choices),
        ];
        for (kind, list) in subs {
            for entry in list.iter().flatten() {
                out.push(TextContainer {
                    kind,
                    jp_text: &entry.jp_text,
                    en_text: &entry.en_text,
                    skip: entry.is_skipped(),
                });
            }
        }
        out
    }

    /// Mutable counterpart of [`TextBlock::containers`], same order
    pub fn containers_mut(&mut self) -> Vec<TextContainerMut<'_>> {
        let skip = self.is_skipped();
        let TextBlock {
            jp_text,
            en_text,
            choices,
            colored_text,
            ..
        } = self;
        let jp_text: &String = jp_text;
        let mut out = Vec::new();
        if !jp_text.is_empty() {
            if is_blacklisted(jp_text) {
                return out;
            }
            out.push(TextContainerMut {
                kind: ContainerKind::Block,
                jp_text: jp_text.as_str(),
                en_text,
                skip,
            });
        }
        let subs = [
            (ContainerKind::ColoredText, colored_text),
            (ContainerKind::Choice, choices),
        ];
        for (kind, list) in subs {
            for entry in list.iter_mut().flatten() {
                let skip = entry.is_skipped();
                out.push(TextContainerMut {
                    kind,
                    jp_text: entry.jp_text.as_str(),
                    en_text: &mut entry.en_text,
                    skip,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blacklist() {
        assert!(is_blacklisted("タイトルコール"));
        assert!(is_blacklisted("イベントタイトルロゴ表示（後半）"));
        assert!(is_blacklisted("※ダミーテキスト"));
        assert!(is_blacklisted("ダミーテキスト"));
        assert!(is_blacklisted("欠番"));
        assert!(!is_blacklisted("タイトルコールです"));
        assert!(!is_blacklisted("こんにちは"));
    }

    #[test]
    fn test_block_keeps_unknown_fields() {
        let raw = json!({
            "jpName": "スペ",
            "enName": "Spe",
            "jpText": "こんにちは",
            "enText": "Hello",
            "nextBlock": 2,
            "animData": [{"origLen": 40}],
            "skip": true
        });
        let block: TextBlock = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(block.next_block, Some(2));
        assert!(block.is_skipped());
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_null_text_reads_as_empty() {
        let block: TextBlock = serde_json::from_value(json!({"jpText": "a", "enText": null})).unwrap();
        assert_eq!(block.en_text, "");
    }

    #[test]
    fn test_container_order() {
        let mut block = TextBlock::new("本文", "");
        block.choices = Some(vec![TextEntry::new("選択1", ""), TextEntry::new("選択2", "")]);
        block.colored_text = Some(vec![TextEntry::new("色", "")]);

        let kinds: Vec<_> = block.containers().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContainerKind::Block,
                ContainerKind::ColoredText,
                ContainerKind::Choice,
                ContainerKind::Choice
            ]
        );

        for c in block.containers_mut() {
            c.en_text.push_str("x");
        }
        assert_eq!(block.en_text, "x");
        assert_eq!(block.choices.as_ref().unwrap()[1].en_text, "x");
    }

    #[test]
    fn test_blacklisted_block_hides_children() {
        let mut block = TextBlock::new("タイトルコール", "");
        block.choices = Some(vec![TextEntry::new("選択1", "")]);
        assert!(block.containers().is_empty());

        // empty source text hides only the block itself
        let mut empty = TextBlock::new("", "");
        empty.choices = Some(vec![TextEntry::new("選択1", "")]);
        assert_eq!(empty.containers().len(), 1);
    }

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_raw_block_keeps_key_order() {
        let raw = json!({
            "jpName": "スペ", "enName": "", "jpText": "行こう", "enText": "",
            "nextBlock": 3, "origClipLength": 40, "animData": [{"origLen": 40}],
            "choices": [{"nextBlockIdx": 3, "jpText": "はい", "enText": ""}],
            "pathId": 77, "blockIdx": 2
        });
        let mut block = TextBlock::from_raw(raw.clone()).unwrap();
        block.en_text = "Let's go".to_string();
        block.extra.insert("skip".to_string(), json!(true));

        let written = block.to_value();
        assert_eq!(
            keys(&written),
            vec![
                "jpName", "enName", "jpText", "enText", "nextBlock", "origClipLength",
                "animData", "choices", "pathId", "blockIdx", "skip"
            ]
        );
        assert_eq!(keys(&written["choices"][0]), vec!["nextBlockIdx", "jpText", "enText"]);
        assert_eq!(written["enText"], "Let's go");
    }

    #[test]
    fn test_skip_is_not_inherited() {
        let mut block = TextBlock::new("本文", "text");
        block.extra.insert("skip".to_string(), json!(true));
        let mut own = TextEntry::new("選択2", "b");
        own.extra.insert("skip".to_string(), json!(true));
        block.choices = Some(vec![TextEntry::new("選択1", "a"), own]);

        let skips: Vec<bool> = block.containers().iter().map(|c| c.skip).collect();
        assert_eq!(skips, vec![true, false, true]);
        let skips: Vec<bool> = block.containers_mut().iter().map(|c| c.skip).collect();
        assert_eq!(skips, vec![true, false, true]);
    }
}
