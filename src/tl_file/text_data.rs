use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::block::{TextBlock, TextContainer, TextContainerMut};
use crate::utils::{Result, TlError};

/// Block collection of a translation file
///
/// Narrative files store a list of block records; mdb and unversioned files
/// store a flat `jpText -> enText` map. Both shapes expose the same
/// positional and keyed access. Map-shaped data is expanded into block
/// records on load and folded back by [`TextData::to_native`].
#[derive(Debug, Clone, PartialEq)]
pub enum TextData {
    /// List of block records, stored as-is
    List(Vec<TextBlock>),
    /// Flat map expanded into records, with a jpText index
    Keyed(KeyedBlocks),
}

/// Records synthesized from a flat map, indexed by source text in map order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedBlocks {
    blocks: Vec<TextBlock>,
    index: IndexMap<String, usize>,
}

impl KeyedBlocks {
    fn push(&mut self, jp_text: String, en_text: String) {
        let pos = self.blocks.len();
        let mut block = TextBlock::new(jp_text.clone(), en_text);
        block.block_idx = Some(pos as i64 + 1);
        block.next_block = Some(pos as i64 + 2);
        self.blocks.push(block);
        self.index.insert(jp_text, pos);
    }
}

impl FromIterator<(String, String)> for KeyedBlocks {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut keyed = KeyedBlocks::default();
        for (jp, en) in iter {
            match keyed.index.get(&jp) {
                Some(&pos) => keyed.blocks[pos].en_text = en,
                None => keyed.push(jp, en),
            }
        }
        keyed
    }
}

impl Default for TextData {
    fn default() -> Self {
        TextData::List(Vec::new())
    }
}

impl TextData {
    /// Build from raw JSON: an array becomes a block list, an object a keyed map
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(TextBlock::from_raw)
                .collect::<Result<Vec<_>>>()
                .map(TextData::List),
            Value::Object(map) => Self::from_map(map),
            other => Err(TlError::InvalidShape(format!(
                "text data must be a list or map, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        let mut pairs = Vec::with_capacity(map.len());
        for (jp, en) in map {
            let en = match en {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => {
                    return Err(TlError::InvalidShape(format!(
                        "value for `{jp}` must be a string, got {}",
                        json_kind(&other)
                    )))
                }
            };
            pairs.push((jp, en));
        }
        Ok(TextData::Keyed(pairs.into_iter().collect()))
    }

    /// Blocks as records. Keyed data exposes its pairs as blocks with only
    /// `jpText` and `enText` set.
    pub fn blocks(&self) -> &[TextBlock] {
        match self {
            TextData::List(blocks) => blocks,
            TextData::Keyed(keyed) => &keyed.blocks,
        }
    }

    fn blocks_vec_mut(&mut self) -> &mut Vec<TextBlock> {
        match self {
            TextData::List(blocks) => blocks,
            TextData::Keyed(keyed) => &mut keyed.blocks,
        }
    }

    /// Data of a flat `jpText -> enText` map
    pub fn is_keyed(&self) -> bool {
        matches!(self, TextData::Keyed(_))
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextBlock> {
        self.blocks().iter()
    }

    /// Mutable block access. Source texts of keyed data must not be changed
    /// through this, or the jpText index goes stale.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TextBlock> {
        self.blocks_vec_mut().iter_mut()
    }

    /// Block at a position in file order
    pub fn get(&self, pos: usize) -> Option<&TextBlock> {
        self.blocks().get(pos)
    }

    /// Mutable block at a position. The same caveat as
    /// [`TextData::iter_mut`] applies to keyed data.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut TextBlock> {
        self.blocks_vec_mut().get_mut(pos)
    }

    /// Translation for a source text
    pub fn get_by_key(&self, jp_text: &str) -> Option<&str> {
        match self {
            TextData::Keyed(keyed) => keyed
                .index
                .get(jp_text)
                .map(|&pos| keyed.blocks[pos].en_text.as_str()),
            TextData::List(blocks) => blocks
                .iter()
                .find(|b| b.jp_text == jp_text)
                .map(|b| b.en_text.as_str()),
        }
    }

    /// Set the translation for a source text, adding an entry when missing.
    /// List-shaped data has no key index and is addressed by position only.
    pub fn set_by_key(&mut self, jp_text: &str, en_text: impl Into<String>) -> Result<()> {
        match self {
            TextData::Keyed(keyed) => {
                let en_text = en_text.into();
                match keyed.index.get(jp_text) {
                    Some(&pos) => keyed.blocks[pos].en_text = en_text,
                    None => keyed.push(jp_text.to_string(), en_text),
                }
                Ok(())
            }
            TextData::List(_) => Err(TlError::NoIndex(jp_text.to_string())),
        }
    }

    /// Replace the block at `pos`
    pub fn set(&mut self, pos: usize, block: TextBlock) -> Result<()> {
        if let TextData::Keyed(keyed) = self {
            if let Some(old) = keyed.blocks.get(pos) {
                if old.jp_text != block.jp_text {
                    keyed.index.shift_remove(&old.jp_text);
                    keyed.index.insert(block.jp_text.clone(), pos);
                }
            }
        }
        let blocks = self.blocks_vec_mut();
        let len = blocks.len();
        let slot = blocks
            .get_mut(pos)
            .ok_or_else(|| TlError::InvalidShape(format!("block index {pos} out of range ({len})")))?;
        *slot = block;
        Ok(())
    }

    /// Append a block record
    pub fn push(&mut self, block: TextBlock) {
        match self {
            TextData::Keyed(keyed) => keyed.push(block.jp_text, block.en_text),
            TextData::List(blocks) => blocks.push(block),
        }
    }

    /// First block whose field `key` equals `val` (camelCase field names)
    pub fn find(&self, key: &str, val: &Value) -> Option<&TextBlock> {
        self.iter().find(|b| {
            serde_json::to_value(b)
                .ok()
                .and_then(|v| v.get(key).cloned())
                .as_ref()
                == Some(val)
        })
    }

    /// `(jpText, enText)` pairs in order
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().map(|b| (b.jp_text.as_str(), b.en_text.as_str()))
    }

    /// Every translatable container, block by block
    pub fn containers(&self) -> impl Iterator<Item = TextContainer<'_>> {
        self.iter().flat_map(TextBlock::containers)
    }

    pub fn containers_mut(&mut self) -> impl Iterator<Item = TextContainerMut<'_>> {
        self.iter_mut().flat_map(TextBlock::containers_mut)
    }

    /// Serialized form as written to disk. Flat-family files fold the
    /// records back into a `jpText -> enText` map.
    pub fn to_native(&self, flat: bool) -> Value {
        if flat {
            let map: Map<String, Value> = self
                .items()
                .map(|(jp, en)| (jp.to_string(), Value::String(en.to_string())))
                .collect();
            Value::Object(map)
        } else {
            self.to_interchange()
        }
    }

    /// Expanded list-of-records form
    pub fn to_interchange(&self) -> Value {
        Value::Array(self.iter().map(TextBlock::to_value).collect())
    }
}

impl<'a> IntoIterator for &'a TextData {
    type Item = &'a TextBlock;
    type IntoIter = std::slice::Iter<'a, TextBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
