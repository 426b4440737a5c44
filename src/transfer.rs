//! Carry translations over to a freshly extracted file
//!
//! When a story asset is re-extracted (a game update changed it, or the
//! file is being upgraded to a newer version), the existing translation is
//! matched block by block and copied into the new file.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::tl_file::{TextBlock, TextData, TextEntry, TranslationFile};

/// Counters of a transfer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Blocks matched through their `blockIdx`
    pub by_index: usize,
    /// Blocks matched by searching the source text
    pub by_search: usize,
    /// Blocks with no counterpart in the old file
    pub missing: usize,
}

/// Matches new blocks against an old file's blocks
///
/// Blocks are looked up by `blockIdx`, corrected by the shift found at the
/// last text search, so inserted or removed blocks only cost one search.
#[derive(Debug)]
pub struct Transfer<'a> {
    source: &'a TextData,
    offset: i64,
    upgrade: bool,
    stats: TransferStats,
}

impl<'a> Transfer<'a> {
    /// In `upgrade` mode the source texts are copied too and index matches
    /// are trusted without comparing them.
    pub fn new(source: &'a TextData, upgrade: bool) -> Self {
        Self {
            source,
            offset: 0,
            upgrade,
            stats: TransferStats::default(),
        }
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    fn find(&mut self, block: &TextBlock) -> Option<&'a TextBlock> {
        let mut pos = 0usize;
        if let Some(block_idx) = block.block_idx {
            pos = (block_idx - 1 - self.offset).max(0) as usize;
            if let Some(candidate) = self.source.get(pos) {
                if self.upgrade || candidate.jp_text == block.jp_text {
                    self.stats.by_index += 1;
                    return Some(candidate);
                }
            }
        }

        debug!("Searching by text for block {:?}", block.block_idx);
        let source = self.source;
        match source.iter().position(|b| b.jp_text == block.jp_text) {
            Some(found) => {
                debug!("Found text at block {found}");
                self.offset = pos as i64 - found as i64;
                self.stats.by_search += 1;
                source.get(found)
            }
            None => {
                info!(
                    "At blockIdx {}: jpText not found in file.",
                    block.block_idx.map_or_else(|| "none".to_string(), |i| i.to_string())
                );
                self.stats.missing += 1;
                None
            }
        }
    }

    /// Copy the translation of the matching old block into `block`.
    /// Returns whether a match was found.
    pub fn apply(&mut self, block: &mut TextBlock) -> bool {
        let Some(old) = self.find(block) else {
            return false;
        };
        let upgrade = self.upgrade;

        if upgrade {
            block.jp_text = old.jp_text.clone();
        }
        block.en_text = old.en_text.clone();
        if old.en_name.is_some() {
            if upgrade {
                block.jp_name = old.jp_name.clone();
            }
            block.en_name = old.en_name.clone();
        }
        if let (Some(old_list), Some(new_list)) = (&old.choices, &mut block.choices) {
            copy_entries("choices", old_list, new_list, old.block_idx, upgrade);
        }
        if let (Some(old_list), Some(new_list)) = (&old.colored_text, &mut block.colored_text) {
            copy_entries("coloredText", old_list, new_list, old.block_idx, upgrade);
        }
        if let Some(skip) = old.extra.get("skip") {
            block.extra.insert("skip".to_string(), skip.clone());
        }
        if old.new_clip_length.is_some() {
            block.new_clip_length = old.new_clip_length;
        }
        // clip lengths of the old asset only hold when it was patched
        if upgrade && old.orig_clip_length.is_some() {
            block.orig_clip_length = old.orig_clip_length;
            copy_anim_lengths(old, block);
        }
        true
    }
}

fn copy_entries(
    what: &str,
    old: &[TextEntry],
    new: &mut [TextEntry],
    block_idx: Option<i64>,
    upgrade: bool,
) {
    if new.is_empty() {
        return;
    }
    if old.len() != new.len() {
        warn!(
            "{what} mismatch at blockIdx {:?} ({} -> {}), not transferred",
            block_idx,
            old.len(),
            new.len()
        );
        return;
    }
    for (from, to) in old.iter().zip(new.iter_mut()) {
        if upgrade {
            to.jp_text = from.jp_text.clone();
        }
        to.en_text = from.en_text.clone();
    }
}

fn copy_anim_lengths(old: &TextBlock, block: &mut TextBlock) {
    let Some(Value::Array(old_groups)) = old.extra.get("animData") else {
        return;
    };
    let Some(Value::Array(groups)) = block.extra.get_mut("animData") else {
        return;
    };
    for (group, old_group) in groups.iter_mut().zip(old_groups) {
        if let (Some(obj), Some(len)) = (group.as_object_mut(), old_group.get("origLen")) {
            obj.insert("origLen".to_string(), len.clone());
        }
    }
}

/// Transfer every block of `target` from `source`
pub fn transfer_file(
    source: &TranslationFile,
    target: &mut TranslationFile,
    upgrade: bool,
) -> TransferStats {
    let mut transfer = Transfer::new(source.text_blocks(), upgrade);
    for block in target.text_blocks_mut().iter_mut() {
        transfer.apply(block);
    }
    let stats = transfer.stats();
    info!(
        "{} {}: {} by index, {} by search, {} missing",
        if upgrade { "Upgraded" } else { "Updated" },
        target.name(),
        stats.by_index,
        stats.by_search,
        stats.missing
    );
    stats
}
