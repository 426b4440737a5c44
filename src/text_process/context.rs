use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::reflow::calc_line_length;
use super::replace::ReplacementTable;
use crate::tl_file::TranslationFile;
use crate::utils::Result;

/// State shared by the texts of one processing run
///
/// Holds the compiled replacement table and the line lengths already
/// derived for each file. Cloning is cheap: the table is shared, so
/// parallel workers each take a clone.
#[derive(Debug, Clone, Default)]
pub struct ProcessingContext {
    replacements: Arc<ReplacementTable>,
    line_lengths: HashMap<PathBuf, i64>,
}

impl ProcessingContext {
    /// Context sharing `replacements`, with an empty line-length cache
    pub fn new(replacements: ReplacementTable) -> Self {
        Self {
            replacements: Arc::new(replacements),
            line_lengths: HashMap::new(),
        }
    }

    /// Context with the bundled replacement table
    pub fn with_builtin() -> Result<Self> {
        Ok(Self::new(ReplacementTable::builtin()?))
    }

    /// Context with a replacement table read from `path`
    pub fn with_table_file(path: &Path) -> Result<Self> {
        Ok(Self::new(ReplacementTable::load(path)?))
    }

    /// Replacement table used for every text
    pub fn replacements(&self) -> &ReplacementTable {
        &self.replacements
    }

    /// Automatic line length of a file, computed once per path
    pub fn line_length_for(&mut self, file: &TranslationFile) -> i64 {
        if let Some(&ll) = self.line_lengths.get(file.path()) {
            return ll;
        }
        let ll = calc_line_length(file);
        debug!("Line length set to {ll} for {}", file.name());
        self.line_lengths.insert(file.path().to_path_buf(), ll);
        ll
    }

    /// Forget cached line lengths
    pub fn clear_cache(&mut self) {
        self.line_lengths.clear();
    }
}
