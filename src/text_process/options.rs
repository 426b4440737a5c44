use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::TlError;

/// How much of the replacement table to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Every enabled rule
    All,
    /// Skip rules flagged `limit`
    #[default]
    Limit,
    /// No replacements
    None,
}

impl FromStr for ReplaceMode {
    type Err = TlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReplaceMode::All),
            "limit" => Ok(ReplaceMode::Limit),
            "none" => Ok(ReplaceMode::None),
            other => Err(TlError::InvalidShape(format!("unknown replace mode `{other}`"))),
        }
    }
}

/// Text processing options
///
/// Deserializes from the `textprocess` section of a tool config, missing
/// keys taking their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessOptions {
    /// Drop existing line breaks before reflowing
    pub redo_newlines: bool,
    pub replace_mode: ReplaceMode,
    /// Normalize letter stutters ("T-t-that")
    pub extrarep: bool,
    /// -1 derives the length from the file, 0 disables length adjustment
    pub line_length: i64,
    /// Lines a text may take before it is reported as overflowing
    pub target_lines: usize,
    /// Regenerate an existing `<size>` wrapper
    pub force_resize: bool,
    /// Leave texts that already contain a line break alone
    pub exclusive_newlines: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            redo_newlines: false,
            replace_mode: ReplaceMode::Limit,
            extrarep: false,
            line_length: -1,
            target_lines: 3,
            force_resize: false,
            exclusive_newlines: false,
        }
    }
}
