use std::fmt;
use std::str::FromStr;

use crate::utils::TlError;

/// Kind of text a translation file (or story id) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextType {
    /// Main and event story chapters
    Story,
    /// Home screen conversations
    Home,
    /// Race commentary
    Race,
    /// Song lyrics
    Lyrics,
    /// Live preview texts
    Preview,
    /// Master database term maps
    Mdb,
    /// Unversioned flat maps
    Dict,
    /// Version 1/2 files, before the type was stored
    Legacy,
}

impl TextType {
    /// Asset types the bundle tools read and write
    pub const TARGETS: [TextType; 5] = [
        TextType::Story,
        TextType::Home,
        TextType::Race,
        TextType::Lyrics,
        TextType::Preview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Story => "story",
            TextType::Home => "home",
            TextType::Race => "race",
            TextType::Lyrics => "lyrics",
            TextType::Preview => "preview",
            TextType::Mdb => "mdb",
            TextType::Dict => "dict",
            TextType::Legacy => "story/home",
        }
    }

    /// Types whose story id is a single flat `id`
    pub fn is_id_only(&self) -> bool {
        matches!(self, TextType::Lyrics | TextType::Preview)
    }

    /// Types whose stored line breaks are the escaped `\n` sequence
    pub fn escapes_newline(&self) -> bool {
        matches!(
            self,
            TextType::Race | TextType::Preview | TextType::Mdb | TextType::Lyrics
        )
    }
}

impl FromStr for TextType {
    type Err = TlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(TextType::Story),
            "home" => Ok(TextType::Home),
            "race" => Ok(TextType::Race),
            "lyrics" => Ok(TextType::Lyrics),
            "preview" => Ok(TextType::Preview),
            "mdb" => Ok(TextType::Mdb),
            "dict" => Ok(TextType::Dict),
            "story/home" => Ok(TextType::Legacy),
            other => Err(TlError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
