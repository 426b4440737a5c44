mod block;
mod file;
mod io;
mod text_data;
mod version;

#[cfg(test)]
mod tests;

pub use block::{
    is_blacklisted, ContainerKind, KeyLayout, TextBlock, TextContainer, TextContainerMut, TextEntry,
};
pub use file::{FileStats, TranslationFile, CHARACTER_SYSTEM_TEXT};
pub use io::{read_json, write_json};
pub use text_data::{KeyedBlocks, TextData};
pub use version::FileVersion;
