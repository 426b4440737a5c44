pub mod config;
pub mod io;
pub mod search;
pub mod story_id;
pub mod text_process;
pub mod text_type;
pub mod tl_file;
pub mod transfer;
pub mod utils;

// main types
pub use config::ToolConfig;
pub use story_id::StoryId;
pub use text_process::{process_file, process_text, ProcessOptions, ProcessingContext, ReplaceMode};
pub use text_type::TextType;
pub use tl_file::{FileVersion, TextBlock, TextData, TranslationFile};
pub use utils::{Result, TlError};
