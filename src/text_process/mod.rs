//! Translation cleanup and line reflow
//!
//! A text goes through, in order: newline removal (`redo_newlines`), the
//! replacement table, stutter normalization (`extrarep`), length
//! adjustment, and the `<size>` wrapper pass.

mod context;
mod options;
mod reflow;
mod replace;
mod tokenizer;


pub use context::ProcessingContext;
pub use options::{ProcessOptions, ReplaceMode};
pub use reflow::{
    adjust_length, budget, calc_line_length, clean_newlines, resize_text, Adjusted, Layout,
    DEFAULT_FONT_SIZE, DEFAULT_TARGET_LINES,
};
pub use replace::{normalize_stutter, ReplacementTable};
pub use tokenizer::{pure_len, strip_markup, tokenize, Token, TokenKind};

use tracing::info;

use crate::tl_file::TranslationFile;
use crate::utils::Result;

/// A processed text
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub text: String,
    /// Length adjustment ran past the target line count
    pub overflow: bool,
}

/// Outcome of processing one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Translated containers that were processed
    pub containers: usize,
    pub changed: usize,
    pub overflowing: usize,
    /// The file was written
    pub saved: bool,
}

fn resolve_layout(ctx: &mut ProcessingContext, file: &TranslationFile, opts: &ProcessOptions) -> Layout {
    let line_length = if opts.line_length < 0 {
        ctx.line_length_for(file)
    } else {
        opts.line_length
    };
    Layout::for_file(file, line_length)
}

/// Process one translated text for display in `file`
pub fn process_text(
    ctx: &mut ProcessingContext,
    file: &TranslationFile,
    text: &str,
    opts: &ProcessOptions,
) -> Processed {
    let layout = resolve_layout(ctx, file, opts);
    process_with_layout(ctx.replacements(), &layout, text, opts)
}

/// Process a text against an already resolved layout
pub fn process_with_layout(
    table: &ReplacementTable,
    layout: &Layout,
    text: &str,
    opts: &ProcessOptions,
) -> Processed {
    let mut text = if opts.redo_newlines {
        clean_newlines(text)
    } else {
        text.to_string()
    };
    text = table.apply(&text, opts.replace_mode);
    if opts.extrarep {
        text = normalize_stutter(&text);
    }

    let mut overflow = false;
    if layout.line_length > 0 {
        let adjusted = adjust_length(&text, layout, opts.target_lines, opts.exclusive_newlines);
        text = adjusted.text;
        overflow = adjusted.overflow;
    }
    Processed {
        text: resize_text(&text, layout, opts.force_resize),
        overflow,
    }
}

/// Process every translated container of a file, then save it.
/// Empty translations and blocks flagged `skip` are left alone.
pub fn process_file(
    ctx: &mut ProcessingContext,
    file: &mut TranslationFile,
    opts: &ProcessOptions,
) -> Result<ProcessStats> {
    let layout = resolve_layout(ctx, file, opts);
    let table = ctx.replacements();
    let mut stats = ProcessStats::default();

    for container in file.text_containers_mut() {
        if container.en_text.is_empty() || container.skip {
            continue;
        }
        stats.containers += 1;
        let out = process_with_layout(table, &layout, container.en_text, opts);
        if out.overflow {
            stats.overflowing += 1;
        }
        if out.text != *container.en_text {
            stats.changed += 1;
            *container.en_text = out.text;
        }
    }

    stats.saved = file.save()?;
    info!(
        "Processed {}: {} texts, {} changed, {} overflowing",
        file.name(),
        stats.containers,
        stats.changed,
        stats.overflowing
    );
    Ok(stats)
}
