use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::tokenizer::{pure_len, render, tokenize, Token, TokenKind};
use crate::text_type::TextType;
use crate::tl_file::{TranslationFile, CHARACTER_SYSTEM_TEXT};

/// Font size the line lengths are tuned for
pub const DEFAULT_FONT_SIZE: i64 = 24;
/// Default line count of a dialogue box
pub const DEFAULT_TARGET_LINES: usize = 3;
/// Last lines shorter than this share of the budget get rebalanced
const SHORT_LAST_LINE: f64 = 0.31;
/// Slack kept at the end of a greedily packed line
const BREAK_MARGIN: usize = 2;

/// Story groups shown in the wide text box
const WIDE_GROUPS: [&str; 5] = ["02", "04", "09", "10", "13"];

static NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *(?:\\n|\r?\n) *").expect("newline pattern is valid"));

static SIZE_WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(<size=\d+>)(.*?)((?:\\n|\r?\n)?</size>)$").expect("size pattern is valid")
});

/// Per-file layout parameters of the reflow engine
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Nominal characters per line; 0 disables adjustment
    pub line_length: i64,
    pub text_size: Option<i64>,
    pub escape_newline: bool,
    /// File identity used in overflow warnings
    pub label: String,
}

impl Layout {
    /// Layout of `file` at a resolved line length
    pub fn for_file(file: &TranslationFile, line_length: i64) -> Self {
        let label = match file.story_id() {
            Some(sid) if !sid.is_empty() => format!("{} ({sid})", file.name()),
            _ => file.name().to_string(),
        };
        Self {
            line_length,
            text_size: file.text_size(),
            escape_newline: file.escape_newline(),
            label,
        }
    }

    pub fn newline(&self) -> &'static str {
        if self.escape_newline {
            "\\n"
        } else {
            "\n"
        }
    }

    /// Character budget of one line
    pub fn budget(&self) -> usize {
        budget(self.line_length, self.text_size)
    }
}

/// Result of a length adjustment
#[derive(Debug, Clone, PartialEq)]
pub struct Adjusted {
    pub text: String,
    pub lines: usize,
    /// More lines than the target
    pub overflow: bool,
}

/// Nominal line length for a file: its own positive `lineLength`, else a
/// default by storage location and type
pub fn calc_line_length(file: &TranslationFile) -> i64 {
    if let Some(ll) = file.line_length().filter(|&ll| ll > 0) {
        return ll;
    }
    if file.parent_dir_name() == Some(CHARACTER_SYSTEM_TEXT) {
        return 25;
    }
    match file.text_type() {
        TextType::Lyrics => 67,
        TextType::Preview => 41,
        TextType::Race => 48,
        TextType::Story if is_wide_group(file) => 48,
        _ => 34,
    }
}

fn is_wide_group(file: &TranslationFile) -> bool {
    file.parsed_story_id()
        .and_then(|sid| sid.group)
        .is_some_and(|g| WIDE_GROUPS.contains(&g.as_str()))
}

/// Character budget for a nominal line length, scaled for glyph width and
/// font size
pub fn budget(line_length: i64, text_size: Option<i64>) -> usize {
    let len = line_length as f64;
    let font = text_size.unwrap_or(DEFAULT_FONT_SIZE) as f64;
    let size_mod = 1.07 * (font / 24.0).powf(0.6);
    ((len * (1.135 * len.powf(0.05)) + 1.0) * size_mod).floor() as usize
}

/// Collapse real and escaped line breaks (with surrounding spaces) to a
/// single space
pub fn clean_newlines(text: &str) -> String {
    NEWLINE_RE.replace_all(text, " ").into_owned()
}

fn split_lines(text: &str) -> Vec<&str> {
    NEWLINE_RE.split(text).collect()
}

fn has_newline(text: &str) -> bool {
    text.contains('\n') || text.contains("\\n")
}

/// Convert real newlines to the file's stored form
fn normalize_newlines(text: &str, layout: &Layout) -> String {
    if layout.escape_newline {
        text.replace("\r\n", "\\n").replace('\n', "\\n")
    } else {
        text.to_string()
    }
}

/// Split a `<size=N>...</size>` wrapper off: (open tag, inner, close part)
fn split_size_wrapper(text: &str) -> Option<(&str, &str, &str)> {
    let caps = SIZE_WRAPPER_RE.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str()))
}

/// Reflow a text to the layout's line budget
///
/// Texts that are shorter than one line, or whose lines all fit and stay
/// within `target_lines`, are kept as they are. An existing size wrapper
/// is kept around the reflowed text.
///
/// # Arguments
/// * `layout` - line budget and newline form of the target file
/// * `target_lines` - lines the text should fit in; 0 means no limit
/// * `exclusive_newlines` - leave texts with manual line breaks alone
///
/// # Returns
/// The reflowed text with its line count. Going past `target_lines` is
/// flagged in `overflow` and logged, never refused.
pub fn adjust_length(
    text: &str,
    layout: &Layout,
    target_lines: usize,
    exclusive_newlines: bool,
) -> Adjusted {
    let (open, inner, close) = split_size_wrapper(text).unwrap_or(("", text, ""));
    let budget = layout.budget();
    let keep = |reason: &str| {
        debug!("{reason}, skipping: {text}");
        Adjusted {
            text: normalize_newlines(text, layout),
            lines: split_lines(inner).len(),
            overflow: false,
        }
    };

    if exclusive_newlines && has_newline(inner) {
        return keep("Text has manual line breaks");
    }
    if pure_len(inner) < budget {
        return keep("Short text line");
    }
    let existing = split_lines(inner);
    if existing.len() <= target_lines && existing.iter().all(|l| pure_len(l) <= budget) {
        return keep("Text passes length check");
    }

    let flat = clean_newlines(inner);
    let tokens = layout_tokens(&flat);
    let mut lines = pack(&tokens, budget, Fill::Greedy);
    let last_len = lines.last().map_or(0, |l| pure_len(l));
    if lines.len() > 1 && (last_len as f64) < budget as f64 * SHORT_LAST_LINE {
        let total = pure_len(&render(&tokens));
        let per_line = total.div_ceil(lines.len());
        debug!("Last line is short, balancing to {} lines of {per_line}", lines.len());
        let balanced = pack(&tokens, budget, Fill::Balanced(per_line));
        if balanced.len() <= lines.len() {
            lines = balanced;
        }
    }

    let overflow = target_lines > 0 && lines.len() > target_lines;
    if overflow {
        warn!(
            "Exceeded target lines ({target_lines} -> {}) in {}:\n\t{}",
            lines.len(),
            layout.label,
            lines.join("\n\t")
        );
    }
    Adjusted {
        text: format!("{open}{}{close}", lines.join(layout.newline())),
        lines: lines.len(),
        overflow,
    }
}

/// Wrap text in the layout's `<size>` tag. An existing wrapper is kept,
/// or regenerated with `force`.
pub fn resize_text(text: &str, layout: &Layout, force: bool) -> String {
    let Some(size) = layout.text_size else {
        return text.to_string();
    };
    let inner = match split_size_wrapper(text) {
        Some(_) if !force => return text.to_string(),
        Some((_, inner, _)) => inner,
        None => text,
    };
    format!("<size={size}>{inner}{}</size>", layout.newline())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// Fill each line up to the budget
    Greedy,
    /// Fill each line to at least this length, never past the budget
    Balanced(usize),
}

/// A run of tokens with no whitespace inside; lines only break between chunks
struct Chunk<'t, 'a> {
    tokens: &'t [Token<'a>],
    len: usize,
}

fn chunks<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<Chunk<'t, 'a>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if tok.space_after || i + 1 == tokens.len() {
            let slice = &tokens[start..=i];
            out.push(Chunk {
                tokens: slice,
                len: slice.iter().map(Token::pure_len).sum(),
            });
            start = i + 1;
        }
    }
    out
}

/// Tokens of a text ready for packing. Opening tags give up the space
/// after them and closing tags the space before them, so a tag stays with
/// the word it marks up and the whitespace around a lone tag renders as one
/// space. Lines then measure exactly as they render.
fn layout_tokens(text: &str) -> Vec<Token<'_>> {
    let mut tokens = tokenize(text);
    for i in 1..tokens.len() {
        if tokens[i].kind == TokenKind::Close && tokens[i - 1].space_after {
            tokens[i - 1].space_after = false;
            tokens[i].space_after = true;
        }
    }
    for i in (0..tokens.len()).rev() {
        if tokens[i].kind == TokenKind::Open && tokens[i].space_after {
            tokens[i].space_after = false;
            if i > 0 {
                tokens[i - 1].space_after = true;
            }
        }
    }
    tokens
}

#[derive(Default)]
struct Line<'a> {
    tokens: Vec<Token<'a>>,
    /// Visible length of the rendered line
    len: usize,
}

impl<'a> Line<'a> {
    fn has_text(&self) -> bool {
        self.len > 0
    }

    /// Length after appending `chunk`, counting the space `render` puts
    /// between the two
    fn len_with(&self, chunk: &Chunk<'_, 'a>) -> usize {
        let gap = usize::from(self.tokens.last().is_some_and(|t| t.space_after));
        self.len + gap + chunk.len
    }

    fn push(&mut self, chunk: &Chunk<'_, 'a>) {
        self.len = self.len_with(chunk);
        self.tokens.extend_from_slice(chunk.tokens);
    }
}

fn pack(tokens: &[Token<'_>], budget: usize, fill: Fill) -> Vec<String> {
    let limit = budget.saturating_sub(BREAK_MARGIN);
    let mut lines: Vec<Line<'_>> = Vec::new();
    let mut line = Line::default();

    for chunk in chunks(tokens) {
        let fits = match fill {
            Fill::Greedy => {
                let len = line.len_with(&chunk);
                len <= limit || (chunk.len == 1 && chunk.tokens.len() == 1 && len <= budget)
            }
            Fill::Balanced(target) => line.len < target && line.len_with(&chunk) <= budget,
        };
        if chunk.len == 0 || !line.has_text() || fits {
            line.push(&chunk);
            continue;
        }
        lines.push(std::mem::take(&mut line));
        line.push(&chunk);
    }
    if !line.tokens.is_empty() {
        lines.push(line);
    }
    lines.iter().map(|l| render(&l.tokens)).collect()
}
