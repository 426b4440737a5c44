use std::sync::LazyLock;

use regex::Regex;

/// Rich-text tags the game renders: bold, italic, color and size
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:i|b|color|size)(?:=[^>]*)?>").expect("markup pattern is valid")
});

static WORD_OR_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+|\s+").expect("word pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    Word,
}

/// One unit of reflow input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Whitespace follows this token in the source
    pub space_after: bool,
}

impl Token<'_> {
    pub fn is_tag(&self) -> bool {
        self.kind != TokenKind::Word
    }

    /// Characters counted toward the line budget
    pub fn pure_len(&self) -> usize {
        match self.kind {
            TokenKind::Word => self.text.chars().count(),
            _ => 0,
        }
    }
}

/// Split text into tag and word tokens in one pass. Whitespace runs are not
/// tokens of their own; they set `space_after` on the preceding token.
/// Tags outside the markup allow-list are plain words.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in MARKUP_RE.find_iter(text) {
        push_words(&mut tokens, &text[last..m.start()]);
        let kind = if m.as_str().starts_with("</") {
            TokenKind::Close
        } else {
            TokenKind::Open
        };
        tokens.push(Token {
            kind,
            text: m.as_str(),
            space_after: false,
        });
        last = m.end();
    }
    push_words(&mut tokens, &text[last..]);
    tokens
}

fn push_words<'a>(tokens: &mut Vec<Token<'a>>, chunk: &'a str) {
    for m in WORD_OR_SPACE_RE.find_iter(chunk) {
        if m.as_str().trim().is_empty() {
            if let Some(prev) = tokens.last_mut() {
                prev.space_after = true;
            }
        } else {
            tokens.push(Token {
                kind: TokenKind::Word,
                text: m.as_str(),
                space_after: false,
            });
        }
    }
}

/// Text with allow-listed markup removed
pub fn strip_markup(text: &str) -> String {
    MARKUP_RE.replace_all(text, "").into_owned()
}

/// Visible length of a text, in chars
pub fn pure_len(text: &str) -> usize {
    strip_markup(text).chars().count()
}

/// Render tokens back to text: single spaces where the source had
/// whitespace, nothing trailing
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for tok in tokens {
        out.push_str(tok.text);
        if tok.space_after {
            out.push(' ');
        }
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, &str, bool)> {
        tokenize(text)
            .into_iter()
            .map(|t| (t.kind, t.text, t.space_after))
            .collect()
    }

    #[test]
    fn test_tokenize_words_and_tags() {
        use TokenKind::*;
        assert_eq!(
            kinds("Say <color=#ff0000>hi</color>  now"),
            vec![
                (Word, "Say", true),
                (Open, "<color=#ff0000>", false),
                (Word, "hi", false),
                (Close, "</color>", true),
                (Word, "now", false),
            ]
        );
    }

    #[test]
    fn test_unknown_tags_are_words() {
        let toks = tokenize("<ruby>x</ruby>");
        assert!(toks.iter().all(|t| t.kind == TokenKind::Word));
        assert_eq!(pure_len("<ruby>x</ruby>"), 14);
    }

    #[test]
    fn test_pure_len_ignores_markup() {
        assert_eq!(pure_len("<b>bold</b> <size=20>big</size>"), 8);
        assert_eq!(pure_len("ウマ娘"), 3);
    }

    #[test]
    fn test_render_normalizes_space() {
        assert_eq!(render(&tokenize("  a   <i>b</i>\tc ")), "a <i>b</i> c");
    }
}
