use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::options::ReplaceMode;
use crate::utils::{Result, TlError};

/// Table shipped with the crate
const BUILTIN_TABLE: &str = include_str!("../../data/replacer.json");

/// Letter stutters such as "T-t-that" or "w-w-what"
static STUTTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z]-)+[A-Za-z]\w*").expect("stutter pattern is valid")
});

#[derive(Debug, Deserialize)]
struct RawRule {
    re: String,
    repl: String,
    /// Presence alone marks the rule as full-mode only
    #[serde(default)]
    limit: Option<Value>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    repl: String,
    full_only: bool,
}

/// Ordered, case-insensitive find/replace cascade
#[derive(Debug, Clone, Default)]
pub struct ReplacementTable {
    rules: Vec<Rule>,
}

impl ReplacementTable {
    /// The table bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Load a table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parse a table: a list of `{"re", "repl", "limit"?, "disabled"?}`.
    /// Replacements may use `\1` / `\g<name>` group references.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawRule> = serde_json::from_str(json)?;
        let mut rules = Vec::with_capacity(raw.len());
        for (index, rule) in raw.into_iter().enumerate() {
            if rule.disabled {
                continue;
            }
            let pattern = RegexBuilder::new(&rule.re)
                .case_insensitive(true)
                .build()
                .map_err(|source| TlError::Regex { index, source })?;
            rules.push(Rule {
                pattern,
                repl: convert_group_refs(&rule.repl),
                full_only: rule.limit.is_some(),
            });
        }
        debug!("Loaded {} replacement rules", rules.len());
        Ok(Self { rules })
    }

    /// Enabled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the cascade in table order
    pub fn apply(&self, text: &str, mode: ReplaceMode) -> String {
        if mode == ReplaceMode::None {
            return text.to_string();
        }
        let mut text = text.to_string();
        for rule in &self.rules {
            if mode == ReplaceMode::Limit && rule.full_only {
                continue;
            }
            text = rule
                .pattern
                .replace_all(&text, rule.repl.as_str())
                .into_owned();
        }
        text
    }
}

/// Rewrite `\1`, `\g<1>` and `\g<name>` group references into `${...}`
/// form, escaping literal `$`
fn convert_group_refs(repl: &str) -> String {
    let mut out = String::with_capacity(repl.len());
    let mut chars = repl.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                        num.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{num}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Give every letter of a stutter the case of its first letter:
/// "T-t-that" becomes "T-T-That". Hyphenated words whose leading letters
/// differ from the word ("x-ray", "T-shirt") are left alone.
pub fn normalize_stutter(text: &str) -> String {
    STUTTER_RE
        .replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            let mut parts: Vec<&str> = whole.split('-').collect();
            let Some(word) = parts.pop() else {
                return whole.to_string();
            };
            let Some(first) = word.chars().next() else {
                return whole.to_string();
            };
            let is_stutter = parts
                .iter()
                .all(|p| p.chars().all(|c| c.eq_ignore_ascii_case(&first)));
            if !is_stutter || parts.is_empty() {
                return whole.to_string();
            }
            let upper = parts[0].starts_with(|c: char| c.is_ascii_uppercase());
            let set_case = |c: char| {
                if upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            };
            let mut out = String::with_capacity(whole.len());
            for p in &parts {
                out.extend(p.chars().map(set_case));
                out.push('-');
            }
            out.push(set_case(first));
            out.push_str(&word[first.len_utf8()..]);
            out
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_ref_conversion() {
        assert_eq!(convert_group_refs(r"\1 and \2"), "${1} and ${2}");
        assert_eq!(convert_group_refs(r"\g<name>!"), "${name}!");
        assert_eq!(convert_group_refs("cost $5"), "cost $$5");
        assert_eq!(convert_group_refs(r"a\nb"), "a\nb");
    }

    #[test]
    fn test_table_order_and_modes() {
        let table = ReplacementTable::from_json(
            r#"[
                {"re": "cat", "repl": "dog"},
                {"re": "dog", "repl": "wolf", "limit": true},
                {"re": "wolf", "repl": "fox", "disabled": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.apply("Cat", ReplaceMode::All), "wolf");
        assert_eq!(table.apply("Cat", ReplaceMode::Limit), "dog");
        assert_eq!(table.apply("Cat", ReplaceMode::None), "Cat");
    }

    #[test]
    fn test_backrefs_apply() {
        let table =
            ReplacementTable::from_json(r#"[{"re": "(\\w+)-san", "repl": "\\1"}]"#).unwrap();
        assert_eq!(table.apply("Thanks, Trainer-san!", ReplaceMode::All), "Thanks, Trainer!");
    }

    #[test]
    fn test_bad_rule_reports_index() {
        let err = ReplacementTable::from_json(r#"[{"re": "ok", "repl": ""}, {"re": "(", "repl": ""}]"#)
            .unwrap_err();
        assert!(matches!(err, TlError::Regex { index: 1, .. }));
    }

    #[test]
    fn test_builtin_table() {
        let table = ReplacementTable::builtin().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.apply("Wait…  what ?", ReplaceMode::Limit), "Wait... what?");
        assert_eq!(table.apply("Thanks, Trainer-san", ReplaceMode::Limit), "Thanks, Trainer-san");
        assert_eq!(table.apply("Thanks, Trainer-san", ReplaceMode::All), "Thanks, Trainer");
    }

    #[test]
    fn test_stutter() {
        assert_eq!(normalize_stutter("T-t-that's it."), "T-T-That's it.");
        assert_eq!(normalize_stutter("w-W-what?"), "w-w-what?");
        assert_eq!(normalize_stutter("An x-ray and a T-shirt."), "An x-ray and a T-shirt.");
    }
}
