//! Sentence segmentation — splits a line of running text into sentence spans.
//!
//! 1. Top-level balanced parentheses are pulled out first (recursively) and
//!    become independent spans; the parenthesis-free remainder comes first.
//! 2. Each delimiter of [`DELIMITERS`] is applied in turn to every pending span.
//!    A span is cut at the first *accepted* occurrence and scanning resumes on
//!    the remainder with the same delimiter.
//! 3. Spans with fewer than two tokens are dropped.
//!
//! An occurrence is rejected when it sits at the very start of the text, when
//! nothing follows it, or when the character right before it is an isolated
//! letter (`J. M. Edwards`, `B.T. Hopkins`).  Under the default
//! [`SplitPolicy`] the character after the delimiter must also be uppercase or
//! non-alphanumeric.

use serde::Deserialize;

use crate::tokenize::tokenize;

/// Sentence delimiters, in the order they are applied.
pub const DELIMITERS: [&str; 5] = [". ", ": ", "! ", "? ", "; "];

/// Minimum number of tokens for a span to survive.
const MIN_SPAN_TOKENS: usize = 2;

/// Split-acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SplitPolicy {
    /// Only split when the next character is uppercase or non-alphanumeric.
    /// `false` splits regardless of the following character's case.
    pub require_capital_after: bool,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self { require_capital_after: true }
    }
}

impl SplitPolicy {
    /// Always split on a delimiter, whatever follows it.
    pub fn relaxed() -> Self {
        Self { require_capital_after: false }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parentheses
// ─────────────────────────────────────────────────────────────────────────────

/// Pull balanced parenthesised text out of `text`.
///
/// Returns the remainder first, then the inner text of every top-level
/// parenthesis pair in order of appearance, each itself processed the same
/// way (so nested pairs become spans of their own).  An unmatched `(` or `)`
/// is kept as ordinary text.
pub fn extract_parentheses(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = vec![text.to_string()];
    // Work list instead of recursion: each item yields its remainder plus the
    // inner parts, which are queued right after it.
    let mut cursor = 0;
    while cursor < pending.len() {
        let (remainder, inner) = split_top_level(&pending[cursor]);
        out.push(remainder);
        for (k, part) in inner.into_iter().enumerate() {
            pending.insert(cursor + 1 + k, part);
        }
        cursor += 1;
    }
    out
}

fn split_top_level(text: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = text.chars().collect();
    let mut remainder = String::with_capacity(text.len());
    let mut inner = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '(' {
            if let Some(close) = matching_paren(&chars, i) {
                inner.push(chars[i + 1..close].iter().collect());
                remainder.push(' ');
                i = close + 1;
                continue;
            }
        }
        remainder.push(chars[i]);
        i += 1;
    }

    if inner.is_empty() {
        (text.to_string(), inner)
    } else {
        (remainder.split_whitespace().collect::<Vec<_>>().join(" "), inner)
    }
}

fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Delimiter splitting
// ─────────────────────────────────────────────────────────────────────────────

/// `true` when `c` is a letter standing alone, i.e. not preceded by another
/// alphanumeric character.
fn is_isolated_letter(before: &str) -> bool {
    let mut rev = before.chars().rev();
    match rev.next() {
        Some(c) if c.is_alphabetic() => !rev.next().is_some_and(char::is_alphanumeric),
        _ => false,
    }
}

/// Byte offset of the first accepted occurrence of `delimiter` in `text`.
fn find_split(text: &str, delimiter: &str, policy: SplitPolicy) -> Option<usize> {
    text.match_indices(delimiter).map(|(i, _)| i).find(|&i| {
        if i == 0 {
            return false;
        }
        let Some(next) = text[i + delimiter.len()..].chars().next() else {
            return false;
        };
        if is_isolated_letter(&text[..i]) {
            return false;
        }
        !policy.require_capital_after || next.is_uppercase() || !next.is_alphanumeric()
    })
}

fn split_on(spans: Vec<String>, delimiter: &str, policy: SplitPolicy) -> Vec<String> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let mut rest = span.as_str();
        while let Some(i) = find_split(rest, delimiter, policy) {
            out.push(rest[..i].trim().to_string());
            rest = &rest[i + delimiter.len()..];
        }
        out.push(rest.trim().to_string());
    }
    out
}

/// Split `line` into sentence spans with an explicit policy.
pub fn split_line_with(line: &str, policy: SplitPolicy) -> Vec<String> {
    let mut spans = extract_parentheses(line);
    for delimiter in DELIMITERS {
        spans = split_on(spans, delimiter, policy);
    }
    spans
        .into_iter()
        .filter(|s| tokenize(s).len() >= MIN_SPAN_TOKENS)
        .collect()
}

/// Split `line` into sentence spans with the default [`SplitPolicy`].
pub fn split_line(line: &str) -> Vec<String> {
    split_line_with(line, SplitPolicy::default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
