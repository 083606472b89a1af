//! Title normalization and word-boundary checks.
//!
//! Case-insensitive matching runs against a lowercased copy of the text.
//! Lowercasing can change byte lengths ("İ" becomes two chars), so the
//! folded copy keeps a map from its byte offsets back to the source.

use std::borrow::Cow;

/// Normalized form of a title used as the index key.
pub fn normalize_title(title: &str, case_insensitive: bool) -> String {
    let trimmed = title.trim();
    if case_insensitive {
        fold_str(trimmed)
    } else {
        trimmed.to_string()
    }
}

fn fold_str(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Text prepared for matching.
pub struct Folded<'a> {
    text: Cow<'a, str>,
    /// `Some(source offset)` where a folded byte starts the expansion of a
    /// source char, plus one trailing entry for the end. `None` when the
    /// text was not folded.
    origin: Option<Vec<Option<usize>>>,
}

impl<'a> Folded<'a> {
    pub fn new(source: &'a str, case_insensitive: bool) -> Self {
        if !case_insensitive {
            return Self {
                text: Cow::Borrowed(source),
                origin: None,
            };
        }

        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len() + 1);
        for (offset, c) in source.char_indices() {
            let before = text.len();
            text.extend(c.to_lowercase());
            origin.push(Some(offset));
            origin.extend(std::iter::repeat(None).take(text.len() - before - 1));
        }
        origin.push(Some(source.len()));

        Self {
            text: Cow::Owned(text),
            origin: Some(origin),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Source offset for a folded offset, if it falls on a source char boundary.
    pub fn to_source(&self, folded: usize) -> Option<usize> {
        match &self.origin {
            None => Some(folded),
            Some(origin) => origin.get(folded).copied().flatten(),
        }
    }

    /// Source range for a folded match.
    pub fn source_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        Some((self.to_source(start)?, self.to_source(end)?))
    }
}

/// Whether `text[start..end]` stands as whole words: each side is either
/// a hard edge or a non-alphanumeric character. `outside` holds the
/// characters just beyond either end of `text`, if any.
pub fn is_word_bounded(
    text: &str,
    start: usize,
    end: usize,
    outside: (Option<char>, Option<char>),
) -> bool {
    let before = text[..start].chars().next_back().or(outside.0);
    let after = text[end..].chars().next().or(outside.1);
    before.map_or(true, |c| !c.is_alphanumeric()) && after.map_or(true, |c| !c.is_alphanumeric())
}
