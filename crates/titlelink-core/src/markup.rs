//! Splits rendered HTML into markup, rewritable text, and protected text.
//!
//! This is not a full HTML parser. It recognises tags, comments and
//! declarations well enough to keep them intact, and tracks which
//! elements' content must be left alone (existing links, code, ...).
//! Raw-text elements (`script`, `style`, `textarea`, `title`) can never
//! hold markup, so their content is always left alone.

use std::collections::BTreeSet;

/// Elements whose content is raw text: a `<` inside them never opens a tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A tag, comment or declaration. Never matched.
    Markup,
    /// Plain text eligible for rewriting.
    Text,
    /// Text inside a link element. Scanned to note titles that are
    /// already linked, never rewritten.
    Linked,
    /// Text inside any other protected element or a raw-text element.
    /// Copied untouched.
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub kind: SegmentKind,
    /// Lowercased element name, for markup segments that are tags.
    pub name: Option<String>,
}

struct Tag {
    end: usize,
    name: Option<String>,
    closing: bool,
    self_closing: bool,
}

/// Characters adjacent to a text segment, looking through the tags of
/// `transparent` elements. `None` marks the edge of the text or any other tag.
pub fn neighbours(
    text: &str,
    segments: &[Segment],
    i: usize,
    transparent: &BTreeSet<String>,
) -> (Option<char>, Option<char>) {
    let see_through = |s: &Segment| {
        s.kind == SegmentKind::Markup
            && s.name.as_ref().map_or(false, |n| transparent.contains(n))
    };

    let mut before = None;
    for s in segments[..i].iter().rev() {
        if s.kind != SegmentKind::Markup {
            before = text[s.start..s.end].chars().next_back();
            break;
        }
        if !see_through(s) {
            break;
        }
    }

    let mut after = None;
    for s in &segments[i + 1..] {
        if s.kind != SegmentKind::Markup {
            after = text[s.start..s.end].chars().next();
            break;
        }
        if !see_through(s) {
            break;
        }
    }

    (before, after)
}

/// Segment `text`. Content of any element in `protected` is guarded, and
/// is [`SegmentKind::Linked`] when one of the enclosing elements is in `links`.
pub fn segment(
    text: &str,
    protected: &BTreeSet<String>,
    links: &BTreeSet<String>,
) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let tag = match read_tag(text, pos) {
            Some(tag) => tag,
            None => {
                pos += 1;
                continue;
            }
        };

        push_text(&mut segments, text_start, pos, guard(&stack, links));
        segments.push(Segment {
            start: pos,
            end: tag.end,
            kind: SegmentKind::Markup,
            name: tag.name.clone(),
        });
        pos = tag.end;
        text_start = pos;

        let name = match tag.name {
            Some(name) => name,
            None => continue,
        };

        if tag.closing {
            if let Some(depth) = stack.iter().rposition(|open| *open == name) {
                stack.truncate(depth);
            }
            continue;
        }

        if tag.self_closing {
            continue;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            // Jump straight to the closing tag; a '<' inside never opens a tag.
            let close = find_closing(text, pos, &name).unwrap_or(text.len());
            push_text(&mut segments, pos, close, Some(SegmentKind::Protected));
            pos = close;
            text_start = pos;
            continue;
        }

        if protected.contains(&name) {
            stack.push(name);
        }
    }

    push_text(&mut segments, text_start, bytes.len(), guard(&stack, links));
    segments
}

/// Kind of text under the open protected elements in `stack`, if any.
fn guard(stack: &[String], links: &BTreeSet<String>) -> Option<SegmentKind> {
    if stack.iter().any(|open| links.contains(open)) {
        Some(SegmentKind::Linked)
    } else if stack.is_empty() {
        None
    } else {
        Some(SegmentKind::Protected)
    }
}

fn push_text(segments: &mut Vec<Segment>, start: usize, end: usize, guard: Option<SegmentKind>) {
    if start < end {
        segments.push(Segment {
            start,
            end,
            kind: guard.unwrap_or(SegmentKind::Text),
            name: None,
        });
    }
}

/// Read a tag starting at `start` (which holds `<`). `None` means the `<`
/// is literal text.
fn read_tag(text: &str, start: usize) -> Option<Tag> {
    let bytes = text.as_bytes();
    let rest = &text[start..];

    if rest.starts_with("<!--") {
        let end = rest[4..]
            .find("-->")
            .map(|i| start + 4 + i + 3)
            .unwrap_or(text.len());
        return Some(Tag {
            end,
            name: None,
            closing: false,
            self_closing: true,
        });
    }

    let next = *bytes.get(start + 1)?;
    let closing = next == b'/';
    let declaration = next == b'!' || next == b'?';
    if !(next.is_ascii_alphabetic() || closing || declaration) {
        return None;
    }

    // Find the closing '>' outside quoted attribute values.
    let mut quote: Option<u8> = None;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                end = Some(i + 1);
                break;
            }
            None => {}
        }
    }
    let end = end?;

    if declaration {
        return Some(Tag {
            end,
            name: None,
            closing: false,
            self_closing: true,
        });
    }

    let name_start = if closing { start + 2 } else { start + 1 };
    let name: String = text[name_start..end]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();

    Some(Tag {
        end,
        name: if name.is_empty() { None } else { Some(name) },
        closing,
        self_closing: text[..end - 1].ends_with('/'),
    })
}

/// Offset of `</name` (ASCII case-insensitive) at or after `from`.
fn find_closing(text: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    let haystack = text.as_bytes();
    let needle = needle.as_bytes();
    if haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
