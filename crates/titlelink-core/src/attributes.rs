//! Attribute lines: `name=value` pairs whose value may embed `{field}` or
//! `{template.field}` tokens resolved against the linked page.

use crate::types::LinkableTitle;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("missing '=' in attribute line {0:?}")]
    MissingSeparator(String),

    #[error("invalid attribute name {0:?}")]
    InvalidName(String),

    #[error("unclosed token in {0:?}")]
    UnclosedToken(String),

    #[error("empty token in {0:?}")]
    EmptyToken(String),

    #[error("invalid token {{{0}}}")]
    InvalidToken(String),
}

/// Piece of an attribute value template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    /// Field path without braces, e.g. `title` or `template.label`.
    Field(&'a str),
}

/// Split a value template into literals and field tokens.
///
/// A stray `}` is literal. An unclosed `{`, an empty `{}` or a token with
/// characters outside `[A-Za-z0-9_.-]` is an error.
pub fn tokenize(template: &str) -> Result<Vec<Token<'_>>, AttributeError> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            tokens.push(Token::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| AttributeError::UnclosedToken(template.to_string()))?;
        let field = after[..close].trim();
        if field.is_empty() {
            return Err(AttributeError::EmptyToken(template.to_string()));
        }
        if !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(AttributeError::InvalidToken(field.to_string()));
        }
        tokens.push(Token::Field(field));
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    Ok(tokens)
}

/// One validated `name=value` attribute line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLine {
    pub name: String,
    /// Value template, surrounding quotes removed.
    pub value: String,
}

impl AttributeLine {
    pub fn parse(line: &str) -> Result<Self, AttributeError> {
        let line = line.trim();
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| AttributeError::MissingSeparator(line.to_string()))?;

        let name = name.trim();
        if !is_attribute_name(name) {
            return Err(AttributeError::InvalidName(name.to_string()));
        }

        let value = unquote(value.trim());
        tokenize(value)?;

        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Expands attribute value templates against a matched page.
pub trait AttributeTemplateEngine: Send + Sync {
    /// Must not fail: unknown tokens expand to an empty string.
    fn expand(&self, template_line: &str, page: &LinkableTitle) -> String;
}

/// Resolves tokens from the page's own properties and its `fields` map.
///
/// Known tokens: `title`, `id`, `name`, `url`, `created`, `template`,
/// `template.name`, `template.label`, `template.id`. Anything else is
/// looked up in `fields`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldTemplateEngine;

impl FieldTemplateEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, field: &str, page: &LinkableTitle) -> Option<String> {
        let value = match field {
            "title" => page.title.clone(),
            "id" => page.page_id.to_string(),
            "name" => page.name.clone(),
            "url" => page.url.clone(),
            "created" => page.created_order.to_string(),
            "template" | "template.name" => page.template_name.clone(),
            "template.label" if page.template_label.is_empty() => page.template_name.clone(),
            "template.label" => page.template_label.clone(),
            "template.id" => page.template_id.to_string(),
            other => return page.fields.get(other).cloned(),
        };
        Some(value)
    }
}

impl AttributeTemplateEngine for FieldTemplateEngine {
    fn expand(&self, template_line: &str, page: &LinkableTitle) -> String {
        let tokens = match tokenize(template_line) {
            Ok(tokens) => tokens,
            Err(e) => {
                log::debug!("Leaving attribute template unexpanded: {}", e);
                return template_line.to_string();
            }
        };

        let mut out = String::with_capacity(template_line.len());
        for token in tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Field(field) => {
                    if let Some(value) = self.resolve(field, page) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}
