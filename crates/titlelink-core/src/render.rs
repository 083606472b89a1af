use crate::attributes::{AttributeLine, AttributeTemplateEngine};
use crate::settings::RewriteSettings;
use crate::types::LinkableTitle;
use html_escape::encode_double_quoted_attribute;

/// An attribute line left out of the emitted markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttribute {
    pub line: String,
    pub reason: String,
}

/// Emits link markup for matched titles.
pub struct LinkRenderer<'e> {
    tag: String,
    include_href: bool,
    attributes: Vec<AttributeLine>,
    engine: &'e dyn AttributeTemplateEngine,
}

impl<'e> LinkRenderer<'e> {
    /// Parse the configured attribute lines once. Bad lines are returned,
    /// never fatal.
    pub fn new(
        settings: &RewriteSettings,
        engine: &'e dyn AttributeTemplateEngine,
    ) -> (Self, Vec<SkippedAttribute>) {
        let include_href = !settings.disable_href;
        let mut attributes: Vec<AttributeLine> = Vec::new();
        let mut skipped = Vec::new();

        for line in &settings.attributes {
            let parsed = match AttributeLine::parse(line) {
                Ok(parsed) => parsed,
                Err(e) => {
                    skipped.push(SkippedAttribute {
                        line: line.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if include_href && parsed.name.eq_ignore_ascii_case("href") {
                skipped.push(SkippedAttribute {
                    line: line.clone(),
                    reason: "href is generated from the page URL".into(),
                });
                continue;
            }

            if attributes
                .iter()
                .any(|a| a.name.eq_ignore_ascii_case(&parsed.name))
            {
                skipped.push(SkippedAttribute {
                    line: line.clone(),
                    reason: format!("duplicate attribute {}", parsed.name),
                });
                continue;
            }

            attributes.push(parsed);
        }

        for skip in &skipped {
            log::warn!("Skipping attribute line {:?}: {}", skip.line, skip.reason);
        }

        let renderer = Self {
            tag: settings.html_tag.clone(),
            include_href,
            attributes,
            engine,
        };
        (renderer, skipped)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Append `text` wrapped in link markup for `page` to `out`.
    pub fn render_into(&self, page: &LinkableTitle, text: &str, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);

        if self.include_href && !page.url.is_empty() {
            push_attribute(out, "href", &page.url);
        }

        for attribute in &self.attributes {
            let value = self.engine.expand(&attribute.value, page);
            push_attribute(out, &attribute.name, &value);
        }

        out.push('>');
        out.push_str(text);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    pub fn render(&self, page: &LinkableTitle, text: &str) -> String {
        let mut out = String::new();
        self.render_into(page, text, &mut out);
        out
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&encode_double_quoted_attribute(value));
    out.push('"');
}
