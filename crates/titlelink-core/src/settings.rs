use crate::error::{Result, TitleLinkError};
use crate::types::{PageId, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Elements whose content is never rewritten, in addition to `a` and the
/// configured link tag.
pub const DEFAULT_SKIP_ELEMENTS: &[&str] = &["script", "style", "code", "pre", "textarea"];

/// Which page wins when several pages share a normalized title.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SameTitleOrder {
    /// Oldest page (smallest creation order).
    #[default]
    Min,
    /// Newest page (largest creation order).
    Max,
}

impl FromStr for SameTitleOrder {
    type Err = TitleLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            other => Err(TitleLinkError::InvalidSettings(format!(
                "same_title_order must be MIN or MAX, got {:?}",
                other
            ))),
        }
    }
}

/// How many occurrences of one title get linked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    #[default]
    FirstOccurrence,
    EveryOccurrence,
}

impl FromStr for LinkMode {
    type Err = TitleLinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_occurrence" => Ok(Self::FirstOccurrence),
            "all" | "every" | "every_occurrence" => Ok(Self::EveryOccurrence),
            other => Err(TitleLinkError::InvalidSettings(format!(
                "link_mode must be \"first\" or \"all\", got {:?}",
                other
            ))),
        }
    }
}

/// Immutable settings for one rewrite invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteSettings {
    /// Templates whose pages are searched for matching titles.
    pub templates: BTreeSet<TemplateId>,

    /// Titles shorter than this (in characters) are never linked. Default: 3.
    pub minimum_length: usize,

    /// Allow links to the page being rendered. Default: false.
    pub include_current_page: bool,

    /// Allow links to hidden pages. Default: false.
    pub include_hidden: bool,

    /// Compare titles case-insensitively. Default: false.
    pub case_insensitive_match: bool,

    /// Passed through to the catalog; does not affect matching.
    pub force_case_sensitive_query: bool,

    pub same_title_order: SameTitleOrder,

    /// Raw `name=value` attribute lines, in declaration order.
    pub attributes: Vec<String>,

    /// Element used for links. Default: `a`.
    pub html_tag: String,

    pub disable_href: bool,

    pub disable_viewable_check: bool,

    /// Page being rendered, for self-link suppression.
    pub current_page: Option<PageId>,

    pub link_mode: LinkMode,

    /// Elements whose content is left untouched.
    pub skip_elements: Vec<String>,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            templates: BTreeSet::new(),
            minimum_length: 3,
            include_current_page: false,
            include_hidden: false,
            case_insensitive_match: false,
            force_case_sensitive_query: false,
            same_title_order: SameTitleOrder::Min,
            attributes: Vec::new(),
            html_tag: "a".to_string(),
            disable_href: false,
            disable_viewable_check: false,
            current_page: None,
            link_mode: LinkMode::FirstOccurrence,
            skip_elements: DEFAULT_SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RewriteSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates<I: IntoIterator<Item = i64>>(mut self, templates: I) -> Self {
        self.templates = templates.into_iter().map(TemplateId).collect();
        self
    }

    pub fn with_minimum_length(mut self, length: usize) -> Self {
        self.minimum_length = length;
        self
    }

    pub fn with_include_current_page(mut self, include: bool) -> Self {
        self.include_current_page = include;
        self
    }

    pub fn with_include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_case_insensitive_match(mut self, enabled: bool) -> Self {
        self.case_insensitive_match = enabled;
        self
    }

    pub fn with_force_case_sensitive_query(mut self, enabled: bool) -> Self {
        self.force_case_sensitive_query = enabled;
        self
    }

    pub fn with_same_title_order(mut self, order: SameTitleOrder) -> Self {
        self.same_title_order = order;
        self
    }

    /// Set attribute lines from multi-line text, one `name=value` per line.
    pub fn with_attributes(mut self, text: &str) -> Self {
        self.attributes = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        self
    }

    pub fn with_html_tag(mut self, tag: impl Into<String>) -> Self {
        self.html_tag = tag.into().trim().to_ascii_lowercase();
        self
    }

    pub fn with_disable_href(mut self, disable: bool) -> Self {
        self.disable_href = disable;
        self
    }

    pub fn with_disable_viewable_check(mut self, disable: bool) -> Self {
        self.disable_viewable_check = disable;
        self
    }

    pub fn with_current_page(mut self, page: Option<PageId>) -> Self {
        self.current_page = page;
        self
    }

    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    pub fn with_skip_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_elements = elements
            .into_iter()
            .map(|e| e.into().trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// Page excluded from linking, if any.
    pub fn excluded_page(&self) -> Option<PageId> {
        if self.include_current_page {
            None
        } else {
            self.current_page
        }
    }

    /// Elements that form links: `a` and the configured link tag.
    pub fn link_elements(&self) -> BTreeSet<String> {
        ["a".to_string(), self.html_tag.clone()].into_iter().collect()
    }

    /// Every element name whose content must not be rewritten.
    pub fn protected_elements(&self) -> BTreeSet<String> {
        let mut set = self.link_elements();
        set.extend(self.skip_elements.iter().cloned());
        set
    }

    pub fn validate(&self) -> Result<()> {
        if !is_element_name(&self.html_tag) {
            return Err(TitleLinkError::InvalidSettings(format!(
                "html_tag {:?} is not a valid element name",
                self.html_tag
            )));
        }

        if let Some(bad) = self.skip_elements.iter().find(|e| !is_element_name(e)) {
            return Err(TitleLinkError::InvalidSettings(format!(
                "skip element {:?} is not a valid element name",
                bad
            )));
        }

        Ok(())
    }
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Settings as persisted by the host CMS module. Loosely typed: call
/// [`RewriteConfig::into_settings`] to validate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriteConfig {
    pub auto_link_templates: Vec<i64>,
    pub minimum_length: i64,
    pub include_current_page: bool,
    pub include_hidden: bool,
    pub case_insensitive_match: bool,
    pub force_case_sensitive_query: bool,
    pub same_title_order: String,
    pub attributes: String,
    pub html_tag: String,
    pub disable_href: bool,
    pub disable_viewable_check: bool,
    pub link_mode: String,
    pub skip_elements: Option<Vec<String>>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        let defaults = RewriteSettings::default();
        Self {
            auto_link_templates: Vec::new(),
            minimum_length: defaults.minimum_length as i64,
            include_current_page: defaults.include_current_page,
            include_hidden: defaults.include_hidden,
            case_insensitive_match: defaults.case_insensitive_match,
            force_case_sensitive_query: defaults.force_case_sensitive_query,
            same_title_order: "MIN".to_string(),
            attributes: String::new(),
            html_tag: defaults.html_tag,
            disable_href: defaults.disable_href,
            disable_viewable_check: defaults.disable_viewable_check,
            link_mode: "first".to_string(),
            skip_elements: None,
        }
    }
}

impl RewriteConfig {
    /// Validate and convert into typed settings for one invocation.
    pub fn into_settings(&self, current_page: Option<PageId>) -> Result<RewriteSettings> {
        if self.minimum_length < 0 {
            return Err(TitleLinkError::InvalidSettings(format!(
                "minimum_length must be >= 0, got {}",
                self.minimum_length
            )));
        }

        let mut settings = RewriteSettings::new()
            .with_templates(self.auto_link_templates.iter().copied())
            .with_minimum_length(self.minimum_length as usize)
            .with_include_current_page(self.include_current_page)
            .with_include_hidden(self.include_hidden)
            .with_case_insensitive_match(self.case_insensitive_match)
            .with_force_case_sensitive_query(self.force_case_sensitive_query)
            .with_same_title_order(self.same_title_order.parse()?)
            .with_attributes(&self.attributes)
            .with_html_tag(self.html_tag.as_str())
            .with_disable_href(self.disable_href)
            .with_disable_viewable_check(self.disable_viewable_check)
            .with_current_page(current_page)
            .with_link_mode(self.link_mode.parse()?);

        if let Some(elements) = &self.skip_elements {
            settings = settings.with_skip_elements(elements.iter().map(String::as_str));
        }

        settings.validate()?;
        Ok(settings)
    }
}
