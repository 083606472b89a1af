use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identity of a page in the host CMS.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PageId(pub i64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a page template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TemplateId(pub i64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A page eligible for auto-linking, as supplied by a [`crate::PageCatalog`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkableTitle {
    /// Target page identity.
    pub page_id: PageId,

    /// Title as stored. Matching works on a normalized copy.
    pub title: String,

    /// Monotonic creation sequence. Breaks ties between pages
    /// sharing a title.
    pub created_order: i64,

    pub template_id: TemplateId,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "default_viewable")]
    pub viewable: bool,

    /// Canonical URL used for the `href` attribute.
    #[serde(default)]
    pub url: String,

    /// Page name (URL segment).
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub template_name: String,

    #[serde(default)]
    pub template_label: String,

    /// Additional page fields available to attribute templates.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_viewable() -> bool {
    true
}

impl LinkableTitle {
    /// A visible, viewable page with no URL. Set one with
    /// [`LinkableTitle::with_url`] to get an `href`.
    pub fn new(page_id: i64, title: impl Into<String>, created_order: i64, template_id: i64) -> Self {
        Self {
            page_id: PageId(page_id),
            title: title.into(),
            created_order,
            template_id: TemplateId(template_id),
            hidden: false,
            viewable: true,
            url: String::new(),
            name: String::new(),
            template_name: String::new(),
            template_label: String::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_template(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.template_name = name.into();
        self.template_label = label.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn viewable(mut self, viewable: bool) -> Self {
        self.viewable = viewable;
        self
    }
}

/// A page template as known to the host CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// System templates are never offered for auto-linking.
    #[serde(default)]
    pub system: bool,
}

impl TemplateInfo {
    /// Label shown when picking templates: `"Label (name)"`, or just the name.
    pub fn display_name(&self) -> String {
        if self.label.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.label, self.name)
        }
    }
}

/// Options for the template picker, excluding system templates.
pub fn selectable_templates(templates: &[TemplateInfo]) -> Vec<(TemplateId, String)> {
    templates
        .iter()
        .filter(|t| !t.system)
        .map(|t| (t.id, t.display_name()))
        .collect()
}
