use crate::settings::RewriteSettings;
use crate::types::{LinkableTitle, PageId, TemplateId, TemplateInfo};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed catalog data: {0}")]
    Malformed(String),
}

/// Criteria for fetching linkable pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub templates: BTreeSet<TemplateId>,
    pub include_hidden: bool,
    /// Ask a case-insensitive store not to merge rows whose titles differ
    /// only by case.
    pub force_case_sensitive: bool,
}

impl CatalogQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Query matching the template and visibility options of `settings`
    pub fn from_settings(settings: &RewriteSettings) -> Self {
        Self {
            templates: settings.templates.clone(),
            include_hidden: settings.include_hidden,
            force_case_sensitive: settings.force_case_sensitive_query,
        }
    }

    pub fn with_templates<I: IntoIterator<Item = TemplateId>>(mut self, templates: I) -> Self {
        self.templates = templates.into_iter().collect();
        self
    }

    pub fn with_include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_force_case_sensitive(mut self, force: bool) -> Self {
        self.force_case_sensitive = force;
        self
    }

    /// Whether a page satisfies this query
    pub fn matches(&self, page: &LinkableTitle) -> bool {
        self.templates.contains(&page.template_id) && (self.include_hidden || !page.hidden)
    }
}

/// Source of candidate pages for linking.
pub trait PageCatalog: Send + Sync {
    /// Every page whose template is in `query.templates`, respecting
    /// `query.include_hidden`.
    fn query(&self, query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError>;

    /// Changes whenever the catalog contents change. `None` disables index caching.
    fn version(&self) -> Option<u64> {
        None
    }
}

impl<T: PageCatalog + ?Sized> PageCatalog for Arc<T> {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError> {
        (**self).query(query)
    }

    fn version(&self) -> Option<u64> {
        (**self).version()
    }
}

impl<T: PageCatalog + ?Sized> PageCatalog for &T {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError> {
        (**self).query(query)
    }

    fn version(&self) -> Option<u64> {
        (**self).version()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Pages(Vec<LinkableTitle>),
    Full {
        #[serde(default)]
        templates: Vec<TemplateInfo>,
        pages: Vec<LinkableTitle>,
    },
}

/// In-memory page catalog. Every mutation bumps the version.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    pages: Vec<LinkableTitle>,
    templates: Vec<TemplateInfo>,
    version: u64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<LinkableTitle>) -> Self {
        Self {
            pages,
            templates: Vec::new(),
            version: 1,
        }
    }

    /// Parse either a bare array of pages or `{"templates": [...], "pages": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        let (templates, pages) = match document {
            CatalogDocument::Pages(pages) => (Vec::new(), pages),
            CatalogDocument::Full { templates, pages } => (templates, pages),
        };
        Ok(Self {
            pages,
            templates,
            version: 1,
        })
    }

    pub fn insert(&mut self, page: LinkableTitle) {
        self.pages.retain(|p| p.page_id != page.page_id);
        self.pages.push(page);
        self.version += 1;
    }

    pub fn remove(&mut self, page_id: PageId) -> Option<LinkableTitle> {
        let pos = self.pages.iter().position(|p| p.page_id == page_id)?;
        self.version += 1;
        Some(self.pages.remove(pos))
    }

    pub fn set_templates(&mut self, templates: Vec<TemplateInfo>) {
        self.templates = templates;
        self.version += 1;
    }

    pub fn pages(&self) -> &[LinkableTitle] {
        &self.pages
    }

    pub fn templates(&self) -> &[TemplateInfo] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageCatalog for MemoryCatalog {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError> {
        // Titles are stored verbatim, so force_case_sensitive needs no handling here.
        Ok(self
            .pages
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    fn version(&self) -> Option<u64> {
        Some(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryCatalog {
        MemoryCatalog::with_pages(vec![
            LinkableTitle::new(1, "Apple", 1, 10),
            LinkableTitle::new(2, "Banana", 2, 10).hidden(true),
            LinkableTitle::new(3, "Cherry", 3, 20),
        ])
    }

    #[test]
    fn test_query_filters_templates_and_hidden() {
        let catalog = sample();

        let query = CatalogQuery::new().with_templates([TemplateId(10)]);
        let pages = catalog.query(&query).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Apple");

        let query = query.with_include_hidden(true);
        assert_eq!(catalog.query(&query).unwrap().len(), 2);

        let query = CatalogQuery::new();
        assert!(catalog.query(&query).unwrap().is_empty());
    }

    #[test]
    fn test_mutation_bumps_version() {
        let mut catalog = sample();
        let v1 = catalog.version().unwrap();

        catalog.insert(LinkableTitle::new(4, "Date", 4, 10));
        let v2 = catalog.version().unwrap();
        assert!(v2 > v1);

        assert!(catalog.remove(PageId(4)).is_some());
        assert!(catalog.version().unwrap() > v2);

        let v3 = catalog.version().unwrap();
        assert!(catalog.remove(PageId(99)).is_none());
        assert_eq!(catalog.version().unwrap(), v3);
    }

    #[test]
    fn test_insert_replaces_same_page() {
        let mut catalog = sample();
        catalog.insert(LinkableTitle::new(1, "Green Apple", 1, 10));
        assert_eq!(catalog.len(), 3);
        assert!(catalog.pages().iter().any(|p| p.title == "Green Apple"));
    }

    #[test]
    fn test_from_json_both_shapes() {
        let bare = r#"[{"page_id": 1, "title": "Apple", "created_order": 1, "template_id": 2}]"#;
        assert_eq!(MemoryCatalog::from_json_str(bare).unwrap().len(), 1);

        let full = r#"{
            "templates": [{"id": 2, "name": "fruit", "label": "Fruit"}],
            "pages": [{"page_id": 1, "title": "Apple", "created_order": 1, "template_id": 2}]
        }"#;
        let catalog = MemoryCatalog::from_json_str(full).unwrap();
        assert_eq!(catalog.templates().len(), 1);
        assert_eq!(catalog.templates()[0].display_name(), "Fruit (fruit)");

        assert!(matches!(
            MemoryCatalog::from_json_str("{not json"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
