//! Automatic page-title linking.
//!
//! Given rendered text and a catalog of pages, [`rewrite`] finds page titles
//! in the text and wraps them in link markup pointing at those pages.

pub mod attributes;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod index;
pub mod markup;
pub mod metrics;
pub mod normalize;
pub mod render;
pub mod rewriter;
pub mod settings;
pub mod types;

pub use attributes::{AttributeError, AttributeLine, AttributeTemplateEngine, FieldTemplateEngine};
pub use cache::IndexCache;
pub use catalog::{CatalogError, CatalogQuery, MemoryCatalog, PageCatalog};
pub use error::{Result, TitleLinkError};
pub use index::{IndexKey, IndexedTitle, TitleIndex};
pub use metrics::{LinkerMetrics, MetricsSnapshot};
pub use render::LinkRenderer;
pub use rewriter::{
    rewrite, rewrite_with_index, AppliedLink, RewriteResult, RewriteWarning, TitleLinker,
};
pub use settings::{LinkMode, RewriteConfig, RewriteSettings, SameTitleOrder};
pub use types::{selectable_templates, LinkableTitle, PageId, TemplateId, TemplateInfo};
