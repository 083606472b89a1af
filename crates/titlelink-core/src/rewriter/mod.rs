//! Title-to-link rewriting.
//!
//! A single left-to-right pass over the text:
//! - markup (tags, comments) is copied untouched
//! - text inside existing links is scanned only to note titles that are
//!   already linked
//! - text inside other protected elements is copied untouched
//! - everywhere else the longest word-bounded title at each position is
//!   replaced with link markup, first occurrence per title by default

use crate::attributes::{AttributeTemplateEngine, FieldTemplateEngine};
use crate::cache::IndexCache;
use crate::catalog::{CatalogQuery, PageCatalog};
use crate::error::Result;
use crate::index::{IndexKey, TitleIndex};
use crate::markup::{self, SegmentKind};
use crate::metrics::{LinkerMetrics, MetricsSnapshot};
use crate::normalize::{is_word_bounded, Folded};
use crate::render::LinkRenderer;
use crate::settings::{LinkMode, RewriteSettings};
use crate::types::PageId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Recoverable condition met during a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteWarning {
    /// No templates configured, so nothing can be linked.
    NoTemplates,
    /// The catalog query failed. The text is returned unchanged.
    CatalogUnavailable(String),
    /// The catalog returned no pages. The text is returned unchanged.
    CatalogEmpty,
    /// An attribute line was left out of the emitted markup.
    AttributeSkipped { line: String, reason: String },
    /// The rewrite failed and the original text was returned.
    Fallback(String),
}

impl fmt::Display for RewriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTemplates => write!(f, "no templates configured for auto-linking"),
            Self::CatalogUnavailable(reason) => write!(f, "page catalog unavailable: {}", reason),
            Self::CatalogEmpty => write!(f, "page catalog returned no pages"),
            Self::AttributeSkipped { line, reason } => {
                write!(f, "attribute line {:?} skipped: {}", line, reason)
            }
            Self::Fallback(reason) => write!(f, "rewrite failed, original text kept: {}", reason),
        }
    }
}

/// One emitted link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedLink {
    pub page_id: PageId,
    /// Text as it appeared in the input.
    pub matched: String,
    /// Byte offset of the link element in the output.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub text: String,
    pub substitutions: usize,
    pub links: Vec<AppliedLink>,
    pub warnings: Vec<RewriteWarning>,
}

impl RewriteResult {
    pub fn unchanged(text: &str, warnings: Vec<RewriteWarning>) -> Self {
        Self {
            text: text.to_string(),
            substitutions: 0,
            links: Vec::new(),
            warnings,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.substitutions > 0
    }
}

/// Rewrite `text` against a prebuilt index.
pub fn rewrite_with_index(
    text: &str,
    index: &TitleIndex,
    settings: &RewriteSettings,
    engine: &dyn AttributeTemplateEngine,
) -> Result<RewriteResult> {
    settings.validate()?;

    let (renderer, skipped) = LinkRenderer::new(settings, engine);
    let warnings: Vec<RewriteWarning> = skipped
        .into_iter()
        .map(|s| RewriteWarning::AttributeSkipped {
            line: s.line,
            reason: s.reason,
        })
        .collect();

    if index.is_empty() {
        return Ok(RewriteResult::unchanged(text, warnings));
    }

    let mut scan = Scan {
        index,
        renderer: &renderer,
        link_mode: settings.link_mode,
        used: HashSet::new(),
        out: String::with_capacity(text.len() + text.len() / 4),
        links: Vec::new(),
    };

    // Link tags do not break words: a title glued to an existing link is
    // not word-bounded, before or after that link was added.
    let links = settings.link_elements();
    let segments = markup::segment(text, &settings.protected_elements(), &links);

    for (i, segment) in segments.iter().enumerate() {
        let slice = &text[segment.start..segment.end];
        let linked = match segment.kind {
            SegmentKind::Markup | SegmentKind::Protected => {
                scan.out.push_str(slice);
                continue;
            }
            SegmentKind::Text => false,
            SegmentKind::Linked => true,
        };
        let edges = markup::neighbours(text, &segments, i, &links);
        scan.text(slice, edges, linked);
    }

    Ok(RewriteResult {
        text: scan.out,
        substitutions: scan.links.len(),
        links: scan.links,
        warnings,
    })
}

/// Rewrite `text` with pages from `catalog`, using the default attribute engine.
pub fn rewrite<C: PageCatalog + ?Sized>(
    text: &str,
    settings: &RewriteSettings,
    catalog: &C,
) -> Result<RewriteResult> {
    TitleLinker::new(catalog).rewrite(text, settings)
}

struct Scan<'a> {
    index: &'a TitleIndex,
    renderer: &'a LinkRenderer<'a>,
    link_mode: LinkMode,
    /// Titles (by index position) already linked in this text.
    used: HashSet<usize>,
    out: String,
    links: Vec<AppliedLink>,
}

impl Scan<'_> {
    /// Scan one text segment. `linked` text already sits inside a link:
    /// titles found there are only marked as used.
    fn text(&mut self, slice: &str, edges: (Option<char>, Option<char>), linked: bool) {
        let folded = Folded::new(slice, self.index.case_insensitive());
        let candidates = self.index.find_candidates(folded.as_str());

        // Source offsets: everything before `copied` is in `out`, nothing
        // before `cursor` may start a new match.
        let mut copied = 0;
        let mut cursor = 0;
        let mut i = 0;

        while i < candidates.len() {
            let start = candidates[i].start;
            let group_end = candidates[i..]
                .iter()
                .position(|c| c.start != start)
                .map_or(candidates.len(), |n| i + n);

            // Longest word-bounded title at this position wins.
            let chosen = candidates[i..group_end].iter().find_map(|c| {
                let (s, e) = folded.source_range(c.start, c.end)?;
                (s >= cursor && is_word_bounded(slice, s, e, edges)).then_some((s, e, c.title))
            });
            i = group_end;

            let (s, e, title) = match chosen {
                Some(found) => found,
                None => continue,
            };
            cursor = e;

            let first = self.used.insert(title);
            if linked || (!first && self.link_mode == LinkMode::FirstOccurrence) {
                continue;
            }

            let Some(entry) = self.index.title(title) else {
                continue;
            };
            self.out.push_str(&slice[copied..s]);
            let offset = self.out.len();
            self.renderer
                .render_into(&entry.page, &slice[s..e], &mut self.out);
            self.links.push(AppliedLink {
                page_id: entry.page.page_id,
                matched: slice[s..e].to_string(),
                offset,
            });
            copied = e;
        }

        self.out.push_str(&slice[copied..]);
    }
}

/// Rewrites text against a page catalog, caching title indexes between calls.
pub struct TitleLinker<C: PageCatalog, E: AttributeTemplateEngine = FieldTemplateEngine> {
    catalog: C,
    engine: E,
    cache: IndexCache,
    metrics: LinkerMetrics,
}

impl<C: PageCatalog> TitleLinker<C, FieldTemplateEngine> {
    pub fn new(catalog: C) -> Self {
        Self::with_engine(catalog, FieldTemplateEngine::new())
    }
}

impl<C: PageCatalog, E: AttributeTemplateEngine> TitleLinker<C, E> {
    pub fn with_engine(catalog: C, engine: E) -> Self {
        Self {
            catalog,
            engine,
            cache: IndexCache::default(),
            metrics: LinkerMetrics::new(),
        }
    }

    pub fn with_cache(mut self, cache: IndexCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Mutable access to the catalog. Cached indexes are dropped once the
    /// catalog's version changes.
    pub fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Title index for `settings`, from cache when the catalog is unchanged.
    /// `None` means nothing can be linked; the warnings say why.
    pub fn index(
        &self,
        settings: &RewriteSettings,
    ) -> Result<(Option<Arc<TitleIndex>>, Vec<RewriteWarning>)> {
        if settings.templates.is_empty() {
            log::debug!("No auto-link templates configured");
            return Ok((None, vec![RewriteWarning::NoTemplates]));
        }

        let key = IndexKey::from_settings(settings);
        let version = self.catalog.version();

        if let Some(version) = version {
            if let Some(index) = self.cache.get(&key, version) {
                log::debug!("Title index served from cache (catalog v{})", version);
                self.metrics.record_cache_hit();
                return Ok((Some(index), Vec::new()));
            }
        }

        let pages = match self.catalog.query(&CatalogQuery::from_settings(settings)) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("Page catalog query failed, leaving text unchanged: {}", e);
                self.metrics.record_catalog_failure();
                return Ok((None, vec![RewriteWarning::CatalogUnavailable(e.to_string())]));
            }
        };

        if pages.is_empty() {
            log::warn!("Page catalog returned no pages for templates {:?}", settings.templates);
            self.metrics.record_empty_catalog();
            return Ok((None, vec![RewriteWarning::CatalogEmpty]));
        }

        let index = Arc::new(TitleIndex::build(pages, settings)?);
        self.metrics.record_index_build();
        if let Some(version) = version {
            self.cache.put(key, index.clone(), version);
        }
        Ok((Some(index), Vec::new()))
    }

    /// Like [`TitleLinker::index`], with an empty index standing in for
    /// `None` so attribute lines are still checked.
    fn index_or_empty(
        &self,
        settings: &RewriteSettings,
    ) -> Result<(Arc<TitleIndex>, Vec<RewriteWarning>)> {
        let (index, warnings) = self.index(settings)?;
        let index = index
            .unwrap_or_else(|| Arc::new(TitleIndex::empty(settings.case_insensitive_match)));
        Ok((index, warnings))
    }

    /// Record metrics for one rewritten text and put the index warnings first.
    fn finish(
        &self,
        mut result: RewriteResult,
        index_warnings: &[RewriteWarning],
    ) -> RewriteResult {
        let skipped = result
            .warnings
            .iter()
            .filter(|w| matches!(w, RewriteWarning::AttributeSkipped { .. }))
            .count();
        self.metrics.record_attributes_skipped(skipped);
        self.metrics.record_rewrite(result.substitutions);

        if !index_warnings.is_empty() {
            let mut warnings = index_warnings.to_vec();
            warnings.append(&mut result.warnings);
            result.warnings = warnings;
        }
        result
    }

    /// Rewrite one text.
    ///
    /// Invalid settings are an error. A failing or empty catalog is not: the
    /// text comes back unchanged with a warning.
    pub fn rewrite(&self, text: &str, settings: &RewriteSettings) -> Result<RewriteResult> {
        settings.validate()?;

        let (index, warnings) = self.index_or_empty(settings)?;
        let result = rewrite_with_index(text, &index, settings, &self.engine)?;
        let result = self.finish(result, &warnings);
        log::debug!(
            "Rewrote {} bytes: {} links, {} warnings",
            text.len(),
            result.substitutions,
            result.warnings.len()
        );
        Ok(result)
    }

    /// Like [`TitleLinker::rewrite`], but any error yields the original text.
    pub fn rewrite_or_original(&self, text: &str, settings: &RewriteSettings) -> RewriteResult {
        match self.rewrite(text, settings) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Title linking failed, keeping original text: {}", e);
                self.metrics.record_fallback();
                RewriteResult::unchanged(text, vec![RewriteWarning::Fallback(e.to_string())])
            }
        }
    }

    /// Rewrite many texts in parallel with one shared index.
    pub fn rewrite_batch<S>(
        &self,
        texts: &[S],
        settings: &RewriteSettings,
    ) -> Result<Vec<RewriteResult>>
    where
        S: AsRef<str> + Sync,
    {
        settings.validate()?;

        let (index, warnings) = self.index_or_empty(settings)?;
        let results = texts
            .par_iter()
            .map(|t| {
                rewrite_with_index(t.as_ref(), &index, settings, &self.engine)
                    .map(|result| self.finish(result, &warnings))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("Batch of {} texts: {}", texts.len(), self.metrics().summary());
        Ok(results)
    }
}
