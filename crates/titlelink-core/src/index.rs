//! Title index: the deduplicated, longest-first set of linkable titles and
//! the automaton that finds them in text.

use crate::error::{Result, TitleLinkError};
use crate::normalize::normalize_title;
use crate::settings::{RewriteSettings, SameTitleOrder};
use crate::types::{LinkableTitle, PageId, TemplateId};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Every setting that changes the contents of a [`TitleIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub templates: BTreeSet<TemplateId>,
    pub include_hidden: bool,
    pub force_case_sensitive: bool,
    pub minimum_length: usize,
    pub case_insensitive: bool,
    pub same_title_order: SameTitleOrder,
    pub disable_viewable_check: bool,
    pub excluded_page: Option<PageId>,
}

impl IndexKey {
    pub fn from_settings(settings: &RewriteSettings) -> Self {
        Self {
            templates: settings.templates.clone(),
            include_hidden: settings.include_hidden,
            force_case_sensitive: settings.force_case_sensitive_query,
            minimum_length: settings.minimum_length,
            case_insensitive: settings.case_insensitive_match,
            same_title_order: settings.same_title_order,
            disable_viewable_check: settings.disable_viewable_check,
            excluded_page: settings.excluded_page(),
        }
    }
}

/// The page chosen for one normalized title.
#[derive(Debug, Clone)]
pub struct IndexedTitle {
    /// Normalized title.
    pub key: String,
    pub page: LinkableTitle,
    /// How many eligible pages shared this title before the tie-break.
    pub candidates: usize,
}

/// A title occurrence found in (possibly folded) text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    /// Position in [`TitleIndex::iter`] order.
    pub title: usize,
}

/// Immutable once built. Rebuild, never patch, when the catalog changes.
#[derive(Debug, Clone)]
pub struct TitleIndex {
    /// Longest title first.
    titles: Vec<IndexedTitle>,
    by_key: HashMap<String, usize>,
    automaton: Option<AhoCorasick>,
    /// Pattern id -> position in `titles`.
    pattern_titles: Vec<usize>,
    case_insensitive: bool,
}

impl TitleIndex {
    pub fn empty(case_insensitive: bool) -> Self {
        Self {
            titles: Vec::new(),
            by_key: HashMap::new(),
            automaton: None,
            pattern_titles: Vec::new(),
            case_insensitive,
        }
    }

    /// Filter, deduplicate and compile `pages` according to `settings`.
    pub fn build(pages: Vec<LinkableTitle>, settings: &RewriteSettings) -> Result<Self> {
        let case_insensitive = settings.case_insensitive_match;
        let excluded = settings.excluded_page();

        let mut groups: HashMap<String, (LinkableTitle, usize)> = HashMap::new();
        let mut considered = 0usize;

        for page in pages {
            if !settings.templates.contains(&page.template_id) {
                continue;
            }
            if page.hidden && !settings.include_hidden {
                continue;
            }
            if !page.viewable && !settings.disable_viewable_check {
                continue;
            }
            if excluded == Some(page.page_id) {
                continue;
            }
            let length = page.title.trim().chars().count();
            if length == 0 || length < settings.minimum_length {
                continue;
            }

            considered += 1;
            let key = normalize_title(&page.title, case_insensitive);
            match groups.get_mut(&key) {
                Some((best, count)) => {
                    *count += 1;
                    if prefer(&page, best, settings.same_title_order) {
                        *best = page;
                    }
                }
                None => {
                    groups.insert(key, (page, 1));
                }
            }
        }

        let mut titles: Vec<IndexedTitle> = groups
            .into_iter()
            .map(|(key, (page, candidates))| IndexedTitle {
                key,
                page,
                candidates,
            })
            .collect();
        titles.sort_by(|a, b| {
            Reverse(a.key.chars().count())
                .cmp(&Reverse(b.key.chars().count()))
                .then_with(|| a.key.cmp(&b.key))
        });

        let by_key = titles
            .iter()
            .enumerate()
            .map(|(i, t)| (t.key.clone(), i))
            .collect();

        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_titles = Vec::new();
        let mut seen = HashSet::new();
        for (i, title) in titles.iter().enumerate() {
            if seen.insert(title.key.clone()) {
                patterns.push(title.key.clone());
                pattern_titles.push(i);
            }
            // Rendered markup carries "&" as "&amp;".
            let encoded = html_escape::encode_text(title.page.title.trim());
            let encoded = normalize_title(&encoded, case_insensitive);
            if seen.insert(encoded.clone()) {
                patterns.push(encoded);
                pattern_titles.push(i);
            }
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasickBuilder::new()
                    .match_kind(MatchKind::Standard)
                    .build(&patterns)
                    .map_err(|e| TitleLinkError::Index(e.to_string()))?,
            )
        };

        log::debug!(
            "Built title index: {} titles from {} eligible pages ({} patterns)",
            titles.len(),
            considered,
            patterns.len()
        );

        Ok(Self {
            titles,
            by_key,
            automaton,
            pattern_titles,
            case_insensitive,
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Titles, longest first.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedTitle> {
        self.titles.iter()
    }

    pub fn title(&self, position: usize) -> Option<&IndexedTitle> {
        self.titles.get(position)
    }

    /// Look up the chosen page for a raw title.
    pub fn lookup(&self, title: &str) -> Option<&IndexedTitle> {
        let key = normalize_title(title, self.case_insensitive);
        self.by_key.get(&key).map(|&i| &self.titles[i])
    }

    /// All title occurrences in `haystack`, ordered by start offset and,
    /// at the same offset, longest first.
    pub fn find_candidates(&self, haystack: &str) -> Vec<Candidate> {
        let automaton = match &self.automaton {
            Some(a) => a,
            None => return Vec::new(),
        };

        let mut found: Vec<Candidate> = automaton
            .find_overlapping_iter(haystack)
            .map(|m| Candidate {
                start: m.start(),
                end: m.end(),
                title: self.pattern_titles[m.pattern().as_usize()],
            })
            .collect();

        found.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
        });
        found
    }
}

/// Whether `candidate` should replace `current` as the page for a title.
fn prefer(candidate: &LinkableTitle, current: &LinkableTitle, order: SameTitleOrder) -> bool {
    let by_order = candidate.created_order.cmp(&current.created_order);
    let by_id = candidate.page_id.cmp(&current.page_id);
    match order {
        SameTitleOrder::Min => by_order.then(by_id) == Ordering::Less,
        SameTitleOrder::Max => by_order.then(by_id) == Ordering::Greater,
    }
}
