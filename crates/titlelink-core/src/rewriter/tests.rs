use crate::catalog::{CatalogError, CatalogQuery, MemoryCatalog, PageCatalog};
use crate::error::TitleLinkError;
use crate::rewriter::*;
use crate::settings::{LinkMode, RewriteSettings, SameTitleOrder};
use crate::types::{LinkableTitle, PageId};
// The glob above brings in the crate's 1-arg Result alias.
use std::result::Result;
use std::sync::Mutex;

fn page(id: i64, title: &str, order: i64) -> LinkableTitle {
    LinkableTitle::new(id, title, order, 1).with_url(format!("/pages/{}/", id))
}

fn catalog(pages: Vec<LinkableTitle>) -> MemoryCatalog {
    MemoryCatalog::with_pages(pages)
}

fn settings() -> RewriteSettings {
    RewriteSettings::new().with_templates([1])
}

fn run(text: &str, settings: &RewriteSettings, pages: Vec<LinkableTitle>) -> RewriteResult {
    rewrite(text, settings, &catalog(pages)).unwrap()
}

struct FailingCatalog;

impl PageCatalog for FailingCatalog {
    fn query(&self, _query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError> {
        Err(CatalogError::Unavailable("database offline".into()))
    }
}

struct RecordingCatalog {
    inner: MemoryCatalog,
    last: Mutex<Option<CatalogQuery>>,
}

impl PageCatalog for RecordingCatalog {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<LinkableTitle>, CatalogError> {
        *self.last.lock().unwrap() = Some(query.clone());
        self.inner.query(query)
    }
}

#[test]
fn test_text_without_titles_is_unchanged() {
    let text = "<p>Nothing to see here.</p>";
    let result = run(text, &settings(), vec![page(1, "Apple", 1)]);
    assert_eq!(result.text, text);
    assert_eq!(result.substitutions, 0);
    assert!(!result.is_changed());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_longest_title_wins_at_same_position() {
    let pages = vec![page(1, "New York", 1), page(2, "New York City", 2)];
    let result = run("Visit New York City today", &settings(), pages);
    assert_eq!(
        result.text,
        r#"Visit <a href="/pages/2/">New York City</a> today"#
    );
    assert_eq!(result.substitutions, 1);
    assert_eq!(result.links[0].page_id, PageId(2));
}

#[test]
fn test_shorter_title_used_when_longer_is_not_word_bounded() {
    let pages = vec![page(1, "Art", 1), page(2, "Art Deco", 2)];
    let result = run("Art Decorations", &settings(), pages);
    assert_eq!(result.text, r#"<a href="/pages/1/">Art</a> Decorations"#);
}

#[test]
fn test_duplicate_titles_tie_break() {
    let pages = vec![page(1, "Apple", 5), page(2, "Apple", 9)];

    let result = run("I like Apple", &settings(), pages.clone());
    assert_eq!(result.links[0].page_id, PageId(1));

    let max = settings().with_same_title_order(SameTitleOrder::Max);
    let result = run("I like Apple", &max, pages);
    assert_eq!(result.links[0].page_id, PageId(2));
}

#[test]
fn test_case_insensitive_match_keeps_original_text() {
    let settings = settings().with_case_insensitive_match(true);
    let result = run("I like apple pie", &settings, vec![page(1, "Apple", 1)]);
    assert_eq!(result.text, r#"I like <a href="/pages/1/">apple</a> pie"#);

    let result = run("I like apple pie", &self::settings(), vec![page(1, "Apple", 1)]);
    assert_eq!(result.substitutions, 0);
}

#[test]
fn test_case_insensitive_with_length_changing_fold() {
    let settings = settings().with_case_insensitive_match(true);
    let result = run("Visit İSTANBUL now", &settings, vec![page(1, "İstanbul", 1)]);
    assert_eq!(result.text, r#"Visit <a href="/pages/1/">İSTANBUL</a> now"#);
}

#[test]
fn test_minimum_length_excludes_short_titles() {
    let settings = settings().with_minimum_length(4);
    let pages = vec![page(1, "Go", 1), page(2, "Gopher", 2)];
    let result = run("Go home. Go Gopher!", &settings, pages);
    assert_eq!(
        result.text,
        r#"Go home. Go <a href="/pages/2/">Gopher</a>!"#
    );
}

#[test]
fn test_word_boundary_required() {
    let pages = vec![page(1, "Art", 1)];
    let result = run("Article", &settings(), pages.clone());
    assert_eq!(result.text, "Article");

    let result = run("An Article about Art.", &settings(), pages);
    assert_eq!(
        result.text,
        r#"An Article about <a href="/pages/1/">Art</a>."#
    );
}

#[test]
fn test_current_page_excluded() {
    let pages = vec![page(1, "Apple", 1)];
    let excluded = settings().with_current_page(Some(PageId(1)));
    let result = run("Apple", &excluded, pages.clone());
    assert_eq!(result.substitutions, 0);

    let included = excluded.with_include_current_page(true);
    let result = run("Apple", &included, pages);
    assert_eq!(result.substitutions, 1);
}

#[test]
fn test_current_page_excluded_before_tie_break() {
    let pages = vec![page(1, "Apple", 1), page(2, "Apple", 2)];
    let settings = settings().with_current_page(Some(PageId(1)));
    let result = run("Apple", &settings, pages);
    assert_eq!(result.links[0].page_id, PageId(2));
}

#[test]
fn test_unviewable_page_not_linked_unless_check_disabled() {
    let pages = vec![page(1, "Apple", 1).viewable(false)];
    let result = run("Apple", &settings(), pages.clone());
    assert_eq!(result.substitutions, 0);

    let relaxed = settings().with_disable_viewable_check(true);
    let result = run("Apple", &relaxed, pages);
    assert_eq!(result.substitutions, 1);
}

#[test]
fn test_first_occurrence_only_by_default() {
    let result = run("Apple and Apple", &settings(), vec![page(1, "Apple", 1)]);
    assert_eq!(result.text, r#"<a href="/pages/1/">Apple</a> and Apple"#);
    assert_eq!(result.substitutions, 1);
}

#[test]
fn test_every_occurrence_mode() {
    let settings = settings().with_link_mode(LinkMode::EveryOccurrence);
    let result = run("Apple and Apple", &settings, vec![page(1, "Apple", 1)]);
    assert_eq!(
        result.text,
        r#"<a href="/pages/1/">Apple</a> and <a href="/pages/1/">Apple</a>"#
    );
    assert_eq!(result.substitutions, 2);
}

#[test]
fn test_linked_title_span_is_not_relinked_by_shorter_title() {
    let pages = vec![page(1, "New York", 1), page(2, "New York City", 2)];
    let result = run("New York City, then New York City.", &settings(), pages);
    assert_eq!(
        result.text,
        r#"<a href="/pages/2/">New York City</a>, then New York City."#
    );
}

#[test]
fn test_existing_links_and_tags_untouched() {
    let pages = vec![page(1, "Apple", 1)];
    let text = r#"<a href="/x">Apple</a> and Apple"#;
    let result = run(text, &settings(), pages.clone());
    assert_eq!(result.text, text);
    assert_eq!(result.substitutions, 0);

    let text = r#"<img alt="Apple" src="apple.png"> Apple"#;
    let result = run(text, &settings(), pages);
    assert_eq!(
        result.text,
        r#"<img alt="Apple" src="apple.png"> <a href="/pages/1/">Apple</a>"#
    );
}

#[test]
fn test_protected_elements_skipped() {
    let pages = vec![page(1, "Apple", 1)];
    let settings = settings().with_link_mode(LinkMode::EveryOccurrence);
    let text = "<code>Apple</code><pre>Apple</pre><p>Apple</p>";
    let result = run(text, &settings, pages);
    assert_eq!(
        result.text,
        r#"<code>Apple</code><pre>Apple</pre><p><a href="/pages/1/">Apple</a></p>"#
    );
}

#[test]
fn test_raw_text_elements_never_rewritten() {
    let pages = vec![page(1, "Apple", 1)];
    let text = "<html><head><title>Apple</title></head>\
                <body><textarea>Apple</textarea><p>Apple</p></body></html>";
    let once = run(text, &settings(), pages.clone());
    assert_eq!(once.substitutions, 1);
    assert!(once
        .text
        .contains(r#"<title>Apple</title></head><body><textarea>Apple</textarea>"#));
    assert!(once.text.contains(r#"<p><a href="/pages/1/">Apple</a></p>"#));

    let twice = run(&once.text, &settings(), pages.clone());
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.substitutions, 0);

    // Still protected when the skip list no longer names them.
    let settings = settings().with_skip_elements(["h1"]);
    let once = run("<title>Apple</title><p>Apple</p>", &settings, pages.clone());
    assert_eq!(
        once.text,
        r#"<title>Apple</title><p><a href="/pages/1/">Apple</a></p>"#
    );
    let twice = run(&once.text, &settings, pages);
    assert_eq!(twice.text, once.text);
}

#[test]
fn test_skipped_content_does_not_use_up_first_occurrence() {
    let pages = vec![page(1, "Apple", 1)];
    let result = run("<pre>Apple</pre><p>I like Apple.</p>", &settings(), pages.clone());
    assert_eq!(result.substitutions, 1);
    assert_eq!(
        result.text,
        r#"<pre>Apple</pre><p>I like <a href="/pages/1/">Apple</a>.</p>"#
    );

    // A link inside skipped content still counts.
    let text = r#"<pre><a href="/x">Apple</a></pre><p>Apple</p>"#;
    let result = run(text, &settings(), pages);
    assert_eq!(result.text, text);
    assert_eq!(result.substitutions, 0);
}

#[test]
fn test_title_split_by_markup_not_matched() {
    let result = run("New <b>York</b>", &settings(), vec![page(1, "New York", 1)]);
    assert_eq!(result.text, "New <b>York</b>");
}

#[test]
fn test_entity_encoded_title() {
    let result = run(
        "<p>Tom &amp; Jerry</p>",
        &settings(),
        vec![page(1, "Tom & Jerry", 1)],
    );
    assert_eq!(
        result.text,
        r#"<p><a href="/pages/1/">Tom &amp; Jerry</a></p>"#
    );
}

#[test]
fn test_rewrite_is_idempotent() {
    let pages = vec![
        page(1, "New York", 1),
        page(2, "New York City", 2),
        page(3, "Apple", 3),
    ];
    let text = "<p>New York City has Apple stores. New York likes Apple.</p>";
    let once = run(text, &settings(), pages.clone());
    let twice = run(&once.text, &settings(), pages);
    assert_eq!(once.substitutions, 3);
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.substitutions, 0);
}

#[test]
fn test_idempotent_with_custom_tag() {
    let settings = settings().with_html_tag("span").with_disable_href(true);
    let pages = vec![page(1, "Apple", 1)];
    let once = run("Apple, Apple", &settings, pages.clone());
    assert_eq!(once.text, "<span>Apple</span>, Apple");
    let twice = run(&once.text, &settings, pages);
    assert_eq!(twice.text, once.text);
}

#[test]
fn test_title_glued_to_link_stays_unlinked() {
    let pages = vec![page(1, "C++", 1), page(2, "Apple", 2)];
    let once = run("C++Apple", &settings(), pages.clone());
    assert_eq!(once.text, r#"C++<a href="/pages/2/">Apple</a>"#);

    let twice = run(&once.text, &settings(), pages);
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.substitutions, 0);
}

#[test]
fn test_custom_attributes_and_bad_lines() {
    let pages = vec![page(1, "Apple", 1).with_template("fruit", "Fruit")];
    let settings = settings().with_attributes("title=Go to {template.label}: {title}\nbroken");
    let result = run("Apple", &settings, pages);
    assert_eq!(
        result.text,
        r#"<a href="/pages/1/" title="Go to Fruit: Apple">Apple</a>"#
    );
    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        result.warnings[0],
        RewriteWarning::AttributeSkipped { .. }
    ));
}

#[test]
fn test_link_offsets_point_at_markup() {
    let pages = vec![page(1, "Apple", 1), page(2, "Banana", 2)];
    let result = run("Apple or Banana", &settings(), pages);
    assert_eq!(result.links.len(), 2);
    for link in &result.links {
        assert!(result.text[link.offset..].starts_with("<a href"));
    }
    assert_eq!(result.links[1].matched, "Banana");
}

#[test]
fn test_catalog_failure_returns_original_with_warning() {
    let result = rewrite("Apple", &settings(), &FailingCatalog).unwrap();
    assert_eq!(result.text, "Apple");
    assert_eq!(result.substitutions, 0);
    assert!(matches!(
        result.warnings.as_slice(),
        [RewriteWarning::CatalogUnavailable(_)]
    ));
}

#[test]
fn test_empty_catalog_and_no_templates_warn() {
    let result = run("Apple", &settings(), Vec::new());
    assert_eq!(result.warnings, vec![RewriteWarning::CatalogEmpty]);

    let result = run("Apple", &RewriteSettings::new(), vec![page(1, "Apple", 1)]);
    assert_eq!(result.text, "Apple");
    assert_eq!(result.warnings, vec![RewriteWarning::NoTemplates]);
}

#[test]
fn test_invalid_settings_are_errors() {
    let bad = settings().with_html_tag("not a tag");
    let catalog = catalog(vec![page(1, "Apple", 1)]);
    assert!(matches!(
        rewrite("Apple", &bad, &catalog),
        Err(TitleLinkError::InvalidSettings(_))
    ));

    let linker = TitleLinker::new(catalog);
    let result = linker.rewrite_or_original("Apple", &bad);
    assert_eq!(result.text, "Apple");
    assert!(matches!(result.warnings[0], RewriteWarning::Fallback(_)));
    assert_eq!(linker.metrics().fallbacks, 1);
}

#[test]
fn test_query_carries_settings() {
    let catalog = RecordingCatalog {
        inner: catalog(vec![page(1, "Apple", 1)]),
        last: Mutex::new(None),
    };
    let settings = settings()
        .with_include_hidden(true)
        .with_force_case_sensitive_query(true);
    rewrite("Apple", &settings, &catalog).unwrap();

    let query = catalog.last.lock().unwrap().clone().unwrap();
    assert!(query.include_hidden);
    assert!(query.force_case_sensitive);
    assert_eq!(query.templates, settings.templates);
}

#[test]
fn test_linker_caches_index_until_catalog_changes() {
    let mut linker = TitleLinker::new(catalog(vec![page(1, "Apple", 1)]));

    let first = linker.rewrite("Apple Banana", &settings()).unwrap();
    assert_eq!(first.substitutions, 1);
    linker.rewrite("Apple Banana", &settings()).unwrap();
    assert_eq!(linker.metrics().index_builds, 1);
    assert_eq!(linker.metrics().cache_hits, 1);

    linker.catalog_mut().insert(page(2, "Banana", 2));
    let after = linker.rewrite("Apple Banana", &settings()).unwrap();
    assert_eq!(after.substitutions, 2);
    assert_eq!(linker.metrics().index_builds, 2);
}

#[test]
fn test_rewrite_batch() {
    let linker = TitleLinker::new(catalog(vec![page(1, "Apple", 1)]));
    let texts = vec!["Apple pie", "No fruit", "Apple and Apple"];
    let results = linker.rewrite_batch(&texts, &settings()).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].substitutions, 1);
    assert_eq!(results[1].substitutions, 0);
    assert_eq!(results[2].substitutions, 1);
    assert_eq!(linker.metrics().rewrites, 3);
    assert_eq!(linker.metrics().substitutions, 2);
}

#[test]
fn test_rewrite_with_prebuilt_index() {
    let settings = settings();
    let index = crate::index::TitleIndex::build(vec![page(1, "Apple", 1)], &settings).unwrap();
    let engine = crate::attributes::FieldTemplateEngine::new();
    let result = rewrite_with_index("An Apple", &index, &settings, &engine).unwrap();
    assert_eq!(result.text, r#"An <a href="/pages/1/">Apple</a>"#);
}

#[test]
fn test_attribute_warnings_kept_without_templates() {
    let settings = RewriteSettings::new().with_attributes("broken");
    let result = run("Apple", &settings, vec![page(1, "Apple", 1)]);
    assert_eq!(result.text, "Apple");
    assert_eq!(result.warnings.len(), 2);
    assert_eq!(result.warnings[0], RewriteWarning::NoTemplates);
    assert!(matches!(
        result.warnings[1],
        RewriteWarning::AttributeSkipped { .. }
    ));
}

#[test]
fn test_rewrite_batch_metrics_match_single_rewrites() {
    let texts = vec!["Apple pie", "No fruit", "Apple and Apple"];

    let linker = TitleLinker::new(catalog(vec![page(1, "Apple", 1)]));
    let settings = settings().with_attributes("broken
also broken");
    let results = linker.rewrite_batch(&texts, &settings).unwrap();
    assert!(results.iter().all(|r| r.warnings.len() == 2));
    assert_eq!(linker.metrics().rewrites, 3);
    assert_eq!(linker.metrics().attributes_skipped, 6);

    // No templates: nothing is linked, but every text still counts.
    let linker = TitleLinker::new(catalog(vec![page(1, "Apple", 1)]));
    let settings = RewriteSettings::new().with_attributes("broken");
    let results = linker.rewrite_batch(&texts, &settings).unwrap();
    assert_eq!(results[0].text, "Apple pie");
    assert_eq!(results[0].warnings[0], RewriteWarning::NoTemplates);
    assert_eq!(linker.metrics().rewrites, 3);
    assert_eq!(linker.metrics().substitutions, 0);
    assert_eq!(linker.metrics().attributes_skipped, 3);

    for text in &texts {
        linker.rewrite(text, &settings).unwrap();
    }
    assert_eq!(linker.metrics().rewrites, 6);
    assert_eq!(linker.metrics().attributes_skipped, 6);
}
