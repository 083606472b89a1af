//! Property-based tests for the rewriter.
//!
//! 1. **Idempotence**: rewriting rewritten output changes nothing
//! 2. **Identity**: text containing no title comes back unchanged
//! 3. **Accounting**: the substitution count matches the links emitted
//! 4. **Additive**: removing the emitted markup restores the input

use proptest::prelude::*;
use titlelink_core::{rewrite, LinkMode, LinkableTitle, MemoryCatalog, RewriteSettings};

fn page(id: i64, title: &str) -> LinkableTitle {
    LinkableTitle::new(id, title, id, 1).with_url(format!("/pages/{}/", id))
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::with_pages(vec![
        page(1, "Apple"),
        page(2, "New York"),
        page(3, "New York City"),
        page(4, "C++"),
        page(5, "Art"),
    ])
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec![
            "Apple",
            "apple",
            "New York",
            "New York City",
            "C++",
            "Art",
            "Article",
            " ",
            " ",
            ", ",
            ".",
            "<b>",
            "</b>",
            "<a href=\"/x\">",
            "</a>",
            "<code>",
            "</code>",
            "<br/>",
            "<pre>",
            "</pre>",
            "<title>",
            "</title>",
            "<!-- Apple -->",
        ])
        .prop_map(str::to_string),
        "[a-zA-Z]{1,6}",
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.concat())
}

fn settings(case_insensitive: bool, every: bool) -> RewriteSettings {
    let mode = if every {
        LinkMode::EveryOccurrence
    } else {
        LinkMode::FirstOccurrence
    };
    RewriteSettings::new()
        .with_templates([1])
        .with_case_insensitive_match(case_insensitive)
        .with_link_mode(mode)
}

proptest! {
    #[test]
    fn prop_rewrite_is_idempotent(
        text in document(),
        case_insensitive in any::<bool>(),
        every in any::<bool>(),
    ) {
        let settings = settings(case_insensitive, every);
        let once = rewrite(&text, &settings, &catalog()).unwrap();
        let twice = rewrite(&once.text, &settings, &catalog()).unwrap();
        prop_assert_eq!(twice.substitutions, 0);
        prop_assert_eq!(twice.text, once.text);
    }

    #[test]
    fn prop_text_without_titles_is_unchanged(text in "[0-9 .,;()-]{0,60}") {
        let result = rewrite(&text, &settings(true, true), &catalog()).unwrap();
        prop_assert_eq!(result.substitutions, 0);
        prop_assert_eq!(result.text, text);
    }

    #[test]
    fn prop_substitutions_match_emitted_links(
        text in document(),
        every in any::<bool>(),
    ) {
        let result = rewrite(&text, &settings(false, every), &catalog()).unwrap();
        prop_assert_eq!(result.substitutions, result.links.len());
        prop_assert_eq!(result.text.matches("<a href=\"/pages/").count(), result.substitutions);
        for link in &result.links {
            prop_assert!(result.text[link.offset..].starts_with("<a href=\"/pages/"));
        }
    }

    #[test]
    fn prop_rewrite_only_adds_markup(
        text in document(),
        case_insensitive in any::<bool>(),
    ) {
        let settings = settings(case_insensitive, true)
            .with_html_tag("span")
            .with_disable_href(true);
        let result = rewrite(&text, &settings, &catalog()).unwrap();
        let stripped = result.text.replace("<span>", "").replace("</span>", "");
        prop_assert_eq!(stripped, text);
    }
}
