//! Example: link page titles in a rendered page
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use titlelink_core::*;

fn main() {
    // Initialize logging
    env_logger::init();

    let mut catalog = MemoryCatalog::with_pages(vec![
        LinkableTitle::new(1, "New York", 1, 1)
            .with_url("/cities/new-york/")
            .with_template("city", "City"),
        LinkableTitle::new(2, "New York City", 2, 1)
            .with_url("/cities/nyc/")
            .with_template("city", "City"),
        LinkableTitle::new(3, "Brooklyn", 3, 1)
            .with_url("/cities/brooklyn/")
            .with_template("city", "City")
            .with_field("borough", "Kings"),
        LinkableTitle::new(4, "Draft notes", 4, 2).hidden(true),
    ]);
    catalog.set_templates(vec![
        TemplateInfo {
            id: TemplateId(1),
            name: "city".into(),
            label: "City".into(),
            system: false,
        },
        TemplateInfo {
            id: TemplateId(2),
            name: "notes".into(),
            label: String::new(),
            system: false,
        },
    ]);

    println!("Templates available for auto-linking:");
    for (id, display) in selectable_templates(catalog.templates()) {
        println!("  {} => {}", id, display);
    }

    let settings = RewriteSettings::new()
        .with_templates([1])
        .with_case_insensitive_match(true)
        .with_attributes("title={template.label}: {title}\nclass=autolink\ndata-borough={borough}")
        .with_current_page(Some(PageId(1)));

    let html = "<h1>Trip report</h1>\n\
                <p>We landed in new york city, crossed into Brooklyn, \
                and later saw <a href=\"/maps\">New York</a> from the ferry. \
                Brooklyn again at night.</p>\n\
                <pre>New York City</pre>";

    let linker = TitleLinker::new(catalog);
    let result = linker.rewrite_or_original(html, &settings);

    println!("\nRewritten ({} links):\n{}\n", result.substitutions, result.text);
    for link in &result.links {
        println!("  page {} <- {:?} at byte {}", link.page_id, link.matched, link.offset);
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }

    // Second pass is served from the index cache.
    let again = linker.rewrite_or_original(&result.text, &settings);
    println!("\nSecond pass changed text: {}", again.is_changed());
    println!("{}", linker.metrics().summary());
}
