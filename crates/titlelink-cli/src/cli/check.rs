use crate::config::TitleLinkConfig;
use anyhow::Result;
use std::path::Path;
use titlelink_core::{CatalogQuery, PageCatalog, TitleIndex};

pub fn run(config: &TitleLinkConfig, config_path: &Path) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        println!("❌ Validation errors in {}:", config_path.display());
        for e in &errors {
            println!("  - {}", e);
        }
        anyhow::bail!("{} validation error(s)", errors.len());
    }

    let settings = config.settings(None)?;
    let catalog = config.catalog()?;

    if settings.templates.is_empty() {
        println!("⚠️  No auto_link_templates configured: nothing will be linked.");
    }

    let pages = catalog.query(&CatalogQuery::from_settings(&settings))?;
    let index = TitleIndex::build(pages, &settings)?;

    println!("✅ {} is valid.", config_path.display());
    println!(
        "   {} pages in catalog, {} linkable titles",
        catalog.len(),
        index.len()
    );
    Ok(())
}
