use crate::config::TitleLinkConfig;
use anyhow::Result;
use titlelink_core::{selectable_templates, TemplateId, TemplateInfo};

pub fn run(config: &TitleLinkConfig) -> Result<()> {
    let catalog = config.catalog()?;
    let lines = listing(catalog.templates(), &config.linking.auto_link_templates);
    if lines.is_empty() {
        println!("No selectable templates in catalog.");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// One line per selectable template; `*` marks those already configured.
fn listing(templates: &[TemplateInfo], selected: &[i64]) -> Vec<String> {
    selectable_templates(templates)
        .into_iter()
        .map(|(TemplateId(id), display)| {
            let mark = if selected.contains(&id) { '*' } else { ' ' };
            format!("{} {:>4}  {}", mark, id, display)
        })
        .collect()
}
