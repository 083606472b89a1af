use crate::cli::RewriteArgs;
use crate::config::TitleLinkConfig;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use titlelink_core::{PageId, RewriteResult, TitleLinker};
use tracing::{info, warn};

pub fn run(args: RewriteArgs, config: &TitleLinkConfig) -> Result<()> {
    let mut config = config.clone();
    if !args.templates.is_empty() {
        config.linking.auto_link_templates = args.templates.clone();
    }

    let settings = config.settings(args.current_page.map(PageId))?;
    let catalog = config.catalog()?;
    info!("Loaded {} pages from catalog", catalog.len());
    let linker = TitleLinker::new(catalog);

    if args.inputs.len() > 1 {
        let out_dir = args
            .out_dir
            .as_deref()
            .context("--out-dir is required when rewriting several files")?;
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        let texts = args
            .inputs
            .iter()
            .map(|path| read_input(Some(path.as_path())))
            .collect::<Result<Vec<_>>>()?;
        let results = linker.rewrite_batch(&texts, &settings)?;

        for (path, result) in args.inputs.iter().zip(&results) {
            let name = path
                .file_name()
                .with_context(|| format!("{} has no file name", path.display()))?;
            report(&path.display().to_string(), result);
            write_output(Some(out_dir.join(name).as_path()), result, args.json)?;
        }
        return Ok(());
    }

    let input = args.inputs.first();
    let text = read_input(input.map(|p| p.as_path()))?;
    let result = linker.rewrite_or_original(&text, &settings);

    let label = input.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    report(&label, &result);

    let output = match (&args.output, &args.out_dir, input) {
        (Some(path), _, _) => Some(path.clone()),
        (None, Some(dir), Some(input)) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let name = input
                .file_name()
                .with_context(|| format!("{} has no file name", input.display()))?;
            Some(dir.join(name))
        }
        _ => None,
    };
    write_output(output.as_deref(), &result, args.json)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, result: &RewriteResult, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(result)?
    } else {
        result.text.clone()
    };

    match path {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn report(label: &str, result: &RewriteResult) {
    info!("{}: {} links", label, result.substitutions);
    for warning in &result.warnings {
        warn!("{}: {}", label, warning);
    }
}
