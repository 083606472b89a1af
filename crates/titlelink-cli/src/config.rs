use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use titlelink_core::{MemoryCatalog, PageId, RewriteConfig, RewriteSettings};

/// Contents of `titlelink.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TitleLinkConfig {
    pub linking: RewriteConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON page catalog. Relative paths resolve against the config file.
    pub path: Option<PathBuf>,
}

impl TitleLinkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;

        if let (Some(catalog), Some(dir)) = (&config.catalog.path, path.parent()) {
            if catalog.is_relative() {
                config.catalog.path = Some(dir.join(catalog));
            }
        }
        Ok(config)
    }

    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn settings(&self, current_page: Option<PageId>) -> Result<RewriteSettings> {
        self.linking
            .into_settings(current_page)
            .context("Invalid [linking] settings")
    }

    pub fn catalog(&self) -> Result<MemoryCatalog> {
        let path = self
            .catalog
            .path
            .as_deref()
            .context("No page catalog configured: set [catalog] path or pass --catalog")?;
        load_catalog(path)
    }

    /// Problems that make the config unusable. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.linking.into_settings(None) {
            errors.push(e.to_string());
        }

        match &self.catalog.path {
            None => errors.push("no page catalog configured".to_string()),
            Some(path) if !path.exists() => {
                errors.push(format!("catalog file {} not found", path.display()))
            }
            Some(_) => {}
        }

        errors
    }
}

pub fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    MemoryCatalog::from_json_str(&json)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))
}
