use thiserror::Error;

use crate::attributes::AttributeError;
use crate::catalog::CatalogError;

pub type Result<T> = std::result::Result<T, TitleLinkError>;

#[derive(Debug, Error)]
pub enum TitleLinkError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    #[error("Index build failed: {0}")]
    Index(String),
}
