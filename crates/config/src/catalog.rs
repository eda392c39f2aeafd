//! Listing catalog
//!
//! Read-only reference data. The built-in catalog is compiled into the binary; a deployment
//! can point `catalog_path` at its own YAML file with the same shape.

use std::path::Path;

use roy_core::Listing;

use crate::ConfigError;

const BUILTIN_LISTINGS: &str = include_str!("../data/listings.yaml");

/// Ordered, immutable set of listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingCatalog {
    listings: Vec<Listing>,
}

impl ListingCatalog {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Catalog shipped with the service
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_LISTINGS)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let listings: Vec<Listing> = serde_yaml::from_str(yaml)?;
        Ok(Self { listings })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_yaml(&yaml)?;
        tracing::info!(path = %path.display(), listings = catalog.len(), "Loaded listing catalog");
        Ok(catalog)
    }

    /// Load from `path` if given, otherwise the built-in catalog
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if !p.trim().is_empty() => Self::from_file(p),
            _ => Self::builtin(),
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
