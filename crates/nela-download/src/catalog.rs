//! Named downloads (installers and model files) mapped to provider file ids.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [[artifact]]
//! kind = "models"
//! slug = "small"
//! file_id = "1AbCdEf"
//! label = "Small"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    /// Artifact group, e.g. `installer` or `models`.
    pub kind: String,
    /// Name within the group, e.g. `windows` or `small`.
    pub slug: String,
    /// Provider file id.
    pub file_id: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
}

/// Public view of an artifact; the file id is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogListing {
    /// Artifact group.
    pub kind: String,
    /// Name within the group.
    pub slug: String,
    /// Human-readable label, defaulting to the slug.
    pub label: String,
    /// Route that downloads this artifact.
    pub href: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "artifact")]
    artifacts: Vec<Artifact>,
}

/// Immutable set of named downloads.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    artifacts: Vec<Artifact>,
}

impl Catalog {
    /// An empty catalog; every named route answers 404.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate or incomplete entries.
    pub fn new(artifacts: Vec<Artifact>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for a in &artifacts {
            for (field, value) in [("kind", &a.kind), ("slug", &a.slug), ("file_id", &a.file_id)] {
                if value.trim().is_empty() {
                    return Err(CatalogError::EmptyField {
                        kind: a.kind.clone(),
                        slug: a.slug.clone(),
                        field,
                    });
                }
            }
            if !seen.insert((a.kind.as_str(), a.slug.as_str())) {
                return Err(CatalogError::Duplicate {
                    kind: a.kind.clone(),
                    slug: a.slug.clone(),
                });
            }
        }
        Ok(Self { artifacts })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.artifacts)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            artifacts = catalog.len(),
            "Loaded download catalog"
        );
        Ok(catalog)
    }

    /// Find an artifact by kind and slug.
    pub fn get(&self, kind: &str, slug: &str) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|a| a.kind == kind && a.slug == slug)
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the catalog has no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Public listing, in file order.
    pub fn listing(&self) -> Vec<CatalogListing> {
        self.artifacts
            .iter()
            .map(|a| CatalogListing {
                kind: a.kind.clone(),
                slug: a.slug.clone(),
                label: a.label.clone().unwrap_or_else(|| a.slug.clone()),
                href: format!("/downloads/{}/{}", a.kind, a.slug),
            })
            .collect()
    }
}
