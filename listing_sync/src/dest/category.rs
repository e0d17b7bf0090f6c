//! Source-to-destination category mapping.
//!
//! The map lives in an optional TOML file. Each entry maps one source
//! category id to a destination category id; many-to-one is fine. A fixed
//! `uncategorized` entry catches everything unmapped. Without a file every
//! product is created uncategorized.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use shim_utils::env::get_env_var;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CategoryMapFile {
    #[serde(default)]
    uncategorized: Option<i64>,
    #[serde(default)]
    categories: IndexMap<String, i64>,
}

/// Resolves source category ids to destination category ids.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    entries: HashMap<i64, i64>,
    fallback: Option<i64>,
}

impl CategoryMap {
    /// A map with no entries; every lookup misses.
    pub fn disabled() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: None,
        }
    }

    /// Loads the map from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading category map {}", path.display()))?;
        let file: CategoryMapFile = toml::from_str(&raw)
            .with_context(|| format!("parsing category map {}", path.display()))?;

        let mut entries = HashMap::with_capacity(file.categories.len());
        for (source, dest) in &file.categories {
            let source: i64 = source
                .parse()
                .with_context(|| format!("non-numeric source category id {source:?}"))?;
            entries.insert(source, *dest);
        }
        Ok(Self {
            entries,
            fallback: file.uncategorized,
        })
    }

    /// Loads the map named by the `category_map` variable, if set.
    pub fn from_env() -> anyhow::Result<Self> {
        match get_env_var("category_map") {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => {
                info!("no category map configured, products will be uncategorized");
                Ok(Self::disabled())
            }
        }
    }

    /// Two-step lookup: exact entry, else the uncategorized fallback.
    pub fn lookup(&self, source_id: i64) -> Option<i64> {
        self.entries.get(&source_id).copied().or(self.fallback)
    }
}
