use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::item_def::{ItemDefinition, RawItemDefinition};
use crate::shop::CatalogError;

/// Registry for all tradeable item definitions
pub struct ItemRegistry {
    items: HashMap<String, ItemDefinition>,
    /// Files that failed to parse on the last load
    rejected: Vec<PathBuf>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            rejected: Vec::new(),
        }
    }

    /// Load all item definitions from `<data_dir>/items/*.toml`. A file that
    /// fails to parse is logged and skipped; the rest still load. Files are
    /// read in name order, so a duplicate ID resolves the same way every run.
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<usize, CatalogError> {
        let items_dir = data_dir.join("items");

        if !items_dir.exists() {
            warn!("Items directory does not exist: {:?}", items_dir);
            return Ok(0);
        }

        let mut loaded = 0;
        for path in sorted_entries(&items_dir)? {
            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }

            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| CatalogError::io(&path, e))
                .and_then(|content| {
                    self.load_str(&content)
                        .map_err(|e| CatalogError::parse(&path, e))
                });
            match parsed {
                Ok(count) => loaded += count,
                Err(e) => {
                    warn!("Skipping item file {:?}: {}", path, e);
                    self.rejected.push(path);
                }
            }
        }

        info!("Loaded {} item definitions", self.items.len());

        Ok(loaded)
    }

    /// Parse a TOML table of items and add them to the registry
    pub fn load_str(&mut self, content: &str) -> Result<usize, toml::de::Error> {
        let table: HashMap<String, RawItemDefinition> = toml::from_str(content)?;
        let count = table.len();

        for (id, raw) in table {
            if self.items.contains_key(&id) {
                warn!("Duplicate item ID '{}', overwriting", id);
            }
            let item = ItemDefinition::from_raw(&id, &raw);
            self.items.insert(id, item);
        }

        Ok(count)
    }

    /// Get an item definition by ID
    pub fn get(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    /// Files rejected on the last load
    pub fn rejected(&self) -> &[PathBuf] {
        &self.rejected
    }

    /// Get the number of loaded items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory entries sorted by path
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))? {
        let entry = entry.map_err(|e| CatalogError::io(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
