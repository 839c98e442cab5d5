//! Shop Registry
//!
//! Loads and caches validated shop definitions from JSON or TOML files.
//! Supports hot-reloading: the item catalog and every shop are re-validated
//! and the result swapped in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{error, info, warn};

use super::definition::{RawShopDefinition, ShopDefinition};
use super::error::CatalogError;
use crate::data::ItemRegistry;
use crate::data::item_registry::sorted_entries;

/// Registry for all shop definitions
pub struct ShopRegistry {
    shops: HashMap<String, Arc<ShopDefinition>>,
    /// Files that failed validation on the last load
    rejected: Vec<PathBuf>,
}

impl ShopRegistry {
    /// Create a new empty shop registry
    pub fn new() -> Self {
        Self {
            shops: HashMap::new(),
            rejected: Vec::new(),
        }
    }

    /// Build a registry from a directory, logging whatever could not be loaded
    pub fn from_directory(path: &Path, items: &ItemRegistry) -> Self {
        let mut registry = Self::new();
        if let Err(e) = registry.load_from_directory(path, items) {
            error!("Failed to load shop directory {:?}: {}", path, e);
        }
        registry
    }

    /// Load the item catalog under `data_dir/items`, then the shops under
    /// `data_dir/shops` validated against it. Rejected item files are
    /// reported alongside rejected shop files.
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let mut items = ItemRegistry::new();
        if let Err(e) = items.load_from_directory(data_dir) {
            error!("Failed to load item registry: {}", e);
        }
        let mut registry = Self::from_directory(&data_dir.join("shops"), &items);
        registry.rejected.extend(items.rejected().iter().cloned());
        registry
    }

    /// Load all shop definitions from a directory. A file that fails to
    /// parse or validate is logged and skipped; the rest still load. Files
    /// are read in name order, so a duplicate ID resolves the same way
    /// every run.
    pub fn load_from_directory(
        &mut self,
        path: &Path,
        items: &ItemRegistry,
    ) -> Result<usize, CatalogError> {
        if !path.exists() {
            warn!("Shop directory does not exist: {:?}", path);
            return Ok(0);
        }

        let mut loaded = 0;
        for file_path in sorted_entries(path)? {
            if !is_catalog_file(&file_path) {
                continue;
            }

            match self.load_file(&file_path, items) {
                Ok(shop) => {
                    info!(
                        "Loaded shop: {} ({}) - {} offers",
                        shop.display_name,
                        shop.id,
                        shop.offer_count()
                    );
                    loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping shop file {:?}: {}", file_path, e);
                    self.rejected.push(file_path);
                }
            }
        }

        info!("Loaded {} shop definitions", self.shops.len());
        Ok(loaded)
    }

    /// Load, validate and register a single catalog file
    pub fn load_file(
        &mut self,
        path: &Path,
        items: &ItemRegistry,
    ) -> Result<Arc<ShopDefinition>, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let raw = parse_definition(path, &contents)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let shop = Arc::new(ShopDefinition::from_raw(stem, &raw, items)?);

        if self.shops.contains_key(&shop.id) {
            warn!("Duplicate shop ID '{}' in {:?}, overwriting", shop.id, path);
        }
        self.shops.insert(shop.id.clone(), Arc::clone(&shop));

        Ok(shop)
    }

    /// Register an already validated definition
    pub fn insert(&mut self, shop: ShopDefinition) -> Arc<ShopDefinition> {
        let shop = Arc::new(shop);
        self.shops.insert(shop.id.clone(), Arc::clone(&shop));
        shop
    }

    /// Get a shop definition by ID
    pub fn get(&self, shop_id: &str) -> Option<Arc<ShopDefinition>> {
        self.shops.get(shop_id).cloned()
    }

    /// Get a shop definition, or an empty one if the archetype is missing or
    /// was rejected at load
    pub fn get_or_empty(&self, shop_id: &str) -> Arc<ShopDefinition> {
        self.get(shop_id).unwrap_or_else(|| {
            warn!("Shop '{}' is not loaded, stocking nothing", shop_id);
            Arc::new(ShopDefinition::empty(shop_id))
        })
    }

    /// All shop definitions ordered by ID
    pub fn sorted(&self) -> Vec<Arc<ShopDefinition>> {
        let mut shops: Vec<_> = self.shops.values().cloned().collect();
        shops.sort_by(|a, b| a.id.cmp(&b.id));
        shops
    }

    /// Files (shop or item) rejected on the last load
    pub fn rejected(&self) -> &[PathBuf] {
        &self.rejected
    }

    /// Check if a shop exists in the registry
    pub fn contains(&self, shop_id: &str) -> bool {
        self.shops.contains_key(shop_id)
    }

    /// Get the number of shops in the registry
    pub fn len(&self) -> usize {
        self.shops.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }
}

impl Default for ShopRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_catalog_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("json") | Some("toml")
    )
}

/// Parse a catalog file by extension
pub fn parse_definition(path: &Path, contents: &str) -> Result<RawShopDefinition, CatalogError> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(contents).map_err(|e| CatalogError::parse(path, e)),
        Some("toml") => toml::from_str(contents).map_err(|e| CatalogError::parse(path, e)),
        _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    }
}

// ============================================================================
// Hot Reload
// ============================================================================

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// The registry was rebuilt after a change to this file
    Reloaded { path: String, shops: usize },
    /// An error occurred during reload
    Error(String),
}

/// How long the watcher waits for a burst of file events to settle
const RELOAD_SETTLE: std::time::Duration = std::time::Duration::from_millis(250);

/// Watch `data_dir/shops` (and `data_dir/items` when present) and rebuild
/// `registry` whenever a catalog file changes. Rebuilds run one at a time on
/// the watcher thread, so the last swap always reflects the newest files.
/// Vendors see the new definitions at their next restock.
pub fn start_file_watcher(
    registry: Arc<RwLock<ShopRegistry>>,
    data_dir: PathBuf,
) -> Result<mpsc::Receiver<HotReloadEvent>, CatalogError> {
    use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    let (tx, rx) = mpsc::channel(32);
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = notify_tx.send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )?;

    let shops_dir = data_dir.join("shops");
    watcher.watch(&shops_dir, RecursiveMode::NonRecursive)?;
    let items_dir = data_dir.join("items");
    if items_dir.exists() {
        watcher.watch(&items_dir, RecursiveMode::NonRecursive)?;
    }

    info!("Catalog hot-reload watcher started for {:?}", data_dir);

    let catalog_change = |event: &notify::Event| -> Option<PathBuf> {
        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) {
            return None;
        }
        event.paths.iter().find(|p| is_catalog_file(p)).cloned()
    };

    std::thread::spawn(move || {
        // Keep the watcher alive for as long as events flow
        let _watcher = watcher;

        while let Ok(event) = notify_rx.recv() {
            let Some(mut path) = catalog_change(&event) else {
                continue;
            };

            // Coalesce the burst a single save produces into one rebuild
            let mut disconnected = false;
            loop {
                match notify_rx.recv_timeout(RELOAD_SETTLE) {
                    Ok(event) => {
                        if let Some(changed) = catalog_change(&event) {
                            path = changed;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
            info!("Detected change in {:?}, reloading catalog", path);

            let fresh = ShopRegistry::from_data_dir(&data_dir);
            let shops = fresh.len();
            let rejected = fresh.rejected().len();
            *registry.blocking_write() = fresh;

            let event = if rejected == 0 {
                info!("Hot-reload completed: {} shops", shops);
                HotReloadEvent::Reloaded {
                    path: path.to_string_lossy().to_string(),
                    shops,
                }
            } else {
                warn!("Hot-reload completed with {} rejected files", rejected);
                HotReloadEvent::Error(format!(
                    "{} catalog files rejected, {} shops loaded",
                    rejected, shops
                ))
            };
            if tx.blocking_send(event).is_err() || disconnected {
                break;
            }
        }
    });

    Ok(rx)
}
