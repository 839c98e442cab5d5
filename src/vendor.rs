use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::shop::{
    ChanceGate, ConfigSnapshot, ShopDefinition, ShopRegistry, StockResolver, VendorStock,
};

/// One vendor instance. Owns its stock and its own RNG stream, so vendors
/// never contend for randomness.
pub struct Vendor {
    pub id: String,
    pub shop_id: String,
    pub stock: VendorStock,
    pub restocked_at: DateTime<Utc>,
    pub restock_count: u64,
    rng: StdRng,
}

impl Vendor {
    fn new(shop_id: &str, rng: StdRng) -> Self {
        Self {
            id: format!("vendor_{}", Uuid::new_v4()),
            shop_id: shop_id.to_string(),
            stock: VendorStock::default(),
            restocked_at: Utc::now(),
            restock_count: 0,
            rng,
        }
    }

    /// Discard the current stock and resolve a fresh one
    pub fn restock<G: ChanceGate>(
        &mut self,
        definition: &ShopDefinition,
        resolver: &StockResolver<G>,
        snapshot: &ConfigSnapshot,
    ) {
        self.stock = resolver.resolve(definition, snapshot, &mut self.rng);
        self.restocked_at = Utc::now();
        self.restock_count += 1;
    }
}

/// Summary of a vendor for listings
#[derive(Debug, Clone, Serialize)]
pub struct VendorSummary {
    pub id: String,
    pub shop_id: String,
    pub restocked_at: DateTime<Utc>,
    pub restock_count: u64,
    pub for_sale: usize,
    pub will_buy: usize,
}

impl From<&Vendor> for VendorSummary {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id.clone(),
            shop_id: vendor.shop_id.clone(),
            restocked_at: vendor.restocked_at,
            restock_count: vendor.restock_count,
            for_sale: vendor.stock.for_sale.len(),
            will_buy: vendor.stock.will_buy.len(),
        }
    }
}

/// Seed for the `ordinal`-th vendor of a shop. Depends only on its inputs,
/// never on spawn order or hash-map iteration order.
fn stream_seed(seed: u64, shop_id: &str, ordinal: u64) -> u64 {
    // FNV-1a over the shop id
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in shop_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    seed ^ hash.wrapping_add(ordinal.wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Manages all live vendor instances
pub struct VendorManager {
    vendors: DashMap<String, Vendor>,
    /// Base seed for vendor RNG streams; entropy when absent
    seed: Option<u64>,
    /// Vendors spawned so far, per shop
    spawned: DashMap<String, u64>,
}

impl VendorManager {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            vendors: DashMap::new(),
            seed,
            spawned: DashMap::new(),
        }
    }

    fn next_rng(&self, shop_id: &str) -> StdRng {
        let ordinal = {
            let mut count = self.spawned.entry(shop_id.to_string()).or_insert(0);
            let ordinal = *count;
            *count += 1;
            ordinal
        };
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(stream_seed(seed, shop_id, ordinal)),
            None => StdRng::from_entropy(),
        }
    }

    /// Spawn a vendor for an archetype and stock it. Returns the vendor ID.
    pub fn spawn<G: ChanceGate>(
        &self,
        definition: &ShopDefinition,
        resolver: &StockResolver<G>,
        snapshot: &ConfigSnapshot,
    ) -> String {
        let mut vendor = Vendor::new(&definition.id, self.next_rng(&definition.id));
        vendor.restock(definition, resolver, snapshot);

        let id = vendor.id.clone();
        info!(
            "Spawned vendor {} for shop '{}' ({} for sale, {} bought back)",
            id,
            definition.id,
            vendor.stock.for_sale.len(),
            vendor.stock.will_buy.len()
        );
        self.vendors.insert(id.clone(), vendor);
        id
    }

    /// Restock one vendor from the current registry contents
    pub fn restock<G: ChanceGate>(
        &self,
        vendor_id: &str,
        registry: &ShopRegistry,
        resolver: &StockResolver<G>,
        snapshot: &ConfigSnapshot,
    ) -> Option<VendorStock> {
        let mut vendor = self.vendors.get_mut(vendor_id)?;
        let definition = registry.get_or_empty(&vendor.shop_id);
        vendor.restock(&definition, resolver, snapshot);
        debug!("Restocked vendor {} ({})", vendor_id, vendor.shop_id);
        Some(vendor.stock.clone())
    }

    /// Restock every vendor. Returns how many were restocked.
    pub fn restock_all<G: ChanceGate>(
        &self,
        registry: &ShopRegistry,
        resolver: &StockResolver<G>,
        snapshot: &ConfigSnapshot,
    ) -> usize {
        let mut count = 0;
        for mut entry in self.vendors.iter_mut() {
            let definition = registry.get_or_empty(&entry.shop_id);
            entry.value_mut().restock(&definition, resolver, snapshot);
            count += 1;
        }
        if count > 0 {
            info!("Restocked {} vendor(s)", count);
        }
        count
    }

    /// Snapshot of a vendor's current stock
    pub fn stock(&self, vendor_id: &str) -> Option<VendorStock> {
        self.vendors.get(vendor_id).map(|v| v.stock.clone())
    }

    /// Remove up to `amount` units of an item from a vendor's for-sale list.
    /// Returns the amount taken, or `None` if the vendor does not exist.
    pub fn take(&self, vendor_id: &str, item_id: &str, amount: u32) -> Option<u32> {
        let mut vendor = self.vendors.get_mut(vendor_id)?;
        Some(vendor.stock.take(item_id, amount))
    }

    pub fn summaries(&self) -> Vec<VendorSummary> {
        self.vendors.iter().map(|v| VendorSummary::from(v.value())).collect()
    }

    pub fn remove(&self, vendor_id: &str) -> bool {
        self.vendors.remove(vendor_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

impl Default for VendorManager {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::RawShopDefinition;
    use crate::shop::definition::tests::test_items;

    fn registry() -> ShopRegistry {
        let raw: RawShopDefinition = serde_json::from_str(
            r#"{ "id": "healer",
                 "buy":  [ {"item":"bandage","price":{"fixed":3},"qty":{"range":[10,60]}},
                           {"item":"blank_scroll","price":{"range":[4,6]},"qty":{"fixed":5},"chance":"rare"} ],
                 "sell": [ {"item":"bandage","price":{"fixed":1},"chance":"common"} ] }"#,
        )
        .unwrap();
        let mut registry = ShopRegistry::new();
        registry.insert(ShopDefinition::from_raw("healer", &raw, &test_items()).unwrap());
        registry
    }

    #[test]
    fn test_seeded_vendors_are_reproducible() {
        let registry = registry();
        let healer = registry.get("healer").unwrap();
        let resolver = StockResolver::default();
        let snapshot = ConfigSnapshot::default();

        let a = VendorManager::new(Some(9));
        let b = VendorManager::new(Some(9));
        for _ in 0..5 {
            let va = a.spawn(&healer, &resolver, &snapshot);
            let vb = b.spawn(&healer, &resolver, &snapshot);
            assert_eq!(a.stock(&va), b.stock(&vb));
        }
    }

    #[test]
    fn test_seeded_stock_independent_of_spawn_order() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        for (n, item) in ["bandage", "blank_scroll", "beverage"].iter().enumerate() {
            for shop in 0..4 {
                std::fs::write(
                    temp_dir.path().join(format!("shop_{}_{}.json", item, shop)),
                    format!(
                        r#"{{ "buy": [ {{"item":"{}","price":{{"range":[1,500]}},"qty":{{"range":[1,500]}},"chance":"normal"}},
                                      {{"item":"bandage","price":{{"range":[{},900]}},"qty":"unlimited","chance":"rare"}} ] }}"#,
                        item,
                        n + 1
                    ),
                )
                .unwrap();
            }
        }

        let resolver = StockResolver::default();
        let snapshot = ConfigSnapshot::default();
        let first = ShopRegistry::from_directory(temp_dir.path(), &test_items());
        let second = ShopRegistry::from_directory(temp_dir.path(), &test_items());
        assert_eq!(first.len(), 12);

        let run = |registry: &ShopRegistry, reverse: bool| {
            let manager = VendorManager::new(Some(42));
            let mut shops = registry.sorted();
            if reverse {
                shops.reverse();
            }
            for shop in &shops {
                manager.spawn(shop, &resolver, &snapshot);
                manager.spawn(shop, &resolver, &snapshot);
            }
            let mut by_shop: Vec<(String, VendorStock)> = manager
                .summaries()
                .into_iter()
                .map(|v| (v.shop_id.clone(), manager.stock(&v.id).unwrap()))
                .collect();
            by_shop.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| format!("{:?}", a.1).cmp(&format!("{:?}", b.1)))
            });
            by_shop
        };

        assert_eq!(run(&first, false), run(&second, true));
    }

    #[test]
    fn test_restock_replaces_stock() {
        let registry = registry();
        let healer = registry.get("healer").unwrap();
        let resolver = StockResolver::default();
        let snapshot = ConfigSnapshot::default();
        let manager = VendorManager::new(Some(1));

        let id = manager.spawn(&healer, &resolver, &snapshot);
        let taken = manager.take(&id, "bandage", 1000).unwrap();
        assert!(taken >= 10);
        assert_eq!(manager.stock(&id).unwrap().for_sale_entry("bandage").unwrap().quantity, 0);

        let fresh = manager.restock(&id, &registry, &resolver, &snapshot).unwrap();
        let bandage = fresh.for_sale_entry("bandage").unwrap();
        assert!((10..=60).contains(&bandage.quantity));
        assert_eq!(manager.summaries()[0].restock_count, 2);
    }

    #[test]
    fn test_missing_shop_restocks_empty() {
        let registry = registry();
        let resolver = StockResolver::default();
        let snapshot = ConfigSnapshot::default();
        let manager = VendorManager::new(Some(1));

        let orphan = ShopDefinition::empty("retired_shop");
        let id = manager.spawn(&orphan, &resolver, &snapshot);

        let stock = manager.restock(&id, &registry, &resolver, &snapshot).unwrap();
        assert!(stock.is_empty());
    }

    #[test]
    fn test_restock_all_and_remove() {
        let registry = registry();
        let healer = registry.get("healer").unwrap();
        let resolver = StockResolver::default();
        let snapshot = ConfigSnapshot::default();
        let manager = VendorManager::default();

        let first = manager.spawn(&healer, &resolver, &snapshot);
        manager.spawn(&healer, &resolver, &snapshot);

        assert_eq!(manager.restock_all(&registry, &resolver, &snapshot), 2);
        assert!(manager.remove(&first));
        assert!(manager.stock(&first).is_none());
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.take(&first, "bandage", 1), None);
    }
}
