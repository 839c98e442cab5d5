//! Stock Resolution
//!
//! Turns a static `ShopDefinition` into the concrete `VendorStock` of one
//! vendor instance. Each resolution is an independent draw; nothing carries
//! over from a previous stock.

use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use super::chance::{ChanceGate, ChanceTable, ChanceTier};
use super::condition::{ConfigSnapshot, FeatureCondition};
use super::definition::ShopDefinition;
use crate::data::ItemTypeRef;

/// Stock count `QuantityPolicy::Unlimited` replenishes to unless configured otherwise
pub const DEFAULT_UNLIMITED_QUANTITY: u32 = 999;

/// One concrete line in a vendor's stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub item: ItemTypeRef,
    pub unit_price: u32,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Resolved stock of one vendor instance, replaced wholesale on every restock
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VendorStock {
    pub for_sale: Vec<StockEntry>,
    pub will_buy: Vec<StockEntry>,
}

impl VendorStock {
    pub fn is_empty(&self) -> bool {
        self.for_sale.is_empty() && self.will_buy.is_empty()
    }

    /// First for-sale entry for an item
    pub fn for_sale_entry(&self, item_id: &str) -> Option<&StockEntry> {
        self.for_sale.iter().find(|e| e.item.id == item_id)
    }

    /// Price the vendor pays for an item, if it buys it at all
    pub fn buy_back_price(&self, item_id: &str) -> Option<u32> {
        self.will_buy
            .iter()
            .find(|e| e.item.id == item_id)
            .map(|e| e.unit_price)
    }

    /// Remove up to `amount` units of a for-sale item and return how many were
    /// taken. Sold-out entries stay listed with quantity zero.
    pub fn take(&mut self, item_id: &str, amount: u32) -> u32 {
        let mut remaining = amount;
        for entry in self.for_sale.iter_mut().filter(|e| e.item.id == item_id) {
            let taken = remaining.min(entry.quantity);
            entry.quantity -= taken;
            remaining -= taken;
            if remaining == 0 {
                break;
            }
        }
        amount - remaining
    }
}

/// Walks a definition's offers and emits the stock for one vendor instance
#[derive(Debug, Clone)]
pub struct StockResolver<G: ChanceGate = ChanceTable> {
    gate: G,
    unlimited_quantity: u32,
}

impl Default for StockResolver<ChanceTable> {
    fn default() -> Self {
        Self::new(ChanceTable::default(), DEFAULT_UNLIMITED_QUANTITY)
    }
}

impl<G: ChanceGate> StockResolver<G> {
    pub fn new(gate: G, unlimited_quantity: u32) -> Self {
        Self {
            gate,
            unlimited_quantity,
        }
    }

    pub fn unlimited_quantity(&self) -> u32 {
        self.unlimited_quantity
    }

    /// Resolve a definition with the caller's RNG stream. Offers are visited
    /// in declaration order, sell list before buy-back list.
    pub fn resolve<R: RngCore>(
        &self,
        definition: &ShopDefinition,
        snapshot: &ConfigSnapshot,
        rng: &mut R,
    ) -> VendorStock {
        let rng: &mut dyn RngCore = rng;
        let mut stock = VendorStock::default();

        for offer in &definition.buy_offers {
            if !self.admits(offer.condition.as_ref(), offer.chance, snapshot, rng) {
                continue;
            }
            let quantity = offer.quantity.resolve(rng, self.unlimited_quantity);
            let unit_price = offer.price.resolve(rng);
            stock.for_sale.push(StockEntry {
                item: offer.item.clone(),
                unit_price,
                quantity,
                args: offer.args.clone(),
            });
        }

        for offer in &definition.sell_offers {
            if !self.admits(offer.condition.as_ref(), offer.chance, snapshot, rng) {
                continue;
            }
            let unit_price = offer.price.resolve(rng);
            stock.will_buy.push(StockEntry {
                item: offer.item.clone(),
                unit_price,
                quantity: self.unlimited_quantity,
                args: Vec::new(),
            });
        }

        debug!(
            "Resolved shop '{}': {} for sale, {} bought back",
            definition.id,
            stock.for_sale.len(),
            stock.will_buy.len()
        );

        stock
    }

    /// Resolve with the thread-local RNG
    pub fn restock(&self, definition: &ShopDefinition, snapshot: &ConfigSnapshot) -> VendorStock {
        self.resolve(definition, snapshot, &mut rand::thread_rng())
    }

    /// Feature condition first so a disabled offer never touches the RNG
    fn admits(
        &self,
        condition: Option<&FeatureCondition>,
        tier: ChanceTier,
        snapshot: &ConfigSnapshot,
        rng: &mut dyn RngCore,
    ) -> bool {
        if let Some(condition) = condition {
            if !condition.enabled(snapshot) {
                return false;
            }
        }
        self.gate.included(tier, rng)
    }
}
