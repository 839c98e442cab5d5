//! Shop Definition Structures
//!
//! Declarative offer lists for one vendor archetype: what the vendor sells and
//! what it buys back. The `Raw*` structures are the persisted catalog schema
//! (JSON or TOML); `ShopDefinition` is the validated form, resolved against
//! the item registry once at load and never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::chance::ChanceTier;
use super::condition::FeatureCondition;
use super::error::CatalogError;
use super::policy::{PricePolicy, QuantityPolicy, RawPricePolicy, RawQuantityPolicy};
use crate::data::{Appearance, ItemDefinition, ItemRegistry, ItemTypeRef};

// ============================================================================
// Raw (persisted) structures
// ============================================================================

/// "Vendor sells this"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBuyOffer {
    pub item: String,
    pub price: RawPricePolicy,
    #[serde(default)]
    pub qty: RawQuantityPolicy,
    #[serde(default)]
    pub chance: ChanceTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<FeatureCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// "Vendor buys this"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSellOffer {
    pub item: String,
    pub price: RawPricePolicy,
    #[serde(default)]
    pub chance: ChanceTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<FeatureCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawShopDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub buy: Vec<RawBuyOffer>,
    #[serde(default)]
    pub sell: Vec<RawSellOffer>,
}

// ============================================================================
// Resolved structures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BuyOffer {
    pub item: ItemTypeRef,
    pub price: PricePolicy,
    pub quantity: QuantityPolicy,
    pub chance: ChanceTier,
    pub condition: Option<FeatureCondition>,
    /// Construction arguments handed through to the stocked entry
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SellOffer {
    pub item: ItemTypeRef,
    pub price: PricePolicy,
    pub chance: ChanceTier,
    pub condition: Option<FeatureCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopDefinition {
    pub id: String,
    pub display_name: String,
    pub buy_offers: Vec<BuyOffer>,
    pub sell_offers: Vec<SellOffer>,
}

/// Look up an offer's item and apply its per-offer overrides
fn resolve_item<'a>(
    shop: &str,
    item_id: &str,
    name: &Option<String>,
    icon: Option<u32>,
    hue: Option<u32>,
    items: &'a ItemRegistry,
) -> Result<(ItemTypeRef, &'a ItemDefinition), CatalogError> {
    let item = items.get(item_id).ok_or_else(|| CatalogError::UnknownItem {
        shop: shop.to_string(),
        item: item_id.to_string(),
    })?;

    let mut type_ref = match name {
        Some(name) => item.type_ref().renamed(name),
        None => item.type_ref(),
    };
    type_ref.appearance = Appearance {
        icon: icon.unwrap_or(item.appearance.icon),
        hue: hue.unwrap_or(item.appearance.hue),
    };

    Ok((type_ref, item))
}

impl ShopDefinition {
    /// An archetype with nothing to trade
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.replace('_', " "),
            buy_offers: Vec::new(),
            sell_offers: Vec::new(),
        }
    }

    /// Validate a persisted definition against the item registry.
    /// `fallback_id` names the archetype when the file carries no `id`.
    pub fn from_raw(
        fallback_id: &str,
        raw: &RawShopDefinition,
        items: &ItemRegistry,
    ) -> Result<Self, CatalogError> {
        let id = raw.id.clone().unwrap_or_else(|| fallback_id.to_string());
        let invalid = |item: &str, reason| CatalogError::InvalidOffer {
            shop: id.clone(),
            item: item.to_string(),
            reason,
        };

        let mut buy_offers = Vec::with_capacity(raw.buy.len());
        for offer in &raw.buy {
            let (item, def) =
                resolve_item(&id, &offer.item, &offer.name, offer.icon, offer.hue, items)?;
            buy_offers.push(BuyOffer {
                item,
                price: PricePolicy::from_raw(&offer.price, def.base_price)
                    .map_err(|e| invalid(&offer.item, e))?,
                quantity: QuantityPolicy::from_raw(&offer.qty)
                    .map_err(|e| invalid(&offer.item, e))?,
                chance: offer.chance,
                condition: offer.when.clone(),
                args: offer.args.clone(),
            });
        }

        let mut sell_offers = Vec::with_capacity(raw.sell.len());
        for offer in &raw.sell {
            let (item, def) =
                resolve_item(&id, &offer.item, &offer.name, offer.icon, offer.hue, items)?;
            sell_offers.push(SellOffer {
                item,
                price: PricePolicy::from_raw(&offer.price, def.base_price)
                    .map_err(|e| invalid(&offer.item, e))?,
                chance: offer.chance,
                condition: offer.when.clone(),
            });
        }

        Ok(Self {
            display_name: raw
                .display_name
                .clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            id,
            buy_offers,
            sell_offers,
        })
    }

    /// Back to the persisted schema. Appearance is written out explicitly so
    /// that parsing the result yields an equal definition.
    pub fn to_raw(&self) -> RawShopDefinition {
        RawShopDefinition {
            id: Some(self.id.clone()),
            display_name: Some(self.display_name.clone()),
            buy: self
                .buy_offers
                .iter()
                .map(|o| RawBuyOffer {
                    item: o.item.id.clone(),
                    price: o.price.to_raw(),
                    qty: o.quantity.to_raw(),
                    chance: o.chance,
                    when: o.condition.clone(),
                    name: o.item.name.clone(),
                    icon: Some(o.item.appearance.icon),
                    hue: Some(o.item.appearance.hue),
                    args: o.args.clone(),
                })
                .collect(),
            sell: self
                .sell_offers
                .iter()
                .map(|o| RawSellOffer {
                    item: o.item.id.clone(),
                    price: o.price.to_raw(),
                    chance: o.chance,
                    when: o.condition.clone(),
                    name: o.item.name.clone(),
                    icon: Some(o.item.appearance.icon),
                    hue: Some(o.item.appearance.hue),
                })
                .collect(),
        }
    }

    /// Total number of offers on both sides
    pub fn offer_count(&self) -> usize {
        self.buy_offers.len() + self.sell_offers.len()
    }
}
