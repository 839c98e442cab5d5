use serde::{Deserialize, Serialize};

// ============================================================================
// Appearance
// ============================================================================

/// How an item is drawn in a vendor's list: icon id plus color hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Appearance {
    pub icon: u32,
    #[serde(default)]
    pub hue: u32,
}

// ============================================================================
// Raw Item Definition (direct from TOML)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawItemDefinition {
    pub display_name: Option<String>,
    pub icon: Option<u32>,
    #[serde(default)]
    pub hue: u32,
    pub base_price: Option<u32>,
}

// ============================================================================
// Resolved Item Definition
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    pub id: String,
    pub display_name: String,
    pub appearance: Appearance,
    pub base_price: u32,
}

impl ItemDefinition {
    pub fn from_raw(id: &str, raw: &RawItemDefinition) -> Self {
        Self {
            id: id.to_string(),
            display_name: raw
                .display_name
                .clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            appearance: Appearance {
                icon: raw.icon.unwrap_or(0),
                hue: raw.hue,
            },
            base_price: raw.base_price.unwrap_or(1),
        }
    }

    /// Reference to this item with its catalog name and appearance
    pub fn type_ref(&self) -> ItemTypeRef {
        ItemTypeRef {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            name: None,
            appearance: self.appearance,
        }
    }
}

// ============================================================================
// Item Type Reference
// ============================================================================

/// Resolved reference to a tradeable item kind, as carried by offers and
/// stock entries. Only ever built against a loaded `ItemRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemTypeRef {
    pub id: String,
    /// Name shown to players: the override if any, otherwise the catalog name
    pub display_name: String,
    /// Display-name override for this particular offer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub appearance: Appearance,
}

impl ItemTypeRef {
    /// Rename this reference for one offer
    pub fn renamed(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self.name = Some(name.to_string());
        self
    }
}
