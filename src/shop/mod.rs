//! Vendor Shop System
//!
//! Declarative shop definitions and the engine that resolves them into the
//! concrete stock of a vendor instance.

pub mod chance;
pub mod condition;
pub mod definition;
pub mod error;
pub mod policy;
pub mod registry;
pub mod resolver;

pub use chance::{ChanceGate, ChanceTable, ChanceTier};
pub use condition::{ConfigSnapshot, FeatureCondition, MissingKey};
pub use definition::{BuyOffer, RawShopDefinition, SellOffer, ShopDefinition};
pub use error::{CatalogError, PolicyError};
pub use policy::{PricePolicy, QuantityPolicy};
pub use registry::{HotReloadEvent, ShopRegistry, start_file_watcher};
pub use resolver::{DEFAULT_UNLIMITED_QUANTITY, StockEntry, StockResolver, VendorStock};
