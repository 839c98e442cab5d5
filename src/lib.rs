//! Vendor stock generation: declarative shop archetypes resolved into the
//! randomized, config-gated inventories of live vendors.

pub mod api;
pub mod config;
pub mod data;
pub mod shop;
pub mod vendor;

pub use config::{ConfigError, ServerConfig};
pub use vendor::{VendorManager, VendorSummary};
