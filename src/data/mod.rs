pub mod item_def;
pub mod item_registry;

pub use item_def::{Appearance, ItemDefinition, ItemTypeRef, RawItemDefinition};
pub use item_registry::ItemRegistry;
