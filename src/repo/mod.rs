pub mod fields;
pub mod items;

pub use fields::CustomFieldRegistry;
pub use items::{InventorySummary, ItemRepository};
