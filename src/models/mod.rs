pub mod custom_field;
pub mod item;

pub use custom_field::*;
pub use item::*;
