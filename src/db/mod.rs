pub mod fields;
pub mod items;
pub mod pool;

pub use fields::PgFieldStore;
pub use items::PgItemStore;
pub use pool::create_pool;
