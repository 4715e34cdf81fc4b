pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod session;
pub mod sheet;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::Session;
