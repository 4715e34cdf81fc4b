use std::env;

use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub export_dir: String,
    pub user_id: Option<Uuid>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            export_dir: env::var("EXPORT_DIR").unwrap_or_else(|_| ".".to_string()),
            user_id: env::var("INVENTORY_USER_ID")
                .ok()
                .and_then(|v| v.parse().ok()),
        })
    }
}
