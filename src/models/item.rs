use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::CustomField;

/// Category applied when an item is saved or imported without one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A persisted inventory item. `custom_fields` is keyed by the custom
/// field's display name and may carry stale keys for fields that were
/// removed after the value was written; those entries are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedItem {
    pub id: Uuid,
    pub barcode: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub scanned_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub custom_fields: HashMap<String, String>,
}

/// An item that has not been persisted yet: no id, no updated_at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub barcode: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub scanned_at: DateTime<Utc>,
    pub custom_fields: HashMap<String, String>,
}

impl NewItem {
    /// Form-level validation: non-empty barcode and name, and a value for
    /// every required custom field. The repository only re-checks barcode
    /// and name before hitting the store.
    pub fn validate(&self, fields: &[CustomField]) -> AppResult<()> {
        if self.barcode.trim().is_empty() {
            return Err(AppError::InvalidInput("barcode is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }

        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| {
                f.required
                    && self
                        .custom_fields
                        .get(&f.name)
                        .map_or(true, |v| v.trim().is_empty())
            })
            .map(|f| f.name.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

/// Full replacement payload for an item update. All four fields are sent
/// as-is; an omitted value clears the corresponding column, so callers
/// must supply the complete known field set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub custom_fields: HashMap<String, String>,
}
