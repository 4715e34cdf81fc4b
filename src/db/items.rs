use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ItemUpdate, NewItem, ScannedItem, DEFAULT_CATEGORY};
use crate::store::ItemStore;

const ITEM_COLUMNS: &str =
    "id, barcode, name, description, category, custom_fields, scanned_at, updated_at";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    barcode: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    custom_fields: Option<Json<HashMap<String, String>>>,
    scanned_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for ScannedItem {
    fn from(row: ItemRow) -> Self {
        ScannedItem {
            id: row.id,
            barcode: row.barcode,
            name: row.name,
            description: row.description.filter(|d| !d.is_empty()),
            category: row
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            scanned_at: row.scanned_at,
            updated_at: row.updated_at,
            custom_fields: row.custom_fields.map(|j| j.0).unwrap_or_default(),
        }
    }
}

/// Postgres-backed item collection, scoped by user_id on every query.
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<ScannedItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM scanned_items \
             WHERE user_id = $1 ORDER BY scanned_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ScannedItem::from).collect())
    }

    async fn insert(&self, user_id: Uuid, item: NewItem) -> AppResult<ScannedItem> {
        let row: ItemRow = sqlx::query_as(&format!(
            "INSERT INTO scanned_items \
             (user_id, barcode, name, description, category, custom_fields, scanned_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(Json(&item.custom_fields))
        .bind(item.scanned_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn insert_many(&self, user_id: Uuid, items: Vec<NewItem>) -> AppResult<Vec<ScannedItem>> {
        // One transaction so a mid-batch failure inserts nothing.
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(items.len());

        for item in items {
            let row: ItemRow = sqlx::query_as(&format!(
                "INSERT INTO scanned_items \
                 (user_id, barcode, name, description, category, custom_fields, scanned_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(user_id)
            .bind(&item.barcode)
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.category)
            .bind(Json(&item.custom_fields))
            .bind(item.scanned_at)
            .fetch_one(&mut *tx)
            .await?;

            inserted.push(row.into());
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, update: ItemUpdate) -> AppResult<ScannedItem> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "UPDATE scanned_items \
             SET name = $1, description = $2, category = $3, custom_fields = $4, \
                 updated_at = NOW() \
             WHERE id = $5 AND user_id = $6 \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.category)
        .bind(Json(&update.custom_fields))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.into()),
            None => Err(AppError::NotFound("Item not found".to_string())),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let rows_affected =
            sqlx::query("DELETE FROM scanned_items WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        Ok(())
    }
}
