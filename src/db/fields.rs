use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CustomField, FieldKind, NewCustomField};
use crate::store::FieldStore;

#[derive(Debug, FromRow)]
struct FieldRow {
    id: Uuid,
    name: String,
    field_kind: String,
    required: bool,
}

impl TryFrom<FieldRow> for CustomField {
    type Error = AppError;

    fn try_from(row: FieldRow) -> Result<Self, Self::Error> {
        let kind = FieldKind::parse(&row.field_kind)
            .ok_or_else(|| AppError::Internal(format!("unknown field kind: {}", row.field_kind)))?;

        Ok(CustomField {
            id: row.id,
            name: row.name,
            kind,
            required: row.required,
        })
    }
}

/// Postgres-backed custom field set, replaced wholesale on every save.
pub struct PgFieldStore {
    pool: PgPool,
}

impl PgFieldStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FieldStore for PgFieldStore {
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<CustomField>> {
        let rows: Vec<FieldRow> = sqlx::query_as(
            "SELECT id, name, field_kind, required FROM custom_fields \
             WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CustomField::try_from).collect()
    }

    async fn replace(
        &self,
        user_id: Uuid,
        fields: Vec<NewCustomField>,
    ) -> AppResult<Vec<CustomField>> {
        // Delete and reinsert inside one transaction: a failed insert rolls
        // the delete back instead of leaving the user with zero fields.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM custom_fields WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut replaced = Vec::with_capacity(fields.len());
        for field in &fields {
            let row: FieldRow = sqlx::query_as(
                "INSERT INTO custom_fields (user_id, name, field_kind, required) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, name, field_kind, required",
            )
            .bind(user_id)
            .bind(&field.name)
            .bind(field.kind.as_str())
            .bind(field.required)
            .fetch_one(&mut *tx)
            .await?;

            replaced.push(CustomField::try_from(row)?);
        }

        tx.commit().await?;
        Ok(replaced)
    }
}
