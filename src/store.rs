use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{CustomField, ItemUpdate, NewCustomField, NewItem, ScannedItem};

/// Per-user item collection in the backing store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items for the user, most recently scanned first.
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<ScannedItem>>;

    /// Insert one item; the store assigns the id.
    async fn insert(&self, user_id: Uuid, item: NewItem) -> AppResult<ScannedItem>;

    /// Insert a batch atomically, returning the persisted records in input
    /// order. On error nothing is considered inserted.
    async fn insert_many(&self, user_id: Uuid, items: Vec<NewItem>) -> AppResult<Vec<ScannedItem>>;

    /// Replace name/description/category/custom_fields wholesale.
    /// NotFound when the id does not exist for this user.
    async fn update(&self, user_id: Uuid, id: Uuid, update: ItemUpdate) -> AppResult<ScannedItem>;

    /// NotFound when the id does not exist for this user.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()>;
}

/// Per-user custom field definitions in the backing store.
#[async_trait]
pub trait FieldStore: Send + Sync {
    /// The user's field set in creation order.
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<CustomField>>;

    /// Atomically replace the whole field set: delete all existing rows and
    /// insert `fields` with fresh ids, in one transaction. An empty list
    /// clears the set without issuing an insert.
    async fn replace(
        &self,
        user_id: Uuid,
        fields: Vec<NewCustomField>,
    ) -> AppResult<Vec<CustomField>>;
}
