use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ItemUpdate, NewItem, ScannedItem, DEFAULT_CATEGORY};
use crate::session::Session;
use crate::store::ItemStore;

/// Headline counts for the report surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySummary {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// A user's item collection with an in-memory mirror of the store,
/// most recently scanned first.
///
/// The mirror is only touched on the success path of the operation that
/// initiated a change, and each change is a self-contained transform
/// (prepend, replace-by-id, remove-by-id), so completions of independent
/// operations on distinct ids can land in either order.
pub struct ItemRepository<S> {
    store: S,
    session: Option<Session>,
    items: Vec<ScannedItem>,
}

impl<S: ItemStore> ItemRepository<S> {
    pub fn new(store: S, session: Option<Session>) -> Self {
        Self {
            store,
            session,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[ScannedItem] {
        &self.items
    }

    pub fn summary(&self) -> InventorySummary {
        let mut by_category = BTreeMap::new();
        for item in &self.items {
            *by_category.entry(item.category.clone()).or_insert(0) += 1;
        }
        InventorySummary {
            total: self.items.len(),
            by_category,
        }
    }

    /// Fetch all items and replace the mirror. A store failure leaves the
    /// mirror empty; the caller may simply call load again.
    pub async fn load(&mut self) -> AppResult<()> {
        let Some(session) = self.session else {
            self.items.clear();
            return Ok(());
        };

        match self.store.list(session.user_id).await {
            Ok(items) => {
                self.items = items;
                Ok(())
            }
            Err(e) => {
                self.items.clear();
                tracing::error!("failed to load items: {e}");
                Err(e)
            }
        }
    }

    /// Persist one item and prepend the stored record to the mirror.
    /// Signed out: silent no-op.
    pub async fn save(&mut self, mut item: NewItem) -> AppResult<()> {
        let Some(session) = self.session else {
            return Ok(());
        };

        if item.barcode.trim().is_empty() {
            return Err(AppError::InvalidInput("barcode is required".to_string()));
        }
        if item.name.trim().is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        if item.category.trim().is_empty() {
            item.category = DEFAULT_CATEGORY.to_string();
        }

        let saved = self.store.insert(session.user_id, item).await?;
        tracing::info!(id = %saved.id, barcode = %saved.barcode, "item saved");
        self.items.insert(0, saved);
        Ok(())
    }

    /// Send `update` as a full replacement of the item's editable fields
    /// and swap the stored result into the mirror in place, preserving
    /// position. A failure leaves the mirror untouched.
    pub async fn update(&mut self, id: Uuid, update: ItemUpdate) -> AppResult<()> {
        let Some(session) = self.session else {
            return Ok(());
        };

        let updated = self.store.update(session.user_id, id, update).await?;
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == id) {
            *slot = updated;
        }
        Ok(())
    }

    /// Remove from the store, then from the mirror. The mirror is only
    /// touched after the store confirms, so a failed delete changes nothing.
    pub async fn delete(&mut self, id: Uuid) -> AppResult<()> {
        let Some(session) = self.session else {
            return Ok(());
        };

        self.store.delete(session.user_id, id).await?;
        self.items.retain(|i| i.id != id);
        tracing::info!(%id, "item deleted");
        Ok(())
    }

    /// Bulk-insert a batch and prepend the stored records to the mirror in
    /// store-returned (= input) order. Empty input issues no store call.
    /// On failure nothing is prepended, even if the store partially
    /// committed on its side.
    pub async fn import_items(&mut self, items: Vec<NewItem>) -> AppResult<usize> {
        let Some(session) = self.session else {
            return Ok(0);
        };
        if items.is_empty() {
            return Ok(0);
        }

        let items: Vec<NewItem> = items
            .into_iter()
            .map(|mut item| {
                if item.category.trim().is_empty() {
                    item.category = DEFAULT_CATEGORY.to_string();
                }
                item
            })
            .collect();

        let inserted = self.store.insert_many(session.user_id, items).await?;
        let count = inserted.len();
        self.items.splice(0..0, inserted);
        tracing::info!(count, "items imported");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::*;

    /// In-memory stand-in for the Postgres store: assigns ids, orders by
    /// scan time descending, counts calls, and can be told to fail.
    #[derive(Default)]
    struct MemoryItemStore {
        rows: Mutex<Vec<ScannedItem>>,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl MemoryItemStore {
        fn check(&self) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Internal("store offline".to_string()));
            }
            Ok(())
        }

        fn persist(&self, user_id: Uuid, item: NewItem) -> ScannedItem {
            let _ = user_id;
            let stored = ScannedItem {
                id: Uuid::new_v4(),
                barcode: item.barcode,
                name: item.name,
                description: item.description,
                category: item.category,
                scanned_at: item.scanned_at,
                updated_at: None,
                custom_fields: item.custom_fields,
            };
            self.rows.lock().unwrap().push(stored.clone());
            stored
        }
    }

    #[async_trait]
    impl ItemStore for MemoryItemStore {
        async fn list(&self, _user_id: Uuid) -> AppResult<Vec<ScannedItem>> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
            Ok(rows)
        }

        async fn insert(&self, user_id: Uuid, item: NewItem) -> AppResult<ScannedItem> {
            self.check()?;
            Ok(self.persist(user_id, item))
        }

        async fn insert_many(
            &self,
            user_id: Uuid,
            items: Vec<NewItem>,
        ) -> AppResult<Vec<ScannedItem>> {
            self.check()?;
            Ok(items
                .into_iter()
                .map(|item| self.persist(user_id, item))
                .collect())
        }

        async fn update(
            &self,
            _user_id: Uuid,
            id: Uuid,
            update: ItemUpdate,
        ) -> AppResult<ScannedItem> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
            row.name = update.name;
            row.description = update.description;
            row.category = update.category;
            row.custom_fields = update.custom_fields;
            row.updated_at = Some(Utc::now());
            Ok(row.clone())
        }

        async fn delete(&self, _user_id: Uuid, id: Uuid) -> AppResult<()> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            if rows.len() == before {
                return Err(AppError::NotFound("Item not found".to_string()));
            }
            Ok(())
        }
    }

    fn new_item(barcode: &str, name: &str, minutes_ago: i64) -> NewItem {
        NewItem {
            barcode: barcode.to_string(),
            name: name.to_string(),
            description: None,
            category: String::new(),
            scanned_at: Utc::now() - Duration::minutes(minutes_ago),
            custom_fields: HashMap::new(),
        }
    }

    fn repo_with_session() -> ItemRepository<MemoryItemStore> {
        ItemRepository::new(
            MemoryItemStore::default(),
            Some(Session::new(Uuid::new_v4())),
        )
    }

    #[tokio::test]
    async fn save_prepends_and_defaults_category() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 10)).await.unwrap();
        repo.save(new_item("222", "Gadget", 5)).await.unwrap();

        let barcodes: Vec<&str> = repo.items().iter().map(|i| i.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["222", "111"]);
        assert_eq!(repo.items()[0].category, DEFAULT_CATEGORY);
        assert!(!repo.items()[0].id.is_nil());
    }

    #[tokio::test]
    async fn save_rejects_empty_barcode_before_store_call() {
        let mut repo = repo_with_session();
        let err = repo.save(new_item("", "Widget", 0)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(repo.store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn operations_without_session_are_silent_noops() {
        let mut repo = ItemRepository::new(MemoryItemStore::default(), None);

        repo.save(new_item("111", "Widget", 0)).await.unwrap();
        repo.update(Uuid::new_v4(), ItemUpdate::default())
            .await
            .unwrap();
        repo.delete(Uuid::new_v4()).await.unwrap();
        let imported = repo
            .import_items(vec![new_item("222", "Gadget", 0)])
            .await
            .unwrap();
        repo.load().await.unwrap();

        assert_eq!(imported, 0);
        assert!(repo.items().is_empty());
        assert_eq!(repo.store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn import_empty_batch_issues_no_store_call() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 0)).await.unwrap();
        let calls_before = repo.store.calls.load(Ordering::SeqCst);

        let imported = repo.import_items(Vec::new()).await.unwrap();

        assert_eq!(imported, 0);
        assert_eq!(repo.items().len(), 1);
        assert_eq!(repo.store.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn import_prepends_batch_in_input_order() {
        let mut repo = repo_with_session();
        repo.save(new_item("000", "Existing", 60)).await.unwrap();

        let imported = repo
            .import_items(vec![new_item("111", "A", 2), new_item("222", "B", 1)])
            .await
            .unwrap();

        assert_eq!(imported, 2);
        let barcodes: Vec<&str> = repo.items().iter().map(|i| i.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["111", "222", "000"]);
    }

    #[tokio::test]
    async fn failed_import_leaves_mirror_unchanged() {
        let mut repo = repo_with_session();
        repo.save(new_item("000", "Existing", 60)).await.unwrap();
        repo.store.fail.store(true, Ordering::SeqCst);

        let err = repo
            .import_items(vec![new_item("111", "A", 0)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(repo.items().len(), 1);
        assert_eq!(repo.items()[0].barcode, "000");
    }

    #[tokio::test]
    async fn update_replaces_matching_entry_in_place() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 30)).await.unwrap();
        repo.save(new_item("222", "Gadget", 20)).await.unwrap();
        repo.save(new_item("333", "Gizmo", 10)).await.unwrap();

        let target = repo.items()[1].clone();
        repo.update(
            target.id,
            ItemUpdate {
                name: "New Name".to_string(),
                description: target.description.clone(),
                category: target.category.clone(),
                custom_fields: target.custom_fields.clone(),
            },
        )
        .await
        .unwrap();

        let names: Vec<&str> = repo.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gizmo", "New Name", "Widget"]);
        assert_eq!(repo.items()[1].id, target.id);
        assert!(repo.items()[1].updated_at.is_some());

        // A reload from the store agrees with the mirror.
        let mirror = repo.items().to_vec();
        repo.load().await.unwrap();
        assert_eq!(repo.items(), mirror.as_slice());
    }

    #[tokio::test]
    async fn update_missing_id_leaves_mirror_unchanged() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 0)).await.unwrap();
        let before = repo.items().to_vec();

        let err = repo
            .update(
                Uuid::new_v4(),
                ItemUpdate {
                    name: "Renamed".to_string(),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.items(), before.as_slice());
    }

    #[tokio::test]
    async fn failed_update_leaves_mirror_unchanged() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 0)).await.unwrap();
        let before = repo.items().to_vec();
        repo.store.fail.store(true, Ordering::SeqCst);

        let err = repo
            .update(
                before[0].id,
                ItemUpdate {
                    name: "Renamed".to_string(),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(repo.items(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_missing_id_surfaces_not_found() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 0)).await.unwrap();

        let err = repo.delete(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.items().len(), 1);
    }

    #[tokio::test]
    async fn successful_sequence_matches_store_replay() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 40)).await.unwrap();
        repo.save(new_item("222", "Gadget", 30)).await.unwrap();
        repo.save(new_item("333", "Gizmo", 20)).await.unwrap();

        let victim = repo.items()[2].id;
        repo.delete(victim).await.unwrap();

        let target = repo.items()[0].clone();
        repo.update(
            target.id,
            ItemUpdate {
                name: "Renamed".to_string(),
                description: None,
                category: target.category.clone(),
                custom_fields: HashMap::new(),
            },
        )
        .await
        .unwrap();

        let mirror = repo.items().to_vec();
        repo.load().await.unwrap();
        assert_eq!(repo.items(), mirror.as_slice());
        assert_eq!(repo.items().len(), 2);
    }

    #[tokio::test]
    async fn failed_load_empties_mirror() {
        let mut repo = repo_with_session();
        repo.save(new_item("111", "Widget", 0)).await.unwrap();
        repo.store.fail.store(true, Ordering::SeqCst);

        assert!(repo.load().await.is_err());
        assert!(repo.items().is_empty());
    }

    #[tokio::test]
    async fn summary_counts_by_category() {
        let mut repo = repo_with_session();
        let mut tools = new_item("111", "Widget", 10);
        tools.category = "Tools & Equipment".to_string();
        repo.save(tools).await.unwrap();
        repo.save(new_item("222", "Gadget", 5)).await.unwrap();
        repo.save(new_item("333", "Gizmo", 1)).await.unwrap();

        let summary = repo.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_category.get("Tools & Equipment"), Some(&1));
        assert_eq!(summary.by_category.get(DEFAULT_CATEGORY), Some(&2));
    }
}
