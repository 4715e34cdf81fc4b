use crate::error::{AppError, AppResult};
use crate::models::{CustomField, NewCustomField};
use crate::session::Session;
use crate::store::FieldStore;

/// A user's custom field definitions with an in-memory mirror kept in
/// creation order. The set is replaced wholesale on every settings save;
/// fields get fresh ids each time, which is why item values key off the
/// field name rather than the id.
pub struct CustomFieldRegistry<S> {
    store: S,
    session: Option<Session>,
    fields: Vec<CustomField>,
}

impl<S: FieldStore> CustomFieldRegistry<S> {
    pub fn new(store: S, session: Option<Session>) -> Self {
        Self {
            store,
            session,
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[CustomField] {
        &self.fields
    }

    pub async fn load(&mut self) -> AppResult<()> {
        let Some(session) = self.session else {
            self.fields.clear();
            return Ok(());
        };

        match self.store.list(session.user_id).await {
            Ok(fields) => {
                self.fields = fields;
                Ok(())
            }
            Err(e) => {
                self.fields.clear();
                tracing::error!("failed to load custom fields: {e}");
                Err(e)
            }
        }
    }

    /// Replace the whole field set. The store does this in one transaction,
    /// so on failure the mirror keeps its pre-replace value and the server
    /// keeps its pre-replace rows. Signed out: silent no-op.
    pub async fn replace(&mut self, new_fields: Vec<NewCustomField>) -> AppResult<()> {
        let Some(session) = self.session else {
            return Ok(());
        };

        if new_fields.iter().any(|f| f.name.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "field name is required".to_string(),
            ));
        }

        let replaced = self.store.replace(session.user_id, new_fields).await?;
        tracing::info!(count = replaced.len(), "custom fields replaced");
        self.fields = replaced;
        Ok(())
    }
}
