//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, StoredDrawing};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    drawings: RwLock<HashMap<String, StoredDrawing>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, drawing: &StoredDrawing) -> BoxFuture<'_, StorageResult<String>> {
        let drawing = drawing.clone();
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            let mut drawings = self.drawings.write().map_err(lock_error)?;
            drawings.insert(id.clone(), drawing);
            Ok(id)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<StoredDrawing>> {
        let id = id.to_string();
        Box::pin(async move {
            let drawings = self.drawings.read().map_err(lock_error)?;
            drawings
                .get(&id)
                .cloned()
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut drawings = self.drawings.write().map_err(lock_error)?;
            drawings.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let drawings = self.drawings.read().map_err(lock_error)?;
            Ok(drawings.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let drawings = self.drawings.read().map_err(lock_error)?;
            Ok(drawings.contains_key(&id))
        })
    }
}
