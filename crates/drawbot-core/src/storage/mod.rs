//! Storage abstraction for drawing persistence.
//!
//! A stored drawing is a `{ title, commandsJson }` pair where `commandsJson`
//! is the full serialized snapshot, not a delta. Loaded documents are always
//! normalized again before use, since whatever produced them may not have
//! honored the canonical schema.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::command::DrawingData;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Drawing not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for collaborator calls (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A persisted drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDrawing {
    pub title: String,
    /// JSON serialization of a whole [`DrawingData`].
    #[serde(rename = "commandsJson")]
    pub commands_json: String,
}

impl StoredDrawing {
    /// Serialize a snapshot for storage.
    pub fn new(title: impl Into<String>, drawing: &DrawingData) -> StorageResult<Self> {
        let commands_json = drawing
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            title: title.into(),
            commands_json,
        })
    }

    /// Parse and normalize the stored snapshot.
    pub fn drawing(&self) -> StorageResult<DrawingData> {
        DrawingData::from_json(&self.commands_json)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Trait for drawing storage backends.
pub trait Storage: Send + Sync {
    /// Save a drawing, returning its newly assigned ID.
    fn save(&self, drawing: &StoredDrawing) -> BoxFuture<'_, StorageResult<String>>;

    /// Load a drawing.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<StoredDrawing>>;

    /// Delete a drawing.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all drawing IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a drawing exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
