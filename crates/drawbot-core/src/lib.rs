//! Drawbot Core Library
//!
//! Platform-agnostic drawing data model for drawbot: the canonical command
//! schema, the normalizer that turns model output into it, the undo/redo
//! history over drawing snapshots and the editing session tying them together.

pub mod command;
pub mod compose;
pub mod config;
pub mod history;
pub mod interpret;
pub mod normalize;
pub mod session;
pub mod storage;

pub use command::{Circle, Command, DrawingData, Line, Rect, Text, Triangle};
pub use compose::compose;
pub use config::{CanvasDefaults, ConfigError, DEFAULT_FONT, DEFAULT_MAX_PIXELS, DrawbotConfig};
pub use history::History;
pub use interpret::{InterpretError, InterpretRequest, InterpretResponse, Interpreter};
pub use normalize::{normalize, normalize_command};
pub use session::{Outcome, RequestTicket, Session, SessionError};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult, StoredDrawing};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
