//! Wire contract of the interpretation collaborator.
//!
//! The collaborator turns a free-text prompt into a drawing document. Its
//! response wraps that document as a JSON-encoded string, which must itself
//! parse as JSON. The HTTP call and the prompt sent to the model live outside
//! this crate; [`Interpreter`] is the seam they plug into.

use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Interpretation errors.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The collaborator itself failed (transport, HTTP status, timeout).
    #[error("Interpretation failed: {0}")]
    Collaborator(String),
    /// The embedded `commandsJson` string is not valid JSON.
    #[error("commandsJson is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    /// The embedded document parsed but is not a JSON object.
    #[error("commandsJson is not a drawing object")]
    NotAnObject,
}

/// Request sent to the interpretation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub prompt: String,
}

impl InterpretRequest {
    /// Build a request from user input, trimming surrounding whitespace.
    ///
    /// Returns `None` for a blank prompt, which is never sent.
    pub fn new(prompt: &str) -> Option<Self> {
        let prompt = prompt.trim();
        (!prompt.is_empty()).then(|| Self {
            prompt: prompt.to_string(),
        })
    }
}

/// Response from the interpretation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretResponse {
    #[serde(rename = "commandsJson")]
    pub commands_json: String,
}

impl InterpretResponse {
    pub fn new(commands_json: impl Into<String>) -> Self {
        Self {
            commands_json: commands_json.into(),
        }
    }

    /// Decode the embedded drawing document.
    ///
    /// The result is still un-normalized model output.
    pub fn document(&self) -> Result<Value, InterpretError> {
        let value: Value = serde_json::from_str(&self.commands_json)?;
        if value.is_object() {
            Ok(value)
        } else {
            Err(InterpretError::NotAnObject)
        }
    }
}

/// Trait for interpretation backends.
///
/// A call is one-shot: no retries, no cancellation. Its completion re-enters
/// the editing session through [`crate::Session::apply_interpretation`].
pub trait Interpreter {
    /// Interpret a prompt into a drawing document.
    fn interpret(&self, request: &InterpretRequest)
    -> BoxFuture<'_, Result<InterpretResponse, InterpretError>>;
}
