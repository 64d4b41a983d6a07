//! Scripted session replay.
//!
//! A script is a JSON array of actions:
//!
//! ```json
//! [
//!   {"action": "interpret", "commandsJson": "{\"commands\": [...]}"},
//!   {"action": "undo"},
//!   {"action": "redo"},
//!   {"action": "clear"},
//!   {"action": "new"}
//! ]
//! ```
//!
//! `commandsJson` may also be given as an inline object.

use drawbot_core::{InterpretResponse, Outcome, Session};
use serde::Deserialize;
use serde_json::Value;

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ReplayAction {
    /// Apply an interpreter response.
    Interpret {
        #[serde(rename = "commandsJson")]
        commands_json: Value,
    },
    Undo,
    Redo,
    Clear,
    New,
}

impl ReplayAction {
    fn response(commands_json: &Value) -> InterpretResponse {
        match commands_json {
            Value::String(s) => InterpretResponse::new(s.as_str()),
            other => InterpretResponse::new(other.to_string()),
        }
    }
}

/// What happened during a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Interpretations appended to the drawing.
    pub applied: usize,
    /// Interpretations rejected as malformed.
    pub rejected: usize,
    /// Undo/redo steps that had nothing to move to.
    pub noops: usize,
}

/// Parse a replay script.
pub fn parse_script(json: &str) -> Result<Vec<ReplayAction>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Run `actions` against `session` in order.
///
/// A malformed interpretation is reported and skipped; the drawing stays as
/// it was and later actions still run.
pub fn replay(session: &mut Session, actions: &[ReplayAction]) -> ReplayReport {
    let mut report = ReplayReport::default();

    for (step, action) in actions.iter().enumerate() {
        match action {
            ReplayAction::Interpret { commands_json } => {
                let ticket = session.begin_interpretation();
                match session.apply_interpretation(ticket, &ReplayAction::response(commands_json)) {
                    Ok(Outcome::Applied { .. }) => report.applied += 1,
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("step {step}: {e}");
                        report.rejected += 1;
                    }
                }
            }
            ReplayAction::Undo => {
                if !session.undo() {
                    report.noops += 1;
                }
            }
            ReplayAction::Redo => {
                if !session.redo() {
                    report.noops += 1;
                }
            }
            ReplayAction::Clear => session.clear(),
            ReplayAction::New => session.new_drawing(),
        }
    }

    report
}
