//! Editing session: the single timeline of drawing changes.
//!
//! Every way the displayed drawing can change goes through here: interpreted
//! prompts, undo/redo, clear, starting a new drawing and loading a saved one.
//! Collaborator calls happen outside; their results re-enter the session in
//! completion order and are sequenced by [`RequestTicket`].

use crate::command::DrawingData;
use crate::compose::compose;
use crate::config::{CanvasDefaults, DrawbotConfig};
use crate::history::History;
use crate::interpret::{InterpretError, InterpretRequest, InterpretResponse, Interpreter};
use crate::normalize::normalize;
use crate::storage::{Storage, StorageError, StoredDrawing};
use thiserror::Error;

/// Session errors. The displayed drawing is unchanged whenever one is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Tag for one outstanding interpretation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
    epoch: u64,
}

impl RequestTicket {
    /// Monotonic sequence number within the session.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to an interpretation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The batch was appended; `added` commands were composed in.
    Applied { added: usize },
    /// A newer request already landed, or the drawing was switched since the
    /// request was issued. Nothing changed.
    Stale,
    /// The prompt was blank and never sent.
    Ignored,
}

/// An editing session over one drawing timeline.
#[derive(Debug, Clone)]
pub struct Session {
    history: History,
    canvas: CanvasDefaults,
    next_seq: u64,
    last_applied: Option<u64>,
    epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&DrawbotConfig::default())
    }
}

impl Session {
    /// Start a session at the configured empty drawing.
    pub fn new(config: &DrawbotConfig) -> Self {
        let empty = config.canvas.empty_drawing();
        let history = match config.history_capacity {
            Some(capacity) => History::with_capacity(empty, capacity),
            None => History::new(empty),
        };
        Self {
            history,
            canvas: config.canvas.clone(),
            next_seq: 0,
            last_applied: None,
            epoch: 0,
        }
    }

    /// The drawing currently displayed.
    pub fn present(&self) -> &DrawingData {
        self.history.present()
    }

    /// The undo/redo timeline.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Issue a ticket for an interpretation request about to be sent.
    pub fn begin_interpretation(&mut self) -> RequestTicket {
        let ticket = RequestTicket {
            seq: self.next_seq,
            epoch: self.epoch,
        };
        self.next_seq += 1;
        ticket
    }

    fn is_stale(&self, ticket: RequestTicket) -> bool {
        ticket.epoch != self.epoch || self.last_applied.is_some_and(|last| ticket.seq <= last)
    }

    /// Apply a completed interpretation.
    ///
    /// The embedded document is parsed, normalized and appended onto the
    /// present drawing as a new snapshot. A document that is not valid JSON
    /// (or not an object) is an error and leaves the timeline untouched.
    /// Completions that arrive after a newer request already landed, repeats
    /// of one already applied, and those from before a new drawing was
    /// started are dropped.
    pub fn apply_interpretation(
        &mut self,
        ticket: RequestTicket,
        response: &InterpretResponse,
    ) -> Result<Outcome, SessionError> {
        if self.is_stale(ticket) {
            log::warn!("dropping stale interpretation #{}", ticket.seq);
            return Ok(Outcome::Stale);
        }

        let document = response.document()?;
        let batch = normalize(&document);
        let added = batch.len();
        let skipped = batch.len() - batch.paintable().count();
        if skipped > 0 {
            log::debug!("interpretation #{} carries {skipped} unpaintable commands", ticket.seq);
        }

        let next = compose(self.present(), batch);
        self.history.push(next);
        self.last_applied = Some(ticket.seq);
        log::info!("applied interpretation #{} ({added} commands)", ticket.seq);

        Ok(Outcome::Applied { added })
    }

    /// Send `prompt` to `interpreter` and apply the result.
    ///
    /// Blank prompts are ignored. Collaborator failures are returned as
    /// errors with the drawing unchanged.
    pub async fn submit_prompt(
        &mut self,
        interpreter: &dyn Interpreter,
        prompt: &str,
    ) -> Result<Outcome, SessionError> {
        let Some(request) = InterpretRequest::new(prompt) else {
            return Ok(Outcome::Ignored);
        };
        let ticket = self.begin_interpretation();
        let response = interpreter.interpret(&request).await?;
        self.apply_interpretation(ticket, &response)
    }

    /// Step back one snapshot.
    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    /// Step forward one snapshot.
    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    /// Replace the drawing with an empty one, as an undoable edit.
    pub fn clear(&mut self) {
        self.history.push(self.canvas.empty_drawing());
    }

    /// Start a new editing session at an empty drawing.
    ///
    /// Outstanding interpretation requests become stale.
    pub fn new_drawing(&mut self) {
        self.start_epoch(self.canvas.empty_drawing());
    }

    /// Switch to a saved drawing, normalizing it again on the way in.
    ///
    /// Outstanding interpretation requests become stale.
    pub fn load(&mut self, stored: &StoredDrawing) -> Result<(), SessionError> {
        let drawing = stored.drawing()?;
        log::info!("loaded drawing {:?} ({} commands)", stored.title, drawing.len());
        self.start_epoch(drawing);
        Ok(())
    }

    fn start_epoch(&mut self, drawing: DrawingData) {
        self.history.reset(drawing);
        self.epoch += 1;
    }

    /// The persistence payload for the present drawing.
    pub fn save_request(&self, title: &str) -> Result<StoredDrawing, SessionError> {
        Ok(StoredDrawing::new(title, self.present())?)
    }

    /// Save the present drawing, returning its ID.
    pub async fn save_to(&self, storage: &dyn Storage, title: &str) -> Result<String, SessionError> {
        let stored = self.save_request(title)?;
        Ok(storage.save(&stored).await?)
    }

    /// Load a saved drawing by ID and switch to it.
    pub async fn load_from(&mut self, storage: &dyn Storage, id: &str) -> Result<(), SessionError> {
        let stored = storage.load(id).await?;
        self.load(&stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::storage::{BoxFuture, MemoryStorage, block_on};
    use serde_json::json;

    fn response(value: serde_json::Value) -> InterpretResponse {
        InterpretResponse::new(value.to_string())
    }

    fn sun() -> InterpretResponse {
        response(json!({
            "width": 800,
            "commands": [{"type": "circle", "x": 250, "y": 200, "r": 60, "fill": "#FFD54F"}]
        }))
    }

    fn cloud() -> InterpretResponse {
        response(json!({
            "commands": [{"type": "rect", "x": 50, "y": 50, "width": 120, "height": 40, "fill": "#ddd"}]
        }))
    }

    /// Replies with a fixed response, or fails.
    struct FixedInterpreter(Option<InterpretResponse>);

    impl Interpreter for FixedInterpreter {
        fn interpret(
            &self,
            _request: &InterpretRequest,
        ) -> BoxFuture<'_, Result<InterpretResponse, InterpretError>> {
            let result = self
                .0
                .clone()
                .ok_or_else(|| InterpretError::Collaborator("HTTP 503".to_string()));
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::default();
        assert_eq!(session.present(), &DrawingData::empty());
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn test_interpretations_accumulate() {
        let mut session = Session::default();

        let t1 = session.begin_interpretation();
        assert_eq!(session.apply_interpretation(t1, &sun()).unwrap(), Outcome::Applied { added: 1 });
        let t2 = session.begin_interpretation();
        session.apply_interpretation(t2, &cloud()).unwrap();

        let present = session.present();
        assert_eq!(present.width, 500);
        let kinds: Vec<_> = present.commands.iter().map(Command::kind).collect();
        assert_eq!(kinds, vec![Some("circle"), Some("rect")]);

        assert!(session.undo());
        assert_eq!(session.present().len(), 1);
        assert!(session.redo());
        assert_eq!(session.present().len(), 2);
    }

    #[test]
    fn test_structural_error_leaves_state_unchanged() {
        let mut session = Session::default();
        let t1 = session.begin_interpretation();
        session.apply_interpretation(t1, &sun()).unwrap();
        let before = session.history().clone();

        let t2 = session.begin_interpretation();
        let err = session
            .apply_interpretation(t2, &InterpretResponse::new("{\"commands\": ["))
            .unwrap_err();
        assert!(matches!(err, SessionError::Interpret(InterpretError::InvalidDocument(_))));

        let t3 = session.begin_interpretation();
        let err = session
            .apply_interpretation(t3, &InterpretResponse::new("\"just a string\""))
            .unwrap_err();
        assert!(matches!(err, SessionError::Interpret(InterpretError::NotAnObject)));

        assert_eq!(session.history(), &before);
    }

    #[test]
    fn test_out_of_order_completion_is_dropped() {
        let mut session = Session::default();
        let slow = session.begin_interpretation();
        let fast = session.begin_interpretation();

        session.apply_interpretation(fast, &cloud()).unwrap();
        assert_eq!(session.apply_interpretation(slow, &sun()).unwrap(), Outcome::Stale);

        assert_eq!(session.present().len(), 1);
        assert_eq!(session.present().commands[0].kind(), Some("rect"));
    }

    #[test]
    fn test_duplicate_completion_is_dropped() {
        let mut session = Session::default();
        let ticket = session.begin_interpretation();

        session.apply_interpretation(ticket, &sun()).unwrap();
        assert_eq!(session.apply_interpretation(ticket, &sun()).unwrap(), Outcome::Stale);
        assert_eq!(session.present().len(), 1);
        assert_eq!(session.history().past().len(), 1);
    }

    #[test]
    fn test_in_order_completions_both_apply() {
        let mut session = Session::default();
        let first = session.begin_interpretation();
        let second = session.begin_interpretation();

        session.apply_interpretation(first, &sun()).unwrap();
        session.apply_interpretation(second, &cloud()).unwrap();
        assert_eq!(session.present().len(), 2);
    }

    #[test]
    fn test_new_drawing_invalidates_outstanding_requests() {
        let mut session = Session::default();
        let pending = session.begin_interpretation();

        session.new_drawing();
        assert_eq!(session.apply_interpretation(pending, &sun()).unwrap(), Outcome::Stale);
        assert!(session.present().is_empty());

        let fresh = session.begin_interpretation();
        assert!(matches!(
            session.apply_interpretation(fresh, &sun()).unwrap(),
            Outcome::Applied { .. }
        ));
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut session = Session::default();
        let t = session.begin_interpretation();
        session.apply_interpretation(t, &sun()).unwrap();

        session.clear();
        assert!(session.present().is_empty());
        assert!(session.undo());
        assert_eq!(session.present().len(), 1);
    }

    #[test]
    fn test_configured_canvas_and_capacity() {
        let config = DrawbotConfig::from_json(
            r##"{"canvas": {"width": 320, "height": 240, "background": "#000"}, "history_capacity": 1}"##,
        )
        .unwrap();
        let mut session = Session::new(&config);
        assert_eq!(session.present().width, 320);

        for _ in 0..3 {
            let t = session.begin_interpretation();
            session.apply_interpretation(t, &cloud()).unwrap();
        }
        assert_eq!(session.present().background, "#000");
        assert!(session.undo());
        assert!(!session.undo());
    }

    #[test]
    fn test_submit_prompt() {
        let mut session = Session::default();

        let outcome = block_on(session.submit_prompt(&FixedInterpreter(Some(sun())), "draw a sun")).unwrap();
        assert_eq!(outcome, Outcome::Applied { added: 1 });

        let outcome = block_on(session.submit_prompt(&FixedInterpreter(Some(sun())), "   ")).unwrap();
        assert_eq!(outcome, Outcome::Ignored);

        let err = block_on(session.submit_prompt(&FixedInterpreter(None), "a cloud")).unwrap_err();
        assert!(matches!(err, SessionError::Interpret(InterpretError::Collaborator(_))));
        assert_eq!(session.present().len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let storage = MemoryStorage::new();
        let mut session = Session::default();
        let t = session.begin_interpretation();
        session.apply_interpretation(t, &sun()).unwrap();
        let saved = session.present().clone();

        let id = block_on(session.save_to(&storage, "sunny")).unwrap();
        session.new_drawing();
        assert!(session.present().is_empty());

        block_on(session.load_from(&storage, &id)).unwrap();
        assert_eq!(session.present(), &saved);
        assert_eq!(session.history().past().len(), 1);
        assert!(!session.can_redo());
    }

    #[test]
    fn test_load_normalizes_legacy_snapshot() {
        let mut session = Session::default();
        let stored = StoredDrawing {
            title: "legacy".to_string(),
            commands_json: json!({
                "width": 640,
                "commands": [{"type": "line", "x": 1, "y": 2, "x1": 3, "y1": 4}]
            })
            .to_string(),
        };

        session.load(&stored).unwrap();
        assert_eq!(session.present().width, 640);
        assert!(session.present().commands[0].is_paintable());
    }

    #[test]
    fn test_failed_load_keeps_present() {
        let storage = MemoryStorage::new();
        let mut session = Session::default();
        let t = session.begin_interpretation();
        session.apply_interpretation(t, &sun()).unwrap();
        let before = session.history().clone();

        let err = block_on(session.load_from(&storage, "missing")).unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::NotFound(_))));
        assert_eq!(session.history(), &before);
    }
}
