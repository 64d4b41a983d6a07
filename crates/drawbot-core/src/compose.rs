//! Merging a freshly interpreted batch into the displayed drawing.

use crate::command::DrawingData;

/// Append `batch`'s commands to `current`, producing the next snapshot.
///
/// Canvas size and background always come from `current`; whatever the batch
/// declares for them is discarded. Commands are appended in order, never
/// replaced or reordered, so successive prompts build on each other.
pub fn compose(current: &DrawingData, batch: DrawingData) -> DrawingData {
    let mut commands = Vec::with_capacity(current.commands.len() + batch.commands.len());
    commands.extend(current.commands.iter().cloned());
    commands.extend(batch.commands);

    DrawingData {
        width: current.width,
        height: current.height,
        background: current.background.clone(),
        commands,
    }
}
