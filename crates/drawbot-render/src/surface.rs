//! Output surface abstraction.

use crate::style::FontSpec;
use kurbo::{BezPath, Point};
use peniko::Color;

/// Trait for paint targets.
///
/// A surface is exclusively borrowed by the renderer while a drawing is
/// painted. Coordinates are in surface pixels with the origin at the top-left,
/// x increasing rightward and y increasing downward.
pub trait Surface {
    /// Surface size in pixels as `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Replace every pixel with `color`.
    fn clear(&mut self, color: Color);

    /// Fill a closed path (non-zero winding).
    fn fill_path(&mut self, path: &BezPath, color: Color);

    /// Stroke a path with the given line width.
    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color);

    /// Draw a single line of text with its baseline origin at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color);
}
