//! Painting canonical drawings onto a surface.

use crate::pixmap::PixmapSurface;
use crate::style::{FontSpec, color_or};
use crate::surface::Surface;
use drawbot_core::DEFAULT_MAX_PIXELS;
use drawbot_core::command::{Circle, Command, DrawingData, Line, Rect, Text, Triangle};
use kurbo::{BezPath, Point, Shape as KurboShape};
use peniko::Color;
use thiserror::Error;

/// Flattening tolerance for curved outlines.
const TOLERANCE: f64 = 0.1;

/// Line width used when a command has none (or an unusable one).
const DEFAULT_LINE_WIDTH: f64 = 1.0;

/// Radius up to which circles flatten at [`TOLERANCE`]. Beyond it the
/// tolerance grows with the radius so the segment count stays bounded.
const MAX_PRECISE_RADIUS: f64 = 1e8;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Cannot allocate a {0}x{1} surface")]
    InvalidSize(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Paints [`DrawingData`] onto a [`Surface`].
///
/// Painting is a pure projection: the surface is cleared first, so painting
/// the same drawing twice leaves the same pixels.
#[derive(Debug, Clone)]
pub struct Renderer {
    default_font: FontSpec,
    max_pixels: u64,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            default_font: FontSpec::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl Renderer {
    /// Create a renderer with the 16px sans-serif default font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to allocate surfaces larger than `max_pixels`.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Use `font` (a CSS font shorthand) for text commands that name none.
    pub fn with_default_font(mut self, font: &str) -> Self {
        match FontSpec::parse(font) {
            Some(font) => self.default_font = font,
            None => log::warn!("ignoring unparseable default font {font:?}"),
        }
        self
    }

    /// The font used for text commands that name none.
    pub fn default_font(&self) -> &FontSpec {
        &self.default_font
    }

    /// Clear `surface` to the drawing's background and paint every command in
    /// order.
    ///
    /// Commands that are opaque or carry non-finite geometry are skipped; the
    /// rest of the drawing still paints.
    pub fn render<S: Surface + ?Sized>(&self, data: &DrawingData, surface: &mut S) {
        let (width, height) = surface.size();
        if (width, height) != (data.width, data.height) {
            log::warn!(
                "painting a {}x{} drawing onto a {width}x{height} surface",
                data.width,
                data.height
            );
        }

        surface.clear(color_or(Some(&data.background), Color::WHITE));
        let bounds = kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));

        for (index, command) in data.commands.iter().enumerate() {
            if !command.is_paintable() {
                log::debug!("skipping command #{index} ({:?})", command.kind());
                continue;
            }
            self.paint_command(command, bounds, surface);
        }
    }

    fn paint_command<S: Surface + ?Sized>(
        &self,
        command: &Command,
        bounds: kurbo::Rect,
        surface: &mut S,
    ) {
        match command {
            Command::Circle(circle) => paint_circle(circle, bounds, surface),
            Command::Line(line) => paint_line(line, surface),
            Command::Rect(rect) => paint_rect(rect, surface),
            Command::Triangle(triangle) => paint_triangle(triangle, surface),
            Command::Text(text) => self.paint_text(text, surface),
            Command::Opaque(_) => {}
        }
    }

    fn paint_text<S: Surface + ?Sized>(&self, text: &Text, surface: &mut S) {
        let font = text
            .font
            .as_deref()
            .and_then(FontSpec::parse)
            .unwrap_or_else(|| self.default_font.clone());
        let color = color_or(text.fill.as_deref(), Color::BLACK);
        surface.fill_text(&text.text, Point::new(text.x, text.y), &font, color);
    }
}

fn line_width(width: Option<f64>) -> f64 {
    width
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(DEFAULT_LINE_WIDTH)
}

/// Fill and/or stroke a closed outline; each applies only when its color is set.
fn paint_outline<S: Surface + ?Sized>(
    path: &BezPath,
    fill: Option<&str>,
    stroke: Option<&str>,
    width: Option<f64>,
    surface: &mut S,
) {
    if fill.is_some() {
        surface.fill_path(path, color_or(fill, Color::BLACK));
    }
    if stroke.is_some() {
        surface.stroke_path(path, line_width(width), color_or(stroke, Color::BLACK));
    }
}

/// Paint a circle onto a surface covering `bounds`.
///
/// A disk that swallows the whole surface, with its outline outside it, is
/// painted as a filled rectangle instead of being flattened.
fn paint_circle<S: Surface + ?Sized>(circle: &Circle, bounds: kurbo::Rect, surface: &mut S) {
    let center = Point::new(circle.x, circle.y);
    let width = line_width(circle.line_width);
    let margin = width + 1.0;
    let area = bounds.inflate(margin, margin);
    let farthest = [
        Point::new(area.x0, area.y0),
        Point::new(area.x1, area.y0),
        Point::new(area.x0, area.y1),
        Point::new(area.x1, area.y1),
    ]
    .into_iter()
    .map(|corner| corner.distance(center))
    .fold(0.0, f64::max);

    if circle.r - width > farthest {
        if circle.fill.is_some() {
            surface.fill_path(
                &area.to_path(TOLERANCE),
                color_or(circle.fill.as_deref(), Color::BLACK),
            );
        }
        return;
    }

    let tolerance = TOLERANCE.max(circle.r / MAX_PRECISE_RADIUS * TOLERANCE);
    let path = kurbo::Circle::new(center, circle.r).to_path(tolerance);
    paint_outline(
        &path,
        circle.fill.as_deref(),
        circle.stroke.as_deref(),
        circle.line_width,
        surface,
    );
}

fn paint_line<S: Surface + ?Sized>(line: &Line, surface: &mut S) {
    let mut path = BezPath::new();
    path.move_to((line.x1, line.y1));
    path.line_to((line.x2, line.y2));
    surface.stroke_path(
        &path,
        line_width(line.line_width),
        color_or(line.stroke.as_deref(), Color::BLACK),
    );
}

fn paint_rect<S: Surface + ?Sized>(rect: &Rect, surface: &mut S) {
    let path = kurbo::Rect::new(rect.x, rect.y, rect.x + rect.w, rect.y + rect.h).to_path(TOLERANCE);
    paint_outline(
        &path,
        rect.fill.as_deref(),
        rect.stroke.as_deref(),
        rect.line_width,
        surface,
    );
}

fn paint_triangle<S: Surface + ?Sized>(triangle: &Triangle, surface: &mut S) {
    let mut path = BezPath::new();
    path.move_to((triangle.x1, triangle.y1));
    path.line_to((triangle.x2, triangle.y2));
    path.line_to((triangle.x3, triangle.y3));
    path.close_path();
    paint_outline(
        &path,
        triangle.fill.as_deref(),
        triangle.stroke.as_deref(),
        triangle.line_width,
        surface,
    );
}

/// Paint `data` onto a fresh pixmap of its declared size and encode it as PNG.
///
/// Fails with [`RendererError::InvalidSize`] when the drawing has more pixels
/// than the renderer allows.
pub fn render_png(renderer: &Renderer, data: &DrawingData) -> Result<Vec<u8>, RendererError> {
    let mut surface =
        PixmapSurface::with_limit(data.width, data.height, renderer.max_pixels)?;
    renderer.render(data, &mut surface);
    surface.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawbot_core::normalize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear([u8; 4]),
        Fill(kurbo::Rect, [u8; 4]),
        Stroke(kurbo::Rect, f64, [u8; 4]),
        Text(String, Point, FontSpec, [u8; 4]),
    }

    fn rgba(color: Color) -> [u8; 4] {
        let c = color.to_rgba8();
        [c.r, c.g, c.b, c.a]
    }

    /// Records paint calls instead of rasterizing them.
    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Surface for Recorder {
        fn size(&self) -> (u32, u32) {
            (500, 400)
        }

        fn clear(&mut self, color: Color) {
            self.ops.clear();
            self.ops.push(Op::Clear(rgba(color)));
        }

        fn fill_path(&mut self, path: &BezPath, color: Color) {
            self.ops.push(Op::Fill(path.bounding_box(), rgba(color)));
        }

        fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color) {
            self.ops.push(Op::Stroke(path.bounding_box(), width, rgba(color)));
        }

        fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
            self.ops.push(Op::Text(text.to_string(), origin, font.clone(), rgba(color)));
        }
    }

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn record(document: serde_json::Value) -> Vec<Op> {
        let mut recorder = Recorder::default();
        Renderer::new().render(&normalize(&document), &mut recorder);
        recorder.ops
    }

    #[test]
    fn test_background_first() {
        let ops = record(json!({"background": "#ff0000"}));
        assert_eq!(ops, vec![Op::Clear(RED)]);

        let ops = record(json!({"background": "garbage"}));
        assert_eq!(ops, vec![Op::Clear(WHITE)]);
    }

    #[test]
    fn test_rect_fill_and_stroke_independent() {
        let ops = record(json!({"commands": [
            {"type": "rect", "x": 10, "y": 20, "w": 30, "h": 40, "fill": "red"},
            {"type": "rect", "x": 10, "y": 20, "w": 30, "h": 40, "stroke": "red", "lineWidth": 3},
            {"type": "rect", "x": 10, "y": 20, "w": 30, "h": 40, "fill": "red", "stroke": "#000"},
            {"type": "rect", "x": 10, "y": 20, "w": 30, "h": 40}
        ]}));
        let bounds = kurbo::Rect::new(10.0, 20.0, 40.0, 60.0);
        assert_eq!(
            ops,
            vec![
                Op::Clear(WHITE),
                Op::Fill(bounds, RED),
                Op::Stroke(bounds, 3.0, RED),
                Op::Fill(bounds, RED),
                Op::Stroke(bounds, 1.0, BLACK),
            ]
        );
    }

    #[test]
    fn test_line_defaults_to_black_stroke() {
        let ops = record(json!({"commands": [
            {"type": "line", "x1": 0, "y1": 0, "x2": 10, "y2": 5, "lineWidth": -2}
        ]}));
        assert_eq!(
            ops[1],
            Op::Stroke(kurbo::Rect::new(0.0, 0.0, 10.0, 5.0), 1.0, BLACK)
        );
    }

    #[test]
    fn test_circle_without_styles_paints_nothing() {
        let ops = record(json!({"commands": [{"type": "circle", "x": 5, "y": 5, "r": 3}]}));
        assert_eq!(ops, vec![Op::Clear(WHITE)]);
    }

    #[test]
    fn test_enormous_circle_fills_surface_area() {
        let ops = record(json!({"commands": [
            {"type": "circle", "x": 250, "y": 200, "r": 1e300, "fill": "red", "stroke": "black"}
        ]}));
        assert_eq!(
            ops,
            vec![
                Op::Clear(WHITE),
                Op::Fill(kurbo::Rect::new(-2.0, -2.0, 502.0, 402.0), RED),
            ]
        );
    }

    #[test]
    fn test_circle_and_triangle() {
        let ops = record(json!({"commands": [
            {"type": "circle", "x": 50, "y": 50, "r": 10, "fill": "red", "stroke": "black", "lineWidth": 2},
            {"type": "triangle", "x": 0, "y": 0, "x1": 10, "y1": 0, "x2": 5, "y2": 10, "stroke": "red"}
        ]}));
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[1], Op::Fill(_, RED)));
        assert!(matches!(ops[2], Op::Stroke(_, w, BLACK) if w == 2.0));
        assert_eq!(
            ops[3],
            Op::Stroke(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0), 1.0, RED)
        );
    }

    #[test]
    fn test_text_defaults() {
        let ops = record(json!({"commands": [
            {"type": "text", "x": 5, "y": 20, "text": "hello"},
            {"type": "text", "x": 5, "y": 40, "text": "big", "font": "bold 24px serif", "fill": "red"}
        ]}));
        assert_eq!(
            ops[1],
            Op::Text("hello".to_string(), Point::new(5.0, 20.0), FontSpec::default(), BLACK)
        );
        let Op::Text(_, _, font, color) = &ops[2] else {
            panic!("expected text");
        };
        assert_eq!(font.size, 24.0);
        assert!(font.bold);
        assert_eq!(*color, RED);
    }

    #[test]
    fn test_configured_default_font() {
        let renderer = Renderer::new().with_default_font("20px monospace");
        assert_eq!(renderer.default_font().family, "monospace");

        let renderer = Renderer::new().with_default_font("nonsense");
        assert_eq!(renderer.default_font(), &FontSpec::default());
    }

    #[test]
    fn test_non_finite_command_skipped_rest_painted() {
        let mut data = DrawingData::empty();
        data.commands.push(Command::Rect(Rect {
            x: 0.0,
            y: 0.0,
            w: f64::NAN,
            h: 10.0,
            fill: Some("#fff".to_string()),
            stroke: None,
            line_width: None,
        }));
        data.commands.push(Command::Rect(Rect {
            x: 1.0,
            y: 1.0,
            w: 2.0,
            h: 2.0,
            fill: Some("red".to_string()),
            stroke: None,
            line_width: None,
        }));

        let mut recorder = Recorder::default();
        Renderer::new().render(&data, &mut recorder);
        assert_eq!(
            recorder.ops,
            vec![Op::Clear(WHITE), Op::Fill(kurbo::Rect::new(1.0, 1.0, 3.0, 3.0), RED)]
        );
    }

    #[test]
    fn test_unknown_type_does_not_affect_others() {
        let with_unknown = record(json!({"commands": [
            {"type": "rect", "x": 0, "y": 0, "w": 5, "h": 5, "fill": "red"},
            {"type": "spiral", "turns": 3},
            {"type": "line", "x1": 0, "y1": 0, "x2": 5, "y2": 5}
        ]}));
        let without = record(json!({"commands": [
            {"type": "rect", "x": 0, "y": 0, "w": 5, "h": 5, "fill": "red"},
            {"type": "line", "x1": 0, "y1": 0, "x2": 5, "y2": 5}
        ]}));
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn test_render_is_repeatable() {
        let data = normalize(&json!({"commands": [
            {"type": "circle", "x": 50, "y": 50, "r": 10, "fill": "red"}
        ]}));
        let mut recorder = Recorder::default();
        let renderer = Renderer::new();

        renderer.render(&data, &mut recorder);
        let first = recorder.ops.clone();
        renderer.render(&data, &mut recorder);
        assert_eq!(recorder.ops, first);
    }
}
