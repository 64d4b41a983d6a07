//! CPU pixmap surface backed by tiny-skia.

use crate::renderer::RendererError;
use crate::style::FontSpec;
use crate::surface::Surface;
use drawbot_core::DEFAULT_MAX_PIXELS;
use kurbo::{BezPath, PathEl, Point};
use peniko::Color;
use resvg::tiny_skia::{self, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use resvg::usvg;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

/// The system font database, loaded on first use and shared afterwards.
pub fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("loaded {} font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// An RGBA pixmap surface.
pub struct PixmapSurface {
    pixmap: Pixmap,
    fonts: Arc<usvg::fontdb::Database>,
}

impl PixmapSurface {
    /// Allocate a transparent `width` x `height` surface using system fonts.
    ///
    /// Sizes above [`DEFAULT_MAX_PIXELS`] are refused.
    pub fn new(width: u32, height: u32) -> Result<Self, RendererError> {
        Self::with_fonts(width, height, system_fonts())
    }

    /// Allocate a surface with system fonts, refusing more than `max_pixels`.
    pub fn with_limit(width: u32, height: u32, max_pixels: u64) -> Result<Self, RendererError> {
        Self::allocate(width, height, max_pixels, system_fonts())
    }

    /// Allocate a surface that lays out text with `fonts`.
    pub fn with_fonts(
        width: u32,
        height: u32,
        fonts: Arc<usvg::fontdb::Database>,
    ) -> Result<Self, RendererError> {
        Self::allocate(width, height, DEFAULT_MAX_PIXELS, fonts)
    }

    fn allocate(
        width: u32,
        height: u32,
        max_pixels: u64,
        fonts: Arc<usvg::fontdb::Database>,
    ) -> Result<Self, RendererError> {
        if u64::from(width) * u64::from(height) > max_pixels {
            log::warn!("refusing {width}x{height} surface (limit {max_pixels} pixels)");
            return Err(RendererError::InvalidSize(width, height));
        }
        let pixmap = Pixmap::new(width, height).ok_or(RendererError::InvalidSize(width, height))?;
        Ok(Self { pixmap, fonts })
    }

    /// The straight-alpha RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Row-major straight-alpha RGBA bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Encode the surface as a PNG image.
    pub fn encode_png(&self) -> Result<Vec<u8>, RendererError> {
        let rgba = self.to_rgba();
        let mut png_data = Vec::new();
        {
            let mut encoder =
                png::Encoder::new(&mut png_data, self.pixmap.width(), self.pixmap.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| RendererError::Encode(e.to_string()))?;
            writer
                .write_image_data(&rgba)
                .map_err(|e| RendererError::Encode(e.to_string()))?;
        }
        Ok(png_data)
    }
}

fn paint(color: Color) -> Paint<'static> {
    let c = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo path. Returns `None` for empty or degenerate paths.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A one-element SVG document holding `text` at `origin`.
fn text_svg(width: u32, height: u32, text: &str, origin: Point, font: &FontSpec, color: Color) -> String {
    let c = color.to_rgba8();
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
    );
    let _ = write!(
        svg,
        r##"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" fill="#{:02x}{:02x}{:02x}" fill-opacity="{}" xml:space="preserve">{}</text></svg>"##,
        origin.x,
        origin.y,
        escape_xml(&font.family),
        font.size,
        if font.bold { "bold" } else { "normal" },
        if font.italic { "italic" } else { "normal" },
        c.r,
        c.g,
        c.b,
        f32::from(c.a) / 255.0,
        escape_xml(text),
    );
    svg
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self, color: Color) {
        let c = color.to_rgba8();
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Color) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        if text.is_empty() {
            return;
        }
        let (width, height) = self.size();
        let svg = text_svg(width, height, text, origin, font, color);

        let mut opt = usvg::Options::default();
        opt.fontdb = self.fonts.clone();
        match usvg::Tree::from_str(&svg, &opt) {
            Ok(tree) => resvg::render(&tree, Transform::identity(), &mut self.pixmap.as_mut()),
            Err(e) => log::warn!("failed to lay out text {text:?}: {e}"),
        }
    }
}
