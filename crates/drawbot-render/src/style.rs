//! CSS color and font parsing.

use peniko::Color;
use peniko::color::{Srgb, parse_color as parse_css};

/// Parse a CSS color string (`"#FFD54F"`, `"#000"`, `"red"`, `"rgb(0 0 0 / 50%)"`).
pub fn parse_color(spec: &str) -> Option<Color> {
    parse_css(spec.trim())
        .ok()
        .map(|color| color.to_alpha_color::<Srgb>())
}

/// Parse `spec`, falling back to `fallback` when it isn't a color.
pub(crate) fn color_or(spec: Option<&str>, fallback: Color) -> Color {
    match spec {
        Some(spec) => parse_color(spec).unwrap_or_else(|| {
            log::debug!("unparseable color {spec:?}, using fallback");
            fallback
        }),
        None => fallback,
    }
}

/// A resolved font, parsed from a CSS font shorthand.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font size in pixels.
    pub size: f64,
    /// Font family list, as written (may hold several comma-separated names).
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size: 16.0,
            family: "sans-serif".to_string(),
            bold: false,
            italic: false,
        }
    }
}

/// Convert a CSS length to pixels. Only absolute and font-relative units are
/// meaningful here; relative ones resolve against the 16px default.
fn length_px(token: &str) -> Option<f64> {
    let (number, scale) = if let Some(n) = token.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = token.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else if let Some(n) = token.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = token.strip_suffix("em") {
        (n, 16.0)
    } else {
        return None;
    };
    let px = number.parse::<f64>().ok()? * scale;
    (px.is_finite() && px > 0.0).then_some(px)
}

impl FontSpec {
    /// Parse a CSS font shorthand such as `"bold 24px Arial"` or
    /// `"italic 12pt/1.5 'Comic Sans MS', cursive"`.
    ///
    /// The size is required. Returns `None` when no size is found, in which
    /// case the caller's default font applies.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut font = FontSpec::default();
        let mut rest = spec.trim();

        loop {
            let (token, tail) = match rest.split_once(char::is_whitespace) {
                Some((token, tail)) => (token, tail.trim_start()),
                None => (rest, ""),
            };
            if token.is_empty() {
                return None;
            }

            // Size may carry a line height: `16px/1.5`.
            let size_part = token.split('/').next().unwrap_or(token);
            if let Some(size) = length_px(size_part) {
                font.size = size;
                let family = tail.trim();
                if !family.is_empty() {
                    font.family = family.to_string();
                }
                return Some(font);
            }

            match token {
                "italic" | "oblique" => font.italic = true,
                "bold" | "bolder" => font.bold = true,
                weight if weight.parse::<u16>().is_ok_and(|w| w >= 600) => font.bold = true,
                _ => {}
            }
            rest = tail;
        }
    }
}
