//! Drawbot Render Library
//!
//! Paints canonical drawings onto a [`Surface`]. The shipped surface is a CPU
//! pixmap, so the same drawing always yields the same pixels.

mod pixmap;
mod renderer;
mod style;
mod surface;

pub use pixmap::{PixmapSurface, system_fonts};
pub use renderer::{Renderer, RendererError, render_png};
pub use style::{FontSpec, parse_color};
pub use surface::Surface;
