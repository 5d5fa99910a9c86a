//! Typeflow: a multilingual text layout engine for SDF glyph rendering
//!
//! Typeflow turns a UTF-16 string plus a font/hint configuration into lines
//! of positioned glyphs whose images live in shelf-packed signed-distance-
//! field atlases, ready to be drawn as textured quads.
//!
//! The journey every string takes:
//!
//! 1. **Itemization** - direction (BiDi), script, and font partitions merge
//!    into uniform runs in visual order
//! 2. **Shaping** - HarfBuzz turns each run into glyph indices and pen motion
//! 3. **Line breaking** - mandatory and width-constrained breaks, or elision
//! 4. **Rasterization** - FreeType renders new glyphs, the SDF transform and
//!    shelf packer put them into grayscale atlas pages
//! 5. **Layout** - pen positioning on a zero baseline with per-line metrics
//!
//! ```no_run
//! use typeflow::{utf8_to_utf16, DirectionHint, FontSearch, ScriptHint, TextManager};
//!
//! let mut manager = TextManager::with_defaults()?;
//! manager.add_font_file("sans", "fonts/FiraSans-Regular.ttf")?;
//!
//! let hint = manager.create_hint(
//!     "sans",
//!     FontSearch::Fallback,
//!     DirectionHint::Multiple,
//!     ScriptHint::Multiple,
//! )?;
//!
//! let lines = manager.get_glyphs(&utf8_to_utf16("hello"), &hint)?;
//! for line in &lines {
//!     for glyph in &line.glyphs {
//!         // draw a quad from (glyph.x0, glyph.y0) to (glyph.x1, glyph.y1)
//!         // sampling atlas page glyph.atlas at (glyph.tex_x, glyph.tex_y)
//!     }
//! }
//! # Ok::<(), typeflow::TextError>(())
//! ```
//!
//! Atlas pages and glyph images reach the renderer through the
//! [`AtlasSink`] observer installed with [`TextManager::set_atlas_sink`];
//! both notifications fire synchronously from inside
//! [`TextManager::get_glyphs`].

pub mod manager;

pub use manager::TextManager;

pub use typeflow_atlas::{AtlasSink, GlyphImage};
pub use typeflow_core::{
    utf16_to_utf8, utf32_to_utf8, utf8_to_utf16, AtlasError, DirectionHint, FontError, FontSearch,
    Glyph, GlyphImageDesc, GlyphInfo, GlyphOffset, Hint, Line, Result, ScriptHint, TextError,
};
