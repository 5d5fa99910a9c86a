//! Typeflow core: the data that flows from a string to positioned glyphs
//!
//! Text enters the engine as UTF-16 code units and leaves as lines of
//! rasterized, atlas-resident glyphs. This crate holds everything the other
//! stages agree on:
//!
//! - [`types`] - the records passed between shaper, atlas, and layout manager
//! - [`error`] - the error hierarchy every stage reports through
//! - [`convert`] - the UTF-16 buffer the pipeline indexes into, plus the
//!   conversions callers need at the boundary
//!
//! Cluster values everywhere in the engine are UTF-16 code-unit offsets into
//! the source string. The shaping and layout crates never index text any
//! other way.

pub mod convert;
pub mod error;
pub mod types;

pub use convert::{utf16_to_utf8, utf32_to_utf8, utf8_to_utf16, Utf16Text};
pub use error::{AtlasError, FontError, Result, TextError};
pub use types::{
    DirectionHint, FontSearch, Glyph, GlyphImageDesc, GlyphInfo, GlyphOffset, Hint, Line,
    ScriptHint,
};
