//! The shaper: from a UTF-16 paragraph to shaped lines
//!
//! Shaping runs in three stages. Itemization partitions the paragraph three
//! independent ways (direction, script, font) and merges the partitions into
//! maximal uniform runs in visual order. Each run is then shaped by HarfBuzz
//! into glyph indices, clusters, and pen motion. Finally the single logical
//! line is broken at mandatory breaks and at the line width limit, or elided
//! to one line ending in "...".
//!
//! Everything here indexes the paragraph by UTF-16 code unit; the byte
//! offsets the Unicode crates speak are translated at the seams through
//! [`typeflow_core::Utf16Text`].

pub mod itemize;
pub mod linebreak;
pub mod shaper;

pub use itemize::{itemize, Itemization, TextRun};
pub use linebreak::{classify_breaks, BreakClass};
pub use shaper::{shape_text, TextLine};
