//! Glyph atlases for typeflow
//!
//! Glyphs become textures here: the atlas rasterizes a glyph on first use,
//! pads it, applies the signed-distance-field transform, packs the result
//! into a fixed-size grayscale page with a shelf packer, and remembers it in
//! a per-font sorted cache. The renderer hears about new pages and new glyph
//! images through the [`AtlasSink`] observer and uploads them as textures.

pub mod atlas;
pub mod sdf;
pub mod shelf;

pub use atlas::{AtlasSink, GlyphAtlas, GlyphImage};
pub use sdf::make_distance_map;
pub use shelf::ShelfPacker;
