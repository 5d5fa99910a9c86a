//! The records passed between the shaper, the atlas, and the layout manager

/// How a hint resolves fonts for each code point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSearch {
    /// Search the priority list, then the fallback list.
    #[default]
    Fallback,
    /// Only the first priority font; everything else becomes a missing glyph.
    Explicit,
}

/// Paragraph direction supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionHint {
    #[default]
    LeftToRight,
    RightToLeft,
    /// Run the bidirectional algorithm and let the first strong character
    /// decide the paragraph level.
    Multiple,
}

/// Whether the text is known to be single-script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptHint {
    #[default]
    Single,
    Multiple,
}

/// Caller-supplied layout configuration
///
/// Produced by `TextManager::create_hint`; `glyph_res_px` is filled in from
/// the atlas configuration there and callers normally leave it alone.
#[derive(Debug, Clone)]
pub struct Hint {
    /// Registry indices searched first, in order.
    pub prio_fonts: Vec<usize>,
    /// Remaining registry indices, searched with move-to-front.
    pub fallback_fonts: Vec<usize>,
    pub font_search: FontSearch,
    pub direction: DirectionHint,
    pub script: ScriptHint,
    /// Width at which line breaking (or eliding) occurs. `u32::MAX` disables
    /// width-constrained breaking.
    pub max_line_width_px: u32,
    /// Truncate to one line ending in "..." instead of breaking.
    pub elide: bool,
    /// Glyph rasterization resolution; also the advance assigned to
    /// substituted missing glyphs.
    pub glyph_res_px: u32,
}

impl Default for Hint {
    fn default() -> Self {
        Self {
            prio_fonts: Vec::new(),
            fallback_fonts: Vec::new(),
            font_search: FontSearch::Fallback,
            direction: DirectionHint::LeftToRight,
            script: ScriptHint::Single,
            max_line_width_px: u32::MAX,
            elide: false,
            glyph_res_px: 32,
        }
    }
}

/// A shaped glyph reference, before rasterization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphInfo {
    /// Registry index of the font that shaped this glyph. 0 is the invalid
    /// sentinel, meaning the missing glyph stands in.
    pub font: usize,
    /// Glyph index within the font. 0 within a real font means the font does
    /// not cover the character.
    pub index: u32,
    /// UTF-16 code-unit offset in the source string this glyph came from.
    pub cluster: u32,
    /// Set when the glyph belongs to a right-to-left run.
    pub rtl: bool,
    /// Set for break characters (U+0009..U+000D); the atlas returns a
    /// metrics-only record for these.
    pub zero_width: bool,
}

/// Pen motion for one shaped glyph, in integer pixels
///
/// Converted from the shaping engine's 26.6 fixed point by dividing by 64;
/// the loss is intentional and all downstream math stays integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphOffset {
    pub advance_x: i32,
    pub advance_y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// A rasterized glyph's location and metrics within the atlas set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphImageDesc {
    pub font: usize,
    pub index: u32,
    /// Atlas page holding the glyph image.
    pub atlas: u32,
    /// Top-left corner of the padded glyph image in its page, in pixels.
    pub tex_x: u16,
    pub tex_y: u16,
    /// SDF border insets between the padded image and the glyph box.
    pub sdf_x: u16,
    pub sdf_y: u16,
    pub bearing_x: i32,
    pub bearing_y: i32,
    /// Original glyph box, without the SDF border.
    pub width: u32,
    pub height: u32,
}

impl GlyphImageDesc {
    /// A metrics-only record at page 0 with zero dimensions.
    pub fn empty(font: usize, index: u32) -> Self {
        Self {
            font,
            index,
            atlas: 0,
            tex_x: 0,
            tex_y: 0,
            sdf_x: 0,
            sdf_y: 0,
            bearing_x: 0,
            bearing_y: 0,
            width: 0,
            height: 0,
        }
    }
}

/// A positioned glyph in a laid-out line
///
/// `(x0, y0)` is the bottom-left and `(x1, y1)` the top-right corner on a
/// baseline at y = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub cluster: u32,
    pub atlas: u32,
    pub tex_x: u16,
    pub tex_y: u16,
    pub sdf_x: u16,
    pub sdf_y: u16,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// One laid-out line of text
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// UTF-16 code-unit range of the source string this line covers.
    pub start: u32,
    pub end: u32,

    /// Bounding box over all glyphs in the line.
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,

    /// Maximum ascender over the fonts used in the line.
    pub ascent: i32,
    /// Minimum descender over the fonts used in the line (usually negative).
    pub descent: i32,
    /// Designer line height: the maximum over the fonts used in the line,
    /// not necessarily `y_max - y_min`.
    pub spacing: u32,

    /// Atlas pages referenced by the line's glyphs, deduplicated, in first
    /// use order.
    pub atlases: Vec<u32>,
    pub glyphs: Vec<Glyph>,

    /// Overall direction of the paragraph this line belongs to.
    pub rtl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_defaults_disable_breaking() {
        let hint = Hint::default();
        assert_eq!(hint.max_line_width_px, u32::MAX);
        assert!(!hint.elide);
        assert_eq!(hint.font_search, FontSearch::Fallback);
    }

    #[test]
    fn empty_glyph_desc_is_zeroed() {
        let desc = GlyphImageDesc::empty(3, 17);
        assert_eq!(desc.font, 3);
        assert_eq!(desc.index, 17);
        assert_eq!(desc.atlas, 0);
        assert_eq!((desc.width, desc.height), (0, 0));
    }
}
