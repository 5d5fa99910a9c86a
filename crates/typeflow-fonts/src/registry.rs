//! Append-only font registry

use std::sync::Arc;

use typeflow_core::error::Result;

use crate::context::FtContext;
use crate::font::Font;

/// Owns every registered font and the invalid sentinel at index 0
///
/// Indices are permanent for the registry's lifetime; hints and shaped
/// glyphs refer to fonts by them. `glyph_res_px` is fixed at construction
/// and shared by every font.
pub struct FontRegistry {
    ctx: Arc<FtContext>,
    fonts: Vec<Font>,
    glyph_res_px: u32,
}

impl FontRegistry {
    pub fn new(glyph_res_px: u32) -> Result<Self> {
        let ctx = FtContext::acquire()?;
        Ok(Self {
            ctx,
            fonts: Vec::new(),
            glyph_res_px,
        })
    }

    /// Register a font from file bytes and return its index.
    ///
    /// The first registration also creates the invalid sentinel, so the
    /// first user font always lands at index 1.
    pub fn add_font(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        if self.fonts.is_empty() {
            self.fonts.push(Font::invalid());
        }

        let font = Font::load(&self.ctx, name, bytes, self.glyph_res_px)?;
        self.fonts.push(font);
        let index = self.fonts.len() - 1;
        log::info!("loaded font '{name}' at index {index}");
        Ok(index)
    }

    pub fn font(&self, index: usize) -> &Font {
        &self.fonts[index]
    }

    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// Number of entries including the sentinel; 0 before the first
    /// registration.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// True when no user font has been registered.
    pub fn has_no_user_fonts(&self) -> bool {
        self.fonts.len() < 2
    }

    pub fn glyph_res_px(&self) -> u32 {
        self.glyph_res_px
    }

    /// Glyph index covering `c` in the given font; 0 when uncovered.
    pub fn coverage(&self, index: usize, c: char) -> u32 {
        self.fonts[index].coverage(c)
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("fonts", &self.fonts.len())
            .field("glyph_res_px", &self.glyph_res_px)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeflow_core::error::{FontError, TextError};

    fn system_font() -> Option<Vec<u8>> {
        const CANDIDATES: &[&str] = &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        ];
        CANDIDATES.iter().find_map(|p| std::fs::read(p).ok())
    }

    #[test]
    fn empty_bytes_are_rejected() {
        let mut registry = FontRegistry::new(32).unwrap();
        let err = registry.add_font("empty", Vec::new()).unwrap_err();
        assert!(matches!(err, TextError::Font(FontError::FileInvalid)));
        // The failed load must not leave a half-registered font behind.
        assert!(registry.has_no_user_fonts());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut registry = FontRegistry::new(32).unwrap();
        let err = registry
            .add_font("garbage", vec![0xDE, 0xAD, 0xBE, 0xEF])
            .unwrap_err();
        assert!(matches!(err, TextError::Font(FontError::FileInvalid)));
    }

    #[test]
    fn first_font_lands_at_index_one() {
        let Some(bytes) = system_font() else { return };
        let mut registry = FontRegistry::new(32).unwrap();
        let index = registry.add_font("sans", bytes).unwrap();
        assert_eq!(index, 1);
        assert!(registry.font(0).is_sentinel());
        assert!(!registry.font(1).is_sentinel());
    }

    #[test]
    fn coverage_distinguishes_sentinel_and_real_font() {
        let Some(bytes) = system_font() else { return };
        let mut registry = FontRegistry::new(32).unwrap();
        registry.add_font("sans", bytes).unwrap();
        assert_eq!(registry.coverage(0, 'A'), 0);
        assert_ne!(registry.coverage(1, 'A'), 0);
    }

    #[test]
    fn rendered_glyph_has_pixels_and_metrics() {
        let Some(bytes) = system_font() else { return };
        let mut registry = FontRegistry::new(32).unwrap();
        let index = registry.add_font("sans", bytes).unwrap();

        let glyph_index = registry.coverage(index, 'H');
        let raster = registry.font(index).render_glyph(glyph_index).unwrap();
        assert!(raster.width > 0 && raster.height > 0);
        assert_eq!(raster.pixels.len(), (raster.width * raster.height) as usize);
        assert!(!raster.is_blank());

        let (ascent, descent, height) = registry.font(index).size_metrics_px().unwrap();
        assert!(ascent > 0);
        assert!(descent <= 0);
        assert!(height as i32 >= ascent - descent - 2);
    }

    #[test]
    fn rendering_twice_yields_identical_bitmaps() {
        let Some(bytes) = system_font() else { return };
        let mut registry = FontRegistry::new(32).unwrap();
        let index = registry.add_font("sans", bytes).unwrap();

        let glyph_index = registry.coverage(index, 'g');
        let a = registry.font(index).render_glyph(glyph_index).unwrap();
        let b = registry.font(index).render_glyph(glyph_index).unwrap();
        assert_eq!(a.pixels, b.pixels);
        assert_eq!((a.width, a.height), (b.width, b.height));
    }
}
