//! The layout manager: the engine's public face

use std::path::Path;

use typeflow_atlas::{AtlasSink, GlyphAtlas};
use typeflow_core::convert::Utf16Text;
use typeflow_core::error::{Result, TextError};
use typeflow_core::types::{DirectionHint, FontSearch, Glyph, Hint, Line, ScriptHint};
use typeflow_fonts::FontRegistry;
use typeflow_shape::{shape_text, TextLine};

/// Drives the shaper and the atlas and assembles positioned lines
///
/// A manager instance is single-threaded cooperative: it is not safe for
/// concurrent access and its methods must be serialized by the caller. Atlas
/// notifications fire synchronously from inside [`TextManager::get_glyphs`];
/// the consumer must not re-enter the manager from a callback.
pub struct TextManager {
    registry: FontRegistry,
    atlas: GlyphAtlas,
}

impl TextManager {
    pub fn new(atlas_size_px: u32, glyph_res_px: u32, sdf_offset_px: u32) -> Result<Self> {
        Ok(Self {
            registry: FontRegistry::new(glyph_res_px)?,
            atlas: GlyphAtlas::new(atlas_size_px, glyph_res_px, sdf_offset_px),
        })
    }

    /// 1024 px pages, 32 px glyphs, 4 px SDF border.
    pub fn with_defaults() -> Result<Self> {
        Self::new(1024, 32, 4)
    }

    /// Install the renderer's upload observer. Do this before the first
    /// `add_font` so the initial page and missing glyph are announced.
    pub fn set_atlas_sink(&mut self, sink: Box<dyn AtlasSink>) {
        self.atlas.set_sink(sink);
    }

    /// Register a font from file bytes and return its registry index.
    ///
    /// The first registration creates the invalid sentinel at index 0, which
    /// also sets up atlas page 0 and the universal missing glyph.
    pub fn add_font(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        let index = self.registry.add_font(name, bytes)?;
        // The atlas mirrors the registry font list; this also covers the
        // sentinel the registry just created on a first call.
        while self.atlas.font_count() < self.registry.len() {
            self.atlas.add_font(self.registry.font(self.atlas.font_count()))?;
        }
        Ok(index)
    }

    /// Register a font from a file on disk.
    pub fn add_font_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = std::fs::read(path)?;
        self.add_font(name, bytes)
    }

    /// Build a hint from a comma-separated list of priority font names.
    ///
    /// Named fonts become the priority list and every other user font the
    /// fallback list, both in registry order. The sentinel at index 0 never
    /// participates.
    pub fn create_hint(
        &self,
        prio_fonts: &str,
        font_search: FontSearch,
        direction: DirectionHint,
        script: ScriptHint,
    ) -> Result<Hint> {
        if self.registry.has_no_user_fonts() {
            return Err(TextError::NoFontsAvailable);
        }

        let names: Vec<&str> = prio_fonts.split(',').collect();
        let mut hint = Hint {
            font_search,
            direction,
            script,
            glyph_res_px: self.atlas.glyph_res_px(),
            ..Hint::default()
        };

        for (index, font) in self.registry.fonts().iter().enumerate().skip(1) {
            if names.contains(&font.name()) {
                hint.prio_fonts.push(index);
            } else {
                hint.fallback_fonts.push(index);
            }
        }
        Ok(hint)
    }

    /// Lay out a UTF-16 string into lines of positioned glyphs.
    ///
    /// Lines arrive in visual top-to-bottom order with every glyph on a
    /// baseline at y = 0; the caller advances its own baseline by
    /// `line.spacing` between lines.
    pub fn get_glyphs(&mut self, text: &[u16], hint: &Hint) -> Result<Vec<Line>> {
        if hint.prio_fonts.is_empty() && hint.fallback_fonts.is_empty() {
            return Err(TextError::HintInvalid);
        }
        if hint.font_search == FontSearch::Explicit && hint.prio_fonts.is_empty() {
            return Err(TextError::HintInvalid);
        }
        if self.registry.has_no_user_fonts() {
            return Err(TextError::NoFontsAvailable);
        }
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let text = Utf16Text::from_units(text);
        let shaped = shape_text(&self.registry, &text, hint)?;
        log::debug!("shaped {} code units into {} line(s)", text.len(), shaped.len());

        let mut lines = Vec::with_capacity(shaped.len());
        for shaped_line in &shaped {
            lines.push(self.layout_line(shaped_line)?);
        }
        Ok(lines)
    }

    /// Join one shaped line with the atlas and thread the pen through it.
    fn layout_line(&mut self, shaped: &TextLine) -> Result<Line> {
        let mut images = Vec::new();
        self.atlas
            .get_glyphs(&self.registry, &shaped.infos, &mut images)?;

        let mut line = Line {
            start: shaped.start,
            end: shaped.end,
            rtl: shaped.rtl,
            ..Line::default()
        };

        let mut pen_x: i32 = 0;
        let mut x_min = i32::MAX;
        let mut x_max = i32::MIN;
        let mut y_min = i32::MAX;
        let mut y_max = i32::MIN;
        let mut fonts_used: Vec<usize> = Vec::new();

        line.glyphs.reserve(images.len());
        for ((info, offset), image) in shaped.infos.iter().zip(&shaped.offsets).zip(&images) {
            let x0 = pen_x + offset.offset_x + image.bearing_x;
            let x1 = x0 + image.width as i32;
            let y1 = offset.offset_y + image.bearing_y;
            let y0 = y1 - image.height as i32;
            pen_x += offset.advance_x;

            x_min = x_min.min(x0);
            x_max = x_max.max(x1);
            y_min = y_min.min(y0);
            y_max = y_max.max(y1);

            line.glyphs.push(Glyph {
                cluster: info.cluster,
                atlas: image.atlas,
                tex_x: image.tex_x,
                tex_y: image.tex_y,
                sdf_x: image.sdf_x,
                sdf_y: image.sdf_y,
                x0,
                y0,
                x1,
                y1,
            });

            if !line.atlases.contains(&image.atlas) {
                line.atlases.push(image.atlas);
            }
            if !fonts_used.contains(&info.font) {
                fonts_used.push(info.font);
            }
        }

        if line.glyphs.is_empty() {
            return Ok(line);
        }

        line.x_min = x_min;
        line.x_max = x_max;
        line.y_min = y_min;
        line.y_max = y_max;

        let glyph_res = self.atlas.glyph_res_px();
        for &font in &fonts_used {
            let (ascent, descent, height) = match self.registry.font(font).size_metrics_px() {
                Some(metrics) => metrics,
                // The invalid font has no face; it contributes a constant
                // designer height.
                None => (glyph_res as i32, 0, glyph_res * 6 / 5),
            };
            line.ascent = line.ascent.max(ascent);
            line.descent = line.descent.min(descent);
            line.spacing = line.spacing.max(height);
        }

        Ok(line)
    }
}

impl std::fmt::Debug for TextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextManager")
            .field("fonts", &self.registry.len())
            .field("atlas_pages", &self.atlas.page_count())
            .finish()
    }
}
