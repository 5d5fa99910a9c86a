//! The glyph atlas: rasterize once, pack, cache, notify

use typeflow_core::error::{AtlasError, Result};
use typeflow_core::types::{GlyphImageDesc, GlyphInfo};
use typeflow_fonts::{Font, FontRegistry};

use crate::sdf::make_distance_map;
use crate::shelf::ShelfPacker;

/// A padded SDF glyph image handed to the renderer for upload
#[derive(Debug, Clone)]
pub struct GlyphImage {
    pub width: u32,
    pub height: u32,
    /// `width * height` bytes, row-major, top-down, 8-bit grayscale.
    pub pixels: Vec<u8>,
}

/// Observer for texture uploads
///
/// Both callbacks fire synchronously from inside `get_glyphs` and must
/// return before the provoking call does; the consumer may marshal the data
/// to its own thread but must not re-enter the layout manager.
pub trait AtlasSink {
    /// A new atlas page of `size_px` x `size_px` grayscale pixels exists.
    fn on_new_atlas(&mut self, atlas: u32, size_px: u32);

    /// A glyph image was written; `offset` is its top-left corner in the
    /// page.
    fn on_new_glyph(&mut self, atlas: u32, offset: (u16, u16), image: &GlyphImage);
}

/// Rasterized-glyph store shared by every layout call
///
/// Pages are append-only and packed by [`ShelfPacker`]; per-font caches are
/// kept strictly sorted by glyph index and binary-searched. Nothing is ever
/// evicted: the working set of UI text is assumed bounded and pages are
/// tuned via `atlas_size_px`.
pub struct GlyphAtlas {
    atlas_size_px: u32,
    glyph_res_px: u32,
    sdf_offset_px: u32,

    pages: Vec<ShelfPacker>,
    /// Glyph caches indexed by font.
    caches: Vec<Vec<GlyphImageDesc>>,
    /// Universal fallback image, synthesized when the sentinel font is
    /// added; also cached under font 0, glyph 0.
    missing_glyph: GlyphImageDesc,

    sink: Option<Box<dyn AtlasSink>>,
}

impl GlyphAtlas {
    pub fn new(atlas_size_px: u32, glyph_res_px: u32, sdf_offset_px: u32) -> Self {
        Self {
            atlas_size_px,
            glyph_res_px,
            sdf_offset_px,
            pages: Vec::new(),
            caches: Vec::new(),
            missing_glyph: GlyphImageDesc::empty(0, 0),
            sink: None,
        }
    }

    pub fn atlas_size_px(&self) -> u32 {
        self.atlas_size_px
    }

    pub fn glyph_res_px(&self) -> u32 {
        self.glyph_res_px
    }

    pub fn sdf_offset_px(&self) -> u32 {
        self.sdf_offset_px
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of fonts registered with the atlas, sentinel included.
    pub fn font_count(&self) -> usize {
        self.caches.len()
    }

    /// Install the upload observer. Pages and glyphs created before this
    /// point are not replayed.
    pub fn set_sink(&mut self, sink: Box<dyn AtlasSink>) {
        self.sink = Some(sink);
    }

    /// Register a font with the atlas, in registry order.
    ///
    /// The first call must be the invalid sentinel: it creates page 0 and
    /// the synthesized missing glyph. Every later font gets the universal
    /// missing glyph cloned into its cache unless it draws a usable glyph 0
    /// of its own.
    pub fn add_font(&mut self, font: &Font) -> Result<()> {
        self.caches.push(Vec::new());

        if self.caches.len() == 1 {
            self.add_page()?;
            self.gen_missing_glyph()?;
        } else {
            self.assign_missing_glyph(font)?;
        }
        Ok(())
    }

    /// Resolve every [`GlyphInfo`] to a [`GlyphImageDesc`], rasterizing and
    /// packing on cache misses.
    pub fn get_glyphs(
        &mut self,
        registry: &FontRegistry,
        infos: &[GlyphInfo],
        out: &mut Vec<GlyphImageDesc>,
    ) -> Result<()> {
        out.reserve(infos.len());
        for info in infos {
            if info.zero_width {
                out.push(GlyphImageDesc::empty(info.font, info.index));
                continue;
            }

            match self.find(info.font, info.index) {
                Some(desc) => out.push(desc),
                None => out.push(self.gen_glyph(registry, info)?),
            }
        }
        Ok(())
    }

    fn find(&self, font: usize, index: u32) -> Option<GlyphImageDesc> {
        let cache = &self.caches[font];
        cache
            .binary_search_by_key(&index, |g| g.index)
            .ok()
            .map(|pos| cache[pos])
    }

    fn insert(&mut self, desc: GlyphImageDesc) {
        let cache = &mut self.caches[desc.font];
        let pos = cache.partition_point(|g| g.index <= desc.index);
        cache.insert(pos, desc);
    }

    fn add_page(&mut self) -> Result<()> {
        self.pages
            .push(ShelfPacker::new(self.atlas_size_px, self.atlas_size_px));
        let index = (self.pages.len() - 1) as u32;
        log::debug!("created atlas page {index} ({} px)", self.atlas_size_px);
        if let Some(sink) = self.sink.as_mut() {
            sink.on_new_atlas(index, self.atlas_size_px);
        }
        Ok(())
    }

    /// Pack a padded rectangle, opening a new page when the current one is
    /// full.
    fn pack(&mut self, w: u32, h: u32) -> Result<(u32, u16, u16)> {
        if let Some((x, y)) = self.pages.last_mut().and_then(|p| p.insert(w, h)) {
            return Ok(((self.pages.len() - 1) as u32, x as u16, y as u16));
        }

        self.add_page()?;
        match self.pages.last_mut().unwrap().insert(w, h) {
            Some((x, y)) => Ok(((self.pages.len() - 1) as u32, x as u16, y as u16)),
            None => Err(AtlasError::GlyphTooLarge {
                width: w,
                height: h,
                atlas_size: self.atlas_size_px,
            }
            .into()),
        }
    }

    fn emit_glyph(&mut self, atlas: u32, offset: (u16, u16), image: &GlyphImage) {
        if let Some(sink) = self.sink.as_mut() {
            sink.on_new_glyph(atlas, offset, image);
        }
    }

    /// Rasterize, pad, SDF-transform, pack, cache, and announce one glyph.
    fn gen_glyph(&mut self, registry: &FontRegistry, info: &GlyphInfo) -> Result<GlyphImageDesc> {
        if info.font == 0 {
            // Font 0 lookups always hit the cached universal missing glyph.
            return Err(AtlasError::InvalidFont.into());
        }

        let raster = registry.font(info.font).render_glyph(info.index)?;

        // Pure spacing glyph: record metrics, skip the texture entirely.
        if raster.width == 0 || raster.height == 0 {
            let desc = GlyphImageDesc {
                font: info.font,
                index: info.index,
                atlas: 0,
                tex_x: 0,
                tex_y: 0,
                sdf_x: self.sdf_offset_px as u16,
                sdf_y: self.sdf_offset_px as u16,
                bearing_x: raster.bearing_x,
                bearing_y: raster.bearing_y,
                width: raster.width,
                height: raster.height,
            };
            self.insert(desc);
            return Ok(desc);
        }

        let pad = self.sdf_offset_px;
        let padded_w = raster.width + 2 * pad;
        let padded_h = raster.height + 2 * pad;
        let (atlas, tex_x, tex_y) = self.pack(padded_w, padded_h)?;

        // Coverage bitmap goes into the interior of the padded buffer.
        let mut pixels = vec![0u8; (padded_w * padded_h) as usize];
        for row in 0..raster.height {
            let src = (row * raster.width) as usize;
            let dst = ((row + pad) * padded_w + pad) as usize;
            pixels[dst..dst + raster.width as usize]
                .copy_from_slice(&raster.pixels[src..src + raster.width as usize]);
        }
        make_distance_map(&mut pixels, padded_w, padded_h);

        let desc = GlyphImageDesc {
            font: info.font,
            index: info.index,
            atlas,
            tex_x,
            tex_y,
            sdf_x: pad as u16,
            sdf_y: pad as u16,
            bearing_x: raster.bearing_x,
            bearing_y: raster.bearing_y,
            width: raster.width,
            height: raster.height,
        };
        self.insert(desc);
        log::debug!(
            "rasterized glyph {} of font {} into atlas {atlas} at ({tex_x},{tex_y})",
            info.index,
            info.font
        );

        let image = GlyphImage {
            width: padded_w,
            height: padded_h,
            pixels,
        };
        self.emit_glyph(atlas, (tex_x, tex_y), &image);
        Ok(desc)
    }

    /// Synthesize the universal missing glyph: a rectangular frame whose
    /// contours sit at fixed fractions of the glyph resolution.
    fn gen_missing_glyph(&mut self) -> Result<()> {
        let dim = self.glyph_res_px;
        let adj = self.sdf_offset_px as f32;
        let th = dim as f32 / 5.0;

        let x0 = (th * 1.0).floor() + adj;
        let x1 = (th * 1.75).floor() + adj;
        let x2 = (th * 3.25).floor() + adj;
        let x3 = (th * 4.0).floor() + adj;

        let y0 = (th * 0.5).floor() + adj;
        let y1 = (th * 1.25).floor() + adj;
        let y2 = (th * 3.75).floor() + adj;
        let y3 = (th * 4.5).floor() + adj;

        let dim_full = dim + 2 * self.sdf_offset_px;
        let mut pixels = vec![0u8; (dim_full * dim_full) as usize];
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = (i as u32 % dim_full) as f32;
            let y = (i as u32 / dim_full) as f32;
            let outer = x > x0 && x < x3 && y > y0 && y < y3;
            let inner = x >= x1 && x <= x2 && y >= y1 && y <= y2;
            if outer && !inner {
                *px = 255;
            }
        }
        make_distance_map(&mut pixels, dim_full, dim_full);

        let (atlas, tex_x, tex_y) = self.pack(dim_full, dim_full)?;

        let desc = GlyphImageDesc {
            font: 0,
            index: 0,
            atlas,
            tex_x,
            tex_y,
            sdf_x: self.sdf_offset_px as u16,
            sdf_y: self.sdf_offset_px as u16,
            bearing_x: 0,
            bearing_y: dim as i32,
            width: dim,
            height: dim,
        };
        self.missing_glyph = desc;
        self.insert(desc);

        let image = GlyphImage {
            width: dim_full,
            height: dim_full,
            pixels,
        };
        self.emit_glyph(atlas, (tex_x, tex_y), &image);
        Ok(())
    }

    /// Clone the universal missing glyph into the newest font's cache when
    /// the font's own glyph 0 is absent or blank.
    fn assign_missing_glyph(&mut self, font: &Font) -> Result<()> {
        let raster = font.render_glyph(0)?;
        if !raster.is_blank() {
            // The font draws a usable glyph 0; it will be rasterized on
            // demand like any other glyph.
            return Ok(());
        }

        let font_index = self.caches.len() - 1;
        let mut clone = self.missing_glyph;
        clone.font = font_index;
        self.insert(clone);
        log::debug!("font {font_index} has a blank glyph 0; using the universal missing glyph");
        Ok(())
    }
}
