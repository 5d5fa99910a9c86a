//! A registered font: file bytes plus the FreeType face loaded from them

use std::rc::Rc;

use freetype::face::{Face, LoadFlag};
use freetype::ffi;

use typeflow_core::error::{AtlasError, FontError};

use crate::context::FtContext;

/// An 8-bit coverage bitmap for one glyph, normalized to top-down rows,
/// with pixel metrics already converted from 26.6 fixed point.
#[derive(Debug, Clone)]
pub struct RasterGlyph {
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    /// `width * height` bytes, row-major, top-down.
    pub pixels: Vec<u8>,
}

impl RasterGlyph {
    /// True when the glyph covers no pixels at all. Some fonts define a
    /// glyph 0 box without drawing into it.
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.iter().all(|&p| p == 0)
    }
}

/// One font in the registry, immutable after registration
///
/// Index 0 in the registry is the invalid sentinel: no file, no face. It
/// exists so missing-glyph substitution has a stable font index.
pub struct Font {
    name: String,
    data: Rc<Vec<u8>>,
    face: Option<Face>,
}

impl Font {
    /// The index-0 sentinel.
    pub(crate) fn invalid() -> Self {
        Self {
            name: "invalid".to_owned(),
            data: Rc::new(Vec::new()),
            face: None,
        }
    }

    /// Load a face from font file bytes and prepare it for shaping at
    /// `glyph_res_px`.
    pub(crate) fn load(
        ctx: &FtContext,
        name: &str,
        bytes: Vec<u8>,
        glyph_res_px: u32,
    ) -> Result<Self, FontError> {
        if bytes.is_empty() {
            return Err(FontError::FileInvalid);
        }

        let data = Rc::new(bytes);
        // Face 0 only; collections beyond it are out of scope.
        let _guard = crate::context::face_lock();
        let mut face = ctx
            .library()
            .new_memory_face(Rc::clone(&data), 0)
            .map_err(|_| FontError::FileInvalid)?;

        force_unicode_charmap(&mut face, name)?;

        // FreeType takes char dimensions in 1/64th of a point; at 72 dpi one
        // point is one pixel, so this pins the glyph box to glyph_res_px.
        face.set_char_size((glyph_res_px * 64) as isize, (glyph_res_px * 64) as isize, 72, 72)
            .map_err(|e| FontError::LoadFailed {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            name: name.to_owned(),
            data,
            face: Some(face),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw font file bytes; empty for the sentinel.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_sentinel(&self) -> bool {
        self.face.is_none()
    }

    /// Glyph index for a code point; 0 means not covered (and the sentinel
    /// covers nothing).
    pub fn coverage(&self, c: char) -> u32 {
        match &self.face {
            Some(face) => face.get_char_index(c as usize).unwrap_or(0),
            None => 0,
        }
    }

    /// Ascender, descender, and line height in pixels from the face's size
    /// metrics. `None` for the sentinel.
    pub fn size_metrics_px(&self) -> Option<(i32, i32, u32)> {
        let face = self.face.as_ref()?;
        let m = face.size_metrics()?;
        Some((
            (m.ascender / 64) as i32,
            (m.descender / 64) as i32,
            (m.height / 64) as u32,
        ))
    }

    /// Render a glyph and return its coverage bitmap with top-down rows.
    pub fn render_glyph(&self, index: u32) -> Result<RasterGlyph, AtlasError> {
        let face = self.face.as_ref().ok_or(AtlasError::InvalidFont)?;

        face.load_glyph(index, LoadFlag::RENDER)
            .map_err(|e| AtlasError::Rasterizer {
                name: self.name.clone(),
                index,
                reason: e.to_string(),
            })?;

        let slot = face.glyph();
        let metrics = slot.metrics();
        let width = (metrics.width / 64) as u32;
        let height = (metrics.height / 64) as u32;
        let bearing_x = (metrics.horiBearingX / 64) as i32;
        let bearing_y = (metrics.horiBearingY / 64) as i32;

        let mut pixels = vec![0u8; (width * height) as usize];
        if width > 0 && height > 0 {
            let bitmap = slot.bitmap();
            let bm_width = bitmap.width().max(0) as usize;
            let bm_rows = bitmap.rows().max(0) as usize;
            let pitch = bitmap.pitch();
            let buffer = bitmap.buffer();

            let copy_w = bm_width.min(width as usize);
            let copy_h = bm_rows.min(height as usize);
            for row in 0..copy_h {
                // A negative pitch means the first byte of the buffer is the
                // bottom-left corner.
                let src_row = if pitch >= 0 { row } else { bm_rows - 1 - row };
                let src = src_row * pitch.unsigned_abs() as usize;
                let dst = row * width as usize;
                pixels[dst..dst + copy_w].copy_from_slice(&buffer[src..src + copy_w]);
            }
        }

        Ok(RasterGlyph {
            width,
            height,
            bearing_x,
            bearing_y,
            pixels,
        })
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        if self.face.is_some() {
            let _guard = crate::context::face_lock();
            self.face = None;
        }
    }
}

/// Force a Unicode BMP charmap, as HarfBuzz recommends for FreeType faces.
fn force_unicode_charmap(face: &mut Face, name: &str) -> Result<(), FontError> {
    // The safe API exposes no charmap selection; walk the raw face.
    unsafe {
        let raw = face.raw_mut() as *mut ffi::FT_FaceRec;
        for i in 0..(*raw).num_charmaps {
            let charmap = *(*raw).charmaps.offset(i as isize);
            let platform = (*charmap).platform_id;
            let encoding = (*charmap).encoding_id;
            let unicode_bmp = (platform == 0 && encoding == 3) || (platform == 3 && encoding == 1);
            if unicode_bmp {
                if ffi::FT_Set_Charmap(raw, charmap) == 0 {
                    return Ok(());
                }
                break;
            }
        }
    }

    Err(FontError::CharmapMissing {
        name: name.to_owned(),
    })
}
