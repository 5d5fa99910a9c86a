//! Error types for the typeflow engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextError>;

/// Top-level error for every public operation
///
/// All variants are fatal to the call that produced them; internal state is
/// left consistent and the caller recovers by discarding the call's outputs.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("font error: {0}")]
    Font(#[from] FontError),

    #[error("atlas error: {0}")]
    Atlas(#[from] AtlasError),

    /// The hint names no usable font. The caller must populate the hint
    /// (or pass one produced by `create_hint`) before layout.
    #[error("hint does not reference any usable font")]
    HintInvalid,

    /// Layout was requested before any font was registered.
    #[error("no fonts have been registered")]
    NoFontsAvailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font registration and rasterizer-face failures
#[derive(Debug, Error)]
pub enum FontError {
    /// The font file was empty or the rasterizer rejected it outright.
    #[error("font file is empty or not a loadable face")]
    FileInvalid,

    #[error("failed to load face for font '{name}': {reason}")]
    LoadFailed { name: String, reason: String },

    /// No Unicode BMP charmap (platform 0/encoding 3 or 3/1) in the face.
    #[error("font '{name}' has no Unicode charmap")]
    CharmapMissing { name: String },
}

/// Glyph rasterization and packing failures
#[derive(Debug, Error)]
pub enum AtlasError {
    /// A glyph was requested for the invalid-font sentinel outside the
    /// missing-glyph path.
    #[error("glyph requested for the invalid font sentinel")]
    InvalidFont,

    /// The padded glyph rectangle exceeds a whole atlas page.
    #[error("glyph of {width}x{height} px does not fit an atlas page of {atlas_size} px")]
    GlyphTooLarge {
        width: u32,
        height: u32,
        atlas_size: u32,
    },

    #[error("rasterizer failure for font '{name}' glyph {index}: {reason}")]
    Rasterizer {
        name: String,
        index: u32,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_error_converts_to_text_error() {
        let err: TextError = FontError::FileInvalid.into();
        assert!(matches!(err, TextError::Font(FontError::FileInvalid)));
    }

    #[test]
    fn messages_name_the_offender() {
        let err = AtlasError::GlyphTooLarge {
            width: 2000,
            height: 80,
            atlas_size: 1024,
        };
        let text = err.to_string();
        assert!(text.contains("2000"));
        assert!(text.contains("1024"));
    }
}
