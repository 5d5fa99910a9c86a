//! Font ownership for typeflow
//!
//! The registry owns every font the engine knows about: the raw file bytes,
//! the FreeType face loaded from them, and the reserved invalid-font sentinel
//! at index 0. Registry indices are permanent for the registry's lifetime and
//! every other crate refers to fonts by them.
//!
//! The FreeType library itself is process-wide state; [`context::FtContext`]
//! reference-counts it so the library is initialized when the first registry
//! is built and torn down when the last one drops.

pub mod context;
pub mod font;
pub mod registry;

pub use context::FtContext;
pub use font::{Font, RasterGlyph};
pub use registry::FontRegistry;
