//! Process-wide FreeType library context
//!
//! FreeType wants `FT_Init_FreeType` / `FT_Done_FreeType` paired across the
//! process, not per registry. A `Weak` behind a mutex hands the one live
//! library out to every registry: the first `acquire` initializes it, the
//! last dropped `Arc` tears it down, and a later `acquire` starts a fresh
//! cycle.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use typeflow_core::error::FontError;

static CONTEXT: Mutex<Weak<FtContext>> = Mutex::new(Weak::new());

/// FreeType shares one library across registries, and face creation and
/// destruction on a shared library must be serialized; per-face operations
/// stay on the thread owning the registry.
static FACE_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn face_lock() -> parking_lot::MutexGuard<'static, ()> {
    FACE_LOCK.lock()
}

/// Shared handle to the initialized FreeType library
pub struct FtContext {
    library: freetype::Library,
}

// The mutex above serializes creation and teardown; face operations stay on
// the thread that owns the registry (the engine is single-threaded
// cooperative and registries are not Sync).
unsafe impl Send for FtContext {}
unsafe impl Sync for FtContext {}

impl FtContext {
    /// Get the live library context, initializing FreeType if no registry
    /// currently holds it.
    pub fn acquire() -> Result<Arc<Self>, FontError> {
        let mut slot = CONTEXT.lock();
        if let Some(ctx) = slot.upgrade() {
            return Ok(ctx);
        }

        let library = freetype::Library::init().map_err(|e| FontError::LoadFailed {
            name: "FreeType library".to_owned(),
            reason: e.to_string(),
        })?;
        log::debug!("initialized FreeType library");

        let ctx = Arc::new(FtContext { library });
        *slot = Arc::downgrade(&ctx);
        Ok(ctx)
    }

    pub(crate) fn library(&self) -> &freetype::Library {
        &self.library
    }
}

impl Drop for FtContext {
    fn drop(&mut self) {
        log::debug!("releasing FreeType library");
    }
}
