//! Owned runtime handles.
//!
//! [`Owned`] ties a raw handle to the runtime that created it and destroys it
//! exactly once when dropped.

use crate::error::Result;
use crate::runtime::types::{ActionHandle, ActionSetHandle};
use crate::runtime::InputRuntime;
use std::fmt;
use std::sync::Arc;

/// Raw handle kinds that have a matching destroy primitive.
pub trait Destroy: Copy + fmt::Debug {
    /// Human readable kind, used in log messages
    const KIND: &'static str;

    fn destroy(self, runtime: &dyn InputRuntime) -> Result<()>;
}

impl Destroy for ActionSetHandle {
    const KIND: &'static str = "action set";

    fn destroy(self, runtime: &dyn InputRuntime) -> Result<()> {
        runtime.destroy_action_set(self)
    }
}

impl Destroy for ActionHandle {
    const KIND: &'static str = "action";

    fn destroy(self, runtime: &dyn InputRuntime) -> Result<()> {
        runtime.destroy_action(self)
    }
}

/// Owning wrapper around a raw runtime handle.
pub struct Owned<H: Destroy> {
    raw: H,
    runtime: Arc<dyn InputRuntime>,
}

impl<H: Destroy> Owned<H> {
    /// Take ownership of a handle freshly returned by a create call
    pub fn new(raw: H, runtime: Arc<dyn InputRuntime>) -> Self {
        Self { raw, runtime }
    }

    /// Borrow the raw handle
    pub fn get(&self) -> H {
        self.raw
    }
}

impl<H: Destroy> Drop for Owned<H> {
    fn drop(&mut self) {
        if let Err(err) = self.raw.destroy(self.runtime.as_ref()) {
            log::warn!("failed to destroy {} {:?}: {}", H::KIND, self.raw, err);
        }
    }
}

impl<H: Destroy> fmt::Debug for Owned<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.raw).finish()
    }
}
