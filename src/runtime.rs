//! Input runtime abstraction.
//!
//! The action layer never talks to a device runtime directly. Everything it
//! needs (path interning, action set and action creation, binding suggestion,
//! session attachment and per-frame sync) goes through the [`InputRuntime`]
//! trait so that a real OpenXR loader and the in-memory [`RecordingRuntime`]
//! are interchangeable.
//!
//! Every method is a single blocking call. A non-success result is returned as
//! an [`XrError`](crate::error::XrError) and callers in this crate propagate it
//! without retrying.

pub mod handle;
pub mod recording;
pub mod types;

pub use handle::{Destroy, Owned};
pub use recording::{CallKind, RecordingRuntime, RuntimeCall};
pub use types::{
    ActionCreateInfo, ActionHandle, ActionSetCreateInfo, ActionSetHandle, ActionSuggestedBinding,
    ActionType, ActiveActionSet, InstanceHandle, InteractionProfileSuggestedBinding, Path,
    SessionHandle,
};

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Core trait for the runtime primitives the action layer consumes.
///
/// Implementations must be thread-safe so they can be shared behind an `Arc`,
/// but the action layer itself only ever calls them from one thread.
pub trait InputRuntime: Send + Sync {
    /// Resolve a path string to its interned identifier
    fn string_to_path(&self, instance: InstanceHandle, path: &str) -> Result<Path>;

    /// Reverse lookup of an interned path
    fn path_to_string(&self, instance: InstanceHandle, path: Path) -> Result<String>;

    fn create_action_set(
        &self,
        instance: InstanceHandle,
        info: &ActionSetCreateInfo,
    ) -> Result<ActionSetHandle>;

    /// Destroy an action set along with any actions still alive inside it
    fn destroy_action_set(&self, action_set: ActionSetHandle) -> Result<()>;

    fn create_action(
        &self,
        action_set: ActionSetHandle,
        info: &ActionCreateInfo,
    ) -> Result<ActionHandle>;

    fn destroy_action(&self, action: ActionHandle) -> Result<()>;

    /// Submit every binding suggestion for one interaction profile
    fn suggest_interaction_profile_bindings(
        &self,
        instance: InstanceHandle,
        suggested: &InteractionProfileSuggestedBinding,
    ) -> Result<()>;

    /// Attach action sets to a session. Allowed once per session.
    fn attach_session_action_sets(
        &self,
        session: SessionHandle,
        action_sets: &[ActionSetHandle],
    ) -> Result<()>;

    /// Declare the active action sets for the current frame
    fn sync_actions(&self, session: SessionHandle, active: &[ActiveActionSet]) -> Result<()>;

    /// Resolve several path strings, stopping at the first failure
    fn strings_to_paths(&self, instance: InstanceHandle, paths: &[&str]) -> Result<Vec<Path>> {
        paths
            .iter()
            .map(|path| self.string_to_path(instance, path))
            .collect()
    }
}

/// An instance: a raw handle plus the runtime that owns it.
///
/// Cloning is cheap and shares the runtime.
#[derive(Clone)]
pub struct Instance {
    handle: InstanceHandle,
    runtime: Arc<dyn InputRuntime>,
}

impl Instance {
    pub fn new(handle: InstanceHandle, runtime: Arc<dyn InputRuntime>) -> Self {
        Self { handle, runtime }
    }

    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    pub fn runtime(&self) -> &Arc<dyn InputRuntime> {
        &self.runtime
    }

    pub fn string_to_path(&self, path: &str) -> Result<Path> {
        self.runtime.string_to_path(self.handle, path)
    }

    pub fn strings_to_paths<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<Path>> {
        let paths: Vec<&str> = paths.iter().map(|p| p.as_ref()).collect();
        self.runtime.strings_to_paths(self.handle, &paths)
    }

    pub fn path_to_string(&self, path: Path) -> Result<String> {
        self.runtime.path_to_string(self.handle, path)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// A session created from an [`Instance`].
#[derive(Clone)]
pub struct Session {
    handle: SessionHandle,
    runtime: Arc<dyn InputRuntime>,
}

impl Session {
    pub fn new(handle: SessionHandle, runtime: Arc<dyn InputRuntime>) -> Self {
        Self { handle, runtime }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn runtime(&self) -> &Arc<dyn InputRuntime> {
        &self.runtime
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
