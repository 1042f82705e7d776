//! # xractions - XR input action aggregation
//!
//! Lets independent application subsystems each declare their own input
//! actions, action sets and controller bindings, then merges all of them into
//! the small number of batched calls an XR input runtime accepts.
//!
//! ## Features
//!
//! - **Per-subsystem contexts**: every subsystem owns an [`ActionContext`]
//! - **Single attach**: one binding suggestion per interaction profile, one
//!   attach call per session, across all contexts
//! - **Per-frame sync**: active action sets expanded into one record per
//!   declared sub-action path
//! - **Action manifests**: contexts described in TOML (feature `config`)
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`runtime`] - Input runtime abstraction, owned handles, in-memory runtime
//! - [`action_set`] - Action sets and their declared sub-action paths
//! - [`context`] - Per-subsystem action contexts
//! - [`protocol`] - Cross-context attach and sync
//! - `manifest` - TOML action manifests
//!
//! ## Threading
//!
//! Contexts and the protocol functions are used from the single thread that
//! drives the runtime session. Concurrent use is not supported.

// Core modules
pub mod error;
pub mod runtime;

// Action layer
pub mod action_set;
pub mod context;
pub mod protocol;

#[cfg(feature = "config")]
pub mod manifest;

// Re-export commonly used types for convenience
pub use error::{Result, XrError};

// Public API surface for external usage
pub use action_set::{ActionSet, ActionSetId};
pub use context::ActionContext;
pub use protocol::{attach_actions_to_session, sync_actions};
pub use runtime::{ActionType, InputRuntime, Instance, Path, Session};

#[cfg(feature = "config")]
pub use manifest::ActionManifest;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
