//! Raw values exchanged with the input runtime.
//!
//! Handles and paths are opaque 64-bit values owned by the runtime. They are
//! `Copy` and carry no lifetime; ownership lives in [`Owned`](super::handle::Owned).

use std::fmt;

macro_rules! raw_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn into_raw(self) -> u64 {
                self.0
            }
        }
    };
}

raw_handle!(
    /// Raw instance handle
    InstanceHandle
);
raw_handle!(
    /// Raw session handle
    SessionHandle
);
raw_handle!(
    /// Raw action set handle
    ActionSetHandle
);
raw_handle!(
    /// Raw action handle
    ActionHandle
);

/// Interned path identifier.
///
/// Equal path strings resolve to equal identifiers within one instance.
/// [`Path::NULL`] is the wildcard used when an action set is synced without a
/// sub-action path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path(u64);

impl Path {
    pub const NULL: Path = Path(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "XR_NULL_PATH")
        } else {
            write!(f, "path#{}", self.0)
        }
    }
}

/// Kind of value an action reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ActionType {
    BooleanInput,
    FloatInput,
    Vector2fInput,
    PoseInput,
    VibrationOutput,
}

/// Parameters for creating an action set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSetCreateInfo {
    pub name: String,
    pub localized_name: String,
    pub priority: u32,
}

/// Parameters for creating an action inside an action set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreateInfo {
    pub name: String,
    pub localized_name: String,
    pub action_type: ActionType,
    pub subaction_paths: Vec<Path>,
}

/// One resolved (action, input path) pair of a binding suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSuggestedBinding {
    pub action: ActionHandle,
    pub binding: Path,
}

/// All binding suggestions for one interaction profile, submitted in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionProfileSuggestedBinding {
    pub interaction_profile: Path,
    pub suggested_bindings: Vec<ActionSuggestedBinding>,
}

/// Activation record submitted at sync time.
///
/// `subaction_path` is [`Path::NULL`] when the set is activated for all
/// sub-action paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveActionSet {
    pub action_set: ActionSetHandle,
    pub subaction_path: Path,
}
