//! Per-subsystem collection of action sets and pending binding suggestions.
//!
//! An application may run several independent subsystems (gameplay, menus,
//! tools), each declaring its own actions. Every subsystem owns one
//! [`ActionContext`]; the [`protocol`](crate::protocol) functions merge all
//! contexts into the batched calls the runtime expects.

use crate::action_set::{ActionSet, ActionSetId};
use crate::error::Result;
use crate::runtime::{ActionHandle, Instance, Path};
use indexmap::IndexMap;

/// A binding declared by a context, resolved lazily at attach time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingBinding {
    pub(crate) action: ActionHandle,
    pub(crate) binding: String,
}

/// Owns the action sets and binding suggestions of one subsystem.
///
/// Action sets live at stable indices: an [`ActionSetId`] returned for a set
/// stays valid for the lifetime of the context no matter how many sets are
/// created afterwards. Sets are never removed or reordered.
///
/// Contexts are meant to be used from a single thread, the one driving the
/// runtime session.
#[derive(Debug)]
pub struct ActionContext {
    instance: Instance,
    action_sets: Vec<ActionSet>,
    bindings: IndexMap<Path, Vec<PendingBinding>>,
}

impl ActionContext {
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            action_sets: Vec::new(),
            bindings: IndexMap::new(),
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Create a new action set owned by this context.
    ///
    /// The returned reference can be used right away to add actions; later
    /// access goes through [`ActionSet::id`] and [`Self::action_set_mut`].
    pub fn create_action_set(
        &mut self,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> Result<&mut ActionSet> {
        let id = ActionSetId(self.action_sets.len());
        let set = ActionSet::create(id, &self.instance, name, localized_name, priority)?;
        self.action_sets.push(set);
        Ok(&mut self.action_sets[id.0])
    }

    /// Queue binding suggestions for an interaction profile.
    ///
    /// Repeated calls for the same profile accumulate. Binding paths are kept
    /// as strings until attach time and are not deduplicated.
    pub fn suggest_interaction_profile_bindings<S: AsRef<str>>(
        &mut self,
        interaction_profile: &str,
        bindings: &[(ActionHandle, S)],
    ) -> Result<()> {
        let profile = self.instance.string_to_path(interaction_profile)?;
        if bindings.is_empty() {
            return Ok(());
        }
        let pending = self.bindings.entry(profile).or_default();
        pending.extend(bindings.iter().map(|(action, binding)| PendingBinding {
            action: *action,
            binding: binding.as_ref().to_string(),
        }));
        Ok(())
    }

    pub fn action_set(&self, id: ActionSetId) -> Option<&ActionSet> {
        self.action_sets.get(id.0)
    }

    pub fn action_set_mut(&mut self, id: ActionSetId) -> Option<&mut ActionSet> {
        self.action_sets.get_mut(id.0)
    }

    pub fn find_action_set(&self, name: &str) -> Option<ActionSetId> {
        self.action_sets
            .iter()
            .find(|set| set.name() == name)
            .map(ActionSet::id)
    }

    /// Action sets in creation order
    pub fn action_sets(&self) -> impl Iterator<Item = &ActionSet> + '_ {
        self.action_sets.iter()
    }

    pub fn set_all_active(&mut self, active: bool) {
        for set in &mut self.action_sets {
            set.set_active(active);
        }
    }

    /// Pending bindings keyed by interaction profile, in first-declared order.
    ///
    /// Only the merge functions in [`protocol`](crate::protocol) read this.
    pub(crate) fn pending_bindings(&self) -> &IndexMap<Path, Vec<PendingBinding>> {
        &self.bindings
    }
}
