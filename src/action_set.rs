//! A group of actions sharing one runtime action set.

use crate::error::Result;
use crate::runtime::{
    ActionCreateInfo, ActionHandle, ActionSetCreateInfo, ActionSetHandle, ActionType, Instance,
    Owned, Path,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Stable identifier of an [`ActionSet`] inside its owning
/// [`ActionContext`](crate::context::ActionContext).
///
/// Identifiers are never reused or invalidated while the context lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionSetId(pub(crate) usize);

/// Actions grouped under one runtime action set.
///
/// Besides owning the runtime handles, the set remembers every sub-action
/// path any of its actions declared. Sync uses that union to emit one
/// activation record per distinct path.
#[derive(Debug)]
pub struct ActionSet {
    id: ActionSetId,
    instance: Instance,
    name: String,
    priority: u32,
    active: bool,
    declared_subaction_paths: BTreeSet<Path>,
    // Field order matters: actions are destroyed before the set that owns them.
    actions: Vec<Owned<ActionHandle>>,
    handle: Owned<ActionSetHandle>,
}

impl ActionSet {
    /// Create the runtime action set. New sets start active.
    pub(crate) fn create(
        id: ActionSetId,
        instance: &Instance,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> Result<Self> {
        let info = ActionSetCreateInfo {
            name: name.to_string(),
            localized_name: localized_name.to_string(),
            priority,
        };
        let runtime = instance.runtime();
        let raw = runtime.create_action_set(instance.handle(), &info)?;

        Ok(Self {
            id,
            instance: instance.clone(),
            name: name.to_string(),
            priority,
            active: true,
            declared_subaction_paths: BTreeSet::new(),
            actions: Vec::new(),
            handle: Owned::new(raw, Arc::clone(runtime)),
        })
    }

    /// Create an action in this set and return its handle.
    ///
    /// `subaction_paths` are resolved first; any resolution or creation
    /// failure leaves the set unchanged.
    pub fn create_action<S: AsRef<str>>(
        &mut self,
        action_name: &str,
        localized_name: &str,
        action_type: ActionType,
        subaction_paths: &[S],
    ) -> Result<ActionHandle> {
        let resolved = self.instance.strings_to_paths(subaction_paths)?;

        let info = ActionCreateInfo {
            name: action_name.to_string(),
            localized_name: localized_name.to_string(),
            action_type,
            subaction_paths: resolved,
        };
        let runtime = self.instance.runtime();
        let raw = runtime.create_action(self.handle.get(), &info)?;

        self.declared_subaction_paths
            .extend(info.subaction_paths.iter().copied());
        self.actions.push(Owned::new(raw, Arc::clone(runtime)));
        Ok(raw)
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Takes effect at the next sync
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn handle(&self) -> ActionSetHandle {
        self.handle.get()
    }

    /// Union of the sub-action paths declared by every action in this set
    pub fn declared_subaction_paths(&self) -> &BTreeSet<Path> {
        &self.declared_subaction_paths
    }

    pub fn id(&self) -> ActionSetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Action handles in creation order
    pub fn actions(&self) -> impl Iterator<Item = ActionHandle> + '_ {
        self.actions.iter().map(Owned::get)
    }
}
