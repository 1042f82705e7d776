//! Cross-context attach and sync.
//!
//! The runtime wants one binding-suggestion call per interaction profile, a
//! single attach call per session and one sync call per frame covering every
//! active action set. These functions merge any number of independently
//! populated [`ActionContext`]s into exactly those calls.
//!
//! Callers must pass the complete list of live contexts on every call, in a
//! stable order. Any runtime failure aborts the operation immediately and is
//! returned as is; nothing is retried and no partial progress is rolled back.

use crate::context::ActionContext;
use crate::error::Result;
use crate::runtime::{
    ActionSetHandle, ActionSuggestedBinding, ActiveActionSet, Instance,
    InteractionProfileSuggestedBinding, Path, Session,
};
use indexmap::IndexMap;

/// Merge the pending bindings of every context, keyed by interaction profile.
///
/// Binding path strings are resolved here. Profiles appear in the order they
/// were first declared across `contexts`; bindings for a profile keep context
/// order then declaration order. Duplicates are passed through.
pub fn merge_suggested_bindings(
    instance: &Instance,
    contexts: &[&ActionContext],
) -> Result<IndexMap<Path, Vec<ActionSuggestedBinding>>> {
    let mut merged: IndexMap<Path, Vec<ActionSuggestedBinding>> = IndexMap::new();
    for context in contexts {
        for (profile, pending) in context.pending_bindings() {
            let entry = merged.entry(*profile).or_default();
            for binding in pending {
                entry.push(ActionSuggestedBinding {
                    action: binding.action,
                    binding: instance.string_to_path(&binding.binding)?,
                });
            }
        }
    }
    Ok(merged)
}

/// Every action set handle, in context order then creation order
pub fn collect_action_set_handles(contexts: &[&ActionContext]) -> Vec<ActionSetHandle> {
    contexts
        .iter()
        .flat_map(|context| context.action_sets())
        .map(|set| set.handle())
        .collect()
}

/// Expand the active sets of every context into activation records.
///
/// A set without declared sub-action paths yields one wildcard record;
/// otherwise one record per declared path. Inactive sets yield nothing.
pub fn collect_active_action_sets(contexts: &[&ActionContext]) -> Vec<ActiveActionSet> {
    let mut active = Vec::new();
    for set in contexts.iter().flat_map(|context| context.action_sets()) {
        if !set.active() {
            continue;
        }
        let paths = set.declared_subaction_paths();
        if paths.is_empty() {
            active.push(ActiveActionSet {
                action_set: set.handle(),
                subaction_path: Path::NULL,
            });
        } else {
            active.extend(paths.iter().map(|path| ActiveActionSet {
                action_set: set.handle(),
                subaction_path: *path,
            }));
        }
    }
    active
}

/// Suggest every context's bindings and attach all action sets to `session`.
///
/// Issues one suggestion call per interaction profile, stopping at the first
/// rejected profile, then one attach call with every action set. The attach
/// call is skipped when no context owns an action set.
///
/// Attaching is a once-per-session operation. Calling this twice for the same
/// session, or adding bindings afterwards, is a caller error that the runtime
/// reports.
pub fn attach_actions_to_session(
    instance: &Instance,
    session: &Session,
    contexts: &[&ActionContext],
) -> Result<()> {
    let merged = merge_suggested_bindings(instance, contexts)?;
    let runtime = instance.runtime();
    for (interaction_profile, suggested_bindings) in merged {
        let suggested = InteractionProfileSuggestedBinding {
            interaction_profile,
            suggested_bindings,
        };
        runtime.suggest_interaction_profile_bindings(instance.handle(), &suggested)?;
    }

    let handles = collect_action_set_handles(contexts);
    if !handles.is_empty() {
        session
            .runtime()
            .attach_session_action_sets(session.handle(), &handles)?;
    }
    Ok(())
}

/// Sync every active action set of every context for this frame.
///
/// Reflects the activation flags at call time. The sync call is skipped when
/// there is nothing active.
pub fn sync_actions(session: &Session, contexts: &[&ActionContext]) -> Result<()> {
    let active = collect_active_action_sets(contexts);
    if !active.is_empty() {
        session.runtime().sync_actions(session.handle(), &active)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XrError;
    use crate::runtime::{ActionType, CallKind, RecordingRuntime, RuntimeCall};
    use std::sync::Arc;

    const SIMPLE: &str = "/interaction_profiles/khr/simple_controller";
    const TOUCH: &str = "/interaction_profiles/oculus/touch_controller";
    const INDEX: &str = "/interaction_profiles/valve/index_controller";
    const LEFT: &str = "/user/hand/left";
    const RIGHT: &str = "/user/hand/right";

    struct Fixture {
        runtime: Arc<RecordingRuntime>,
        instance: Instance,
        session: Session,
    }

    impl Fixture {
        fn new() -> Self {
            let runtime = RecordingRuntime::new();
            let instance = runtime.create_instance();
            let session = runtime.create_session(&instance).unwrap();
            Self {
                runtime,
                instance,
                session,
            }
        }

        fn context(&self) -> ActionContext {
            ActionContext::new(self.instance.clone())
        }
    }

    #[test]
    fn test_bindings_merge_across_contexts() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let mut b = fx.context();
        let jump = a
            .create_action_set("gameplay", "Gameplay", 0)
            .unwrap()
            .create_action("jump", "Jump", ActionType::BooleanInput, &[LEFT])
            .unwrap();
        let select = b
            .create_action_set("ui", "UI", 1)
            .unwrap()
            .create_action("select", "Select", ActionType::BooleanInput, &[RIGHT])
            .unwrap();

        a.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(jump, "/user/hand/left/input/select/click")],
        )
        .unwrap();
        b.suggest_interaction_profile_bindings(
            TOUCH,
            &[(select, "/user/hand/right/input/a/click")],
        )
        .unwrap();
        b.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(select, "/user/hand/right/input/select/click")],
        )
        .unwrap();

        let merged = merge_suggested_bindings(&fx.instance, &[&a, &b]).unwrap();
        let simple = fx.instance.string_to_path(SIMPLE).unwrap();
        let touch = fx.instance.string_to_path(TOUCH).unwrap();

        assert_eq!(merged.keys().copied().collect::<Vec<_>>(), vec![simple, touch]);
        let simple_actions: Vec<_> = merged[&simple].iter().map(|b| b.action).collect();
        assert_eq!(simple_actions, vec![jump, select]);
        assert_eq!(merged[&touch].len(), 1);
    }

    #[test]
    fn test_duplicate_bindings_pass_through() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let no_paths: &[&str] = &[];
        let jump = a
            .create_action_set("gameplay", "Gameplay", 0)
            .unwrap()
            .create_action("jump", "Jump", ActionType::BooleanInput, no_paths)
            .unwrap();
        let binding = [(jump, "/user/hand/left/input/select/click")];
        a.suggest_interaction_profile_bindings(SIMPLE, &binding).unwrap();
        a.suggest_interaction_profile_bindings(SIMPLE, &binding).unwrap();

        attach_actions_to_session(&fx.instance, &fx.session, &[&a]).unwrap();

        let calls = fx.runtime.calls_of(CallKind::SuggestInteractionProfileBindings);
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            RuntimeCall::SuggestInteractionProfileBindings { suggested } => {
                assert_eq!(suggested.suggested_bindings.len(), 2);
                assert_eq!(suggested.suggested_bindings[0], suggested.suggested_bindings[1]);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn test_attach_one_suggestion_per_profile_then_one_attach() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let mut b = fx.context();
        let no_paths: &[&str] = &[];
        let jump = a
            .create_action_set("gameplay", "Gameplay", 0)
            .unwrap()
            .create_action("jump", "Jump", ActionType::BooleanInput, no_paths)
            .unwrap();
        let menu = b
            .create_action_set("menu", "Menu", 0)
            .unwrap()
            .create_action("open", "Open", ActionType::BooleanInput, no_paths)
            .unwrap();
        a.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(jump, "/user/hand/left/input/select/click")],
        )
        .unwrap();
        a.suggest_interaction_profile_bindings(
            INDEX,
            &[(jump, "/user/hand/left/input/a/click")],
        )
        .unwrap();
        b.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(menu, "/user/hand/left/input/menu/click")],
        )
        .unwrap();
        fx.runtime.clear_calls();

        attach_actions_to_session(&fx.instance, &fx.session, &[&a, &b]).unwrap();

        let kinds: Vec<CallKind> = fx
            .runtime
            .calls()
            .iter()
            .map(RuntimeCall::kind)
            .filter(|kind| *kind != CallKind::StringToPath)
            .collect();
        assert_eq!(
            kinds,
            vec![
                CallKind::SuggestInteractionProfileBindings,
                CallKind::SuggestInteractionProfileBindings,
                CallKind::AttachSessionActionSets,
            ]
        );
        let expected = collect_action_set_handles(&[&a, &b]);
        assert_eq!(fx.runtime.attached_action_sets(fx.session.handle()), Some(expected));
    }

    #[test]
    fn test_attach_skipped_without_action_sets() {
        let fx = Fixture::new();
        let a = fx.context();
        let b = fx.context();

        attach_actions_to_session(&fx.instance, &fx.session, &[&a, &b]).unwrap();
        attach_actions_to_session(&fx.instance, &fx.session, &[]).unwrap();

        assert!(fx.runtime.calls_of(CallKind::AttachSessionActionSets).is_empty());
        assert!(fx
            .runtime
            .calls_of(CallKind::SuggestInteractionProfileBindings)
            .is_empty());
    }

    #[test]
    fn test_failed_profile_stops_remaining_profiles_and_attach() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let no_paths: &[&str] = &[];
        let jump = a
            .create_action_set("gameplay", "Gameplay", 0)
            .unwrap()
            .create_action("jump", "Jump", ActionType::BooleanInput, no_paths)
            .unwrap();
        a.suggest_interaction_profile_bindings(
            "/interaction_profiles/acme/gizmo",
            &[(jump, "/user/hand/left/input/trigger")],
        )
        .unwrap();
        a.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(jump, "/user/hand/left/input/select/click")],
        )
        .unwrap();

        let result = attach_actions_to_session(&fx.instance, &fx.session, &[&a]);

        assert!(matches!(result, Err(XrError::PathUnsupported { .. })));
        assert_eq!(
            fx.runtime
                .calls_of(CallKind::SuggestInteractionProfileBindings)
                .len(),
            1
        );
        assert!(fx.runtime.calls_of(CallKind::AttachSessionActionSets).is_empty());
    }

    #[test]
    fn test_unresolvable_binding_fails_before_any_suggestion() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let no_paths: &[&str] = &[];
        let jump = a
            .create_action_set("gameplay", "Gameplay", 0)
            .unwrap()
            .create_action("jump", "Jump", ActionType::BooleanInput, no_paths)
            .unwrap();
        a.suggest_interaction_profile_bindings(
            SIMPLE,
            &[(jump, "/user/hand/left/input/select/click")],
        )
        .unwrap();
        a.suggest_interaction_profile_bindings(TOUCH, &[(jump, "/user/hand/left/Input")])
            .unwrap();

        let result = attach_actions_to_session(&fx.instance, &fx.session, &[&a]);

        assert!(matches!(result, Err(XrError::PathFormatInvalid { .. })));
        assert!(fx
            .runtime
            .calls_of(CallKind::SuggestInteractionProfileBindings)
            .is_empty());
    }

    #[test]
    fn test_second_attach_is_rejected_by_runtime() {
        let fx = Fixture::new();
        let mut a = fx.context();
        a.create_action_set("gameplay", "Gameplay", 0).unwrap();

        attach_actions_to_session(&fx.instance, &fx.session, &[&a]).unwrap();
        let result = attach_actions_to_session(&fx.instance, &fx.session, &[&a]);

        assert!(matches!(result, Err(XrError::ActionSetsAlreadyAttached)));
    }

    #[test]
    fn test_sync_expands_declared_paths() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let set = a.create_action_set("gameplay", "Gameplay", 0).unwrap();
        set.create_action("jump", "Jump", ActionType::BooleanInput, &[LEFT, RIGHT])
            .unwrap();
        set.create_action("grab", "Grab", ActionType::FloatInput, &[RIGHT, LEFT])
            .unwrap();
        let handle = set.handle();

        let active = collect_active_action_sets(&[&a]);

        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|record| record.action_set == handle));
        assert!(active.iter().all(|record| !record.subaction_path.is_null()));
        assert_ne!(active[0].subaction_path, active[1].subaction_path);
    }

    #[test]
    fn test_sync_skipped_when_nothing_active() {
        let fx = Fixture::new();
        let mut a = fx.context();
        a.create_action_set("gameplay", "Gameplay", 0).unwrap();
        attach_actions_to_session(&fx.instance, &fx.session, &[&a]).unwrap();
        a.set_all_active(false);

        sync_actions(&fx.session, &[&a]).unwrap();
        sync_actions(&fx.session, &[]).unwrap();

        assert!(fx.runtime.calls_of(CallKind::SyncActions).is_empty());
    }

    #[test]
    fn test_sync_reflects_activation_at_call_time() {
        let fx = Fixture::new();
        let mut a = fx.context();
        let id = a.create_action_set("gameplay", "Gameplay", 0).unwrap().id();
        attach_actions_to_session(&fx.instance, &fx.session, &[&a]).unwrap();

        sync_actions(&fx.session, &[&a]).unwrap();
        a.action_set_mut(id).unwrap().set_active(false);
        sync_actions(&fx.session, &[&a]).unwrap();
        a.action_set_mut(id).unwrap().set_active(true);
        sync_actions(&fx.session, &[&a]).unwrap();

        let syncs = fx.runtime.calls_of(CallKind::SyncActions);
        assert_eq!(syncs.len(), 2);
        assert_eq!(syncs[0], syncs[1]);
    }

    #[test]
    fn test_sync_failure_propagates() {
        let fx = Fixture::new();
        let mut a = fx.context();
        a.create_action_set("gameplay", "Gameplay", 0).unwrap();

        let result = sync_actions(&fx.session, &[&a]);

        assert!(matches!(result, Err(XrError::ActionSetNotAttached { .. })));
    }
}
