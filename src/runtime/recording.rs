//! In-memory input runtime.
//!
//! [`RecordingRuntime`] validates every call the way a conformant runtime
//! does and appends it to a call log. It backs the test suite and the
//! `xractions` binary, so the whole action layer can be exercised without a
//! headset.

use crate::error::{Result, XrError};
use crate::runtime::types::{
    ActionCreateInfo, ActionHandle, ActionSetCreateInfo, ActionSetHandle, ActiveActionSet,
    InstanceHandle, InteractionProfileSuggestedBinding, Path, SessionHandle,
};
use crate::runtime::{InputRuntime, Instance, Session};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

/// Longest accepted path string, in bytes
const MAX_PATH_LENGTH: usize = 255;

/// Longest accepted action set or action name, in bytes
const MAX_NAME_LENGTH: usize = 63;

/// Interaction profiles accepted out of the box
const DEFAULT_PROFILES: &[&str] = &[
    "/interaction_profiles/khr/simple_controller",
    "/interaction_profiles/oculus/touch_controller",
    "/interaction_profiles/valve/index_controller",
    "/interaction_profiles/htc/vive_controller",
    "/interaction_profiles/microsoft/motion_controller",
    "/interaction_profiles/microsoft/hand_interaction",
];

/// Kinds of recorded calls, used to select calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    StringToPath,
    CreateActionSet,
    DestroyActionSet,
    CreateAction,
    DestroyAction,
    SuggestInteractionProfileBindings,
    AttachSessionActionSets,
    SyncActions,
}

/// One call received by the runtime, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    StringToPath {
        path: String,
    },
    CreateActionSet {
        info: ActionSetCreateInfo,
    },
    DestroyActionSet {
        action_set: ActionSetHandle,
    },
    CreateAction {
        action_set: ActionSetHandle,
        info: ActionCreateInfo,
    },
    DestroyAction {
        action: ActionHandle,
    },
    SuggestInteractionProfileBindings {
        suggested: InteractionProfileSuggestedBinding,
    },
    AttachSessionActionSets {
        session: SessionHandle,
        action_sets: Vec<ActionSetHandle>,
    },
    SyncActions {
        session: SessionHandle,
        active: Vec<ActiveActionSet>,
    },
}

impl RuntimeCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::StringToPath { .. } => CallKind::StringToPath,
            Self::CreateActionSet { .. } => CallKind::CreateActionSet,
            Self::DestroyActionSet { .. } => CallKind::DestroyActionSet,
            Self::CreateAction { .. } => CallKind::CreateAction,
            Self::DestroyAction { .. } => CallKind::DestroyAction,
            Self::SuggestInteractionProfileBindings { .. } => {
                CallKind::SuggestInteractionProfileBindings
            }
            Self::AttachSessionActionSets { .. } => CallKind::AttachSessionActionSets,
            Self::SyncActions { .. } => CallKind::SyncActions,
        }
    }
}

#[derive(Debug)]
struct ActionSetRecord {
    instance: InstanceHandle,
    name: String,
    localized_name: String,
    actions: Vec<ActionHandle>,
    attached: bool,
}

#[derive(Debug)]
struct ActionRecord {
    action_set: ActionSetHandle,
    name: String,
    localized_name: String,
    subaction_paths: Vec<Path>,
}

#[derive(Debug)]
struct SessionRecord {
    instance: InstanceHandle,
    attached: Option<Vec<ActionSetHandle>>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    path_ids: HashMap<String, Path>,
    path_strings: Vec<String>,
    instances: HashSet<InstanceHandle>,
    sessions: HashMap<SessionHandle, SessionRecord>,
    action_sets: HashMap<ActionSetHandle, ActionSetRecord>,
    actions: HashMap<ActionHandle, ActionRecord>,
    supported_profiles: HashSet<String>,
    calls: Vec<RuntimeCall>,
    injected: HashMap<CallKind, XrError>,
}

impl State {
    fn next_raw(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, call: RuntimeCall) -> Result<()> {
        let kind = call.kind();
        self.calls.push(call);
        match self.injected.remove(&kind) {
            Some(err) => {
                log::debug!("injected failure for {:?}: {}", kind, err);
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn check_instance(&self, instance: InstanceHandle) -> Result<()> {
        if self.instances.contains(&instance) {
            Ok(())
        } else {
            Err(XrError::HandleInvalid { kind: "instance" })
        }
    }

    fn intern(&mut self, path: &str) -> Path {
        if let Some(id) = self.path_ids.get(path) {
            return *id;
        }
        self.path_strings.push(path.to_string());
        let id = Path::from_raw(self.path_strings.len() as u64);
        self.path_ids.insert(path.to_string(), id);
        id
    }

    fn path_str(&self, path: Path) -> Option<&str> {
        let index = path.into_raw().checked_sub(1)? as usize;
        self.path_strings.get(index).map(String::as_str)
    }

    fn is_user_path(&self, path: Path) -> bool {
        self.path_str(path)
            .map_or(false, |p| p.starts_with("/user/"))
    }

    fn describe_path(&self, path: Path) -> String {
        match self.path_str(path) {
            Some(p) => p.to_string(),
            None => path.to_string(),
        }
    }

    fn set_name(&self, handle: ActionSetHandle) -> String {
        self.action_sets
            .get(&handle)
            .map_or_else(|| format!("{:?}", handle), |set| set.name.clone())
    }

    fn action_name(&self, handle: ActionHandle) -> String {
        self.actions.get(&handle).map_or_else(
            || format!("{:?}", handle),
            |action| format!("{}/{}", self.set_name(action.action_set), action.name),
        )
    }
}

fn validate_path_format(path: &str) -> Result<()> {
    let invalid = || XrError::PathFormatInvalid {
        path: path.to_string(),
    };
    if path.len() > MAX_PATH_LENGTH || !path.starts_with('/') || path.ends_with('/') {
        return Err(invalid());
    }
    for component in path[1..].split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(invalid());
        }
        if !component.bytes().all(is_name_byte) {
            return Err(invalid());
        }
    }
    Ok(())
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'_' | b'.')
}

fn validate_names(name: &str, localized_name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH || !name.bytes().all(is_name_byte) {
        return Err(XrError::NameInvalid {
            name: name.to_string(),
        });
    }
    if localized_name.is_empty() {
        return Err(XrError::LocalizedNameInvalid {
            name: localized_name.to_string(),
        });
    }
    Ok(())
}

/// Conformance-checking in-memory runtime with a call log.
#[derive(Debug)]
pub struct RecordingRuntime {
    state: Mutex<State>,
}

impl RecordingRuntime {
    /// Create a runtime accepting the default interaction profiles
    pub fn new() -> Arc<Self> {
        let state = State {
            supported_profiles: DEFAULT_PROFILES.iter().map(|p| p.to_string()).collect(),
            ..State::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn create_instance(self: &Arc<Self>) -> Instance {
        let mut state = self.state.lock();
        let handle = InstanceHandle::from_raw(state.next_raw());
        state.instances.insert(handle);
        log::debug!("created instance {:?}", handle);
        let runtime: Arc<dyn InputRuntime> = Arc::clone(self) as Arc<dyn InputRuntime>;
        Instance::new(handle, runtime)
    }

    pub fn create_session(self: &Arc<Self>, instance: &Instance) -> Result<Session> {
        let mut state = self.state.lock();
        state.check_instance(instance.handle())?;
        let handle = SessionHandle::from_raw(state.next_raw());
        state.sessions.insert(
            handle,
            SessionRecord {
                instance: instance.handle(),
                attached: None,
            },
        );
        log::debug!("created session {:?}", handle);
        let runtime: Arc<dyn InputRuntime> = Arc::clone(self) as Arc<dyn InputRuntime>;
        Ok(Session::new(handle, runtime))
    }

    /// Accept an additional interaction profile
    pub fn add_supported_profile(&self, profile: &str) {
        self.state.lock().supported_profiles.insert(profile.to_string());
    }

    /// Make the next call of `kind` fail with `err`
    pub fn fail_next(&self, kind: CallKind, err: XrError) {
        self.state.lock().injected.insert(kind, err);
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RuntimeCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn path_string(&self, path: Path) -> Option<String> {
        self.state.lock().path_str(path).map(str::to_string)
    }

    pub fn action_set_name(&self, handle: ActionSetHandle) -> Option<String> {
        self.state
            .lock()
            .action_sets
            .get(&handle)
            .map(|set| set.name.clone())
    }

    pub fn is_live_action_set(&self, handle: ActionSetHandle) -> bool {
        self.state.lock().action_sets.contains_key(&handle)
    }

    pub fn is_live_action(&self, handle: ActionHandle) -> bool {
        self.state.lock().actions.contains_key(&handle)
    }

    /// Action sets attached to `session`, if attach has succeeded
    pub fn attached_action_sets(&self, session: SessionHandle) -> Option<Vec<ActionSetHandle>> {
        self.state
            .lock()
            .sessions
            .get(&session)
            .and_then(|s| s.attached.clone())
    }

    /// One-line human readable rendering of a recorded call
    pub fn describe_call(&self, call: &RuntimeCall) -> String {
        let state = self.state.lock();
        match call {
            RuntimeCall::StringToPath { path } => format!("string_to_path {}", path),
            RuntimeCall::CreateActionSet { info } => format!(
                "create_action_set {} ({:?}, priority {})",
                info.name, info.localized_name, info.priority
            ),
            RuntimeCall::DestroyActionSet { action_set } => {
                format!("destroy_action_set {}", state.set_name(*action_set))
            }
            RuntimeCall::CreateAction { action_set, info } => {
                let subaction_paths: Vec<String> = info
                    .subaction_paths
                    .iter()
                    .map(|p| state.describe_path(*p))
                    .collect();
                format!(
                    "create_action {}/{} {:?} [{}]",
                    state.set_name(*action_set),
                    info.name,
                    info.action_type,
                    subaction_paths.join(", ")
                )
            }
            RuntimeCall::DestroyAction { action } => {
                format!("destroy_action {}", state.action_name(*action))
            }
            RuntimeCall::SuggestInteractionProfileBindings { suggested } => {
                let mut out = format!(
                    "suggest_interaction_profile_bindings {} ({} bindings)",
                    state.describe_path(suggested.interaction_profile),
                    suggested.suggested_bindings.len()
                );
                for binding in &suggested.suggested_bindings {
                    let _ = write!(
                        out,
                        "\n    {} -> {}",
                        state.action_name(binding.action),
                        state.describe_path(binding.binding)
                    );
                }
                out
            }
            RuntimeCall::AttachSessionActionSets { action_sets, .. } => {
                let names: Vec<String> = action_sets.iter().map(|h| state.set_name(*h)).collect();
                format!("attach_session_action_sets [{}]", names.join(", "))
            }
            RuntimeCall::SyncActions { active, .. } => {
                let records: Vec<String> = active
                    .iter()
                    .map(|record| {
                        format!(
                            "({}, {})",
                            state.set_name(record.action_set),
                            state.describe_path(record.subaction_path)
                        )
                    })
                    .collect();
                format!("sync_actions [{}]", records.join(", "))
            }
        }
    }
}

impl InputRuntime for RecordingRuntime {
    fn string_to_path(&self, instance: InstanceHandle, path: &str) -> Result<Path> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::StringToPath {
            path: path.to_string(),
        })?;
        state.check_instance(instance)?;
        validate_path_format(path)?;
        let id = state.intern(path);
        log::trace!("string_to_path {} -> {}", path, id);
        Ok(id)
    }

    fn path_to_string(&self, instance: InstanceHandle, path: Path) -> Result<String> {
        let state = self.state.lock();
        state.check_instance(instance)?;
        state
            .path_str(path)
            .map(str::to_string)
            .ok_or_else(|| XrError::PathUnsupported {
                path: path.to_string(),
            })
    }

    fn create_action_set(
        &self,
        instance: InstanceHandle,
        info: &ActionSetCreateInfo,
    ) -> Result<ActionSetHandle> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::CreateActionSet { info: info.clone() })?;
        state.check_instance(instance)?;
        validate_names(&info.name, &info.localized_name)?;

        let siblings = state.action_sets.values().filter(|s| s.instance == instance);
        for sibling in siblings {
            if sibling.name == info.name {
                return Err(XrError::NameDuplicated {
                    name: info.name.clone(),
                });
            }
            if sibling.localized_name == info.localized_name {
                return Err(XrError::LocalizedNameDuplicated {
                    name: info.localized_name.clone(),
                });
            }
        }

        let handle = ActionSetHandle::from_raw(state.next_raw());
        state.action_sets.insert(
            handle,
            ActionSetRecord {
                instance,
                name: info.name.clone(),
                localized_name: info.localized_name.clone(),
                actions: Vec::new(),
                attached: false,
            },
        );
        log::debug!(
            "created action set {} (priority {}) as {:?}",
            info.name,
            info.priority,
            handle
        );
        Ok(handle)
    }

    fn destroy_action_set(&self, action_set: ActionSetHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::DestroyActionSet { action_set })?;
        let record = state
            .action_sets
            .remove(&action_set)
            .ok_or(XrError::HandleInvalid { kind: "action set" })?;
        for action in &record.actions {
            state.actions.remove(action);
        }
        log::debug!("destroyed action set {}", record.name);
        Ok(())
    }

    fn create_action(
        &self,
        action_set: ActionSetHandle,
        info: &ActionCreateInfo,
    ) -> Result<ActionHandle> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::CreateAction {
            action_set,
            info: info.clone(),
        })?;
        let set = state
            .action_sets
            .get(&action_set)
            .ok_or(XrError::HandleInvalid { kind: "action set" })?;
        if set.attached {
            return Err(XrError::ActionSetsAlreadyAttached);
        }
        validate_names(&info.name, &info.localized_name)?;

        for sibling in set.actions.iter().filter_map(|a| state.actions.get(a)) {
            if sibling.name == info.name {
                return Err(XrError::NameDuplicated {
                    name: info.name.clone(),
                });
            }
            if sibling.localized_name == info.localized_name {
                return Err(XrError::LocalizedNameDuplicated {
                    name: info.localized_name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for path in &info.subaction_paths {
            if !state.is_user_path(*path) || !seen.insert(*path) {
                return Err(XrError::PathUnsupported {
                    path: state.describe_path(*path),
                });
            }
        }

        let handle = ActionHandle::from_raw(state.next_raw());
        state.actions.insert(
            handle,
            ActionRecord {
                action_set,
                name: info.name.clone(),
                localized_name: info.localized_name.clone(),
                subaction_paths: info.subaction_paths.clone(),
            },
        );
        if let Some(set) = state.action_sets.get_mut(&action_set) {
            set.actions.push(handle);
        }
        log::debug!("created action {} as {:?}", info.name, handle);
        Ok(handle)
    }

    fn destroy_action(&self, action: ActionHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::DestroyAction { action })?;
        let record = state
            .actions
            .remove(&action)
            .ok_or(XrError::HandleInvalid { kind: "action" })?;
        if let Some(set) = state.action_sets.get_mut(&record.action_set) {
            set.actions.retain(|a| *a != action);
        }
        Ok(())
    }

    fn suggest_interaction_profile_bindings(
        &self,
        instance: InstanceHandle,
        suggested: &InteractionProfileSuggestedBinding,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::SuggestInteractionProfileBindings {
            suggested: suggested.clone(),
        })?;
        state.check_instance(instance)?;

        let profile = state.describe_path(suggested.interaction_profile);
        if !state.supported_profiles.contains(&profile) {
            return Err(XrError::PathUnsupported { path: profile });
        }
        if suggested.suggested_bindings.is_empty() {
            return Err(XrError::validation(format!(
                "no suggested bindings for {}",
                profile
            )));
        }
        for binding in &suggested.suggested_bindings {
            let action = state
                .actions
                .get(&binding.action)
                .ok_or(XrError::HandleInvalid { kind: "action" })?;
            let attached = state
                .action_sets
                .get(&action.action_set)
                .map_or(false, |set| set.attached);
            if attached {
                return Err(XrError::ActionSetsAlreadyAttached);
            }
            if !state.is_user_path(binding.binding) {
                return Err(XrError::PathUnsupported {
                    path: state.describe_path(binding.binding),
                });
            }
        }

        log::debug!(
            "accepted {} bindings for {}",
            suggested.suggested_bindings.len(),
            profile
        );
        Ok(())
    }

    fn attach_session_action_sets(
        &self,
        session: SessionHandle,
        action_sets: &[ActionSetHandle],
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::AttachSessionActionSets {
            session,
            action_sets: action_sets.to_vec(),
        })?;
        let record = state
            .sessions
            .get(&session)
            .ok_or(XrError::HandleInvalid { kind: "session" })?;
        if record.attached.is_some() {
            return Err(XrError::ActionSetsAlreadyAttached);
        }
        if action_sets.is_empty() {
            return Err(XrError::validation("no action sets to attach"));
        }
        let instance = record.instance;
        for handle in action_sets {
            match state.action_sets.get(handle) {
                Some(set) if set.instance == instance => {}
                _ => return Err(XrError::HandleInvalid { kind: "action set" }),
            }
        }

        for handle in action_sets {
            if let Some(set) = state.action_sets.get_mut(handle) {
                set.attached = true;
            }
        }
        if let Some(record) = state.sessions.get_mut(&session) {
            record.attached = Some(action_sets.to_vec());
        }
        log::debug!(
            "attached {} action sets to {:?}",
            action_sets.len(),
            session
        );
        Ok(())
    }

    fn sync_actions(&self, session: SessionHandle, active: &[ActiveActionSet]) -> Result<()> {
        let mut state = self.state.lock();
        state.record(RuntimeCall::SyncActions {
            session,
            active: active.to_vec(),
        })?;
        let record = state
            .sessions
            .get(&session)
            .ok_or(XrError::HandleInvalid { kind: "session" })?;
        if active.is_empty() {
            return Err(XrError::validation("no active action sets"));
        }
        let attached = record.attached.as_deref().unwrap_or(&[]);

        for entry in active {
            if !attached.contains(&entry.action_set) {
                return Err(XrError::ActionSetNotAttached {
                    name: state.set_name(entry.action_set),
                });
            }
            if entry.subaction_path.is_null() {
                continue;
            }
            let declared = state
                .action_sets
                .get(&entry.action_set)
                .map(|set| {
                    set.actions
                        .iter()
                        .filter_map(|a| state.actions.get(a))
                        .flat_map(|a| a.subaction_paths.iter().copied())
                        .collect::<BTreeSet<Path>>()
                })
                .unwrap_or_default();
            if !declared.contains(&entry.subaction_path) {
                return Err(XrError::PathUnsupported {
                    path: state.describe_path(entry.subaction_path),
                });
            }
        }

        log::trace!("synced {} active action set records", active.len());
        Ok(())
    }
}
