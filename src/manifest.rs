//! Action manifests.
//!
//! A manifest describes, in TOML, the action contexts an application creates:
//! their action sets, the actions inside each set and the suggested bindings
//! of every action per interaction profile.
//!
//! ```toml
//! [[contexts]]
//! name = "gameplay"
//!
//! [[contexts.action_sets]]
//! name = "gameplay"
//! localized_name = "Gameplay"
//! priority = 0
//!
//! [[contexts.action_sets.actions]]
//! name = "jump"
//! localized_name = "Jump"
//! type = "boolean_input"
//! subaction_paths = ["/user/hand/left", "/user/hand/right"]
//!
//! [contexts.action_sets.actions.bindings]
//! "/interaction_profiles/khr/simple_controller" = [
//!     "/user/hand/left/input/select/click",
//!     "/user/hand/right/input/select/click",
//! ]
//! ```
//!
//! Building a manifest goes through the public [`ActionContext`] and
//! [`ActionSet`](crate::action_set::ActionSet) API, so the resulting contexts
//! behave exactly like hand-built ones.

use crate::context::ActionContext;
use crate::error::{Result, XrError};
use crate::runtime::{ActionType, Instance};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level manifest document
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionManifest {
    #[serde(default)]
    pub contexts: Vec<ContextSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContextSpec {
    pub name: String,
    #[serde(default)]
    pub action_sets: Vec<ActionSetSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionSetSpec {
    pub name: String,
    pub localized_name: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub name: String,
    pub localized_name: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub subaction_paths: Vec<String>,
    /// Interaction profile path to binding paths, in manifest order
    #[serde(default)]
    pub bindings: IndexMap<String, Vec<String>>,
}

fn default_active() -> bool {
    true
}

/// A context built from a manifest, tagged with its manifest name
#[derive(Debug)]
pub struct ManifestContext {
    pub name: String,
    pub context: ActionContext,
}

impl ActionManifest {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(source)
            .map_err(|e| XrError::config(format!("invalid action manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source).map_err(|e| match e {
            XrError::Config { message } => {
                XrError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// `<config dir>/xractions/actions.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("xractions").join("actions.toml"))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for context in &self.contexts {
            if context.name.is_empty() {
                return Err(XrError::config("context name must not be empty"));
            }
            if !seen.insert(context.name.as_str()) {
                return Err(XrError::config(format!(
                    "duplicate context name: {}",
                    context.name
                )));
            }
        }
        Ok(())
    }

    /// Create every context, action set, action and binding suggestion.
    ///
    /// Stops at the first runtime failure.
    pub fn build(&self, instance: &Instance) -> Result<Vec<ManifestContext>> {
        self.contexts
            .iter()
            .map(|spec| {
                Ok(ManifestContext {
                    name: spec.name.clone(),
                    context: build_context(instance, spec)?,
                })
            })
            .collect()
    }
}

fn build_context(instance: &Instance, spec: &ContextSpec) -> Result<ActionContext> {
    let mut context = ActionContext::new(instance.clone());
    // Profile -> (action, binding path), in manifest order
    let mut bindings: Vec<(&str, Vec<_>)> = Vec::new();

    for set_spec in &spec.action_sets {
        let set = context.create_action_set(
            &set_spec.name,
            &set_spec.localized_name,
            set_spec.priority,
        )?;
        for action_spec in &set_spec.actions {
            let action = set.create_action(
                &action_spec.name,
                &action_spec.localized_name,
                action_spec.action_type,
                &action_spec.subaction_paths,
            )?;
            for (profile, paths) in &action_spec.bindings {
                let index = match bindings.iter().position(|(p, _)| *p == profile.as_str()) {
                    Some(index) => index,
                    None => {
                        bindings.push((profile.as_str(), Vec::new()));
                        bindings.len() - 1
                    }
                };
                bindings[index]
                    .1
                    .extend(paths.iter().map(|path| (action, path.as_str())));
            }
        }
        set.set_active(set_spec.active);
    }

    for (profile, suggested) in &bindings {
        context.suggest_interaction_profile_bindings(profile, suggested)?;
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CallKind, RecordingRuntime};
    use std::io::Write;

    const MANIFEST: &str = r#"
[[contexts]]
name = "gameplay"

[[contexts.action_sets]]
name = "gameplay"
localized_name = "Gameplay"

[[contexts.action_sets.actions]]
name = "jump"
localized_name = "Jump"
type = "boolean_input"
subaction_paths = ["/user/hand/left", "/user/hand/right"]

[contexts.action_sets.actions.bindings]
"/interaction_profiles/khr/simple_controller" = [
    "/user/hand/left/input/select/click",
    "/user/hand/right/input/select/click",
]

[[contexts]]
name = "ui"

[[contexts.action_sets]]
name = "ui"
localized_name = "UI"
priority = 1
active = false

[[contexts.action_sets.actions]]
name = "select"
localized_name = "Select"
type = "boolean_input"

[contexts.action_sets.actions.bindings]
"/interaction_profiles/khr/simple_controller" = ["/user/hand/right/input/select/click"]
"/interaction_profiles/oculus/touch_controller" = ["/user/hand/right/input/a/click"]
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = ActionManifest::from_toml_str(MANIFEST).unwrap();

        assert_eq!(manifest.contexts.len(), 2);
        let gameplay = &manifest.contexts[0].action_sets[0];
        assert_eq!(gameplay.priority, 0);
        assert!(gameplay.active);
        assert_eq!(gameplay.actions[0].action_type, ActionType::BooleanInput);
        assert_eq!(gameplay.actions[0].subaction_paths.len(), 2);

        let ui = &manifest.contexts[1].action_sets[0];
        assert_eq!(ui.priority, 1);
        assert!(!ui.active);
        assert!(ui.actions[0].subaction_paths.is_empty());
        assert_eq!(ui.actions[0].bindings.len(), 2);
    }

    #[test]
    fn test_build_contexts() {
        let manifest = ActionManifest::from_toml_str(MANIFEST).unwrap();
        let runtime = RecordingRuntime::new();
        let instance = runtime.create_instance();

        let built = manifest.build(&instance).unwrap();

        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name, "gameplay");
        let gameplay = built[0].context.action_sets().next().unwrap();
        assert!(gameplay.active());
        assert_eq!(gameplay.declared_subaction_paths().len(), 2);
        let ui = built[1].context.action_sets().next().unwrap();
        assert!(!ui.active());
        assert_eq!(built[1].context.pending_bindings().len(), 2);
        assert_eq!(runtime.calls_of(CallKind::CreateAction).len(), 2);
    }

    #[test]
    fn test_profiles_keep_manifest_order() {
        let source = r#"
[[contexts]]
name = "gameplay"
[[contexts.action_sets]]
name = "gameplay"
localized_name = "Gameplay"
[[contexts.action_sets.actions]]
name = "jump"
localized_name = "Jump"
type = "boolean_input"
[contexts.action_sets.actions.bindings]
"/interaction_profiles/valve/index_controller" = ["/user/hand/left/input/a/click"]
"/interaction_profiles/khr/simple_controller" = ["/user/hand/left/input/select/click"]
"#;
        let manifest = ActionManifest::from_toml_str(source).unwrap();
        let profiles: Vec<&str> = manifest.contexts[0].action_sets[0].actions[0]
            .bindings
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            profiles,
            vec![
                "/interaction_profiles/valve/index_controller",
                "/interaction_profiles/khr/simple_controller",
            ]
        );

        let runtime = RecordingRuntime::new();
        let instance = runtime.create_instance();
        let built = manifest.build(&instance).unwrap();
        let merged =
            crate::protocol::merge_suggested_bindings(&instance, &[&built[0].context]).unwrap();
        let merged_profiles: Vec<String> = merged
            .keys()
            .map(|profile| instance.path_to_string(*profile).unwrap())
            .collect();
        assert_eq!(merged_profiles, profiles);
    }

    #[test]
    fn test_unknown_action_type_rejected() {
        let source = r#"
[[contexts]]
name = "gameplay"
[[contexts.action_sets]]
name = "gameplay"
localized_name = "Gameplay"
[[contexts.action_sets.actions]]
name = "jump"
localized_name = "Jump"
type = "button"
"#;
        let result = ActionManifest::from_toml_str(source);
        assert!(matches!(result, Err(XrError::Config { .. })));
    }

    #[test]
    fn test_duplicate_context_names_rejected() {
        let source = "[[contexts]]\nname = \"a\"\n[[contexts]]\nname = \"a\"\n";
        let err = ActionManifest::from_toml_str(source).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: duplicate context name: a");
    }

    #[test]
    fn test_runtime_failure_during_build_propagates() {
        let source = r#"
[[contexts]]
name = "gameplay"
[[contexts.action_sets]]
name = "Game Play"
localized_name = "Gameplay"
"#;
        let manifest = ActionManifest::from_toml_str(source).unwrap();
        let runtime = RecordingRuntime::new();
        let result = manifest.build(&runtime.create_instance());
        assert!(matches!(result, Err(XrError::NameInvalid { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = ActionManifest::load(file.path()).unwrap();
        assert_eq!(manifest.contexts.len(), 2);

        let missing = ActionManifest::load(Path::new("/nonexistent/actions.toml"));
        assert!(matches!(missing, Err(XrError::Io(_))));
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = ActionManifest::default_path() {
            assert!(path.ends_with("xractions/actions.toml"));
        }
    }
}
