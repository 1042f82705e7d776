//! xractions - run an action manifest against the in-memory runtime
//!
//! Builds every context of a manifest, attaches them to a session, syncs a
//! number of frames and prints the runtime calls that resulted.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use xractions::runtime::{CallKind, RecordingRuntime};
use xractions::{attach_actions_to_session, sync_actions, ActionContext, ActionManifest};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("xractions")
        .version(xractions::VERSION)
        .about("Simulate attaching and syncing an XR action manifest")
        .long_about(
            "xractions builds the action contexts described by a TOML manifest, attaches \
             them to a simulated session and syncs frames, printing every runtime call.",
        )
        .arg(
            Arg::new("manifest")
                .help(
                    "Path to the action manifest \
                     (defaults to <config dir>/xractions/actions.toml)",
                )
                .index(1),
        )
        .arg(
            Arg::new("frames")
                .long("frames")
                .short('n')
                .help("Number of frames to sync")
                .value_parser(clap::value_parser!(u32))
                .default_value("1"),
        )
        .arg(
            Arg::new("deactivate")
                .long("deactivate")
                .short('d')
                .help("Action set to deactivate before syncing (repeatable)")
                .action(ArgAction::Append),
        )
        .get_matches();

    let manifest_path = match matches.get_one::<String>("manifest") {
        Some(path) => PathBuf::from(path),
        None => ActionManifest::default_path()
            .context("no manifest given and no platform config directory")?,
    };
    let frames = matches.get_one::<u32>("frames").copied().unwrap_or(1);
    let deactivate: Vec<&String> = matches
        .get_many::<String>("deactivate")
        .map(|values| values.collect())
        .unwrap_or_default();

    let manifest = ActionManifest::load(&manifest_path)
        .with_context(|| format!("loading {}", manifest_path.display()))?;

    let runtime = RecordingRuntime::new();
    let instance = runtime.create_instance();
    let session = runtime.create_session(&instance)?;

    let mut built = manifest.build(&instance)?;
    log::info!("built {} action contexts", built.len());

    for name in &deactivate {
        let mut found = false;
        for entry in &mut built {
            if let Some(id) = entry.context.find_action_set(name) {
                if let Some(set) = entry.context.action_set_mut(id) {
                    set.set_active(false);
                    found = true;
                }
            }
        }
        if !found {
            anyhow::bail!("no action set named {}", name);
        }
    }

    let contexts: Vec<&ActionContext> = built.iter().map(|entry| &entry.context).collect();
    runtime.clear_calls();

    attach_actions_to_session(&instance, &session, &contexts)?;
    for frame in 0..frames {
        log::debug!("sync frame {}", frame);
        sync_actions(&session, &contexts)?;
    }

    for call in runtime.calls() {
        if call.kind() != CallKind::StringToPath {
            println!("{}", runtime.describe_call(&call));
        }
    }

    Ok(())
}
