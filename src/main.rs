use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use bindkit::cli::{Cli, Command};
use bindkit::config::Options;
use bindkit::input::{BindProfile, BindRegistry, ControlRegistry, DeviceState};
use bindkit::logging;
use bindkit::script::TickScript;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.merge_into_options(Options::default())?;
    logging::init(options.log_level);
    log::debug!("Options: {:?}", options);

    let command = cli.command.clone().unwrap_or(Command::Controls { filter: None });
    match command {
        Command::Controls { filter } => {
            list_controls(filter.as_deref());
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { profile } => check(&options, &profile),
        Command::Simulate { profile, script } => simulate(&options, &profile, &script),
    }
}

fn new_registry(options: &Options) -> (DeviceState, BindRegistry) {
    let device = DeviceState::new();
    let controls = Arc::new(ControlRegistry::standard(&device));
    let registry = BindRegistry::with_settings(controls, options.bind_settings());
    (device, registry)
}

fn list_controls(filter: Option<&str>) {
    let device = DeviceState::new();
    let controls = ControlRegistry::standard(&device);
    let filter = filter.map(str::to_lowercase);

    for control in controls.iter() {
        if let Some(ref text) = filter {
            if !control.name().to_lowercase().contains(text.as_str()) {
                continue;
            }
        }
        let kind = if control.is_analog() { "analog" } else { "digital" };
        println!("{:>4}  {:<16} {}", control.index(), control.name(), kind);
    }
}

fn check(options: &Options, path: &Path) -> Result<ExitCode> {
    let profile = BindProfile::load(path)?;
    let (_device, mut registry) = new_registry(options);

    if let Err(err) = profile.apply(&mut registry) {
        println!("{}: {}", path.display(), err);
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "{}: profile '{}' OK ({} binds)",
        path.display(),
        profile.name,
        profile.binding_count()
    );
    for group in registry.groups() {
        println!("  [{}] {} binds", group.name(), group.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn simulate(options: &Options, profile_path: &Path, script_path: &Path) -> Result<ExitCode> {
    let profile = BindProfile::load(profile_path)?;
    let script = TickScript::load(script_path)?;
    let (device, mut registry) = new_registry(options);

    profile
        .apply(&mut registry)
        .with_context(|| format!("Failed to apply bind profile {}", profile_path.display()))?;

    log::info!(
        "Replaying {} ticks ({:?}) against profile '{}'",
        script.ticks.len(),
        script.duration(),
        profile.name
    );

    let events = script.run(&device, &mut registry, Instant::now());
    for event in &events {
        println!(
            "tick {:>4}  {}/{}  {:?}  held {}ms",
            event.tick,
            event.group,
            event.bind,
            event.kind,
            event.held_for.as_millis()
        );
    }
    Ok(ExitCode::SUCCESS)
}
