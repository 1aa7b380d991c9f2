use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{parse_hold_threshold, parse_log_level, Options};

/// Composite input bind toolkit
#[derive(Parser, Debug, Default)]
#[command(name = "bindkit")]
#[command(version)]
#[command(about = "Inspect, validate, and replay composite input bind profiles", long_about = None)]
pub struct Cli {
    /// Log level (nothing, user, error, warning, info, debug, all)
    #[arg(short, long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Press-and-hold threshold in milliseconds (or with a ms/s suffix)
    #[arg(long = "hold-ms", global = true, value_name = "DURATION")]
    pub hold_ms: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every standard control
    Controls {
        /// Only show controls whose name contains this text
        #[arg(short, long, value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Load a bind profile and report whether every group applies cleanly
    Check {
        /// Bind profile file
        profile: PathBuf,
    },

    /// Replay a tick script against a bind profile and print every bind event
    Simulate {
        /// Bind profile file
        profile: PathBuf,

        /// Tick script file
        script: PathBuf,
    },
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref level) = self.log_level {
            opts.log_level = parse_log_level(level).context("Invalid --log-level")?;
        }

        if let Some(ref hold) = self.hold_ms {
            opts.hold_threshold = parse_hold_threshold(hold).context("Invalid --hold-ms")?;
        }

        match self.command {
            Some(Command::Check { ref profile }) | Some(Command::Simulate { ref profile, .. }) => {
                opts.profile = Some(profile.clone());
            }
            _ => {}
        }

        Ok(opts)
    }
}
