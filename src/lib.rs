// bindkit: composite input binds with per-tick disambiguation

pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod script;

pub use cli::Cli;
pub use config::Options;
pub use input::{BindError, BindGroup, BindRegistry, BindResult, ControlRegistry};
pub use logging::LogLevel;
