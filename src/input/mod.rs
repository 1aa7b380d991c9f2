//! Composite input binds
//!
//! This module maps named binds (combos of one to three physical controls)
//! onto edge-triggered press/hold/release notifications.
//!
//! # Architecture
//!
//! - [`ControlRegistry`] - fixed, ordered list of every physical [`Control`]
//! - [`Bind`] - a named combo with its press state machine
//! - [`BindGroup`] - binds that are validated and disambiguated together
//! - [`BindRegistry`] - named groups, driven once per tick
//!
//! Per tick the host calls [`BindRegistry::handle_input`]; each group polls
//! its controls, resolves overlapping combos so only the longest held combo
//! on a shared control fires, then updates every bind and runs callbacks.
//!
//! # Threading
//!
//! Everything here is single-threaded and synchronous. Only the control
//! registry is shared (read-only, behind an `Arc`).

pub mod actions;
pub mod bind;
pub mod control;
pub mod device;
pub mod error;
pub mod group;
pub mod keynames;
pub mod manager;
pub mod profile;
pub mod registry;


pub use actions::{ActionBinds, BindAction};
pub use bind::{
    Bind, BindCallback, BindEvent, BindEventKind, SubscriptionId, DEFAULT_HOLD_THRESHOLD,
    MAX_COMBO_LEN,
};
pub use control::{Control, ControlId, PollFn};
pub use device::{DeviceState, InputSource, MouseButton, WheelDirection};
pub use error::{BindError, BindResult};
pub use group::{alias_name, split_alias, BindDefinition, BindGroup};
pub use keynames::{key_from_name, key_name, source_from_name};
pub use manager::{BindRegistry, BindSettings};
pub use profile::{BindProfile, ProfileGroup};
pub use registry::{ControlRegistry, ControlRegistryBuilder};
