//! Control registry
//!
//! Holds the fixed, ordered list of every [`Control`] plus a
//! case-insensitive name lookup. Built once at startup and shared read-only
//! (usually behind an `Arc`) by every bind group.

use std::collections::HashMap;
use std::sync::Arc;

use super::control::{Control, ControlId, PollFn};
use super::device::DeviceState;
use super::error::{BindError, BindResult};
use super::group::name_key;
use super::keynames::{is_blacklisted, standard_controls};

/// The process-wide list of controls
#[derive(Debug, Default)]
pub struct ControlRegistry {
    controls: Vec<Control>,
    by_name: HashMap<String, ControlId>,
}

impl ControlRegistry {
    /// Start building a custom control list
    pub fn builder() -> ControlRegistryBuilder {
        ControlRegistryBuilder::default()
    }

    /// Standard keyboard, mouse, wheel, and joystick controls polling `device`
    pub fn standard(device: &DeviceState) -> Self {
        let mut builder = Self::builder();
        for entry in standard_controls() {
            let reader = device.clone();
            let source = entry.source;
            let poll: PollFn = Arc::new(move || reader.is_active(source));
            builder.push(entry.name, entry.analog, poll);
        }
        // Standard names are unique by construction
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Get a control by id
    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.index())
    }

    /// Find a control by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&Control> {
        self.by_name
            .get(&name_key(name))
            .and_then(|id| self.get(*id))
    }

    /// Resolve a control name to its id
    pub fn lookup(&self, name: &str) -> BindResult<ControlId> {
        self.find(name)
            .map(Control::id)
            .ok_or_else(|| BindError::UnknownControl(name.to_string()))
    }

    /// Resolve a list of control names, failing on the first unknown one
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> BindResult<Vec<ControlId>> {
        names.iter().map(|n| self.lookup(n.as_ref())).collect()
    }

    /// Check that an id belongs to this registry
    pub fn check(&self, id: ControlId) -> BindResult<&Control> {
        self.get(id)
            .ok_or_else(|| BindError::UnknownControl(id.to_string()))
    }

    /// Name of a control, or a placeholder for foreign ids
    pub fn name_of(&self, id: ControlId) -> &str {
        self.get(id).map(Control::name).unwrap_or("?")
    }

    /// All controls in index order
    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }
}

/// Builder for a [`ControlRegistry`]
#[derive(Default)]
pub struct ControlRegistryBuilder {
    controls: Vec<Control>,
    by_name: HashMap<String, ControlId>,
    duplicate: Option<String>,
}

impl ControlRegistryBuilder {
    /// Add a digital (held) control
    pub fn digital<F>(mut self, name: &str, poll: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.push(name.to_string(), false, Arc::new(poll));
        self
    }

    /// Add an analog (momentary) control
    pub fn analog<F>(mut self, name: &str, poll: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.push(name.to_string(), true, Arc::new(poll));
        self
    }

    fn push(&mut self, name: String, analog: bool, poll: PollFn) {
        if is_blacklisted(&name) {
            log::trace!("Skipping blacklisted control '{}'", name);
            return;
        }

        let key = name_key(&name);
        if self.by_name.contains_key(&key) {
            if self.duplicate.is_none() {
                self.duplicate = Some(name);
            }
            return;
        }

        let id = ControlId(self.controls.len() as u32);
        self.by_name.insert(key, id);
        self.controls.push(Control::new(id, name, analog, poll));
    }

    fn finish(self) -> ControlRegistry {
        ControlRegistry {
            controls: self.controls,
            by_name: self.by_name,
        }
    }

    /// Finish the registry, rejecting duplicate names
    pub fn build(self) -> BindResult<ControlRegistry> {
        if let Some(name) = self.duplicate {
            return Err(BindError::DuplicateName(name));
        }
        let registry = self.finish();
        log::debug!("Control registry built with {} controls", registry.len());
        Ok(registry)
    }
}
