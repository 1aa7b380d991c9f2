//! Bind registry
//!
//! Owns every [`BindGroup`] by name and drives their per-tick resolution.
//! The registry is a plain value owned by the host; the tick driver holds
//! the only `&mut` to it, so no locking is needed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::bind::{BindEvent, BindEventKind, SubscriptionId, DEFAULT_HOLD_THRESHOLD};
use super::error::{BindError, BindResult};
use super::group::{name_key, BindGroup};
use super::registry::ControlRegistry;

/// Settings shared by every group of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindSettings {
    /// Time a bind must be held before press-and-hold fires
    pub hold_threshold: Duration,
}

impl Default for BindSettings {
    fn default() -> Self {
        Self {
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
        }
    }
}

/// Named collection of bind groups
#[derive(Debug)]
pub struct BindRegistry {
    controls: Arc<ControlRegistry>,
    settings: BindSettings,
    groups: Vec<BindGroup>,
    by_name: HashMap<String, usize>,
}

impl BindRegistry {
    pub fn new(controls: Arc<ControlRegistry>) -> Self {
        Self::with_settings(controls, BindSettings::default())
    }

    pub fn with_settings(controls: Arc<ControlRegistry>, settings: BindSettings) -> Self {
        Self {
            controls,
            settings,
            groups: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn controls(&self) -> &Arc<ControlRegistry> {
        &self.controls
    }

    pub fn settings(&self) -> BindSettings {
        self.settings
    }

    /// Groups in creation order
    pub fn groups(&self) -> &[BindGroup] {
        &self.groups
    }

    /// Create a new group; fails if the name is taken
    pub fn create_group(&mut self, name: &str) -> BindResult<&mut BindGroup> {
        let key = name_key(name);
        if self.by_name.contains_key(&key) {
            return Err(BindError::DuplicateName(name.to_string()));
        }
        Ok(self.insert_group(key, name))
    }

    /// Get a group by name, creating it if needed
    pub fn get_or_create_group(&mut self, name: &str) -> &mut BindGroup {
        let key = name_key(name);
        match self.by_name.get(&key).copied() {
            Some(index) => &mut self.groups[index],
            None => self.insert_group(key, name),
        }
    }

    fn insert_group(&mut self, key: String, name: &str) -> &mut BindGroup {
        let index = self.groups.len();
        self.groups.push(BindGroup::new(
            name,
            Arc::clone(&self.controls),
            self.settings.hold_threshold,
        ));
        self.by_name.insert(key, index);
        log::debug!("Created bind group '{}'", name);
        &mut self.groups[index]
    }

    pub fn get_group(&self, name: &str) -> Option<&BindGroup> {
        self.by_name.get(&name_key(name)).map(|&i| &self.groups[i])
    }

    pub fn get_group_mut(&mut self, name: &str) -> Option<&mut BindGroup> {
        let index = *self.by_name.get(&name_key(name))?;
        self.groups.get_mut(index)
    }

    /// Look up a group, reporting `UnknownGroup` on a miss
    pub fn group(&self, name: &str) -> BindResult<&BindGroup> {
        self.get_group(name)
            .ok_or_else(|| BindError::UnknownGroup(name.to_string()))
    }

    pub fn group_mut(&mut self, name: &str) -> BindResult<&mut BindGroup> {
        self.get_group_mut(name)
            .ok_or_else(|| BindError::UnknownGroup(name.to_string()))
    }

    /// Drop a group and all of its binds. Returns false if it did not exist.
    pub fn unload_group(&mut self, name: &str) -> bool {
        let Some(index) = self.by_name.remove(&name_key(name)) else {
            return false;
        };
        self.groups.remove(index);
        for slot in self.by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        log::debug!("Unloaded bind group '{}'", name);
        true
    }

    /// Subscribe to a bind in a group
    pub fn subscribe<F>(
        &mut self,
        group: &str,
        bind: &str,
        kind: BindEventKind,
        callback: F,
    ) -> BindResult<SubscriptionId>
    where
        F: FnMut(&BindEvent<'_>) + 'static,
    {
        self.group_mut(group)?.subscribe(bind, kind, callback)
    }

    /// Run one tick for every group, in creation order, using the wall clock
    pub fn handle_input(&mut self) {
        self.handle_input_at(Instant::now());
    }

    /// Run one tick for every group at the given tick time
    pub fn handle_input_at(&mut self, now: Instant) {
        for group in &mut self.groups {
            group.handle_input_at(now);
        }
    }
}
