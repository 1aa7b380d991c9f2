//! Bind groups
//!
//! A [`BindGroup`] is a conflict-resolution domain: binds inside it cannot
//! share an identical combo, and every tick they are disambiguated against
//! each other so that only the longest fully-held combo on any shared
//! control reports pressed.
//!
//! # Tick resolution
//!
//! 1. **Hit accumulation** - every bind counts how many of its controls are
//!    down. A bind that was pressed (or is already latched) and now has only
//!    part of its combo down is kept at full count with the releasing latch
//!    set, so combos released over several ticks do not re-trigger shorter
//!    binds. Partial counts are then dropped.
//! 2. **Disambiguation** (only with more than one pressed bind) - for each
//!    used control, the longest bind with hits on it wins; every other bind
//!    with hits on that control loses one hit, which disqualifies it.
//! 3. **Commit** - each bind's state machine is updated and its callbacks fire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::bind::{Bind, BindEvent, BindEventKind, SubscriptionId, MAX_COMBO_LEN};
use super::control::{Control, ControlId};
use super::error::{BindError, BindResult};
use super::registry::ControlRegistry;

/// Lookup key for case-insensitive names
pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Name of the `n`th alias bind of `name` (n starts at 1)
pub fn alias_name(name: &str, n: usize) -> String {
    format!("{}#{}", name, n)
}

/// Split an alias bind name into its base name and alias number
pub fn split_alias(name: &str) -> Option<(&str, usize)> {
    let (base, suffix) = name.rsplit_once('#')?;
    match suffix.parse::<usize>() {
        Ok(n) if n >= 1 && !base.is_empty() => Some((base, n)),
        _ => None,
    }
}

/// One entry of a bind configuration, as decoded from a profile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindDefinition {
    pub name: String,
    /// Control names of the combo, in display order
    pub control_names: Vec<String>,
    /// Alternate combos, each registered as `<name>#<n>`
    pub aliases: Vec<Vec<String>>,
}

impl BindDefinition {
    pub fn new<S: Into<String>>(name: &str, control_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            control_names: control_names.into_iter().map(Into::into).collect(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias<S: Into<String>>(mut self, control_names: impl IntoIterator<Item = S>) -> Self {
        self.aliases
            .push(control_names.into_iter().map(Into::into).collect());
        self
    }
}

/// Saved reconfigurable state, restored when a batch fails
struct GroupSnapshot {
    bind_count: usize,
    binds: Vec<(Vec<ControlId>, bool, bool)>,
    by_name: HashMap<String, usize>,
    control_to_binds: HashMap<ControlId, Vec<usize>>,
    used_controls: Vec<ControlId>,
}

/// An ordered collection of binds resolved against each other every tick
pub struct BindGroup {
    name: String,
    controls: Arc<ControlRegistry>,
    hold_threshold: Duration,
    binds: Vec<Bind>,
    by_name: HashMap<String, usize>,
    /// Reverse index; every entry is non-empty
    control_to_binds: HashMap<ControlId, Vec<usize>>,
    /// Controls referenced by at least one bind, in order of first use
    used_controls: Vec<ControlId>,
}

impl BindGroup {
    pub fn new(name: &str, controls: Arc<ControlRegistry>, hold_threshold: Duration) -> Self {
        Self {
            name: name.to_string(),
            controls,
            hold_threshold,
            binds: Vec::new(),
            by_name: HashMap::new(),
            control_to_binds: HashMap::new(),
            used_controls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controls(&self) -> &ControlRegistry {
        &self.controls
    }

    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    /// All binds in registration order
    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name_key(name)).copied()
    }

    fn require(&self, name: &str) -> BindResult<usize> {
        self.index_of(name)
            .ok_or_else(|| BindError::UnknownBind(name.to_string()))
    }

    /// Look up a bind by name (case-insensitive)
    pub fn bind(&self, name: &str) -> Option<&Bind> {
        self.index_of(name).map(|i| &self.binds[i])
    }

    pub fn bind_mut(&mut self, name: &str) -> Option<&mut Bind> {
        let index = self.index_of(name)?;
        self.binds.get_mut(index)
    }

    pub fn bind_at(&self, index: usize) -> Option<&Bind> {
        self.binds.get(index)
    }

    /// Controls referenced by at least one bind
    pub fn used_controls(&self) -> &[ControlId] {
        &self.used_controls
    }

    /// Indices of the binds whose combo contains `control`
    pub fn binds_using(&self, control: ControlId) -> &[usize] {
        self.control_to_binds
            .get(&control)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // === Registration ===

    /// Register a new bind, optionally with an initial combo
    ///
    /// Fails with `DuplicateName` if the name is taken, or with the combo's
    /// validation error; in both cases nothing is registered.
    pub fn register(&mut self, name: &str, combo: Option<&[ControlId]>) -> BindResult<usize> {
        let key = name_key(name);
        if self.by_name.contains_key(&key) {
            return Err(BindError::DuplicateName(name.to_string()));
        }

        let prepared = match combo {
            Some(combo) => Some(self.prepare_combo(name, combo, None)?),
            None => None,
        };

        let index = self.binds.len();
        self.binds.push(Bind::new(name.to_string(), index));
        self.by_name.insert(key, index);
        if let Some((combo, analog)) = prepared {
            self.apply_combo(index, combo, analog);
        }

        log::debug!(
            "Registered bind '{}' in group '{}' as {}",
            name,
            self.name,
            self.describe(&self.binds[index])
        );
        Ok(index)
    }

    /// Register a bind with a combo given by control names
    pub fn register_by_names<S: AsRef<str>>(&mut self, name: &str, controls: &[S]) -> BindResult<usize> {
        let combo = self.controls.resolve(controls)?;
        self.register(name, Some(&combo))
    }

    /// Rebind an existing bind to a new combo
    pub fn set_combo(&mut self, name: &str, combo: &[ControlId]) -> BindResult<()> {
        let index = self.require(name)?;
        let (combo, analog) = self.prepare_combo(name, combo, Some(index))?;
        self.apply_combo(index, combo, analog);
        log::debug!(
            "Rebound '{}' in group '{}' to {}",
            name,
            self.name,
            self.describe(&self.binds[index])
        );
        Ok(())
    }

    /// Rebind an existing bind using control names
    pub fn set_combo_by_names<S: AsRef<str>>(&mut self, name: &str, controls: &[S]) -> BindResult<()> {
        let combo = self.controls.resolve(controls)?;
        self.set_combo(name, &combo)
    }

    /// Unbind: the bind stays registered but can no longer be pressed
    pub fn clear_combo(&mut self, name: &str) -> BindResult<()> {
        let index = self.require(name)?;
        self.apply_combo(index, Vec::new(), false);
        log::debug!("Cleared combo of '{}' in group '{}'", name, self.name);
        Ok(())
    }

    /// Current combo of a bind
    pub fn combo(&self, name: &str) -> BindResult<&[ControlId]> {
        let index = self.require(name)?;
        Ok(self.binds[index].combo())
    }

    /// Current combo of a bind as control names
    pub fn combo_names(&self, name: &str) -> BindResult<Vec<&str>> {
        let combo = self.combo(name)?;
        Ok(combo.iter().map(|id| self.controls.name_of(*id)).collect())
    }

    /// Find the bind (other than `except`) that already owns this exact set of controls
    ///
    /// Control order does not matter. Pure query, used before committing a rebind.
    pub fn does_combo_conflict(&self, combo: &[ControlId], except: Option<&str>) -> Option<&Bind> {
        let except = except.and_then(|name| self.index_of(name));
        let mut wanted = combo.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        if wanted.is_empty() {
            return None;
        }

        self.binds.iter().find(|bind| {
            Some(bind.index()) != except
                && bind.combo().len() == wanted.len()
                && bind
                    .combo()
                    .iter()
                    .all(|c| wanted.binary_search(c).is_ok())
        })
    }

    // === Subscriptions ===

    pub fn subscribe<F>(&mut self, name: &str, kind: BindEventKind, callback: F) -> BindResult<SubscriptionId>
    where
        F: FnMut(&BindEvent<'_>) + 'static,
    {
        let index = self.require(name)?;
        Ok(self.binds[index].subscribe(kind, callback))
    }

    pub fn unsubscribe(&mut self, name: &str, id: SubscriptionId) -> BindResult<bool> {
        let index = self.require(name)?;
        Ok(self.binds[index].unsubscribe(id))
    }

    // === Combo validation and reverse index ===

    /// Deduplicate, validate, and conflict-check a combo without applying it
    fn prepare_combo(
        &self,
        bind_name: &str,
        combo: &[ControlId],
        except: Option<usize>,
    ) -> BindResult<(Vec<ControlId>, bool)> {
        let mut normalized = Vec::with_capacity(combo.len());
        let mut analog = false;
        for &id in combo {
            let control = self.controls.check(id)?;
            if !normalized.contains(&id) {
                analog |= control.is_analog();
                normalized.push(id);
            }
        }

        if normalized.is_empty() || normalized.len() > MAX_COMBO_LEN {
            return Err(BindError::InvalidComboLength(normalized.len()));
        }

        let except_name = except.map(|i| self.binds[i].name());
        if let Some(existing) = self.does_combo_conflict(&normalized, except_name) {
            return Err(BindError::ComboConflict {
                bind: bind_name.to_string(),
                existing: existing.name().to_string(),
            });
        }

        Ok((normalized, analog))
    }

    fn apply_combo(&mut self, index: usize, combo: Vec<ControlId>, analog: bool) {
        let old: Vec<ControlId> = self.binds[index].combo().to_vec();
        for control in old {
            self.unlink(control, index);
        }
        for &control in &combo {
            self.link(control, index);
        }

        let bind = &mut self.binds[index];
        bind.set_combo(combo, analog);
        bind.releasing = false;
        bind.hit_count = 0;
    }

    fn link(&mut self, control: ControlId, index: usize) {
        let users = self.control_to_binds.entry(control).or_default();
        if users.is_empty() {
            self.used_controls.push(control);
        }
        if !users.contains(&index) {
            users.push(index);
        }
    }

    fn unlink(&mut self, control: ControlId, index: usize) {
        let Some(users) = self.control_to_binds.get_mut(&control) else {
            return;
        };
        users.retain(|&i| i != index);
        if users.is_empty() {
            self.control_to_binds.remove(&control);
            self.used_controls.retain(|&c| c != control);
        }
    }

    fn describe(&self, bind: &Bind) -> String {
        if !bind.is_bound() {
            return "<unbound>".to_string();
        }
        bind.combo()
            .iter()
            .map(|id| self.controls.name_of(*id))
            .collect::<Vec<_>>()
            .join("+")
    }

    // === Batch reconfiguration ===

    fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            bind_count: self.binds.len(),
            binds: self
                .binds
                .iter()
                .map(|b| (b.combo().to_vec(), b.is_analog(), b.releasing))
                .collect(),
            by_name: self.by_name.clone(),
            control_to_binds: self.control_to_binds.clone(),
            used_controls: self.used_controls.clone(),
        }
    }

    fn restore(&mut self, snapshot: GroupSnapshot) {
        self.binds.truncate(snapshot.bind_count);
        for (bind, (combo, analog, releasing)) in self.binds.iter_mut().zip(snapshot.binds) {
            bind.set_combo(combo, analog);
            bind.releasing = releasing;
        }
        self.by_name = snapshot.by_name;
        self.control_to_binds = snapshot.control_to_binds;
        self.used_controls = snapshot.used_controls;
    }

    /// Apply a list of bind definitions, all or nothing
    ///
    /// Existing binds are rebound, missing ones registered. Binds named in
    /// the batch are unbound first, so definitions may swap combos between
    /// themselves. If any entry fails, the group is restored exactly and the
    /// first failure is returned wrapped in `BatchValidationFailed`.
    pub fn load_bind_definitions(&mut self, definitions: &[BindDefinition]) -> BindResult<()> {
        let snapshot = self.snapshot();

        if let Err((entry, err)) = self.apply_definitions(definitions) {
            log::warn!(
                "Rejected bind configuration for group '{}' at '{}': {}; rolling back",
                self.name,
                entry,
                err
            );
            self.restore(snapshot);
            return Err(BindError::BatchValidationFailed {
                entry,
                source: Box::new(err),
            });
        }

        log::debug!(
            "Loaded {} bind definitions into group '{}'",
            definitions.len(),
            self.name
        );
        Ok(())
    }

    fn apply_definitions(&mut self, definitions: &[BindDefinition]) -> Result<(), (String, BindError)> {
        // Every (bind name, control names) pair the batch touches
        let mut entries: Vec<(String, &[String])> = Vec::new();
        for def in definitions {
            entries.push((def.name.clone(), &def.control_names));
            for (n, alias) in def.aliases.iter().enumerate() {
                entries.push((alias_name(&def.name, n + 1), alias));
            }
        }

        let mut seen = Vec::with_capacity(entries.len());
        for (name, _) in &entries {
            let key = name_key(name);
            if seen.contains(&key) {
                return Err((name.clone(), BindError::DuplicateName(name.clone())));
            }
            seen.push(key);
        }

        for (name, _) in &entries {
            if let Some(index) = self.index_of(name) {
                self.apply_combo(index, Vec::new(), false);
            }
        }

        // Aliases numbered past a definition's new alias count are dropped
        for def in definitions {
            let base = name_key(&def.name);
            let stale: Vec<usize> = self
                .binds
                .iter()
                .filter(|bind| {
                    split_alias(bind.name()).is_some_and(|(alias_of, n)| {
                        n > def.aliases.len() && name_key(alias_of) == base
                    })
                })
                .map(Bind::index)
                .collect();
            for index in stale {
                self.apply_combo(index, Vec::new(), false);
            }
        }

        for (name, control_names) in entries {
            let result = self.controls.resolve(control_names).and_then(|combo| {
                if self.index_of(&name).is_some() {
                    self.set_combo(&name, &combo)
                } else {
                    self.register(&name, Some(&combo)).map(|_| ())
                }
            });
            if let Err(err) = result {
                return Err((name, err));
            }
        }
        Ok(())
    }

    /// Export every bound bind as a definition, folding alias binds into
    /// their base bind's `aliases` in alias-number order
    ///
    /// When the base bind itself is unbound, its first bound alias becomes
    /// the exported combo.
    pub fn export_definitions(&self) -> Vec<BindDefinition> {
        let names = |bind: &Bind| -> Vec<String> {
            bind.combo()
                .iter()
                .map(|id| self.controls.name_of(*id).to_string())
                .collect()
        };

        let mut definitions = Vec::new();
        for bind in &self.binds {
            if self.alias_base(bind).is_some() {
                continue;
            }

            let key = name_key(bind.name());
            let mut aliases: Vec<(usize, &Bind)> = self
                .binds
                .iter()
                .filter(|alias| alias.is_bound())
                .filter_map(|alias| {
                    let (base, n) = split_alias(alias.name())?;
                    (name_key(base) == key).then_some((n, alias))
                })
                .collect();
            aliases.sort_by_key(|(n, _)| *n);
            let mut combos = aliases.into_iter().map(|(_, alias)| names(alias));

            let control_names = if bind.is_bound() {
                names(bind)
            } else {
                match combos.next() {
                    Some(combo) => combo,
                    None => continue,
                }
            };
            definitions.push(BindDefinition {
                name: bind.name().to_string(),
                control_names,
                aliases: combos.collect(),
            });
        }
        definitions
    }

    /// Index of the base bind when `bind` is one of its aliases
    fn alias_base(&self, bind: &Bind) -> Option<usize> {
        split_alias(bind.name()).and_then(|(base, _)| self.index_of(base))
    }

    // === Tick resolution ===

    /// Resolve this tick's presses using the wall clock
    pub fn handle_input(&mut self) {
        self.handle_input_at(Instant::now());
    }

    /// Resolve this tick's presses; `now` is the tick time used for hold timing
    pub fn handle_input_at(&mut self, now: Instant) {
        let pressed = self.get_pressed_binds();
        if pressed > 1 {
            self.disambiguate_presses();
        }
        self.commit(now);
    }

    /// Phase A: accumulate hits and apply the releasing latch.
    /// Returns the number of binds fully pressed this tick.
    fn get_pressed_binds(&mut self) -> usize {
        for bind in &mut self.binds {
            bind.hit_count = 0;
        }

        for control in &self.used_controls {
            let down = self.controls.get(*control).is_some_and(Control::is_pressed);
            if !down {
                continue;
            }
            if let Some(users) = self.control_to_binds.get(control) {
                for &i in users {
                    self.binds[i].hit_count += 1;
                }
            }
        }

        for bind in &mut self.binds {
            if !(bind.is_pressed() || bind.releasing) {
                continue;
            }
            let len = bind.combo_len();
            if bind.hit_count > 0 && bind.hit_count < len {
                bind.hit_count = len;
                bind.releasing = true;
            } else {
                bind.releasing = false;
            }
        }

        let mut pressed = 0;
        for bind in &mut self.binds {
            if bind.is_bound() && bind.hit_count == bind.combo_len() {
                pressed += 1;
            } else {
                bind.hit_count = 0;
            }
        }
        pressed
    }

    /// Phase B: on every used control, the longest bind with hits wins and
    /// every other bind with hits there loses one. Ties go to the lowest
    /// bind index.
    fn disambiguate_presses(&mut self) {
        for control in &self.used_controls {
            let Some(users) = self.control_to_binds.get(control) else {
                continue;
            };

            let mut winner: Option<usize> = None;
            for &i in users {
                let candidate = &self.binds[i];
                if candidate.hit_count == 0 {
                    continue;
                }
                let better = match winner {
                    None => true,
                    Some(w) => {
                        let current = &self.binds[w];
                        candidate.combo_len() > current.combo_len()
                            || (candidate.combo_len() == current.combo_len()
                                && candidate.index() < current.index())
                    }
                };
                if better {
                    winner = Some(i);
                }
            }

            let Some(winner) = winner else {
                continue;
            };
            for &i in users {
                let bind = &mut self.binds[i];
                if i != winner && bind.hit_count > 0 {
                    bind.hit_count -= 1;
                }
            }
        }
    }

    /// Phase C: commit states and fire callbacks
    fn commit(&mut self, now: Instant) {
        let threshold = self.hold_threshold;
        let mut pressed = 0;
        for bind in &mut self.binds {
            let pressed_now = bind.is_bound() && bind.hit_count == bind.combo_len();
            bind.update(pressed_now, now, threshold);
            pressed += usize::from(pressed_now);
        }
        log::trace!("Group '{}': {} binds pressed", self.name, pressed);
    }
}

impl std::fmt::Debug for BindGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindGroup")
            .field("name", &self.name)
            .field("binds", &self.binds)
            .field("used_controls", &self.used_controls)
            .finish()
    }
}
