//! Typed action adapter
//!
//! Lets a calling layer describe its binds as an enum instead of strings.
//! Each action maps to one bind in a named group, registered with its
//! default controls.

use std::collections::HashSet;
use std::marker::PhantomData;

use super::bind::Bind;
use super::error::{BindError, BindResult};
use super::group::{name_key, BindDefinition, BindGroup};
use super::manager::BindRegistry;

/// An enum of actions backed by binds
pub trait BindAction: Copy + 'static {
    /// Every action, in registration order
    fn all() -> &'static [Self];

    /// Bind name (unique within the group)
    fn name(self) -> &'static str;

    /// Control names registered when the action has no saved combo
    fn default_controls(self) -> &'static [&'static str];
}

/// Handle to the group holding the binds of an action set
#[derive(Debug, Clone)]
pub struct ActionBinds<A: BindAction> {
    group: String,
    _actions: PhantomData<A>,
}

impl<A: BindAction> ActionBinds<A> {
    /// Register every action of `A` in `group`
    ///
    /// Actions that already exist keep their current combo. An empty
    /// default registers the action unbound. All or nothing: on error the
    /// group is left as it was, and is not created if it did not exist.
    pub fn register(registry: &mut BindRegistry, group: &str) -> BindResult<Self> {
        let created = registry.get_group(group).is_none();
        let result = Self::register_missing(registry.get_or_create_group(group));
        if let Err(err) = result {
            if created {
                registry.unload_group(group);
            }
            return Err(err);
        }

        Ok(Self {
            group: group.to_string(),
            _actions: PhantomData,
        })
    }

    fn register_missing(target: &mut BindGroup) -> BindResult<()> {
        let missing: Vec<A> = A::all()
            .iter()
            .copied()
            .filter(|a| target.bind(a.name()).is_none())
            .collect();

        let mut seen = HashSet::new();
        for action in &missing {
            if !seen.insert(name_key(action.name())) {
                return Err(BindError::DuplicateName(action.name().to_string()));
            }
        }

        let (bound, unbound): (Vec<A>, Vec<A>) = missing
            .into_iter()
            .partition(|a| !a.default_controls().is_empty());
        let definitions: Vec<_> = bound
            .iter()
            .map(|a| BindDefinition::new(a.name(), a.default_controls().iter().copied()))
            .collect();
        target.load_bind_definitions(&definitions)?;

        // Names here are unique and absent from the group
        for action in unbound {
            target.register(action.name(), None)?;
        }
        Ok(())
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// The bind backing an action
    pub fn bind<'r>(&self, registry: &'r BindRegistry, action: A) -> BindResult<&'r Bind> {
        registry
            .group(&self.group)?
            .bind(action.name())
            .ok_or_else(|| BindError::UnknownBind(action.name().to_string()))
    }

    fn check(&self, registry: &BindRegistry, action: A, f: impl Fn(&Bind) -> bool) -> bool {
        self.bind(registry, action).map(f).unwrap_or(false)
    }

    pub fn is_pressed(&self, registry: &BindRegistry, action: A) -> bool {
        self.check(registry, action, Bind::is_pressed)
    }

    pub fn is_new_pressed(&self, registry: &BindRegistry, action: A) -> bool {
        self.check(registry, action, Bind::is_new_pressed)
    }

    pub fn is_pressed_and_held(&self, registry: &BindRegistry, action: A) -> bool {
        self.check(registry, action, Bind::is_pressed_and_held)
    }

    pub fn is_released(&self, registry: &BindRegistry, action: A) -> bool {
        self.check(registry, action, Bind::is_released)
    }

    /// Rebind an action by control names
    pub fn rebind<S: AsRef<str>>(
        &self,
        registry: &mut BindRegistry,
        action: A,
        controls: &[S],
    ) -> BindResult<()> {
        registry
            .group_mut(&self.group)?
            .set_combo_by_names(action.name(), controls)
    }

    /// Restore every action's default combo, all or nothing
    pub fn reset_to_defaults(&self, registry: &mut BindRegistry) -> BindResult<()> {
        let definitions: Vec<_> = A::all()
            .iter()
            .filter(|a| !a.default_controls().is_empty())
            .map(|a| BindDefinition::new(a.name(), a.default_controls().iter().copied()))
            .collect();
        registry
            .group_mut(&self.group)?
            .load_bind_definitions(&definitions)
    }
}
