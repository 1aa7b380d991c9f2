//! Physical controls
//!
//! A [`Control`] wraps a single "is this input active right now" signal:
//! a keyboard key, a mouse button, a wheel tick, or a joystick button.
//! Controls are created once by the [`ControlRegistry`](super::ControlRegistry)
//! and never change afterwards.

use std::fmt;
use std::sync::Arc;

/// Poll function backing a control
pub type PollFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Stable index of a control within its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(pub u32);

impl ControlId {
    /// Position of the control in the registry's ordered list
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single physical input source
#[derive(Clone)]
pub struct Control {
    id: ControlId,
    name: String,
    analog: bool,
    poll: PollFn,
}

impl Control {
    pub(crate) fn new(id: ControlId, name: String, analog: bool, poll: PollFn) -> Self {
        Self {
            id,
            name,
            analog,
            poll,
        }
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn index(&self) -> u32 {
        self.id.0
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Momentary controls (wheel ticks) have no sustained held state
    pub fn is_analog(&self) -> bool {
        self.analog
    }

    /// Poll the underlying input. Side-effect free.
    pub fn is_pressed(&self) -> bool {
        (self.poll)()
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("analog", &self.analog)
            .finish_non_exhaustive()
    }
}
