//! Host-side device state
//!
//! The host event loop writes key, mouse, wheel, and joystick events into a
//! [`DeviceState`]; the standard controls built by
//! [`ControlRegistry::standard`](super::ControlRegistry::standard) poll it.
//! Wheel ticks are momentary: they stay active until the next
//! [`DeviceState::end_frame`].

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

/// Mouse buttons exposed as controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

/// Wheel tick direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Identifies one physical input a standard control reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(i32),
    Mouse(MouseButton),
    Wheel(WheelDirection),
    JoyButton { port: u32, button: i32 },
    JoyAxis { port: u32, axis: i32, polarity: i32 },
}

/// Default axis dead zone
pub const DEFAULT_AXIS_THRESHOLD: i32 = 10000;

#[derive(Debug)]
struct DeviceInner {
    held: HashSet<InputSource>,
    pulses: HashSet<InputSource>,
    axis_threshold: i32,
}

/// Shared, cloneable handle to the current physical input state
#[derive(Debug, Clone)]
pub struct DeviceState {
    inner: Arc<RwLock<DeviceInner>>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DeviceInner {
                held: HashSet::new(),
                pulses: HashSet::new(),
                axis_threshold: DEFAULT_AXIS_THRESHOLD,
            })),
        }
    }

    /// Handle key down event
    pub fn key_down(&self, keycode: i32) {
        self.inner.write().held.insert(InputSource::Key(keycode));
    }

    /// Handle key up event
    pub fn key_up(&self, keycode: i32) {
        self.inner.write().held.remove(&InputSource::Key(keycode));
    }

    pub fn mouse_down(&self, button: MouseButton) {
        self.inner.write().held.insert(InputSource::Mouse(button));
    }

    pub fn mouse_up(&self, button: MouseButton) {
        self.inner.write().held.remove(&InputSource::Mouse(button));
    }

    /// Record a wheel tick; active until the end of the current frame
    pub fn wheel(&self, direction: WheelDirection) {
        self.inner
            .write()
            .pulses
            .insert(InputSource::Wheel(direction));
    }

    /// Handle joystick button event
    pub fn joy_button(&self, port: u32, button: i32, pressed: bool) {
        let source = InputSource::JoyButton { port, button };
        let mut inner = self.inner.write();
        if pressed {
            inner.held.insert(source);
        } else {
            inner.held.remove(&source);
        }
    }

    /// Handle joystick axis motion
    ///
    /// Values beyond the dead zone activate the matching polarity and
    /// release the opposite one; values inside it release both.
    pub fn joy_axis(&self, port: u32, axis: i32, value: i16) {
        let neg = InputSource::JoyAxis {
            port,
            axis,
            polarity: -1,
        };
        let pos = InputSource::JoyAxis {
            port,
            axis,
            polarity: 1,
        };

        let mut inner = self.inner.write();
        let thresh = inner.axis_threshold;
        let value = i32::from(value);

        inner.held.remove(&neg);
        inner.held.remove(&pos);
        if value < -thresh {
            inner.held.insert(neg);
        } else if value > thresh {
            inner.held.insert(pos);
        }
    }

    /// Mark any input as held
    pub fn press(&self, source: InputSource) {
        self.inner.write().held.insert(source);
    }

    pub fn release(&self, source: InputSource) {
        self.inner.write().held.remove(&source);
    }

    /// Mark any input active until the end of the current frame
    pub fn pulse(&self, source: InputSource) {
        self.inner.write().pulses.insert(source);
    }

    /// Set axis dead zone threshold (clamped to 0..=32767)
    pub fn set_axis_threshold(&self, threshold: i32) {
        self.inner.write().axis_threshold = threshold.clamp(0, 32767);
    }

    pub fn axis_threshold(&self) -> i32 {
        self.inner.read().axis_threshold
    }

    /// Finish an input frame - clears momentary inputs
    pub fn end_frame(&self) {
        self.inner.write().pulses.clear();
    }

    /// Release everything (focus loss, device reset)
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.held.clear();
        inner.pulses.clear();
    }

    /// Is the given input currently active?
    pub fn is_active(&self, source: InputSource) -> bool {
        let inner = self.inner.read();
        inner.held.contains(&source) || inner.pulses.contains(&source)
    }

    /// Number of inputs currently active
    pub fn active_count(&self) -> usize {
        let inner = self.inner.read();
        inner.held.len() + inner.pulses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_up() {
        let device = DeviceState::new();
        device.key_down(32);
        assert!(device.is_active(InputSource::Key(32)));
        assert!(!device.is_active(InputSource::Key(97)));

        device.key_up(32);
        assert!(!device.is_active(InputSource::Key(32)));
    }

    #[test]
    fn test_repeated_key_down_is_idempotent() {
        let device = DeviceState::new();
        device.key_down(32);
        device.key_down(32);
        device.key_up(32);
        assert!(!device.is_active(InputSource::Key(32)));
    }

    #[test]
    fn test_wheel_is_momentary() {
        let device = DeviceState::new();
        device.wheel(WheelDirection::Up);
        assert!(device.is_active(InputSource::Wheel(WheelDirection::Up)));
        assert!(!device.is_active(InputSource::Wheel(WheelDirection::Down)));

        device.end_frame();
        assert!(!device.is_active(InputSource::Wheel(WheelDirection::Up)));
    }

    #[test]
    fn test_generic_press_and_pulse() {
        let device = DeviceState::new();
        let x1 = InputSource::Mouse(MouseButton::X1);
        let key = InputSource::Key(97);

        device.press(x1);
        device.pulse(key);
        assert_eq!(device.active_count(), 2);

        device.end_frame();
        assert!(device.is_active(x1));
        assert!(!device.is_active(key));

        device.release(x1);
        assert_eq!(device.active_count(), 0);
    }

    #[test]
    fn test_end_frame_keeps_held_keys() {
        let device = DeviceState::new();
        device.key_down(32);
        device.mouse_down(MouseButton::Left);
        device.end_frame();
        assert!(device.is_active(InputSource::Key(32)));
        assert!(device.is_active(InputSource::Mouse(MouseButton::Left)));
    }

    #[test]
    fn test_joy_button() {
        let device = DeviceState::new();
        device.joy_button(0, 3, true);
        assert!(device.is_active(InputSource::JoyButton { port: 0, button: 3 }));
        assert!(!device.is_active(InputSource::JoyButton { port: 1, button: 3 }));

        device.joy_button(0, 3, false);
        assert!(!device.is_active(InputSource::JoyButton { port: 0, button: 3 }));
    }

    #[test]
    fn test_joy_axis_polarity() {
        let device = DeviceState::new();
        let neg = InputSource::JoyAxis {
            port: 0,
            axis: 0,
            polarity: -1,
        };
        let pos = InputSource::JoyAxis {
            port: 0,
            axis: 0,
            polarity: 1,
        };

        device.joy_axis(0, 0, -20000);
        assert!(device.is_active(neg));
        assert!(!device.is_active(pos));

        device.joy_axis(0, 0, 20000);
        assert!(!device.is_active(neg));
        assert!(device.is_active(pos));

        device.joy_axis(0, 0, 500);
        assert!(!device.is_active(neg));
        assert!(!device.is_active(pos));
    }

    #[test]
    fn test_axis_threshold_clamped() {
        let device = DeviceState::new();
        assert_eq!(device.axis_threshold(), DEFAULT_AXIS_THRESHOLD);
        device.set_axis_threshold(-5);
        assert_eq!(device.axis_threshold(), 0);
        device.set_axis_threshold(40000);
        assert_eq!(device.axis_threshold(), 32767);
    }

    #[test]
    fn test_reset_clears_everything() {
        let device = DeviceState::new();
        device.key_down(32);
        device.wheel(WheelDirection::Down);
        device.joy_button(0, 0, true);
        assert_eq!(device.active_count(), 3);

        device.reset();
        assert_eq!(device.active_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let device = DeviceState::new();
        let reader = device.clone();
        device.key_down(13);
        assert!(reader.is_active(InputSource::Key(13)));
    }
}
