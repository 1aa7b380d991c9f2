//! Standard control names
//!
//! Maps SDL keycodes, mouse buttons, wheel directions, and joystick inputs to
//! the human-readable names used for controls and bind profiles. No name in
//! this table contains `+`, `,`, `=`, `[`, `]` or `#`, so every name can be
//! written into a profile line unescaped.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::device::{InputSource, MouseButton, WheelDirection};

/// Joystick ports exposed by the standard control list
pub const JOY_PORTS: u32 = 2;
/// Buttons per joystick port
pub const JOY_BUTTONS: i32 = 16;
/// Axes per joystick port
pub const JOY_AXES: i32 = 4;

/// Controls that are never registered: placeholders and keys that only act
/// as OS-level modifiers.
pub const CONTROL_BLACKLIST: &[&str] = &["Unknown", "Left GUI", "Right GUI", "NumLock"];

/// SDL keycode → name, in registry order
pub const KEYBOARD_KEYS: &[(i32, &str)] = &[
    (0, "Unknown"),
    (8, "Backspace"),
    (9, "Tab"),
    (13, "Return"),
    (27, "Escape"),
    (32, "Space"),
    (39, "Apostrophe"),
    (44, "Comma"),
    (45, "Minus"),
    (46, "Period"),
    (47, "Slash"),
    (48, "0"),
    (49, "1"),
    (50, "2"),
    (51, "3"),
    (52, "4"),
    (53, "5"),
    (54, "6"),
    (55, "7"),
    (56, "8"),
    (57, "9"),
    (59, "Semicolon"),
    (61, "Equals"),
    (91, "Left Bracket"),
    (92, "Backslash"),
    (93, "Right Bracket"),
    (96, "Grave"),
    (97, "A"),
    (98, "B"),
    (99, "C"),
    (100, "D"),
    (101, "E"),
    (102, "F"),
    (103, "G"),
    (104, "H"),
    (105, "I"),
    (106, "J"),
    (107, "K"),
    (108, "L"),
    (109, "M"),
    (110, "N"),
    (111, "O"),
    (112, "P"),
    (113, "Q"),
    (114, "R"),
    (115, "S"),
    (116, "T"),
    (117, "U"),
    (118, "V"),
    (119, "W"),
    (120, "X"),
    (121, "Y"),
    (122, "Z"),
    (127, "Delete"),
    // SDL scancode | 0x40000000
    (0x4000003A, "F1"),
    (0x4000003B, "F2"),
    (0x4000003C, "F3"),
    (0x4000003D, "F4"),
    (0x4000003E, "F5"),
    (0x4000003F, "F6"),
    (0x40000040, "F7"),
    (0x40000041, "F8"),
    (0x40000042, "F9"),
    (0x40000043, "F10"),
    (0x40000044, "F11"),
    (0x40000045, "F12"),
    (0x40000049, "Insert"),
    (0x4000004A, "Home"),
    (0x4000004B, "PageUp"),
    (0x4000004D, "End"),
    (0x4000004E, "PageDown"),
    (0x4000004F, "Right"),
    (0x40000050, "Left"),
    (0x40000051, "Down"),
    (0x40000052, "Up"),
    (0x40000053, "NumLock"),
    (0x40000054, "Keypad Divide"),
    (0x40000055, "Keypad Multiply"),
    (0x40000056, "Keypad Minus"),
    (0x40000057, "Keypad Plus"),
    (0x40000058, "Keypad Enter"),
    (0x40000059, "Keypad 1"),
    (0x4000005A, "Keypad 2"),
    (0x4000005B, "Keypad 3"),
    (0x4000005C, "Keypad 4"),
    (0x4000005D, "Keypad 5"),
    (0x4000005E, "Keypad 6"),
    (0x4000005F, "Keypad 7"),
    (0x40000060, "Keypad 8"),
    (0x40000061, "Keypad 9"),
    (0x40000062, "Keypad 0"),
    (0x40000063, "Keypad Period"),
    (0x400000E0, "Left Ctrl"),
    (0x400000E1, "Left Shift"),
    (0x400000E2, "Left Alt"),
    (0x400000E3, "Left GUI"),
    (0x400000E4, "Right Ctrl"),
    (0x400000E5, "Right Shift"),
    (0x400000E6, "Right Alt"),
    (0x400000E7, "Right GUI"),
];

static KEY_NAMES: LazyLock<HashMap<i32, &'static str>> =
    LazyLock::new(|| KEYBOARD_KEYS.iter().copied().collect());

/// Lowercased name → keycode
static NAME_TO_KEY: LazyLock<HashMap<String, i32>> = LazyLock::new(|| {
    KEYBOARD_KEYS
        .iter()
        .map(|&(code, name)| (name.to_lowercase(), code))
        .collect()
});

/// Get the human-readable name for a keycode
pub fn key_name(keycode: i32) -> &'static str {
    KEY_NAMES.get(&keycode).copied().unwrap_or("Unknown")
}

/// Get the keycode for a key name (case-insensitive)
pub fn key_from_name(name: &str) -> Option<i32> {
    NAME_TO_KEY.get(&name.to_lowercase()).copied()
}

/// Is this control name excluded from registration? (case-insensitive)
pub fn is_blacklisted(name: &str) -> bool {
    CONTROL_BLACKLIST
        .iter()
        .any(|b| b.eq_ignore_ascii_case(name))
}

pub fn mouse_button_name(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "Mouse Left",
        MouseButton::Right => "Mouse Right",
        MouseButton::Middle => "Mouse Middle",
        MouseButton::X1 => "Mouse X1",
        MouseButton::X2 => "Mouse X2",
    }
}

pub fn wheel_name(direction: WheelDirection) -> &'static str {
    match direction {
        WheelDirection::Up => "Wheel Up",
        WheelDirection::Down => "Wheel Down",
    }
}

/// Get joystick button name
pub fn joy_button_name(port: u32, button: i32) -> String {
    format!("Joy{}Button{}", port, button)
}

/// Get joystick axis name
pub fn joy_axis_name(port: u32, axis: i32, polarity: i32) -> String {
    let dir = if polarity < 0 { "Neg" } else { "Pos" };
    format!("Joy{}Axis{}{}", port, axis, dir)
}

/// An entry of the standard control list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardControl {
    pub name: String,
    pub source: InputSource,
    pub analog: bool,
}

/// The ordered standard control list: keyboard, mouse, wheel, joysticks.
///
/// Blacklisted names are still present here; the registry filters them.
pub fn standard_controls() -> Vec<StandardControl> {
    let mut list: Vec<StandardControl> = KEYBOARD_KEYS
        .iter()
        .map(|&(code, name)| StandardControl {
            name: name.to_string(),
            source: InputSource::Key(code),
            analog: false,
        })
        .collect();

    for button in [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::X1,
        MouseButton::X2,
    ] {
        list.push(StandardControl {
            name: mouse_button_name(button).to_string(),
            source: InputSource::Mouse(button),
            analog: false,
        });
    }

    for direction in [WheelDirection::Up, WheelDirection::Down] {
        list.push(StandardControl {
            name: wheel_name(direction).to_string(),
            source: InputSource::Wheel(direction),
            analog: true,
        });
    }

    for port in 0..JOY_PORTS {
        for button in 0..JOY_BUTTONS {
            list.push(StandardControl {
                name: joy_button_name(port, button),
                source: InputSource::JoyButton { port, button },
                analog: false,
            });
        }
        for axis in 0..JOY_AXES {
            for polarity in [-1, 1] {
                list.push(StandardControl {
                    name: joy_axis_name(port, axis, polarity),
                    source: InputSource::JoyAxis {
                        port,
                        axis,
                        polarity,
                    },
                    analog: false,
                });
            }
        }
    }

    list
}

/// Lowercased standard control name → input source
static NAME_TO_SOURCE: LazyLock<HashMap<String, InputSource>> = LazyLock::new(|| {
    standard_controls()
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.source))
        .collect()
});

/// Find the input a standard control name reads (case-insensitive)
pub fn source_from_name(name: &str) -> Option<InputSource> {
    NAME_TO_SOURCE.get(&name.trim().to_lowercase()).copied()
}
