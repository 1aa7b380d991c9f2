//! Tick scripts
//!
//! A tick script replays input against a [`BindRegistry`] driven by the
//! standard controls. Each line is one tick; items are comma-separated:
//!
//! ```text
//! # hold shift, then add W
//! +Left Shift
//! +W, @40
//! .
//! -W, -Left Shift
//! ~Wheel Up
//! ```
//!
//! `+Name` presses a control, `-Name` releases it, `~Name` pulses it for one
//! tick, and `@<ms>` sets the tick's duration (16 ms when omitted). A line
//! holding only `.` is a tick with no input changes.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::input::{
    source_from_name, BindEventKind, BindRegistry, DeviceState, InputSource, SubscriptionId,
};

/// Tick duration when a line has no `@<ms>` item
pub const DEFAULT_TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputChange {
    Press(InputSource),
    Release(InputSource),
    Pulse(InputSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTick {
    pub changes: Vec<InputChange>,
    pub duration: Duration,
}

/// A parsed tick script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickScript {
    pub ticks: Vec<ScriptTick>,
}

/// One bind event observed during a replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// 1-based tick number
    pub tick: usize,
    pub group: String,
    pub bind: String,
    pub kind: BindEventKind,
    pub held_for: Duration,
}

impl TickScript {
    pub fn parse(text: &str) -> Result<Self> {
        let mut ticks = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tick = ScriptTick {
                changes: Vec::new(),
                duration: DEFAULT_TICK,
            };
            for item in line.split(',').map(str::trim).filter(|i| !i.is_empty()) {
                if item == "." {
                    continue;
                }
                if let Some(ms) = item.strip_prefix('@') {
                    let ms: u64 = ms
                        .trim()
                        .parse()
                        .with_context(|| format!("line {}: invalid tick duration '{}'", number, item))?;
                    tick.duration = Duration::from_millis(ms);
                    continue;
                }

                let mut chars = item.chars();
                let op = chars.next();
                let name = chars.as_str().trim();
                let Some(source) = source_from_name(name) else {
                    bail!("line {}: unknown control '{}'", number, name);
                };
                let change = match op {
                    Some('+') => InputChange::Press(source),
                    Some('-') => InputChange::Release(source),
                    Some('~') => InputChange::Pulse(source),
                    _ => bail!("line {}: expected +, -, ~ or @ in '{}'", number, item),
                };
                tick.changes.push(change);
            }
            ticks.push(tick);
        }

        Ok(Self { ticks })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tick script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid tick script {}", path.display()))
    }

    /// Total simulated time
    pub fn duration(&self) -> Duration {
        self.ticks.iter().map(|t| t.duration).sum()
    }

    /// Replay the script, starting at `start`
    ///
    /// Every bind in the registry is observed for the length of the replay;
    /// the returned events are in firing order.
    pub fn run(
        &self,
        device: &DeviceState,
        registry: &mut BindRegistry,
        start: Instant,
    ) -> Vec<EventRecord> {
        let events: Rc<RefCell<Vec<EventRecord>>> = Rc::default();
        let current_tick = Rc::new(RefCell::new(0usize));
        let subscriptions = observe_all(registry, &events, &current_tick);

        let mut now = start;
        for (index, tick) in self.ticks.iter().enumerate() {
            *current_tick.borrow_mut() = index + 1;
            for change in &tick.changes {
                match *change {
                    InputChange::Press(source) => device.press(source),
                    InputChange::Release(source) => device.release(source),
                    InputChange::Pulse(source) => device.pulse(source),
                }
            }
            now += tick.duration;
            registry.handle_input_at(now);
            device.end_frame();
        }

        for (group, bind, id) in subscriptions {
            let removed = registry
                .get_group_mut(&group)
                .map(|g| g.unsubscribe(&bind, id));
            if !matches!(removed, Some(Ok(true))) {
                log::trace!(
                    "Replay observer {:?} on '{}/{}' was not removed: {:?}",
                    id,
                    group,
                    bind,
                    removed
                );
            }
        }

        let recorded = events.borrow().clone();
        log::debug!(
            "Replayed {} ticks, {} bind events",
            self.ticks.len(),
            recorded.len()
        );
        recorded
    }
}

fn observe_all(
    registry: &mut BindRegistry,
    events: &Rc<RefCell<Vec<EventRecord>>>,
    current_tick: &Rc<RefCell<usize>>,
) -> Vec<(String, String, SubscriptionId)> {
    let targets: Vec<(String, String)> = registry
        .groups()
        .iter()
        .flat_map(|g| {
            g.binds()
                .iter()
                .map(move |b| (g.name().to_string(), b.name().to_string()))
        })
        .collect();

    let mut subscriptions = Vec::new();
    for (group, bind) in targets {
        for kind in [
            BindEventKind::NewPress,
            BindEventKind::PressAndHold,
            BindEventKind::Release,
        ] {
            let events = Rc::clone(events);
            let current_tick = Rc::clone(current_tick);
            let group_name = group.clone();
            let subscribed = registry.subscribe(&group, &bind, kind, move |event| {
                events.borrow_mut().push(EventRecord {
                    tick: *current_tick.borrow(),
                    group: group_name.clone(),
                    bind: event.bind.to_string(),
                    kind: event.kind,
                    held_for: event.held_for,
                });
            });
            if let Ok(id) = subscribed {
                subscriptions.push((group.clone(), bind.clone(), id));
            }
        }
    }
    subscriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{BindDefinition, ControlRegistry, MouseButton, WheelDirection};
    use std::sync::Arc;

    #[test]
    fn test_parse() {
        let script = TickScript::parse(
            "# comment\n+Left Shift\n\n+W, @40\n.\n-w , -left shift\n~Wheel Up\n",
        )
        .unwrap();

        assert_eq!(script.ticks.len(), 5);
        assert_eq!(
            script.ticks[0].changes,
            vec![InputChange::Press(InputSource::Key(0x400000E1))]
        );
        assert_eq!(script.ticks[1].duration, Duration::from_millis(40));
        assert!(script.ticks[2].changes.is_empty());
        assert_eq!(script.ticks[3].changes.len(), 2);
        assert_eq!(
            script.ticks[4].changes,
            vec![InputChange::Pulse(InputSource::Wheel(WheelDirection::Up))]
        );
        assert_eq!(script.duration(), Duration::from_millis(16 * 4 + 40));
    }

    #[test]
    fn test_parse_errors() {
        let err = TickScript::parse("+Space\n+Hyperdrive\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(TickScript::parse("Space\n").is_err());
        assert!(TickScript::parse("@fast\n").is_err());
    }

    #[test]
    fn test_run_records_events() {
        let device = DeviceState::new();
        let mut registry = BindRegistry::new(Arc::new(ControlRegistry::standard(&device)));
        registry
            .get_or_create_group("game")
            .load_bind_definitions(&[
                BindDefinition::new("fire", ["Mouse Left"]),
                BindDefinition::new("zoom", ["Wheel Up"]),
            ])
            .unwrap();

        let script = TickScript::parse("+Mouse Left\n-Mouse Left\n~Wheel Up\n.\n").unwrap();
        let events = script.run(&device, &mut registry, Instant::now());

        let summary: Vec<(usize, &str, BindEventKind)> = events
            .iter()
            .map(|e| (e.tick, e.bind.as_str(), e.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "fire", BindEventKind::NewPress),
                (1, "fire", BindEventKind::PressAndHold),
                (2, "fire", BindEventKind::Release),
                (3, "zoom", BindEventKind::NewPress),
                (3, "zoom", BindEventKind::PressAndHold),
                (4, "zoom", BindEventKind::Release),
            ]
        );
        assert!(!device.is_active(InputSource::Mouse(MouseButton::Left)));

        // observers are removed after the replay
        let fire = registry.group("game").unwrap().bind("fire").unwrap();
        assert_eq!(fire.subscriber_count(), 0);
    }

    #[test]
    fn test_run_removes_only_its_observers() {
        let device = DeviceState::new();
        let mut registry = BindRegistry::new(Arc::new(ControlRegistry::standard(&device)));
        registry
            .get_or_create_group("game")
            .register_by_names("fire", &["Space"])
            .unwrap();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        registry
            .subscribe("game", "fire", BindEventKind::NewPress, move |_| {
                *counter.borrow_mut() += 1
            })
            .unwrap();

        let script = TickScript::parse("+Space\n-Space\n").unwrap();
        let events = script.run(&device, &mut registry, Instant::now());

        assert_eq!(events.len(), 3);
        assert_eq!(*hits.borrow(), 1);
        let fire = registry.group("game").unwrap().bind("fire").unwrap();
        assert_eq!(fire.subscriber_count(), 1);
    }
}
