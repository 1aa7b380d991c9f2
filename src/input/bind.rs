//! Binds
//!
//! A [`Bind`] is a named combo of up to [`MAX_COMBO_LEN`] controls with an
//! edge-triggered press state machine:
//!
//! ```text
//! Idle -> NewPressed -> (PressAndHold once past the hold threshold) -> Released -> Idle
//! ```
//!
//! The raw pressed flag is driven by the owning
//! [`BindGroup`](super::BindGroup) once per tick; everything else is derived
//! from it. Subscribers are notified synchronously, in registration order.

use std::fmt;
use std::time::{Duration, Instant};

use super::control::ControlId;

/// Maximum number of controls in one combo
pub const MAX_COMBO_LEN: usize = 3;

/// Default time a bind must be held before it reports press-and-hold
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_millis(500);

/// Bind state transitions subscribers can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindEventKind {
    /// First tick the bind is pressed (every active tick for analog binds)
    NewPress,
    /// New press, or every tick once held past the threshold
    PressAndHold,
    /// First tick after the bind stopped being pressed
    Release,
}

/// Notification passed to subscribers
#[derive(Debug, Clone, Copy)]
pub struct BindEvent<'a> {
    pub bind: &'a str,
    pub kind: BindEventKind,
    /// Time since the current press began (zero on a new press)
    pub held_for: Duration,
}

/// Subscriber callback
pub type BindCallback = Box<dyn FnMut(&BindEvent<'_>)>;

/// Token returned by [`Bind::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, BindEventKind, BindCallback)>,
}

impl Subscribers {
    fn add(&mut self, kind: BindEventKind, callback: BindCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, callback));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let len = self.entries.len();
        self.entries.retain(|(sid, _, _)| *sid != id);
        self.entries.len() != len
    }

    fn notify(&mut self, event: &BindEvent<'_>) {
        for (_, kind, callback) in self.entries.iter_mut() {
            if *kind == event.kind {
                callback(event);
            }
        }
    }
}

/// A named combo with its press state
pub struct Bind {
    name: String,
    index: usize,
    combo: Vec<ControlId>,
    analog: bool,

    // Resolution scratch state, owned by the group
    pub(crate) hit_count: u32,
    pub(crate) releasing: bool,

    pressed: bool,
    was_pressed: bool,
    pressed_and_held: bool,
    held_since: Option<Instant>,
    subscribers: Subscribers,
}

impl Bind {
    pub(crate) fn new(name: String, index: usize) -> Self {
        Self {
            name,
            index,
            combo: Vec::new(),
            analog: false,
            hit_count: 0,
            releasing: false,
            pressed: false,
            was_pressed: false,
            pressed_and_held: false,
            held_since: None,
            subscribers: Subscribers::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position within the owning group
    pub fn index(&self) -> usize {
        self.index
    }

    /// Controls of the combo, in display order
    pub fn combo(&self) -> &[ControlId] {
        &self.combo
    }

    pub fn combo_len(&self) -> u32 {
        self.combo.len() as u32
    }

    /// An unbound bind has an empty combo and never reports pressed
    pub fn is_bound(&self) -> bool {
        !self.combo.is_empty()
    }

    /// True if any control of the combo is analog
    pub fn is_analog(&self) -> bool {
        self.analog
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn was_pressed(&self) -> bool {
        self.was_pressed
    }

    pub fn is_new_pressed(&self) -> bool {
        self.pressed && (!self.was_pressed || self.analog)
    }

    pub fn is_pressed_and_held(&self) -> bool {
        self.pressed_and_held
    }

    pub fn is_released(&self) -> bool {
        !self.pressed && self.was_pressed
    }

    /// Start of the current press, if pressed
    pub fn held_since(&self) -> Option<Instant> {
        self.held_since
    }

    /// Is the bind being kept pressed while its combo is partially released?
    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    /// Subscribe to a transition; callbacks run in registration order
    pub fn subscribe<F>(&mut self, kind: BindEventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&BindEvent<'_>) + 'static,
    {
        self.subscribers.add(kind, Box::new(callback))
    }

    /// Remove a subscription. Returns false if the id is not subscribed here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.len()
    }

    pub(crate) fn set_combo(&mut self, combo: Vec<ControlId>, analog: bool) {
        self.combo = combo;
        self.analog = analog;
    }

    /// Commit this tick's pressed state and fire callbacks
    pub(crate) fn update(&mut self, pressed_now: bool, now: Instant, hold_threshold: Duration) {
        self.was_pressed = self.pressed;
        self.pressed = pressed_now;

        let new_press = self.is_new_pressed();
        if new_press {
            self.held_since = Some(now);
        }

        let held_for = self
            .held_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.pressed_and_held =
            new_press || (self.pressed && self.held_since.is_some() && held_for >= hold_threshold);

        let released = self.is_released();
        if released {
            self.held_since = None;
        }

        let held = self.pressed_and_held;
        let name = self.name.as_str();
        let subscribers = &mut self.subscribers;
        let mut fire = |kind| {
            subscribers.notify(&BindEvent {
                bind: name,
                kind,
                held_for,
            })
        };
        if new_press {
            fire(BindEventKind::NewPress);
        }
        if held {
            fire(BindEventKind::PressAndHold);
        }
        if released {
            fire(BindEventKind::Release);
        }
    }
}

impl fmt::Debug for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bind")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("combo", &self.combo)
            .field("analog", &self.analog)
            .field("pressed", &self.pressed)
            .field("was_pressed", &self.was_pressed)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn bound(analog: bool) -> Bind {
        let mut bind = Bind::new("fire".into(), 0);
        bind.set_combo(vec![ControlId(0)], analog);
        bind
    }

    #[test]
    fn test_new_bind_is_idle() {
        let bind = Bind::new("jump".into(), 3);
        assert_eq!(bind.name(), "jump");
        assert_eq!(bind.index(), 3);
        assert!(!bind.is_bound());
        assert!(!bind.is_pressed());
        assert!(!bind.is_new_pressed());
        assert!(!bind.is_released());
    }

    #[test]
    fn test_press_hold_release_cycle() {
        let t0 = Instant::now();
        let mut bind = bound(false);

        bind.update(true, t0, DEFAULT_HOLD_THRESHOLD);
        assert!(bind.is_new_pressed());
        assert!(bind.is_pressed_and_held());
        assert_eq!(bind.held_since(), Some(t0));

        bind.update(true, t0 + ms(100), DEFAULT_HOLD_THRESHOLD);
        assert!(bind.is_pressed());
        assert!(!bind.is_new_pressed());
        assert!(!bind.is_pressed_and_held());

        bind.update(true, t0 + ms(499), DEFAULT_HOLD_THRESHOLD);
        assert!(!bind.is_pressed_and_held());

        bind.update(true, t0 + ms(500), DEFAULT_HOLD_THRESHOLD);
        assert!(bind.is_pressed_and_held());

        bind.update(true, t0 + ms(516), DEFAULT_HOLD_THRESHOLD);
        assert!(bind.is_pressed_and_held());

        bind.update(false, t0 + ms(532), DEFAULT_HOLD_THRESHOLD);
        assert!(bind.is_released());
        assert!(!bind.is_pressed_and_held());
        assert_eq!(bind.held_since(), None);

        bind.update(false, t0 + ms(548), DEFAULT_HOLD_THRESHOLD);
        assert!(!bind.is_released());
    }

    #[test]
    fn test_analog_refires_every_tick() {
        let t0 = Instant::now();
        let mut bind = bound(true);
        for i in 0..4 {
            bind.update(true, t0 + ms(i * 16), DEFAULT_HOLD_THRESHOLD);
            assert_eq!(bind.is_new_pressed(), bind.is_pressed());
            assert!(bind.is_new_pressed());
        }
    }

    #[test]
    fn test_callbacks_fire_in_order_and_unsubscribe() {
        let t0 = Instant::now();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bind = bound(false);

        let first = Rc::clone(&log);
        let id = bind.subscribe(BindEventKind::NewPress, move |e| {
            first.borrow_mut().push(format!("1:{}", e.bind))
        });
        let second = Rc::clone(&log);
        bind.subscribe(BindEventKind::NewPress, move |e| {
            second.borrow_mut().push(format!("2:{}", e.bind))
        });
        let third = Rc::clone(&log);
        bind.subscribe(BindEventKind::Release, move |e| {
            third
                .borrow_mut()
                .push(format!("release:{}ms", e.held_for.as_millis()))
        });

        bind.update(true, t0, DEFAULT_HOLD_THRESHOLD);
        bind.update(false, t0 + ms(40), DEFAULT_HOLD_THRESHOLD);
        assert_eq!(*log.borrow(), vec!["1:fire", "2:fire", "release:40ms"]);

        assert!(bind.unsubscribe(id));
        assert!(!bind.unsubscribe(id));
        assert_eq!(bind.subscriber_count(), 2);

        log.borrow_mut().clear();
        bind.update(true, t0 + ms(60), DEFAULT_HOLD_THRESHOLD);
        assert_eq!(*log.borrow(), vec!["2:fire"]);
    }

    #[test]
    fn test_subscription_ids_unique() {
        let mut bind = bound(false);
        let a = bind.subscribe(BindEventKind::NewPress, |_| {});
        let b = bind.subscribe(BindEventKind::NewPress, |_| {});
        bind.unsubscribe(a);
        let c = bind.subscribe(BindEventKind::NewPress, |_| {});
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_hold_fires_every_tick_past_threshold() {
        let t0 = Instant::now();
        let count = Rc::new(RefCell::new(0));
        let mut bind = bound(false);
        let counter = Rc::clone(&count);
        bind.subscribe(BindEventKind::PressAndHold, move |_| {
            *counter.borrow_mut() += 1
        });

        // new press counts once, then 600 and 700 are past the threshold
        for t in [0, 200, 400, 600, 700] {
            bind.update(true, t0 + ms(t), DEFAULT_HOLD_THRESHOLD);
        }
        assert_eq!(*count.borrow(), 3);
    }
}
