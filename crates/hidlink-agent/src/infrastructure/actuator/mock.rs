//! Recording actuator for tests.
//!
//! Every call is appended to an in-memory log so assertions can inspect
//! exactly what was sent and in what order.  The mock also tracks which keys
//! and buttons are currently held, which makes stuck-key bugs visible without
//! reading the whole call log.
//!
//! # Failure injection
//!
//! - [`MockActuator::set_connected`] with `false` makes `is_connected()` report
//!   a dead link.
//! - [`MockActuator::set_should_fail`] with `true` makes every fallible method
//!   return [`ActuatorError::Device`] without recording anything.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hidlink_core::MouseButton;

use crate::application::dispatch::{ActuatorError, HidActuator};

/// One recorded actuator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCall {
    Press(u8),
    Release(u8),
    ReleaseAll,
    MoveAndScroll { dx: i8, dy: i8, wheel: i8 },
    Click(MouseButton),
    PressButton(MouseButton),
    ReleaseButton(MouseButton),
    TypeChar(char),
}

#[derive(Default)]
struct State {
    calls: Vec<ActuatorCall>,
    held_keys: BTreeSet<u8>,
    held_buttons: Vec<MouseButton>,
}

/// Actuator that records calls instead of driving a device.
pub struct MockActuator {
    state: Mutex<State>,
    connected: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockActuator {
    /// Creates a connected mock with an empty log.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            connected: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.lock().calls.clone()
    }

    /// Keys pressed and not yet released, in ascending code order.
    pub fn held_keys(&self) -> Vec<u8> {
        self.lock().held_keys.iter().copied().collect()
    }

    /// Mouse buttons pressed and not yet released.
    pub fn held_buttons(&self) -> Vec<MouseButton> {
        self.lock().held_buttons.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `call` after applying `update` to the held state.
    fn record(&self, call: ActuatorCall, update: impl FnOnce(&mut State)) -> Result<(), ActuatorError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::Device("mock failure".into()));
        }
        let mut state = self.lock();
        update(&mut state);
        state.calls.push(call);
        Ok(())
    }
}

impl HidActuator for MockActuator {
    fn press(&self, code: u8) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::Press(code), |s| {
            s.held_keys.insert(code);
        })
    }

    fn release(&self, code: u8) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::Release(code), |s| {
            s.held_keys.remove(&code);
        })
    }

    fn release_all(&self) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::ReleaseAll, |s| s.held_keys.clear())
    }

    fn move_and_scroll(&self, dx: i8, dy: i8, wheel: i8) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::MoveAndScroll { dx, dy, wheel }, |_| {})
    }

    fn click(&self, button: MouseButton) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::Click(button), |_| {})
    }

    fn press_button(&self, button: MouseButton) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::PressButton(button), |s| {
            if !s.held_buttons.contains(&button) {
                s.held_buttons.push(button);
            }
        })
    }

    fn release_button(&self, button: MouseButton) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::ReleaseButton(button), |s| {
            s.held_buttons.retain(|b| *b != button);
        })
    }

    fn type_char(&self, ch: char) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::TypeChar(ch), |_| {})
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
