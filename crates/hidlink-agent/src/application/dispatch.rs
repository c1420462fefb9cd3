//! Dispatcher: executes decoded commands against a keyboard/mouse actuator.
//!
//! This use case sits at the application layer and delegates to a
//! [`HidActuator`] trait object for the actual input injection.  Actuator
//! implementations live in the infrastructure layer.
//!
//! # Timing
//!
//! [`Dispatcher::dispatch`] is blocking.  A combo with a hold time sleeps the
//! calling thread through the injected [`Sleeper`] between press and release,
//! so the dispatcher must run on a dedicated thread (see
//! [`control_loop`](super::control_loop)), never on an async executor.
//!
//! # Release semantics
//!
//! A released combo (and [`Command::KeyRelease`]) calls `release_all()` and
//! then releases Left, Right and Middle individually.  Releasing a button
//! that is not pressed is harmless, and this guarantees no button stays stuck
//! regardless of what the combo pressed.

use std::sync::Arc;
use std::time::Duration;

use hidlink_core::protocol::command::{Command, KeyCombo, MouseButton};
use hidlink_core::Reply;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Default pause between pressing and releasing an auto-released combo.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(5);

/// Failure reported by an actuator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("device error: {0}")]
    Device(String),
    #[error("device disconnected")]
    Disconnected,
}

/// Error type for command dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The actuator link is down; nothing was sent.
    #[error("not connected")]
    NotReady,
    /// The actuator rejected a call part-way through the command.
    #[error("actuator failure: {0}")]
    Actuator(#[from] ActuatorError),
    /// The control loop has shut down and no longer accepts commands.
    #[error("dispatcher stopped")]
    Stopped,
}

impl From<DispatchError> for Reply {
    fn from(err: DispatchError) -> Self {
        Reply::Err(err.to_string())
    }
}

/// Keyboard/mouse actuator boundary.
///
/// Key codes are USB HID usage IDs.  Implementations must be safe to share;
/// the dispatcher is the only caller that mutates device state.
#[cfg_attr(test, mockall::automock)]
pub trait HidActuator: Send + Sync {
    /// Presses and holds one key.
    fn press(&self, code: u8) -> Result<(), ActuatorError>;

    /// Releases one key.
    fn release(&self, code: u8) -> Result<(), ActuatorError>;

    /// Releases every held key.
    fn release_all(&self) -> Result<(), ActuatorError>;

    /// Emits one relative motion/scroll report.
    fn move_and_scroll(&self, dx: i8, dy: i8, wheel: i8) -> Result<(), ActuatorError>;

    /// Presses and immediately releases one mouse button.
    fn click(&self, button: MouseButton) -> Result<(), ActuatorError>;

    /// Presses and holds one mouse button.
    fn press_button(&self, button: MouseButton) -> Result<(), ActuatorError>;

    /// Releases one mouse button.
    fn release_button(&self, button: MouseButton) -> Result<(), ActuatorError>;

    /// Types one character as a full keystroke.
    fn type_char(&self, ch: char) -> Result<(), ActuatorError>;

    /// Returns `true` while the host link is up.
    fn is_connected(&self) -> bool;
}

/// Blocking delay source, injectable so tests do not sleep.
pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Timing knobs for combo execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Minimum hold before an auto-release, so the host registers the press.
    pub settle: Duration,
    /// Optional upper bound on a hold.  `None` runs every hold to completion.
    pub max_hold: Option<Duration>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            max_hold: None,
        }
    }
}

/// Executes [`Command`]s against an actuator.
pub struct Dispatcher {
    actuator: Arc<dyn HidActuator>,
    sleeper: Box<dyn Sleeper>,
    settings: DispatchSettings,
}

impl Dispatcher {
    /// Creates a dispatcher over `actuator`.
    pub fn new(
        actuator: Arc<dyn HidActuator>,
        sleeper: Box<dyn Sleeper>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            actuator,
            sleeper,
            settings,
        }
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NotReady`] if the actuator is disconnected; the
    ///   actuator is not touched.
    /// - [`DispatchError::Actuator`] if an actuator call fails.  Calls made
    ///   before the failure are not undone.
    pub fn dispatch(&mut self, command: &Command) -> Result<(), DispatchError> {
        if !command.is_actuation() {
            trace!("ping");
            return Ok(());
        }
        if !self.actuator.is_connected() {
            debug!(command = command.name(), "actuator not connected; command refused");
            return Err(DispatchError::NotReady);
        }

        match command {
            Command::Ping => {}
            Command::MouseMove { dx, dy } => self.actuator.move_and_scroll(*dx, *dy, 0)?,
            Command::MouseWheel { delta } => self.actuator.move_and_scroll(0, 0, *delta)?,
            Command::MouseClick { buttons } => {
                for button in buttons.iter() {
                    self.actuator.click(button)?;
                }
            }
            Command::KeyCombo(combo) => self.run_combo(combo)?,
            Command::KeyRelease => self.release_everything()?,
            Command::TypeText { text } => {
                for ch in text.chars() {
                    self.actuator.type_char(ch)?;
                }
            }
        }
        Ok(())
    }

    fn run_combo(&self, combo: &KeyCombo) -> Result<(), ActuatorError> {
        for modifier in combo.modifiers.keys() {
            self.actuator.press(modifier.as_u8())?;
        }
        for &code in combo.keys.as_slice() {
            self.actuator.press(code)?;
        }
        for button in combo.mouse_buttons.iter() {
            self.actuator.press_button(button)?;
        }

        let requested = combo.hold.unwrap_or(Duration::ZERO);
        let hold = match self.settings.max_hold {
            Some(max) if requested > max => {
                warn!(
                    requested_ms = requested.as_millis() as u64,
                    max_ms = max.as_millis() as u64,
                    "combo hold capped"
                );
                max
            }
            _ => requested,
        };
        let wait = if combo.release {
            hold.max(self.settings.settle)
        } else {
            hold
        };
        if !wait.is_zero() {
            self.sleeper.sleep(wait);
        }

        if combo.release {
            self.release_everything()?;
        }
        Ok(())
    }

    fn release_everything(&self) -> Result<(), ActuatorError> {
        self.actuator.release_all()?;
        for button in MouseButton::ALL {
            self.actuator.release_button(button)?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
