//! Session countdown. Decrements once per tick while running and fires expiry exactly once.
//!
//! The timer holds no clock of its own: the owner feeds it ticks (see `usecases::ticker`).
//! The expiry hook is looked up at fire time, so re-registering it between ticks always
//! replaces the handler that will run.

use std::fmt;

/// Handler invoked when the countdown reaches zero.
pub type ExpiryHook = Box<dyn FnMut() + Send>;

pub struct SessionTimer {
    remaining_secs: u64,
    running: bool,
    fired: bool,
    on_expire: Option<ExpiryHook>,
}

impl SessionTimer {
    /// Stopped timer with `initial_secs` on the clock.
    pub fn new(initial_secs: u64) -> Self {
        Self {
            remaining_secs: initial_secs,
            running: false,
            fired: false,
            on_expire: None,
        }
    }

    /// Rewind to `initial_secs` and clear the fired flag. Leaves the run flag untouched.
    pub fn reset(&mut self, initial_secs: u64) {
        self.remaining_secs = initial_secs;
        self.fired = false;
    }

    pub fn start(&mut self) {
        if !self.fired {
            self.running = true;
        }
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Replace the expiry handler. Takes effect for the next firing tick.
    pub fn set_on_expire(&mut self, hook: ExpiryHook) {
        self.on_expire = Some(hook);
    }

    /// Advance by one unit. Returns true only on the tick that crosses zero.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.fired {
            return false;
        }
        if self.remaining_secs <= 1 {
            self.remaining_secs = 0;
            self.fired = true;
            self.running = false;
            if let Some(hook) = self.on_expire.as_mut() {
                hook();
            }
            return true;
        }
        self.remaining_secs -= 1;
        false
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTimer")
            .field("remaining_secs", &self.remaining_secs)
            .field("running", &self.running)
            .field("fired", &self.fired)
            .field("has_hook", &self.on_expire.is_some())
            .finish()
    }
}
