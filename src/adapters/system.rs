//! Device restart adapter.
//!
//! On ESP-IDF this is `esp_restart()`, which does not return. On the
//! host it only counts requests so tests and simulation runs can observe
//! an escalation.

use log::warn;

use crate::app::ports::RestartPort;

#[derive(Default)]
pub struct SystemRestart {
    #[cfg(not(target_os = "espidf"))]
    requested: u32,
}

impl SystemRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts requested so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn requested(&self) -> u32 {
        self.requested
    }
}

impl RestartPort for SystemRestart {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        warn!("SYSTEM | restarting");
        // SAFETY: esp_restart has no preconditions.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        self.requested += 1;
        warn!("SYSTEM(sim) | restart requested ({})", self.requested);
    }
}
