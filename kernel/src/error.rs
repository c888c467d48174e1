//! Time subsystem errors
//!
//! Only startup can fail. Once the subsystem runs, contract violations
//! (sleeping with interrupts masked, calibrating without a ticking timer)
//! are caller bugs and halt the kernel instead of being reported.

use core::fmt;

/// Errors returned while configuring or installing the time subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    // ═══════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════

    /// Requested tick frequency outside what the timer chip supports
    FrequencyOutOfRange { hz: u32, min: u32, max: u32 },

    // ═══════════════════════════════════════════════════════════════
    // Initialization Errors
    // ═══════════════════════════════════════════════════════════════

    /// `time::init` already ran
    AlreadyInitialized,

    /// A global logger is already installed
    LoggerAlreadySet,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfRange { hz, min, max } => {
                write!(f, "Tick frequency {} Hz out of range [{}, {}]", hz, min, max)
            }
            Self::AlreadyInitialized => write!(f, "Time subsystem already initialized"),
            Self::LoggerAlreadySet => write!(f, "Logger already installed"),
        }
    }
}

impl TimerError {
    /// Get recovery hint for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::FrequencyOutOfRange { .. } => "Pick a frequency between 19 and 1000 Hz",
            Self::AlreadyInitialized => "Call time::init once, before enabling interrupts",
            Self::LoggerAlreadySet => "Install the kernel logger once at boot",
        }
    }
}

/// Result type for time subsystem setup
pub type TimerResult<T> = Result<T, TimerError>;
