//! Time subsystem configuration
//!
//! Resolved once at boot and passed to [`crate::time::init`].

use static_assertions::const_assert;

use crate::error::{TimerError, TimerResult};

/// Slowest tick rate the 8254 divisor can produce (16-bit reload value)
pub const MIN_FREQUENCY: u32 = 19;

/// Fastest recommended tick rate
pub const MAX_FREQUENCY: u32 = 1000;

/// Tick rate used when none is configured
pub const DEFAULT_FREQUENCY: u32 = 100;

const_assert!(DEFAULT_FREQUENCY >= MIN_FREQUENCY);
const_assert!(DEFAULT_FREQUENCY <= MAX_FREQUENCY);

/// First loop count tried by the calibrator
pub const CALIBRATION_BASELINE: u32 = 1 << 10;

/// Bits below the leading one refined after the doubling phase
pub const CALIBRATION_REFINE_BITS: u32 = 8;

const_assert!(CALIBRATION_BASELINE >> CALIBRATION_REFINE_BITS > 0);

/// How the scheduler picks threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingMode {
    /// Plain round robin, no per-thread feedback state
    #[default]
    RoundRobin,
    /// Multi-level feedback queue: priority and quantum usage are
    /// snapshotted across sleeps
    Feedback,
}

/// Tick frequency and scheduling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    frequency: u32,
    mode: SchedulingMode,
}

impl TimerConfig {
    /// 100 Hz, round robin
    pub const fn new() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            mode: SchedulingMode::RoundRobin,
        }
    }

    /// Set the tick frequency in Hz
    pub fn with_frequency(self, hz: u32) -> TimerResult<Self> {
        if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&hz) {
            return Err(TimerError::FrequencyOutOfRange {
                hz,
                min: MIN_FREQUENCY,
                max: MAX_FREQUENCY,
            });
        }
        Ok(Self { frequency: hz, ..self })
    }

    /// Set the scheduling mode
    pub const fn with_mode(self, mode: SchedulingMode) -> Self {
        Self { mode, ..self }
    }

    /// Ticks per second
    pub const fn frequency(&self) -> u32 {
        self.frequency
    }

    pub const fn mode(&self) -> SchedulingMode {
        self.mode
    }

    /// Whether sleep records carry a feedback snapshot
    pub const fn snapshots_feedback(&self) -> bool {
        matches!(self.mode, SchedulingMode::Feedback)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new()
    }
}
