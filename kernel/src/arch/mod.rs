// src/arch/mod.rs
// Abstraction d'architecture - contrôle des interruptions et source de ticks

//! Hardware collaborators of the time subsystem.
//!
//! The subsystem never touches the interrupt flag or the timer chip
//! directly: the embedding kernel hands it an [`InterruptControl`] and a
//! [`TickSource`]. On bare-metal x86_64 the [`x86_64::Cpu`] backend is
//! available.

use core::fmt;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod x86_64;

/// Interrupt masking level of the current CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrLevel {
    /// Interrupts are delivered
    On,
    /// Interrupts are masked
    Off,
}

impl IntrLevel {
    /// Check if interrupts are delivered at this level
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for IntrLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Masks and unmasks interrupts on the current CPU.
///
/// Every method returns the level that was in effect *before* the call so
/// that callers can restore it, the same save/restore discipline as
/// `without_interrupts`.
pub trait InterruptControl: Sync {
    /// Current level
    fn level(&self) -> IntrLevel;

    /// Mask interrupts, returning the previous level
    fn disable(&self) -> IntrLevel;

    /// Unmask interrupts, returning the previous level
    fn enable(&self) -> IntrLevel;

    /// Switch to `level`, returning the previous level
    fn set_level(&self, level: IntrLevel) -> IntrLevel {
        match level {
            IntrLevel::On => self.enable(),
            IntrLevel::Off => self.disable(),
        }
    }
}

/// Periodic interrupt generator (PIT channel 0, HPET, APIC timer...).
pub trait TickSource {
    /// Program the hardware to fire `frequency` times per second and route
    /// every interrupt to `handler`.
    fn start_periodic(&self, frequency: u32, handler: fn());
}
