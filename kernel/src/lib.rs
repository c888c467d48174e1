// src/lib.rs
// Sous-système de temps du noyau : compteur de ticks, sommeil, réveil
#![cfg_attr(not(test), no_std)] // Pas de bibliothèque standard hors tests
#![deny(unsafe_op_in_unsafe_fn)]

//! Tick-driven sleep/wake subsystem.
//!
//! A running thread suspends itself with [`time::sleep_ticks`] (or one of the
//! real-time wrappers) and is handed back to the scheduler by the periodic
//! tick interrupt once its deadline has passed. The only shared state, the
//! tick counter and the sleep registry, is touched exclusively with
//! interrupts masked (see [`sync`]).
//!
//! The scheduler, the interrupt controller and the hardware timer are
//! supplied by the embedding kernel through the traits in [`scheduler`] and
//! [`arch`].

pub mod arch;
pub mod config;
pub mod error;
pub mod logger;
pub mod scheduler;
pub mod sync;
pub mod time;

pub use config::{SchedulingMode, TimerConfig};
pub use error::TimerError;
pub use time::{SleepTimer, Tick, Ticks};
