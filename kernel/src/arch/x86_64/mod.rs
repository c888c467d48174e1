// src/arch/x86_64/mod.rs
// Contrôle du flag IF (RFLAGS bit 9)

use super::{InterruptControl, IntrLevel};

/// RFLAGS.IF
const RFLAGS_IF: u64 = 1 << 9;

/// The boot CPU's interrupt flag.
pub struct Cpu;

impl Cpu {
    /// Vérifie si les interruptions sont activées
    #[inline(always)]
    fn interrupts_enabled() -> bool {
        let flags: u64;
        unsafe {
            core::arch::asm!("pushfq; pop {}", out(reg) flags, options(nomem, preserves_flags));
        }
        flags & RFLAGS_IF != 0
    }
}

impl InterruptControl for Cpu {
    #[inline]
    fn level(&self) -> IntrLevel {
        if Self::interrupts_enabled() {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    #[inline]
    fn disable(&self) -> IntrLevel {
        let old = self.level();
        unsafe {
            core::arch::asm!("cli", options(nostack));
        }
        old
    }

    #[inline]
    fn enable(&self) -> IntrLevel {
        let old = self.level();
        unsafe {
            core::arch::asm!("sti", options(nostack));
        }
        old
    }
}
