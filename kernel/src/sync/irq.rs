//! Interrupt-masked critical sections
//!
//! On a single core, masking interrupts is enough to exclude the tick
//! handler, which is the only other party touching the time subsystem's
//! state. [`IrqGuard`] is the proof that interrupts are masked, and
//! [`IrqCell`] only hands out its contents against such a proof.

use core::cell::UnsafeCell;
use core::marker::PhantomData;

use crate::arch::{InterruptControl, IntrLevel};

/// Masks interrupts for its lifetime and restores the previous level on drop.
///
/// Guards nest: an inner guard sees `Off` as the previous level and leaves
/// interrupts masked when it goes away.
pub struct IrqGuard<'a> {
    irq: &'a dyn InterruptControl,
    previous: IntrLevel,
    // Interrupt state belongs to the CPU that created the guard.
    _not_send: PhantomData<*const ()>,
}

impl<'a> IrqGuard<'a> {
    /// Mask interrupts
    #[inline]
    pub fn new(irq: &'a dyn InterruptControl) -> Self {
        let previous = irq.disable();
        Self {
            irq,
            previous,
            _not_send: PhantomData,
        }
    }

    /// Level that will be restored when the guard is dropped
    #[inline]
    pub fn previous(&self) -> IntrLevel {
        self.previous
    }
}

impl Drop for IrqGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.irq.set_level(self.previous);
    }
}

/// Exécute une closure avec les interruptions désactivées
///
/// The previous level is restored afterwards, whatever it was.
#[inline]
pub fn without_interrupts<F, R>(irq: &dyn InterruptControl, f: F) -> R
where
    F: FnOnce(&IrqGuard<'_>) -> R,
{
    let guard = IrqGuard::new(irq);
    f(&guard)
}

/// Data shared between normal context and the interrupt handler.
///
/// Access requires an [`IrqGuard`], so the contents can only be reached with
/// interrupts masked. Only shared references are handed out; mutation goes
/// through `Cell`/`RefCell` inside.
pub struct IrqCell<T> {
    inner: UnsafeCell<T>,
}

// SAFETY: the contents are only reachable through `borrow`, which requires
// interrupts to be masked. With a single core that excludes every other
// accessor, so `T` only ever needs to move between contexts, not be shared.
unsafe impl<T: Send> Sync for IrqCell<T> {}

impl<T> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    /// Borrow the contents for as long as interrupts stay masked
    #[inline]
    pub fn borrow<'g>(&'g self, _guard: &'g IrqGuard<'_>) -> &'g T {
        // SAFETY: `_guard` proves interrupts are masked for 'g.
        unsafe { &*self.inner.get() }
    }

    /// Exclusive access, no masking needed
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}
