pub mod irq;

pub use irq::{without_interrupts, IrqCell, IrqGuard};
