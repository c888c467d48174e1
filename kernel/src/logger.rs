//! Kernel logger backend
//!
//! Routes the `log` facade to a byte console (serial port, VGA, test
//! capture). Formatting happens in a fixed stack buffer: no allocation, so it
//! is usable before the heap exists.

use core::fmt::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Once;

use crate::error::{TimerError, TimerResult};

/// Longest line emitted; longer messages are truncated
pub const LINE_CAPACITY: usize = 512;

/// Byte sink for log lines
pub trait Console: Sync {
    fn write_bytes(&self, bytes: &[u8]);
}

/// Logger writing `[LEVEL] target: message` lines to a [`Console`]
pub struct KernelLogger {
    console: Once<&'static dyn Console>,
}

impl KernelLogger {
    pub const fn new() -> Self {
        Self {
            console: Once::new(),
        }
    }

    /// Attach the console; later calls keep the first one
    pub fn attach(&self, console: &'static dyn Console) {
        self.console.call_once(|| console);
    }

    fn level_str(level: Level) -> &'static str {
        match level {
            Level::Error => "ERROR",
            Level::Warn  => "WARN ",
            Level::Info  => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Format `record` into `buffer`, returning the number of bytes written
    pub fn format(record: &Record, buffer: &mut [u8]) -> usize {
        let mut writer = BufferWriter { buffer, pos: 0 };
        let _ = writeln!(
            &mut writer,
            "[{}] {}: {}",
            Self::level_str(record.level()),
            record.target(),
            record.args()
        );
        writer.pos
    }
}

impl Default for KernelLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for KernelLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        self.console.is_completed()
    }

    fn log(&self, record: &Record) {
        if let Some(console) = self.console.get() {
            let mut buf = [0u8; LINE_CAPACITY];
            let len = Self::format(record, &mut buf);
            console.write_bytes(&buf[..len]);
        }
    }

    fn flush(&self) {}
}

/// Simple buffer writer for formatting without alloc
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> core::fmt::Write for BufferWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

/// Global logger instance
static LOGGER: KernelLogger = KernelLogger::new();

/// Install the kernel logger on `console`
///
/// Call this very early in boot, before `time::init`.
pub fn init(console: &'static dyn Console, level: LevelFilter) -> TimerResult<()> {
    log::set_logger(&LOGGER).map_err(|_| TimerError::LoggerAlreadySet)?;
    LOGGER.attach(console);
    log::set_max_level(level);
    Ok(())
}
