// Licensed under the Apache-2.0 license

//! Shared infrastructure used by every hub driver: the logging abstraction
//! and 7-bit I2C address helpers.

use embedded_io::Write;

/// Capacity of a single formatted log line. Longer messages are truncated.
pub const LOG_LINE_CAPACITY: usize = 96;

/// Lowest non-reserved 7-bit I2C address.
pub const MIN_I2C_ADDRESS: u8 = 0x08;
/// Highest non-reserved 7-bit I2C address.
pub const MAX_I2C_ADDRESS: u8 = 0x77;

/// Minimal logging sink used by the drivers.
///
/// Drivers take the logger as a type parameter so that a build without a
/// console pays nothing for log calls (see [`NoOpLogger`]).
pub trait Logger {
    fn debug(&mut self, msg: &str);
    fn info(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Logger that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}
    fn info(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Logger writing one line per message to a serial console.
///
/// Console write errors are ignored; losing a log line must never fail a
/// bus operation.
pub struct UartLogger<W: Write> {
    console: W,
}

impl<W: Write> UartLogger<W> {
    pub fn new(console: W) -> Self {
        Self { console }
    }

    /// Give the console back.
    pub fn release(self) -> W {
        self.console
    }

    fn line(&mut self, level: &str, msg: &str) {
        let _ = self.console.write_all(level.as_bytes());
        let _ = self.console.write_all(b" ");
        let _ = self.console.write_all(msg.as_bytes());
        let _ = self.console.write_all(b"\r\n");
    }
}

impl<W: Write> Logger for UartLogger<W> {
    fn debug(&mut self, msg: &str) {
        self.line("DEBUG", msg);
    }

    fn info(&mut self, msg: &str) {
        self.line("INFO", msg);
    }

    fn error(&mut self, msg: &str) {
        self.line("ERROR", msg);
    }
}

/// Format a message into a stack buffer and hand it to a [`Logger`].
///
/// `hub_log!(self.logger, error, "Invalid channel {}", ch)`
macro_rules! hub_log {
    ($logger:expr, $level:ident, $($arg:tt)*) => {{
        let mut line: heapless::String<{ $crate::common::LOG_LINE_CAPACITY }> =
            heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut line, format_args!($($arg)*));
        $crate::common::Logger::$level(&mut $logger, line.as_str());
    }};
}
pub(crate) use hub_log;

/// Whether `address` is a usable 7-bit device address, i.e. outside the
/// reserved ranges `0x00..=0x07` and `0x78..=0x7F`.
#[must_use]
pub const fn is_valid_i2c_address(address: u8) -> bool {
    address >= MIN_I2C_ADDRESS && address <= MAX_I2C_ADDRESS
}
