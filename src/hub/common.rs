// Licensed under the Apache-2.0 license

//! Common types for the hub drivers.
//!
//! This module provides the shared error taxonomy, the bus speed enumeration
//! and the hub configuration (with its builder) used by both the channel
//! switch and the port hub.

use fugit::MillisDurationU32;

/// Errors reported by the hub drivers.
///
/// `E` is the error type of the underlying I2C bus. Validation failures are
/// always detected before any bus traffic; `Transport` carries the bus error
/// unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus reported a NACK, arbitration loss or similar.
    Transport(E),
    /// Channel, index or value outside its permitted range.
    InvalidArgument,
    /// The detected firmware variant lacks the requested capability.
    Unsupported,
    /// The bounded address-change poll expired.
    Timeout,
    /// Anything else.
    Unknown,
}

/// Flat classification of an operation outcome.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Ok,
    TransportError,
    InvalidArgument,
    UnsupportedOperation,
    UnknownError,
}

impl<E> Error<E> {
    /// Classification of this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Error::Transport(_) | Error::Timeout => ErrorCode::TransportError,
            Error::InvalidArgument => ErrorCode::InvalidArgument,
            Error::Unsupported => ErrorCode::UnsupportedOperation,
            Error::Unknown => ErrorCode::UnknownError,
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Transport(e)
    }
}

impl ErrorCode {
    /// Classify a driver result.
    pub fn of<T, E>(result: &Result<T, Error<E>>) -> Self {
        match result {
            Ok(_) => ErrorCode::Ok,
            Err(e) => e.code(),
        }
    }
}

impl<E: embedded_hal::i2c::Error> embedded_hal::i2c::Error for Error<E> {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Error::Transport(e) => e.kind(),
            _ => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

impl<E: core::fmt::Debug> embedded_hal::digital::Error for Error<E> {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

/// Runtime configuration of a hub instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HubConfig {
    /// 7-bit bus address of the hub itself.
    pub address: u8,
    /// Bus clock the hub is specified for. The driver does not configure the
    /// bus; whoever sets up the controller should honour this.
    pub speed: I2cSpeed,
    /// Number of downstream channels exposed by the board.
    pub max_children: u8,
    /// Upper bound for the address-change confirmation poll.
    pub address_change_timeout: MillisDurationU32,
    /// Delay between two confirmation attempts.
    pub poll_interval: MillisDurationU32,
}

pub struct HubConfigBuilder {
    address: u8,
    speed: I2cSpeed,
    max_children: u8,
    address_change_timeout: MillisDurationU32,
    poll_interval: MillisDurationU32,
}

impl Default for HubConfigBuilder {
    fn default() -> Self {
        Self::channel_switch()
    }
}

impl HubConfigBuilder {
    /// PCA9548AP defaults: address 0x70, all eight channels.
    #[must_use]
    pub fn channel_switch() -> Self {
        Self {
            address: 0x70,
            speed: I2cSpeed::Fast,
            max_children: 8,
            address_change_timeout: MillisDurationU32::millis(1000),
            poll_interval: MillisDurationU32::millis(1),
        }
    }

    /// Unit PaHub: a PCA9548AP with six of its channels wired to ports.
    #[must_use]
    pub fn pa_hub() -> Self {
        Self::channel_switch().max_children(6)
    }

    /// Unit PbHub defaults: address 0x61, six channels.
    #[must_use]
    pub fn port_hub() -> Self {
        Self::channel_switch().address(0x61).max_children(6)
    }

    #[must_use]
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn max_children(mut self, count: u8) -> Self {
        self.max_children = count;
        self
    }
    #[must_use]
    pub fn address_change_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.address_change_timeout = timeout;
        self
    }
    #[must_use]
    pub fn poll_interval(mut self, interval: MillisDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }
    #[must_use]
    pub fn build(self) -> HubConfig {
        HubConfig {
            address: self.address,
            speed: self.speed,
            max_children: self.max_children,
            address_change_timeout: self.address_change_timeout,
            poll_interval: self.poll_interval,
        }
    }
}
