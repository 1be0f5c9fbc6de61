// Licensed under the Apache-2.0 license

//! Unit PbHub / PbHub v1.1 port expander.
//!
//! The hub exposes six channels with two lines each (digital in/out, analog
//! in, PWM and servo on v1.1) plus an LED strip driver per channel. There is
//! no channel select: every register address carries its channel (see
//! [`crate::hub::port_registers`]).
//!
//! ## Firmware variants
//!
//! `begin()` probes the firmware version register. The first PbHub board does
//! not implement it and NACKs; the v1.1 board returns its firmware version.
//!
//! | capability                                  | Base | Extended(v) |
//! |---------------------------------------------|------|-------------|
//! | digital I/O, analog read, LED count/color   | yes  | yes         |
//! | analog write                                | yes  | no          |
//! | PWM, servo angle/pulse                      | no   | yes         |
//! | LED mode                                    | no   | v >= 2      |
//!
//! Gated operations fail with [`Error::Unsupported`] before any bus traffic,
//! including when `begin()` has not determined the variant yet.

use crate::common::{hub_log, is_valid_i2c_address, Logger, NoOpLogger};
use crate::hub::common::{Error, HubConfig};
use crate::hub::port_channel::PortChannel;
use crate::hub::port_registers::{
    register_address, valid_angle, valid_pulse, LedFill, LedMode, LedRecord,
    FIRMWARE_VERSION_REG, I2C_ADDRESS_REG, LED_BRIGHTNESS_REG, LED_COLOR_MORE_REG,
    LED_COLOR_SINGLE_REG, LED_MODE_REG, LED_NUM_REG, MAX_ANGLE, MAX_CHANNEL, MAX_LED_COUNT,
    MAX_PULSE, MIN_ANGLE, MIN_PULSE, PWM_0_REG, READ_ANALOG_0_REG, READ_DIGITAL_0_REG,
    SERVO_ANGLE_0_REG, SERVO_PULSE_0_REG, WRITE_ANALOG_0_REG, WRITE_DIGITAL_0_REG,
};
use crate::hub::register::RegisterBus;
use crate::hub::traits::{Adapter, ChannelRouter};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};

/// Hardware/firmware tier detected by [`PortHub::begin`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FirmwareVariant {
    /// `begin()` has not run (or failed).
    Undetermined,
    /// First PbHub board, no firmware version register.
    Base,
    /// PbHub v1.1 with the given firmware version.
    Extended(u8),
}

impl FirmwareVariant {
    /// Variant implied by a firmware version byte.
    #[must_use]
    pub const fn from_version(version: u8) -> Self {
        if version == 0 {
            FirmwareVariant::Base
        } else {
            FirmwareVariant::Extended(version)
        }
    }

    /// Version byte; 0 for the base board.
    #[must_use]
    pub const fn version(&self) -> Option<u8> {
        match self {
            FirmwareVariant::Undetermined => None,
            FirmwareVariant::Base => Some(0),
            FirmwareVariant::Extended(v) => Some(*v),
        }
    }

    #[must_use]
    pub const fn supports_analog_write(&self) -> bool {
        matches!(self, FirmwareVariant::Base)
    }

    #[must_use]
    pub const fn supports_pwm(&self) -> bool {
        matches!(self, FirmwareVariant::Extended(_))
    }

    #[must_use]
    pub const fn supports_servo(&self) -> bool {
        matches!(self, FirmwareVariant::Extended(_))
    }

    #[must_use]
    pub const fn supports_led_mode(&self) -> bool {
        matches!(self, FirmwareVariant::Extended(v) if *v >= 2)
    }
}

/// Generates the `…0` / `…1` accessor pair for a per-line operation.
macro_rules! line_pair {
    ($pre:ident $(, $post:ident)? => $inner:ident($($arg:ident: $ty:ty),*) -> $ret:ty) => {
        paste::paste! {
            #[doc = concat!("[`Self::", stringify!($inner), "`] on line 0.")]
            pub fn [<$pre 0 $($post)?>](
                &mut self,
                channel: u8
                $(, $arg: $ty)*
            ) -> Result<$ret, Error<I2C::Error>> {
                self.$inner(channel, 0 $(, $arg)*)
            }

            #[doc = concat!("[`Self::", stringify!($inner), "`] on line 1.")]
            pub fn [<$pre 1 $($post)?>](
                &mut self,
                channel: u8
                $(, $arg: $ty)*
            ) -> Result<$ret, Error<I2C::Error>> {
                self.$inner(channel, 1 $(, $arg)*)
            }
        }
    };
}

pub struct PortHub<I2C: I2c, L: Logger = NoOpLogger> {
    regs: RegisterBus<I2C>,
    config: HubConfig,
    logger: L,
    variant: FirmwareVariant,
    /// Last LED count written per channel. Not read back from the hub.
    led_counts: [u16; MAX_CHANNEL],
}

impl<I2C: I2c, L: Logger> PortHub<I2C, L> {
    /// Create a driver for the hub at `config.address`. No bus traffic.
    pub fn new(bus: I2C, mut config: HubConfig, logger: L) -> Self {
        config.max_children = config.max_children.min(MAX_CHANNEL as u8);
        Self {
            regs: RegisterBus::new(bus, config.address),
            config,
            logger,
            variant: FirmwareVariant::Undetermined,
            led_counts: [MAX_LED_COUNT; MAX_CHANNEL],
        }
    }

    #[must_use]
    pub const fn address(&self) -> SevenBitAddress {
        self.regs.address()
    }

    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }

    #[must_use]
    pub const fn firmware_variant(&self) -> FirmwareVariant {
        self.variant
    }

    /// Firmware version detected by `begin()`: `Some(0)` for the base board.
    #[must_use]
    pub const fn firmware_version(&self) -> Option<u8> {
        self.variant.version()
    }

    /// Detect the hub and its firmware variant.
    ///
    /// Every channel is probed with a digital read. A failing firmware
    /// version read marks the board as [`FirmwareVariant::Base`].
    ///
    /// # Errors
    ///
    /// Transport error of the first failing probe; the variant stays
    /// undetermined.
    pub fn begin(&mut self) -> Result<(), Error<I2C::Error>> {
        for channel in 0..self.config.max_children {
            if let Err(e) = self.read_digital(channel, 0) {
                hub_log!(self.logger, error, "Cannot detect PbHub at {:02X}", self.address());
                return Err(e);
            }
        }

        match self.read_firmware_version() {
            Ok(version) => {
                self.variant = FirmwareVariant::from_version(version);
                hub_log!(self.logger, info, "PbHub v1.1 FW:{:02X}", version);
            }
            Err(_) => {
                self.variant = FirmwareVariant::Base;
                hub_log!(self.logger, info, "PbHub");
            }
        }
        Ok(())
    }

    line_pair!(write_digital => write_digital(high: bool) -> ());
    line_pair!(read_digital => read_digital() -> bool);
    line_pair!(write_analog => write_analog(value: u8) -> ());
    line_pair!(write_pwm => write_pwm(value: u8) -> ());
    line_pair!(read_pwm => read_pwm() -> u8);
    line_pair!(write_servo, _angle => write_servo_angle(angle: u8) -> ());
    line_pair!(read_servo, _angle => read_servo_angle() -> u8);
    line_pair!(write_servo, _pulse => write_servo_pulse(pulse: u16) -> ());
    line_pair!(read_servo, _pulse => read_servo_pulse() -> u16);

    /// Drive `line` of `channel` high or low.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a bad channel or line, otherwise the
    /// transport error.
    pub fn write_digital(&mut self, channel: u8, line: u8, high: bool) -> Result<(), Error<I2C::Error>> {
        let reg = self.reg(WRITE_DIGITAL_0_REG, channel, line)?;
        let r = self.regs.write_register8(reg, u8::from(high));
        self.transport(reg, r)
    }

    /// Level of `line` of `channel`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a bad channel or line, otherwise the
    /// transport error.
    pub fn read_digital(&mut self, channel: u8, line: u8) -> Result<bool, Error<I2C::Error>> {
        let reg = self.reg(READ_DIGITAL_0_REG, channel, line)?;
        let r = self.regs.read_register8(reg);
        self.transport(reg, r).map(|v| v != 0)
    }

    /// Analog output on `line` of `channel`. Base board only.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] on the v1.1 board.
    pub fn write_analog(&mut self, channel: u8, line: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.require(self.variant.supports_analog_write(), "Analog write")?;
        let reg = self.reg(WRITE_ANALOG_0_REG, channel, line)?;
        let r = self.regs.write_register8(reg, value);
        self.transport(reg, r)
    }

    /// Analog input on line 0: 0-1023 on the base board, 0-4095 on v1.1.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a bad channel, otherwise the transport
    /// error.
    pub fn read_analog0(&mut self, channel: u8) -> Result<u16, Error<I2C::Error>> {
        let reg = self.reg(READ_ANALOG_0_REG, channel, 0)?;
        let r = self.regs.read_register16_le(reg);
        self.transport(reg, r)
    }

    pub fn write_pwm(&mut self, channel: u8, line: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.require(self.variant.supports_pwm(), "PWM")?;
        let reg = self.reg(PWM_0_REG, channel, line)?;
        let r = self.regs.write_register8(reg, value);
        self.transport(reg, r)
    }

    pub fn read_pwm(&mut self, channel: u8, line: u8) -> Result<u8, Error<I2C::Error>> {
        self.require(self.variant.supports_pwm(), "PWM")?;
        let reg = self.reg(PWM_0_REG, channel, line)?;
        let r = self.regs.read_register8(reg);
        self.transport(reg, r)
    }

    /// Servo angle in degrees, 0 to 180.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] on the base board, [`Error::InvalidArgument`]
    /// for an angle above 180 or a bad channel.
    pub fn write_servo_angle(&mut self, channel: u8, line: u8, angle: u8) -> Result<(), Error<I2C::Error>> {
        self.require(self.variant.supports_servo(), "Servo")?;
        if !valid_angle(angle) {
            hub_log!(self.logger, error, "Invalid angle {} ({} - {})", angle, MIN_ANGLE, MAX_ANGLE);
            return Err(Error::InvalidArgument);
        }
        let reg = self.reg(SERVO_ANGLE_0_REG, channel, line)?;
        let r = self.regs.write_register8(reg, angle);
        self.transport(reg, r)
    }

    pub fn read_servo_angle(&mut self, channel: u8, line: u8) -> Result<u8, Error<I2C::Error>> {
        self.require(self.variant.supports_servo(), "Servo")?;
        let reg = self.reg(SERVO_ANGLE_0_REG, channel, line)?;
        let r = self.regs.read_register8(reg);
        self.transport(reg, r)
    }

    /// Servo pulse width in microseconds, 500 to 2500.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] on the base board, [`Error::InvalidArgument`]
    /// for a pulse outside the range or a bad channel.
    pub fn write_servo_pulse(&mut self, channel: u8, line: u8, pulse: u16) -> Result<(), Error<I2C::Error>> {
        self.require(self.variant.supports_servo(), "Servo")?;
        if !valid_pulse(pulse) {
            hub_log!(self.logger, error, "Invalid pulse {} ({} - {})", pulse, MIN_PULSE, MAX_PULSE);
            return Err(Error::InvalidArgument);
        }
        let reg = self.reg(SERVO_PULSE_0_REG, channel, line)?;
        let r = self.regs.write_register16_le(reg, pulse);
        self.transport(reg, r)
    }

    pub fn read_servo_pulse(&mut self, channel: u8, line: u8) -> Result<u16, Error<I2C::Error>> {
        self.require(self.variant.supports_servo(), "Servo")?;
        let reg = self.reg(SERVO_PULSE_0_REG, channel, line)?;
        let r = self.regs.read_register16_le(reg);
        self.transport(reg, r)
    }

    /// Set the number of LEDs on `channel`'s strip (0 to 74).
    ///
    /// The count is remembered for [`Self::fill_led_color`] once the write
    /// succeeded.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for more than 74 LEDs or a bad channel.
    pub fn write_led_count(&mut self, channel: u8, count: u16) -> Result<(), Error<I2C::Error>> {
        if count > MAX_LED_COUNT {
            hub_log!(self.logger, error, "Too many LEDs {}/{}", count, MAX_LED_COUNT);
            return Err(Error::InvalidArgument);
        }
        let reg = self.reg(LED_NUM_REG, channel, 0)?;
        let r = self.regs.write_register16_le(reg, count);
        self.transport(reg, r)?;
        if let Some(cached) = self.led_counts.get_mut(usize::from(channel)) {
            *cached = count;
        }
        Ok(())
    }

    /// LED count last written for `channel` (74 until written).
    #[must_use]
    pub fn led_count(&self, channel: u8) -> Option<u16> {
        self.led_counts.get(usize::from(channel)).copied()
    }

    /// Set LED `index` of `channel` to `rgb888` (`0x00RRGGBB`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an index of 74 or above or a bad
    /// channel.
    pub fn write_led_color(&mut self, channel: u8, index: u16, rgb888: u32) -> Result<(), Error<I2C::Error>> {
        let reg = self.reg(LED_COLOR_SINGLE_REG, channel, 0)?;
        if index >= MAX_LED_COUNT {
            hub_log!(self.logger, error, "Too many LEDs {}/{}", index, MAX_LED_COUNT);
            return Err(Error::InvalidArgument);
        }
        let record = LedRecord::from_rgb888(index, rgb888);
        let r = self.regs.write_payload(reg, &record);
        self.transport(reg, r)
    }

    /// Set `count` LEDs starting at `first` to `rgb888`.
    ///
    /// A `count` of 0 fills up to the cached LED count of the channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `first + count` exceeds 74, `first`
    /// lies beyond the cached count (for `count == 0`), or the channel is
    /// bad.
    pub fn fill_led_color(
        &mut self,
        channel: u8,
        rgb888: u32,
        first: u16,
        count: u16,
    ) -> Result<(), Error<I2C::Error>> {
        let reg = self.reg(LED_COLOR_MORE_REG, channel, 0)?;
        let count = if count != 0 {
            Some(count)
        } else {
            self.led_count(channel).and_then(|n| n.checked_sub(first))
        };
        let Some(count) = count.filter(|n| u32::from(first) + u32::from(*n) <= u32::from(MAX_LED_COUNT)) else {
            hub_log!(self.logger, error, "Too many LEDs {}-{}/{}", first, count.unwrap_or(0), MAX_LED_COUNT);
            return Err(Error::InvalidArgument);
        };
        let fill = LedFill::from_rgb888(first, count, rgb888);
        let r = self.regs.write_payload(reg, &fill);
        self.transport(reg, r)
    }

    pub fn write_led_brightness(&mut self, channel: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let reg = self.reg(LED_BRIGHTNESS_REG, channel, 0)?;
        let r = self.regs.write_register8(reg, value);
        self.transport(reg, r)
    }

    /// Select the LED protocol. Common to all channels.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] below firmware 2, [`Error::InvalidArgument`]
    /// for [`LedMode::Unknown`].
    pub fn write_led_mode(&mut self, mode: LedMode) -> Result<(), Error<I2C::Error>> {
        self.require(self.variant.supports_led_mode(), "LED mode")?;
        if mode == LedMode::Unknown {
            return Err(Error::InvalidArgument);
        }
        let r = self.regs.write_register8(LED_MODE_REG, mode as u8);
        self.transport(LED_MODE_REG, r)
    }

    pub fn read_led_mode(&mut self) -> Result<LedMode, Error<I2C::Error>> {
        self.require(self.variant.supports_led_mode(), "LED mode")?;
        let r = self.regs.read_register8(LED_MODE_REG);
        self.transport(LED_MODE_REG, r).map(LedMode::from_raw)
    }

    /// Read the firmware version register. The base board NACKs.
    ///
    /// # Errors
    ///
    /// Transport error of the read.
    pub fn read_firmware_version(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.regs.read_register8(FIRMWARE_VERSION_REG).map_err(Error::Transport)
    }

    /// Move the hub to `address` and wait until it answers there.
    ///
    /// The new address is written to the address register, the driver is
    /// rebound, then the address register is read back at the new address
    /// every `config.poll_interval` until it echoes `address` or
    /// `config.address_change_timeout` expires. At least one read is made,
    /// even with a zero timeout.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a reserved address (nothing changes),
    /// the transport error of the address write (nothing changes), or
    /// [`Error::Timeout`] if the hub never confirmed. After a timeout the
    /// driver stays bound to `address`.
    pub fn change_i2c_address<D: DelayNs>(
        &mut self,
        address: SevenBitAddress,
        delay: &mut D,
    ) -> Result<(), Error<I2C::Error>> {
        if !is_valid_i2c_address(address) {
            hub_log!(self.logger, error, "Invalid address : {:02X}", address);
            return Err(Error::InvalidArgument);
        }
        let r = self.regs.write_register8(I2C_ADDRESS_REG, address);
        self.transport(I2C_ADDRESS_REG, r)?;
        self.regs.set_address(address);
        self.config.address = address;

        let interval = self.config.poll_interval.to_millis().max(1);
        let timeout = self.config.address_change_timeout.to_millis();
        let mut waited = 0u32;
        loop {
            delay.delay_ms(interval);
            waited = waited.saturating_add(interval);
            match self.poll_address_switch(address) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(e),
            }
            if waited >= timeout {
                break;
            }
        }
        hub_log!(self.logger, error, "No answer at {:02X}", address);
        Err(Error::Timeout)
    }

    /// One confirmation attempt of an address change.
    ///
    /// `WouldBlock` while the hub does not answer at `address` or answers
    /// with something else.
    ///
    /// # Errors
    ///
    /// `Other(InvalidArgument)` if the driver is not bound to `address`.
    pub fn poll_address_switch(&mut self, address: SevenBitAddress) -> nb::Result<(), Error<I2C::Error>> {
        if self.address() != address {
            return Err(nb::Error::Other(Error::InvalidArgument));
        }
        match self.regs.read_register8(I2C_ADDRESS_REG) {
            Ok(echo) if echo == address => Ok(()),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    /// Adapter for a unit wired to `channel`.
    ///
    /// [`Adapter::Null`] when the channel is out of range.
    pub fn ensure_adapter(&mut self, channel: u8) -> Adapter {
        if channel >= self.config.max_children {
            hub_log!(self.logger, error, "Invalid channel {}", channel);
            return Adapter::Null;
        }
        Adapter::Port {
            address: self.address(),
            channel,
        }
    }

    /// Port handle for a unit wired to `channel`.
    pub fn port(&mut self, channel: u8) -> PortChannel<'_, I2C, L> {
        let adapter = self.ensure_adapter(channel);
        PortChannel::new(self, adapter)
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.regs.release()
    }

    fn reg(&mut self, base: u8, channel: u8, line: u8) -> Result<u8, Error<I2C::Error>> {
        let reg = if channel < self.config.max_children && line <= 1 {
            register_address(base, channel, line)
        } else {
            None
        };
        reg.ok_or_else(|| {
            hub_log!(self.logger, error, "Invalid channel {} line {}", channel, line);
            Error::InvalidArgument
        })
    }

    fn require(&mut self, supported: bool, what: &str) -> Result<(), Error<I2C::Error>> {
        if supported {
            return Ok(());
        }
        hub_log!(self.logger, error, "{} not supported by firmware {:?}", what, self.variant);
        Err(Error::Unsupported)
    }

    fn transport<T>(&mut self, reg: u8, result: Result<T, I2C::Error>) -> Result<T, Error<I2C::Error>> {
        result.map_err(|e| {
            hub_log!(self.logger, error, "Register {:02X} failed: {:?}", reg, e);
            Error::Transport(e)
        })
    }
}

impl<I2C: I2c, L: Logger> ChannelRouter for PortHub<I2C, L> {
    type BusError = I2C::Error;

    fn channel_count(&self) -> u8 {
        self.config.max_children
    }

    fn ensure_adapter(&mut self, channel: u8) -> Adapter {
        PortHub::ensure_adapter(self, channel)
    }

    /// Channels need no select; the adapter only has to still match the hub.
    fn route(&mut self, adapter: &Adapter) -> Result<(), Error<Self::BusError>> {
        match *adapter {
            Adapter::Port { address, channel }
                if address == self.address() && channel < self.config.max_children =>
            {
                Ok(())
            }
            _ => Err(Error::InvalidArgument),
        }
    }
}
