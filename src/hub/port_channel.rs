// Licensed under the Apache-2.0 license

//! Channel-scoped handles for units wired to a [`PortHub`] port.
//!
//! A port carries two signal lines. `PortChannel` offers the line-level
//! operations a child unit needs; `PortPin` wraps a single line as an
//! `embedded_hal::digital` pin so generic pin drivers work unchanged.

use crate::common::Logger;
use crate::hub::common::Error;
use crate::hub::port_hub::PortHub;
use crate::hub::port_registers::MAX_LED_COUNT;
use crate::hub::traits::{Adapter, ChannelRouter};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::i2c::I2c;

pub struct PortChannel<'a, I2C: I2c, L: Logger> {
    hub: &'a mut PortHub<I2C, L>,
    adapter: Adapter,
}

impl<'a, I2C: I2c, L: Logger> PortChannel<'a, I2C, L> {
    pub(crate) fn new(hub: &'a mut PortHub<I2C, L>, adapter: Adapter) -> Self {
        Self { hub, adapter }
    }

    #[must_use]
    pub const fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.adapter.is_null()
    }

    /// Routed channel, `Err(InvalidArgument)` for a null or stale adapter.
    fn channel(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.hub.route(&self.adapter)?;
        self.adapter.channel().ok_or(Error::InvalidArgument)
    }

    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a line other than 0 or 1.
    pub fn write_digital(&mut self, line: u8, high: bool) -> Result<(), Error<I2C::Error>> {
        let channel = self.channel()?;
        self.hub.write_digital(channel, line, high)
    }

    pub fn read_digital(&mut self, line: u8) -> Result<bool, Error<I2C::Error>> {
        let channel = self.channel()?;
        self.hub.read_digital(channel, line)
    }

    /// Analog input of `line`. Only line 0 has an ADC.
    ///
    /// # Errors
    ///
    /// [`Error::Unsupported`] for line 1.
    pub fn read_analog(&mut self, line: u8) -> Result<u16, Error<I2C::Error>> {
        let channel = self.channel()?;
        match line {
            0 => self.hub.read_analog0(channel),
            1 => Err(Error::Unsupported),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Write an RGB strip starting at LED 0.
    ///
    /// `rgb` holds three bytes per LED; a trailing partial triple is
    /// ignored. Each LED is a separate register write.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for more LEDs than the channel supports,
    /// otherwise the first transport error. LEDs before the failing one
    /// keep their new color.
    pub fn write_colors(&mut self, rgb: &[u8]) -> Result<(), Error<I2C::Error>> {
        let count = rgb.len() / 3;
        if count > usize::from(MAX_LED_COUNT) {
            return Err(Error::InvalidArgument);
        }
        for (index, triple) in (0u16..).zip(rgb.chunks_exact(3)) {
            let &[r, g, b] = triple else {
                continue;
            };
            let channel = self.channel()?;
            let rgb888 = u32::from_be_bytes([0, r, g, b]);
            self.hub.write_led_color(channel, index, rgb888)?;
        }
        Ok(())
    }

    /// Single-line view of this port.
    pub fn pin(&mut self, line: u8) -> PortPin<'_, I2C, L> {
        PortPin {
            hub: &mut *self.hub,
            adapter: self.adapter,
            line,
        }
    }
}

/// One line of a hub port as a digital pin.
pub struct PortPin<'a, I2C: I2c, L: Logger> {
    hub: &'a mut PortHub<I2C, L>,
    adapter: Adapter,
    line: u8,
}

impl<I2C: I2c, L: Logger> PortPin<'_, I2C, L> {
    #[must_use]
    pub const fn line(&self) -> u8 {
        self.line
    }

    fn channel(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.hub.route(&self.adapter)?;
        self.adapter.channel().ok_or(Error::InvalidArgument)
    }
}

impl<I2C: I2c, L: Logger> ErrorType for PortPin<'_, I2C, L> {
    type Error = Error<I2C::Error>;
}

impl<I2C: I2c, L: Logger> OutputPin for PortPin<'_, I2C, L> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let channel = self.channel()?;
        self.hub.write_digital(channel, self.line, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let channel = self.channel()?;
        self.hub.write_digital(channel, self.line, true)
    }
}

impl<I2C: I2c, L: Logger> InputPin for PortPin<'_, I2C, L> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let channel = self.channel()?;
        self.hub.read_digital(channel, self.line)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
