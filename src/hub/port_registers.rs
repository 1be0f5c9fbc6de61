// Licensed under the Apache-2.0 license

//! PbHub register map.
//!
//! Per-channel registers are described by a base address (channel 0, line 0).
//! The physical address adds the line offset to the base and ORs in the
//! channel block `0x40 + 0x10 * slot`:
//!
//! ```text
//! logical channel   0     1     2     3     4     5
//! physical slot     0     1     2     3     4     6
//! block            0x40  0x50  0x60  0x70  0x80  0xA0
//! ```
//!
//! Logical channel 5 lives in slot 6; slot 5 (block 0x90) is not wired.

use zerocopy::byteorder::{LE, U16};
use zerocopy::{Immutable, IntoBytes, KnownLayout};

/// Channels on the board.
pub const MAX_CHANNEL: usize = 6;
/// LEDs addressable per channel.
pub const MAX_LED_COUNT: u16 = 74;

pub const MIN_ANGLE: u8 = 0;
pub const MAX_ANGLE: u8 = 180;
pub const MIN_PULSE: u16 = 500;
pub const MAX_PULSE: u16 = 2500;

/// Logical channel to physical slot.
pub const CHANNEL_SLOTS: [u8; MAX_CHANNEL] = [0, 1, 2, 3, 4, 6];

pub const WRITE_DIGITAL_0_REG: u8 = 0x00;
pub const WRITE_DIGITAL_1_REG: u8 = 0x01;
pub const WRITE_ANALOG_0_REG: u8 = 0x02;
pub const WRITE_ANALOG_1_REG: u8 = 0x03;
// v1.1 reuses the analog write registers for PWM
pub const PWM_0_REG: u8 = 0x02;
pub const PWM_1_REG: u8 = 0x03;
pub const READ_DIGITAL_0_REG: u8 = 0x04;
pub const READ_DIGITAL_1_REG: u8 = 0x05;
pub const READ_ANALOG_0_REG: u8 = 0x06;
pub const LED_NUM_REG: u8 = 0x08;
pub const LED_COLOR_SINGLE_REG: u8 = 0x09;
pub const LED_COLOR_MORE_REG: u8 = 0x0A;
pub const LED_BRIGHTNESS_REG: u8 = 0x0B;
pub const SERVO_ANGLE_0_REG: u8 = 0x0C;
pub const SERVO_ANGLE_1_REG: u8 = 0x0D;
pub const SERVO_PULSE_0_REG: u8 = 0x0E;
pub const SERVO_PULSE_1_REG: u8 = 0x0F;

// Global registers, not channel scoped
pub const LED_MODE_REG: u8 = 0xFA;
pub const FIRMWARE_VERSION_REG: u8 = 0xFE;
pub const I2C_ADDRESS_REG: u8 = 0xFF;

/// Physical register for (`base`, `channel`, `line`).
///
/// `None` for a channel outside the board; callers must not issue I/O then.
#[must_use]
pub fn register_address(base: u8, channel: u8, line: u8) -> Option<u8> {
    let slot = *CHANNEL_SLOTS.get(usize::from(channel))?;
    Some(base.wrapping_add(line) | (0x40 + 0x10 * slot))
}

#[must_use]
pub const fn valid_angle(angle: u8) -> bool {
    angle <= MAX_ANGLE
}

#[must_use]
pub const fn valid_pulse(pulse: u16) -> bool {
    pulse >= MIN_PULSE && pulse <= MAX_PULSE
}

/// LED protocol selected on the hub (firmware 2 or later).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LedMode {
    /// WS28xx, SK6812. Power-on default.
    Ws28xx = 0,
    /// SK6822, APA106.
    Sk6822 = 1,
    Unknown = 0xFF,
}

impl LedMode {
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LedMode::Ws28xx,
            1 => LedMode::Sk6822,
            _ => LedMode::Unknown,
        }
    }
}

/// Payload of [`LED_COLOR_SINGLE_REG`]: one LED.
#[derive(Copy, Clone, Debug, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct LedRecord {
    pub index: U16<LE>,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedRecord {
    /// Record for `index` from a `0x00RRGGBB` color.
    #[must_use]
    pub fn from_rgb888(index: u16, rgb888: u32) -> Self {
        let [_, r, g, b] = rgb888.to_be_bytes();
        Self {
            index: U16::new(index),
            r,
            g,
            b,
        }
    }
}

/// Payload of [`LED_COLOR_MORE_REG`]: a run of LEDs set to one color.
#[derive(Copy, Clone, Debug, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct LedFill {
    pub first: U16<LE>,
    pub count: U16<LE>,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedFill {
    #[must_use]
    pub fn from_rgb888(first: u16, count: u16, rgb888: u32) -> Self {
        let [_, r, g, b] = rgb888.to_be_bytes();
        Self {
            first: U16::new(first),
            count: U16::new(count),
            r,
            g,
            b,
        }
    }
}
