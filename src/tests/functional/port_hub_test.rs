// Licensed under the Apache-2.0 license

use crate::common::Logger;
use crate::hub::common::Error;
use crate::hub::port_hub::{FirmwareVariant, PortHub};
use crate::hub::port_registers::{LedMode, MAX_LED_COUNT};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use embedded_io::Write;

/// Exercise a PbHub with nothing wired to its ports.
pub fn run_port_hub_tests<I2C: I2c, L: Logger, W: Write>(hub: &mut PortHub<I2C, L>, uart: &mut W) {
    let _ = writeln!(uart, "\r\n=== Port Hub Tests ===\r");

    test_begin(hub, uart);
    test_invalid_channel(hub, uart);
    test_capability_gating(hub, uart);
    test_led_strip(hub, uart);
    test_servo_range(hub, uart);

    let _ = writeln!(uart, "\r\n=== All Port Hub Tests Passed ===\r");
}

fn test_begin<I2C: I2c, L: Logger, W: Write>(hub: &mut PortHub<I2C, L>, uart: &mut W) {
    let _ = write!(uart, "Testing begin... ");

    assert!(hub.begin().is_ok());
    assert_ne!(hub.firmware_variant(), FirmwareVariant::Undetermined);

    let _ = writeln!(uart, "PASSED ({:?})\r", hub.firmware_variant());
}

fn test_invalid_channel<I2C: I2c, L: Logger, W: Write>(hub: &mut PortHub<I2C, L>, uart: &mut W) {
    let _ = write!(uart, "Testing invalid channel... ");

    assert!(matches!(hub.write_digital0(6, true), Err(Error::InvalidArgument)));
    assert!(matches!(hub.read_digital1(6), Err(Error::InvalidArgument)));
    assert!(matches!(hub.read_analog0(0xFF), Err(Error::InvalidArgument)));
    assert!(matches!(hub.write_led_count(6, 1), Err(Error::InvalidArgument)));
    assert!(hub.port(6).is_null());

    let _ = writeln!(uart, "PASSED\r");
}

fn test_capability_gating<I2C: I2c, L: Logger, W: Write>(
    hub: &mut PortHub<I2C, L>,
    uart: &mut W,
) {
    let _ = write!(uart, "Testing capability gating... ");

    match hub.firmware_variant() {
        FirmwareVariant::Base => {
            assert!(hub.write_analog0(0, 0).is_ok());
            assert!(matches!(hub.write_pwm0(0, 0), Err(Error::Unsupported)));
            assert!(matches!(hub.read_servo1_angle(0), Err(Error::Unsupported)));
            assert!(matches!(hub.read_led_mode(), Err(Error::Unsupported)));
        }
        FirmwareVariant::Extended(version) => {
            assert!(matches!(hub.write_analog0(0, 0), Err(Error::Unsupported)));
            assert!(hub.write_pwm0(0, 0).is_ok());
            assert!(hub.read_pwm0(0).is_ok());
            if version >= 2 {
                assert!(matches!(hub.write_led_mode(LedMode::Unknown), Err(Error::InvalidArgument)));
                assert!(hub.write_led_mode(LedMode::Ws28xx).is_ok());
                assert!(matches!(hub.read_led_mode(), Ok(LedMode::Ws28xx)));
            } else {
                assert!(matches!(hub.read_led_mode(), Err(Error::Unsupported)));
            }
        }
        FirmwareVariant::Undetermined => unreachable!(),
    }

    let _ = writeln!(uart, "PASSED\r");
}

fn test_led_strip<I2C: I2c, L: Logger, W: Write>(hub: &mut PortHub<I2C, L>, uart: &mut W) {
    let _ = write!(uart, "Testing LED strip limits... ");

    assert!(matches!(hub.write_led_count(0, MAX_LED_COUNT + 1), Err(Error::InvalidArgument)));
    assert!(hub.write_led_count(0, MAX_LED_COUNT).is_ok());
    assert_eq!(hub.led_count(0), Some(MAX_LED_COUNT));

    assert!(hub.fill_led_color(0, 0x0010_0000, 0, MAX_LED_COUNT).is_ok());
    assert!(matches!(hub.fill_led_color(0, 0, 1, MAX_LED_COUNT), Err(Error::InvalidArgument)));
    assert!(matches!(hub.fill_led_color(0, 0, MAX_LED_COUNT, 1), Err(Error::InvalidArgument)));
    assert!(hub.fill_led_color(0, 0, 0, 0).is_ok());

    assert!(hub.write_led_color(0, MAX_LED_COUNT - 1, 0x0000_0010).is_ok());
    assert!(matches!(hub.write_led_color(0, MAX_LED_COUNT, 0), Err(Error::InvalidArgument)));
    assert!(hub.write_led_brightness(0, 0x20).is_ok());

    let _ = writeln!(uart, "PASSED\r");
}

fn test_servo_range<I2C: I2c, L: Logger, W: Write>(hub: &mut PortHub<I2C, L>, uart: &mut W) {
    let _ = write!(uart, "Testing servo range... ");

    if hub.firmware_variant().supports_servo() {
        assert!(hub.write_servo0_angle(1, 90).is_ok());
        assert!(matches!(hub.read_servo0_angle(1), Ok(90)));
        assert!(matches!(hub.write_servo0_angle(1, 181), Err(Error::InvalidArgument)));
        assert!(hub.write_servo1_pulse(1, 1500).is_ok());
        assert!(matches!(hub.read_servo1_pulse(1), Ok(1500)));
        assert!(matches!(hub.write_servo1_pulse(1, 499), Err(Error::InvalidArgument)));
        assert!(matches!(hub.write_servo1_pulse(1, 2501), Err(Error::InvalidArgument)));
        let _ = writeln!(uart, "PASSED\r");
    } else {
        assert!(matches!(hub.write_servo0_angle(1, 90), Err(Error::Unsupported)));
        let _ = writeln!(uart, "SKIPPED (base board)\r");
    }
}

/// Move the hub to `temporary` and back again.
pub fn run_address_change_test<I2C: I2c, L: Logger, D: DelayNs, W: Write>(
    hub: &mut PortHub<I2C, L>,
    delay: &mut D,
    temporary: SevenBitAddress,
    uart: &mut W,
) {
    let _ = write!(uart, "Testing address change {:02X} => {:02X}... ", hub.address(), temporary);

    let original = hub.address();
    let version = hub.read_firmware_version().ok();
    assert!(matches!(hub.change_i2c_address(0x07, delay), Err(Error::InvalidArgument)));
    assert_eq!(hub.address(), original);

    assert!(hub.change_i2c_address(temporary, delay).is_ok());
    assert_eq!(hub.address(), temporary);
    assert!(hub.read_digital0(0).is_ok());
    assert_eq!(hub.read_firmware_version().ok(), version);

    assert!(hub.change_i2c_address(original, delay).is_ok());
    assert_eq!(hub.address(), original);

    let _ = writeln!(uart, "PASSED\r");
}
