// Licensed under the Apache-2.0 license

//! Addressable register-device transport.
//!
//! `RegisterBus` pairs an owned `embedded_hal` I2C bus with the 7-bit address
//! of the device behind it and provides the byte-oriented register forms the
//! hubs speak: plain reads/writes, 8-bit and 16-bit little-endian registers
//! and short fixed-layout payloads.

use embedded_hal::i2c::{I2c, SevenBitAddress};
use heapless::Vec;
use zerocopy::{Immutable, IntoBytes};

/// Largest payload accepted by `RegisterBus::write_payload`.
pub const MAX_PAYLOAD: usize = 8;

pub struct RegisterBus<I2C> {
    bus: I2C,
    address: SevenBitAddress,
}

impl<I2C: I2c> RegisterBus<I2C> {
    pub fn new(bus: I2C, address: SevenBitAddress) -> Self {
        Self { bus, address }
    }

    #[must_use]
    pub const fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Rebind to another device address. No bus traffic.
    pub fn set_address(&mut self, address: SevenBitAddress) {
        self.address = address;
    }

    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.bus
    }

    pub fn release(self) -> I2C {
        self.bus
    }

    /// Raw write transaction to the bound address.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), I2C::Error> {
        self.bus.write(self.address, bytes)
    }

    /// Raw read transaction from the bound address.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<(), I2C::Error> {
        self.bus.read(self.address, buffer)
    }

    /// Write `reg` followed by the bytes of `payload` in one transaction.
    ///
    /// Payload types wider than [`MAX_PAYLOAD`] are rejected at compile time.
    pub(crate) fn write_payload<T: IntoBytes + Immutable>(
        &mut self,
        reg: u8,
        payload: &T,
    ) -> Result<(), I2C::Error> {
        const { assert!(core::mem::size_of::<T>() <= MAX_PAYLOAD) };
        let mut frame: Vec<u8, { MAX_PAYLOAD + 1 }> = Vec::new();
        // Cannot overflow: 1 + size_of::<T>() <= capacity.
        let _ = frame.push(reg);
        let _ = frame.extend_from_slice(payload.as_bytes());
        self.bus.write(self.address, &frame)
    }

    pub fn write_register8(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.bus.write(self.address, &[reg, value])
    }

    pub fn write_register16_le(&mut self, reg: u8, value: u16) -> Result<(), I2C::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.bus.write(self.address, &[reg, lo, hi])
    }

    /// Select `reg`, then read `buffer.len()` bytes.
    ///
    /// The register pointer write and the read are separate transactions
    /// (stop in between); the PbHub firmware does not answer a repeated
    /// start.
    pub fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), I2C::Error> {
        self.bus.write(self.address, &[reg])?;
        self.bus.read(self.address, buffer)
    }

    pub fn read_register8(&mut self, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.read_register(reg, &mut buf)?;
        let [value] = buf;
        Ok(value)
    }

    pub fn read_register16_le(&mut self, reg: u8) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.read_register(reg, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
}
