// Licensed under the Apache-2.0 license

//! PCA9548AP 8-channel I2C switch (Unit PaHub / PaHub2).
//!
//! The switch has a single control register: writing a byte enables the
//! downstream channels whose bits are set, reading returns the enabled set.
//! The driver only ever enables one channel at a time and remembers which,
//! so consecutive transactions to children on the same channel cost no
//! extra select.
//!
//! ## State
//!
//! ```text
//!             select(c) ok               select(d) ok
//! Unselected ─────────────▶ channel c ─────────────▶ channel d
//!     ▲                        │  ▲
//!     └──── disconnect() ──────┘  └── select(c) / any failure
//! ```
//!
//! The current channel only changes after the control write succeeded.

use crate::common::{hub_log, is_valid_i2c_address, Logger, NoOpLogger};
use crate::hub::child_bus::ChildBus;
use crate::hub::common::{Error, HubConfig};
use crate::hub::register::RegisterBus;
use crate::hub::traits::{Adapter, ChannelRouter};
use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};

/// Channels implemented by the PCA9548AP silicon.
pub const MAX_CHANNEL: usize = 8;

pub struct ChannelSwitch<I2C: I2c, L: Logger = NoOpLogger> {
    regs: RegisterBus<I2C>,
    config: HubConfig,
    logger: L,
    current: Option<u8>,
    /// Address of the child attached at each channel.
    children: [Option<SevenBitAddress>; MAX_CHANNEL],
    /// Adapters built on first use, one per channel.
    adapters: [Option<Adapter>; MAX_CHANNEL],
}

impl<I2C: I2c, L: Logger> ChannelSwitch<I2C, L> {
    /// Create a driver for the switch at `config.address`.
    ///
    /// `config.max_children` is clamped to [`MAX_CHANNEL`]. No bus traffic;
    /// the switch starts out Unselected.
    pub fn new(bus: I2C, mut config: HubConfig, logger: L) -> Self {
        config.max_children = config.max_children.min(MAX_CHANNEL as u8);
        Self {
            regs: RegisterBus::new(bus, config.address),
            config,
            logger,
            current: None,
            children: [None; MAX_CHANNEL],
            adapters: [None; MAX_CHANNEL],
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

    /// Channel routed by the last successful select, `None` when Unselected.
    #[must_use]
    pub const fn current_channel(&self) -> Option<u8> {
        self.current
    }

    /// Register the child device at `address` on `channel`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the channel is out of range or already
    /// taken, or the address is reserved.
    pub fn attach(
        &mut self,
        channel: u8,
        address: SevenBitAddress,
    ) -> Result<(), Error<I2C::Error>> {
        if channel >= self.config.max_children {
            hub_log!(self.logger, error, "Invalid channel {}", channel);
            return Err(Error::InvalidArgument);
        }
        if !is_valid_i2c_address(address) {
            hub_log!(self.logger, error, "Invalid child address {:02X}", address);
            return Err(Error::InvalidArgument);
        }
        let Some(slot) = self.children.get_mut(usize::from(channel)) else {
            return Err(Error::InvalidArgument);
        };
        if let Some(existing) = *slot {
            hub_log!(self.logger, error, "Channel {} already holds {:02X}", channel, existing);
            return Err(Error::InvalidArgument);
        }
        *slot = Some(address);
        Ok(())
    }

    /// Address of the child attached at `channel`.
    #[must_use]
    pub fn child_address(&self, channel: u8) -> Option<SevenBitAddress> {
        self.children.get(usize::from(channel)).copied().flatten()
    }

    /// Route `channel` to the upstream bus.
    ///
    /// Selecting the channel that is already routed succeeds without bus
    /// traffic.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a channel at or beyond
    /// `config.max_children` (no transaction issued), or the transport error
    /// of the control write. The current channel is left unchanged on any
    /// error.
    pub fn select_channel(&mut self, channel: u8) -> Result<(), Error<I2C::Error>> {
        if channel >= self.config.max_children {
            hub_log!(self.logger, error, "Invalid channel {}", channel);
            return Err(Error::InvalidArgument);
        }
        if self.current == Some(channel) {
            return Ok(());
        }

        let mask = 1u8 << channel;
        match self.regs.write(&[mask]) {
            Ok(()) => {
                hub_log!(self.logger, debug, "Channel {:?} => {}", self.current, channel);
                self.current = Some(channel);
                Ok(())
            }
            Err(e) => {
                hub_log!(self.logger, error, "Failed to select channel {}: {:?}", channel, e);
                Err(Error::Transport(e))
            }
        }
    }

    /// Read the raw control register: one bit per enabled channel.
    ///
    /// # Errors
    ///
    /// Transport error of the read.
    pub fn read_channel_bits(&mut self) -> Result<u8, Error<I2C::Error>> {
        let mut bits = [0u8; 1];
        self.regs.read(&mut bits).map_err(|e| {
            hub_log!(self.logger, error, "Failed to read channel bits: {:?}", e);
            Error::Transport(e)
        })?;
        let [bits] = bits;
        Ok(bits)
    }

    /// Disable every downstream channel.
    ///
    /// # Errors
    ///
    /// Transport error of the control write; the current channel is kept.
    pub fn disconnect(&mut self) -> Result<(), Error<I2C::Error>> {
        self.regs.write(&[0x00]).map_err(|e| {
            hub_log!(self.logger, error, "Failed to disconnect: {:?}", e);
            Error::Transport(e)
        })?;
        self.current = None;
        Ok(())
    }

    /// Adapter for the child on `channel`, built on first request and
    /// reused afterwards.
    ///
    /// Returns [`Adapter::Null`] when the channel is out of range or nothing
    /// is attached there.
    pub fn ensure_adapter(&mut self, channel: u8) -> Adapter {
        if channel >= self.config.max_children {
            hub_log!(self.logger, error, "Invalid channel {}", channel);
            return Adapter::Null;
        }
        let Some(address) = self.child_address(channel) else {
            hub_log!(self.logger, error, "No unit attached at channel {}", channel);
            return Adapter::Null;
        };
        let Some(slot) = self.adapters.get_mut(usize::from(channel)) else {
            return Adapter::Null;
        };
        if slot.is_none() {
            hub_log!(self.logger, debug, "Adapter {:02X} on channel {}", address, channel);
        }
        *slot.get_or_insert(Adapter::I2c { address, channel })
    }

    /// Bus handle for the child on `channel`.
    ///
    /// Every transaction on the returned handle selects `channel` first. If
    /// the adapter could not be provisioned the handle is inert and all its
    /// transactions fail.
    pub fn child_bus(&mut self, channel: u8) -> ChildBus<'_, I2C, L> {
        let adapter = self.ensure_adapter(channel);
        ChildBus::new(self, adapter)
    }

    /// Route `adapter`'s channel, then run `operations` against `address`.
    pub(crate) fn forward(
        &mut self,
        adapter: &Adapter,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error<I2C::Error>> {
        self.route(adapter)?;
        self.regs
            .bus_mut()
            .transaction(address, operations)
            .map_err(|e| {
                hub_log!(
                    self.logger,
                    error,
                    "Child {:02X} on channel {:?} failed: {:?}",
                    address,
                    adapter.channel(),
                    e
                );
                Error::Transport(e)
            })
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.regs.release()
    }
}

impl<I2C: I2c, L: Logger> ChannelRouter for ChannelSwitch<I2C, L> {
    type BusError = I2C::Error;

    fn channel_count(&self) -> u8 {
        self.config.max_children
    }

    fn ensure_adapter(&mut self, channel: u8) -> Adapter {
        ChannelSwitch::ensure_adapter(self, channel)
    }

    fn route(&mut self, adapter: &Adapter) -> Result<(), Error<Self::BusError>> {
        match *adapter {
            Adapter::I2c { channel, .. } => self.select_channel(channel),
            Adapter::Null | Adapter::Port { .. } => Err(Error::InvalidArgument),
        }
    }
}
