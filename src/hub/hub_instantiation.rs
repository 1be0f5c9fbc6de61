// Licensed under the Apache-2.0 license

//! # Heterogeneous hub storage
//!
//! `ChannelSwitch<I2C, L>` and `PortHub<I2C, L>` are distinct types, so a
//! board that carries both (or a runtime-chosen one) cannot keep them in one
//! array or field. [`HubWrapper`] is a plain enum over the two: no heap,
//! one `match` per call, and the routing seam is reachable as a
//! [`ChannelRouter`] trait object.
//!
//! ```rust,ignore
//! let mut hubs = [
//!     HubWrapper::instantiate(HubKind::ChannelSwitch, bus_a, NoOpLogger),
//!     HubWrapper::instantiate(HubKind::PortHub, bus_b, NoOpLogger),
//! ];
//! for hub in hubs.iter_mut() {
//!     let adapter = hub.ensure_adapter(0);
//!     hub.as_router_mut().route(&adapter)?;
//! }
//! ```

use crate::common::Logger;
use crate::hub::channel_switch::{self, ChannelSwitch};
use crate::hub::common::{Error, HubConfig, HubConfigBuilder};
use crate::hub::port_hub::PortHub;
use crate::hub::port_registers;
use crate::hub::traits::{Adapter, ChannelRouter};
use embedded_hal::i2c::{I2c, SevenBitAddress};

/// Supported hub hardware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HubKind {
    /// PCA9548AP based switch (Unit PaHub).
    ChannelSwitch,
    /// Unit PbHub port expander.
    PortHub,
}

impl HubKind {
    #[must_use]
    pub const fn default_address(&self) -> SevenBitAddress {
        match self {
            HubKind::ChannelSwitch => 0x70,
            HubKind::PortHub => 0x61,
        }
    }

    /// Channels the silicon implements.
    #[must_use]
    pub const fn max_channels(&self) -> usize {
        match self {
            HubKind::ChannelSwitch => channel_switch::MAX_CHANNEL,
            HubKind::PortHub => port_registers::MAX_CHANNEL,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            HubKind::ChannelSwitch => "UnitPCA9548AP",
            HubKind::PortHub => "UnitPbHub",
        }
    }

    /// Default configuration for this kind of hub.
    #[must_use]
    pub fn default_config(&self) -> HubConfig {
        match self {
            HubKind::ChannelSwitch => HubConfigBuilder::channel_switch().build(),
            HubKind::PortHub => HubConfigBuilder::port_hub().build(),
        }
    }
}

pub enum HubWrapper<I2C: I2c, L: Logger> {
    ChannelSwitch(ChannelSwitch<I2C, L>),
    PortHub(PortHub<I2C, L>),
}

impl<I2C: I2c, L: Logger> HubWrapper<I2C, L> {
    /// Build a hub of `kind` with its default configuration.
    pub fn instantiate(kind: HubKind, bus: I2C, logger: L) -> Self {
        Self::with_config(kind, bus, kind.default_config(), logger)
    }

    pub fn with_config(kind: HubKind, bus: I2C, config: HubConfig, logger: L) -> Self {
        match kind {
            HubKind::ChannelSwitch => {
                HubWrapper::ChannelSwitch(ChannelSwitch::new(bus, config, logger))
            }
            HubKind::PortHub => HubWrapper::PortHub(PortHub::new(bus, config, logger)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> HubKind {
        match self {
            HubWrapper::ChannelSwitch(_) => HubKind::ChannelSwitch,
            HubWrapper::PortHub(_) => HubKind::PortHub,
        }
    }

    #[must_use]
    pub const fn address(&self) -> SevenBitAddress {
        match self {
            HubWrapper::ChannelSwitch(hub) => hub.address(),
            HubWrapper::PortHub(hub) => hub.address(),
        }
    }

    pub fn ensure_adapter(&mut self, channel: u8) -> Adapter {
        self.as_router_mut().ensure_adapter(channel)
    }

    /// # Errors
    ///
    /// See [`ChannelRouter::route`].
    pub fn route(&mut self, adapter: &Adapter) -> Result<(), Error<I2C::Error>> {
        self.as_router_mut().route(adapter)
    }

    pub fn as_router_mut(&mut self) -> &mut dyn ChannelRouter<BusError = I2C::Error> {
        match self {
            HubWrapper::ChannelSwitch(hub) => hub,
            HubWrapper::PortHub(hub) => hub,
        }
    }

    #[must_use]
    pub fn as_router(&self) -> &dyn ChannelRouter<BusError = I2C::Error> {
        match self {
            HubWrapper::ChannelSwitch(hub) => hub,
            HubWrapper::PortHub(hub) => hub,
        }
    }

    pub fn as_channel_switch_mut(&mut self) -> Option<&mut ChannelSwitch<I2C, L>> {
        match self {
            HubWrapper::ChannelSwitch(hub) => Some(hub),
            HubWrapper::PortHub(_) => None,
        }
    }

    pub fn as_port_hub_mut(&mut self) -> Option<&mut PortHub<I2C, L>> {
        match self {
            HubWrapper::PortHub(hub) => Some(hub),
            HubWrapper::ChannelSwitch(_) => None,
        }
    }
}
