// Licensed under the Apache-2.0 license

//! # Channel routing seam
//!
//! A multiplexing hub hands every attached child a channel-scoped adapter.
//! How a channel becomes "routed" differs per hub:
//!
//! ```text
//! ChannelRouter
//!     ├── ChannelSwitch  route = write the channel bitmask to the switch
//!     │                  adapter = Adapter::I2c { child address, channel }
//!     └── PortHub        route = validate the channel (the channel is
//!                        encoded in every register address, no select)
//!                        adapter = Adapter::Port { hub address, channel }
//! ```
//!
//! Adapters are plain descriptors. They never reference the hub that made
//! them; a transaction is performed by handing the adapter back to the hub
//! (see [`crate::hub::ChildBus`] and [`crate::hub::PortChannel`]), which
//! routes the channel first and forwards the traffic second.

use crate::hub::common::Error;

/// Channel-scoped communication adapter for one child device.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Adapter {
    /// Inert adapter returned when provisioning fails. Every transaction
    /// through it fails with [`Error::InvalidArgument`] and touches no bus.
    Null,
    /// Child reached through an I2C switch channel at its own address.
    I2c { address: u8, channel: u8 },
    /// Child wired to a port-expander channel; traffic goes to the hub
    /// address with channel-encoded registers.
    Port { address: u8, channel: u8 },
}

impl Adapter {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Adapter::Null)
    }

    /// Channel this adapter is bound to.
    #[must_use]
    pub const fn channel(&self) -> Option<u8> {
        match self {
            Adapter::Null => None,
            Adapter::I2c { channel, .. } | Adapter::Port { channel, .. } => Some(*channel),
        }
    }

    /// Bus address traffic is sent to.
    #[must_use]
    pub const fn address(&self) -> Option<u8> {
        match self {
            Adapter::Null => None,
            Adapter::I2c { address, .. } | Adapter::Port { address, .. } => Some(*address),
        }
    }
}

/// Channel-to-transport mapping strategy of a multiplexing hub.
pub trait ChannelRouter {
    /// Error type of the bus underneath the hub.
    type BusError: core::fmt::Debug;

    /// Number of channels children may be attached to.
    fn channel_count(&self) -> u8;

    /// Produce the adapter for the child on `channel`.
    ///
    /// Never fails: an invalid request yields [`Adapter::Null`].
    fn ensure_adapter(&mut self, channel: u8) -> Adapter;

    /// Make traffic through `adapter` valid on the bus.
    ///
    /// Called before every transaction performed on behalf of a child.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a null or foreign adapter, or the
    /// transport error of a failed channel select.
    fn route(&mut self, adapter: &Adapter) -> Result<(), Error<Self::BusError>>;
}
