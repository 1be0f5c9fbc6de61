// Licensed under the Apache-2.0 license

//! Channel-scoped bus handle for devices behind a [`ChannelSwitch`].
//!
//! `ChildBus` implements `embedded_hal::i2c::I2c`, so any embedded-hal
//! driver can sit behind a switch channel unchanged, including another
//! switch (daisy chaining).

use crate::common::Logger;
use crate::hub::channel_switch::ChannelSwitch;
use crate::hub::common::Error;
use crate::hub::traits::Adapter;
use embedded_hal::i2c::{I2c, Operation, SevenBitAddress};

/// Bus handle bound to one switch channel.
///
/// The child address the handle was provisioned with is advisory: every
/// transaction goes to the address its caller passes, so several devices
/// (or a nested switch) on the same channel can share one handle.
pub struct ChildBus<'a, I2C: I2c, L: Logger> {
    switch: &'a mut ChannelSwitch<I2C, L>,
    adapter: Adapter,
}

impl<'a, I2C: I2c, L: Logger> ChildBus<'a, I2C, L> {
    pub(crate) fn new(switch: &'a mut ChannelSwitch<I2C, L>, adapter: Adapter) -> Self {
        Self { switch, adapter }
    }

    #[must_use]
    pub const fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Whether this handle is the inert fallback.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.adapter.is_null()
    }

    /// Address of the child this handle was provisioned for.
    #[must_use]
    pub const fn child_address(&self) -> Option<SevenBitAddress> {
        self.adapter.address()
    }
}

impl<I2C: I2c, L: Logger> embedded_hal::i2c::ErrorType for ChildBus<'_, I2C, L> {
    type Error = Error<I2C::Error>;
}

impl<I2C: I2c, L: Logger> I2c for ChildBus<'_, I2C, L> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.switch.forward(&self.adapter, address, operations)
    }
}
