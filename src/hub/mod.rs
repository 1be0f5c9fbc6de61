// Licensed under the Apache-2.0 license

pub mod channel_switch;
pub mod child_bus;
pub mod common;
pub mod hub_instantiation;
pub mod port_channel;
pub mod port_hub;
pub mod port_registers;
pub mod register;
pub mod traits;

pub use channel_switch::ChannelSwitch;
pub use child_bus::ChildBus;
pub use common::{Error, ErrorCode, HubConfig, HubConfigBuilder, I2cSpeed};
pub use hub_instantiation::{HubKind, HubWrapper};
pub use port_channel::{PortChannel, PortPin};
pub use port_hub::{FirmwareVariant, PortHub};
pub use port_registers::LedMode;
pub use traits::{Adapter, ChannelRouter};
