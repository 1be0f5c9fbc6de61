// Licensed under the Apache-2.0 license

//! In-memory I2C bus with hub and sensor models.
//!
//! Devices sit either on the trunk or behind a channel of a simulated
//! switch. A device only answers while every switch on its path routes the
//! channel it hangs off.

#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use m5_hub_drivers::common::Logger;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type DeviceId = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    Nack,
}

impl embedded_hal::i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// One bus operation as seen by the simulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Write(u8, Vec<u8>),
    Read(u8, usize),
    Nack(u8),
}

enum Model {
    Switch {
        bits: u8,
    },
    Register {
        regs: HashMap<u8, Vec<u8>>,
        pointer: u8,
    },
    PortHub {
        regs: HashMap<u8, Vec<u8>>,
        pointer: u8,
        firmware: Option<u8>,
        /// Pending address switch: new address and NACKed attempts left.
        moving_to: Option<(u8, u32)>,
        switch_delay: u32,
    },
}

struct Device {
    address: u8,
    upstream: Option<(DeviceId, u8)>,
    model: Model,
}

#[derive(Default)]
struct SimState {
    devices: Vec<Device>,
    log: Vec<Op>,
    nacks: HashMap<u8, u32>,
}

impl SimState {
    fn reachable(&self, id: DeviceId) -> bool {
        let Some(device) = self.devices.get(id) else {
            return false;
        };
        match device.upstream {
            None => true,
            Some((parent, channel)) => {
                let routed = matches!(
                    self.devices.get(parent).map(|d| &d.model),
                    Some(Model::Switch { bits }) if bits & (1 << channel) != 0
                );
                routed && self.reachable(parent)
            }
        }
    }

    /// Device answering at `address`, advancing pending address switches.
    fn target(&mut self, address: u8) -> Option<DeviceId> {
        for id in 0..self.devices.len() {
            if !self.reachable(id) {
                continue;
            }
            let device = &mut self.devices[id];
            if let Model::PortHub { moving_to, .. } = &mut device.model {
                if let Some((new_address, left)) = moving_to {
                    if *new_address != address {
                        continue;
                    }
                    if *left > 0 {
                        *left -= 1;
                        return None;
                    }
                    device.address = *new_address;
                    *moving_to = None;
                    return Some(id);
                }
            }
            if device.address == address {
                return Some(id);
            }
        }
        None
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), SimError> {
        let Some(id) = self.target(address) else {
            return Err(SimError::Nack);
        };
        match &mut self.devices[id].model {
            Model::Switch { bits } => {
                if let Some(last) = bytes.last() {
                    *bits = *last;
                }
            }
            Model::Register { regs, pointer } => {
                if let Some((reg, data)) = bytes.split_first() {
                    *pointer = *reg;
                    if !data.is_empty() {
                        regs.insert(*reg, data.to_vec());
                    }
                }
            }
            Model::PortHub {
                regs,
                pointer,
                moving_to,
                switch_delay,
                ..
            } => {
                if let Some((reg, data)) = bytes.split_first() {
                    *pointer = *reg;
                    if !data.is_empty() {
                        regs.insert(*reg, data.to_vec());
                    }
                    if *reg == 0xFF {
                        if let Some(new_address) = data.first() {
                            *moving_to = Some((*new_address, *switch_delay));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), SimError> {
        let Some(id) = self.target(address) else {
            return Err(SimError::Nack);
        };
        buffer.fill(0);
        let stored = match &self.devices[id].model {
            Model::Switch { bits } => vec![*bits],
            Model::Register { regs, pointer } => regs.get(pointer).cloned().unwrap_or_default(),
            Model::PortHub {
                regs,
                pointer,
                firmware,
                ..
            } => match (*pointer, firmware) {
                (0xFE, None) => return Err(SimError::Nack),
                (0xFE, Some(version)) => vec![*version],
                (reg, _) => regs.get(&reg).cloned().unwrap_or_default(),
            },
        };
        for (dst, src) in buffer.iter_mut().zip(stored) {
            *dst = src;
        }
        Ok(())
    }
}

/// Handle on the simulated bus; clones share one bus.
#[derive(Clone, Default)]
pub struct Sim {
    state: Rc<RefCell<SimState>>,
}

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> SimBus {
        SimBus {
            state: Rc::clone(&self.state),
        }
    }

    fn add(&self, address: u8, upstream: Option<(DeviceId, u8)>, model: Model) -> DeviceId {
        let mut state = self.state.borrow_mut();
        state.devices.push(Device {
            address,
            upstream,
            model,
        });
        state.devices.len() - 1
    }

    pub fn add_switch(&self, address: u8, upstream: Option<(DeviceId, u8)>) -> DeviceId {
        self.add(address, upstream, Model::Switch { bits: 0 })
    }

    pub fn add_sensor(&self, address: u8, upstream: Option<(DeviceId, u8)>) -> DeviceId {
        self.add(
            address,
            upstream,
            Model::Register {
                regs: HashMap::new(),
                pointer: 0,
            },
        )
    }

    /// PbHub model. `firmware` is `None` for the base board, which NACKs the
    /// firmware version register. After an address write the hub NACKs
    /// `switch_delay` attempts at its new address before answering.
    pub fn add_port_hub(&self, address: u8, firmware: Option<u8>, switch_delay: u32) -> DeviceId {
        self.add(
            address,
            None,
            Model::PortHub {
                regs: HashMap::new(),
                pointer: 0,
                firmware,
                moving_to: None,
                switch_delay,
            },
        )
    }

    pub fn set_register(&self, id: DeviceId, reg: u8, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        match &mut state.devices[id].model {
            Model::Register { regs, .. } | Model::PortHub { regs, .. } => {
                regs.insert(reg, bytes.to_vec());
            }
            Model::Switch { bits } => *bits = bytes[0],
        }
    }

    pub fn register(&self, id: DeviceId, reg: u8) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        match &state.devices[id].model {
            Model::Register { regs, .. } | Model::PortHub { regs, .. } => regs.get(&reg).cloned(),
            Model::Switch { bits } => Some(vec![*bits]),
        }
    }

    pub fn switch_bits(&self, id: DeviceId) -> u8 {
        match &self.state.borrow().devices[id].model {
            Model::Switch { bits } => *bits,
            _ => panic!("device {id} is not a switch"),
        }
    }

    pub fn address_of(&self, id: DeviceId) -> u8 {
        self.state.borrow().devices[id].address
    }

    /// Fail the next `count` operations addressed to `address`.
    pub fn inject_nack(&self, address: u8, count: u32) {
        self.state.borrow_mut().nacks.insert(address, count);
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Payloads of the write operations addressed to `address`.
    pub fn writes_to(&self, address: u8) -> Vec<Vec<u8>> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write(a, bytes) if a == address => Some(bytes),
                _ => None,
            })
            .collect()
    }
}

pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl ErrorType for SimBus {
    type Error = SimError;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        for op in operations.iter_mut() {
            if let Some(left) = state.nacks.get_mut(&address) {
                if *left > 0 {
                    *left -= 1;
                    state.log.push(Op::Nack(address));
                    return Err(SimError::Nack);
                }
            }
            let result = match op {
                Operation::Write(bytes) => {
                    let r = state.write(address, bytes);
                    if r.is_ok() {
                        state.log.push(Op::Write(address, bytes.to_vec()));
                    }
                    r
                }
                Operation::Read(buffer) => {
                    let r = state.read(address, buffer);
                    if r.is_ok() {
                        state.log.push(Op::Read(address, buffer.len()));
                    }
                    r
                }
            };
            if result.is_err() {
                state.log.push(Op::Nack(address));
                return result;
            }
        }
        Ok(())
    }
}

/// Delay that only counts.
#[derive(Default)]
pub struct CountingDelay {
    pub total_ns: u64,
    pub calls: u32,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}

/// Console capturing the functional runners' output.
#[derive(Default)]
pub struct MemConsole {
    pub out: Vec<u8>,
}

impl MemConsole {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

impl embedded_io::ErrorType for MemConsole {
    type Error = core::convert::Infallible;
}

impl embedded_io::Write for MemConsole {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Logger keeping every line for inspection.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    pub lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingLogger {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn debug(&mut self, msg: &str) {
        self.lines.borrow_mut().push(format!("DEBUG {msg}"));
    }
    fn info(&mut self, msg: &str) {
        self.lines.borrow_mut().push(format!("INFO {msg}"));
    }
    fn error(&mut self, msg: &str) {
        self.lines.borrow_mut().push(format!("ERROR {msg}"));
    }
}
