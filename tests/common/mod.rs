//! Register-level model of an RFM96 for integration tests
//!
//! [`SimChip`] answers the two-byte register protocol the way the SX1276 does:
//! it keeps a register file with datasheet reset values, a 256-byte FIFO behind
//! an auto-incrementing pointer, write-one-to-clear IRQ flags, and raises TX done
//! as soon as the operating mode is set to transmit. Clones share state so a test
//! can inspect the chip after handing it to the driver.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation};

pub const REG_FIFO: u8 = 0x00;
pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR: u8 = 0x19;
pub const REG_PKT_RSSI: u8 = 0x1A;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
pub const REG_VERSION: u8 = 0x42;

pub const IRQ_RX_DONE: u8 = 0x40;
pub const IRQ_CRC_ERROR: u8 = 0x20;
pub const IRQ_TX_DONE: u8 = 0x08;

const MODE_MASK: u8 = 0x07;
const MODE_STANDBY: u8 = 0x01;
const MODE_TX: u8 = 0x03;
const MODE_RX_SINGLE: u8 = 0x06;

/// Start address at which injected packets are placed in the FIFO
pub const RX_START: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

impl spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A packet the modem receives on the next single-receive arm
#[derive(Debug, Clone)]
pub struct Packet {
    pub payload: Vec<u8>,
    pub rssi: u8,
    pub snr: i8,
    pub crc_error: bool,
}

#[derive(Debug)]
pub struct State {
    pub registers: [u8; 128],
    pub fifo: [u8; 256],
    /// Every register write as (address, value), FIFO and IRQ writes included
    pub writes: Vec<(u8, u8)>,
    /// Registers that ignore writes
    pub stuck: Vec<u8>,
    /// Raise TX done when the mode is set to transmit
    pub tx_completes: bool,
    /// Fail every transaction
    pub failing: bool,
    pub transactions: usize,
    /// Packets received one per entry into single receive
    pub pending: VecDeque<Packet>,
}

impl Default for State {
    fn default() -> Self {
        let mut registers = [0u8; 128];
        registers[0x01] = 0x09;
        registers[0x06] = 0x6C;
        registers[0x07] = 0x80;
        registers[0x09] = 0x4F;
        registers[0x0C] = 0x20;
        registers[0x0E] = 0x80;
        registers[0x1D] = 0x72;
        registers[0x1E] = 0x70;
        registers[0x22] = 0x01;
        registers[0x26] = 0x00;
        registers[0x42] = 0x12;

        Self {
            registers,
            fifo: [0; 256],
            writes: Vec::new(),
            stuck: Vec::new(),
            tx_completes: true,
            failing: false,
            transactions: 0,
            pending: VecDeque::new(),
        }
    }
}

impl State {
    fn read(&mut self, address: u8) -> u8 {
        match address {
            REG_FIFO => {
                let pointer = self.registers[REG_FIFO_ADDR_PTR as usize];
                self.registers[REG_FIFO_ADDR_PTR as usize] = pointer.wrapping_add(1);
                self.fifo[pointer as usize]
            }
            _ => self.registers[address as usize],
        }
    }

    fn write(&mut self, address: u8, value: u8) {
        self.writes.push((address, value));

        if self.stuck.contains(&address) {
            return;
        }

        match address {
            REG_FIFO => {
                let pointer = self.registers[REG_FIFO_ADDR_PTR as usize];
                self.fifo[pointer as usize] = value;
                self.registers[REG_FIFO_ADDR_PTR as usize] = pointer.wrapping_add(1);
            }
            REG_IRQ_FLAGS => self.registers[REG_IRQ_FLAGS as usize] &= !value,
            REG_OP_MODE => {
                self.registers[REG_OP_MODE as usize] = value;
                if value & MODE_MASK == MODE_TX && self.tx_completes {
                    self.registers[REG_IRQ_FLAGS as usize] |= IRQ_TX_DONE;
                }
                if value & MODE_MASK == MODE_RX_SINGLE {
                    if let Some(packet) = self.pending.pop_front() {
                        self.inject_packet(
                            &packet.payload,
                            packet.rssi,
                            packet.snr,
                            packet.crc_error,
                        );
                    }
                }
            }
            REG_FIFO_RX_CURRENT_ADDR | REG_RX_NB_BYTES | REG_PKT_SNR | REG_PKT_RSSI
            | REG_VERSION => {}
            _ => self.registers[address as usize] = value,
        }
    }

    fn exchange(&mut self, address: u8, value: u8) -> u8 {
        let register = address & 0x7F;
        if address & 0x80 != 0 {
            let previous = self.registers[register as usize];
            self.write(register, value);
            previous
        } else {
            self.read(register)
        }
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    /// Values written to `address`, in order
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(written, _)| *written == address)
            .map(|&(_, value)| value)
            .collect()
    }

    /// Queues a packet for the next entry into single receive.
    pub fn queue_packet(&mut self, payload: &[u8], rssi: u8, snr: i8, crc_error: bool) {
        self.pending.push_back(Packet {
            payload: payload.to_vec(),
            rssi,
            snr,
            crc_error,
        });
    }

    /// Places a packet in the FIFO as the modem would on reception. A chip in
    /// single receive drops back to standby.
    pub fn inject_packet(&mut self, payload: &[u8], rssi: u8, snr: i8, crc_error: bool) {
        for (offset, &byte) in payload.iter().enumerate() {
            self.fifo[(RX_START as usize + offset) % 256] = byte;
        }
        self.registers[REG_FIFO_RX_CURRENT_ADDR as usize] = RX_START;
        self.registers[REG_RX_NB_BYTES as usize] = payload.len() as u8;
        self.registers[REG_PKT_RSSI as usize] = rssi;
        self.registers[REG_PKT_SNR as usize] = snr as u8;
        self.registers[REG_IRQ_FLAGS as usize] |= IRQ_RX_DONE;
        if crc_error {
            self.registers[REG_IRQ_FLAGS as usize] |= IRQ_CRC_ERROR;
        }

        let op_mode = self.registers[REG_OP_MODE as usize];
        if op_mode & MODE_MASK == MODE_RX_SINGLE {
            self.registers[REG_OP_MODE as usize] = (op_mode & !MODE_MASK) | MODE_STANDBY;
        }
    }
}

/// SPI device backed by a shared [`State`]
#[derive(Debug, Clone, Default)]
pub struct SimChip {
    pub state: Rc<RefCell<State>>,
}

impl SimChip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::RefMut<'_, State> {
        self.state.borrow_mut()
    }

    fn run(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            return Err(SimError);
        }
        state.transactions += 1;

        let mut address = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => address = bytes.first().copied(),
                Operation::TransferInPlace(bytes) => {
                    let Some(address) = address else {
                        return Err(SimError);
                    };
                    for byte in bytes.iter_mut() {
                        *byte = state.exchange(address, *byte);
                    }
                }
                _ => return Err(SimError),
            }
        }

        Ok(())
    }
}

impl ErrorType for SimChip {
    type Error = SimError;
}

impl spi::SpiDevice for SimChip {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

impl embedded_hal_async::spi::SpiDevice for SimChip {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        self.run(operations)
    }
}

/// Reset line that records the levels it was driven to
#[derive(Debug, Clone, Default)]
pub struct ResetLine {
    pub levels: Rc<RefCell<Vec<bool>>>,
}

impl embedded_hal::digital::ErrorType for ResetLine {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for ResetLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// Delay source that only accumulates the requested time
#[derive(Debug, Clone, Default)]
pub struct Clock {
    pub elapsed_ns: Rc<RefCell<u64>>,
}

impl Clock {
    pub fn elapsed_ms(&self) -> u64 {
        *self.elapsed_ns.borrow() / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        *self.elapsed_ns.borrow_mut() += ns as u64;
    }
}

pub type SimRadio = rfm96::Radio<SimChip, ResetLine, Clock>;

/// Radio on a fresh simulated chip, with handles to its collaborators
pub fn radio(config: rfm96::RadioConfig) -> (SimRadio, SimChip, ResetLine, Clock) {
    let chip = SimChip::new();
    let reset = ResetLine::default();
    let clock = Clock::default();
    let radio = rfm96::Radio::new(chip.clone(), reset.clone(), clock.clone(), config);
    (radio, chip, reset, clock)
}

/// Initialized radio in standby
pub fn standby_radio() -> (SimRadio, SimChip, Clock) {
    let (mut radio, chip, _, clock) = radio(rfm96::RadioConfig::default());
    radio.initialize().unwrap();
    chip.state().writes.clear();
    (radio, chip, clock)
}
