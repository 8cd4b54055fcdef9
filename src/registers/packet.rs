//! Packet handling related registers
//!
//! This module contains registers for moving packets through the 256-byte FIFO:
//! - FIFO data window and the shared SPI access pointer
//! - Transmit and receive base addresses
//! - Payload length of outbound packets
//! - Length, location and link quality of the last received packet
//!
//! Every access to [`FifoData`] reads or writes the byte at [`FifoAddrPtr`] and
//! then advances the pointer by one.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// FIFO data window (address: 0x00)
#[register(0x00u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoData {
    /// Byte at the current FIFO pointer
    pub value: u8,
}

/// FIFO SPI pointer (address: 0x0D)
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoAddrPtr {
    /// FIFO address of the next SPI access
    pub address: u8,
}

/// FIFO transmit base address (address: 0x0E)
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoTxBaseAddr {
    /// Start of the transmit area
    pub address: u8,
}

/// FIFO receive base address (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoRxBaseAddr {
    /// Start of the receive area
    pub address: u8,
}

/// Start address of the last received packet (address: 0x10)
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoRxCurrentAddr {
    /// FIFO address of the first payload byte
    pub address: u8,
}

/// Payload length of the last received packet (address: 0x13)
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxNbBytes {
    /// Number of payload bytes
    pub count: u8,
}

/// SNR estimate of the last packet (address: 0x19)
///
/// Two's complement in steps of 0.25 dB.
#[register(0x19u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketSnr {
    /// Raw signed SNR value
    pub raw: i8,
}

/// RSSI of the last packet (address: 0x1A)
///
/// Packet strength in dBm is `-137 + raw` on the low frequency port.
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketRssi {
    /// Raw RSSI value
    pub raw: u8,
}

/// Payload length register (address: 0x22)
///
/// Number of FIFO bytes sent on the next transmission. Must never exceed
/// [`MAX_PKT_LENGTH`](crate::MAX_PKT_LENGTH).
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadLength {
    /// Payload length in bytes
    pub length: u8,
}

macro_rules! single_byte_field {
    ($register:ty, $field:ident) => {
        impl FromByteArray for $register {
            type Error = Infallible;
            type Array = [u8; 1];

            fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
                Ok(Self { $field: bytes[0] })
            }
        }
    };
    ($register:ty, $field:ident, writable) => {
        single_byte_field!($register, $field);

        impl ToByteArray for $register {
            type Error = Infallible;
            type Array = [u8; 1];

            fn to_bytes(self) -> Result<Self::Array, Self::Error> {
                Ok([self.$field])
            }
        }
    };
}

single_byte_field!(FifoData, value, writable);
single_byte_field!(FifoAddrPtr, address, writable);
single_byte_field!(FifoTxBaseAddr, address, writable);
single_byte_field!(FifoRxBaseAddr, address, writable);
single_byte_field!(FifoRxCurrentAddr, address);
single_byte_field!(RxNbBytes, count);
single_byte_field!(PacketRssi, raw);
single_byte_field!(PayloadLength, length, writable);

impl FromByteArray for PacketSnr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            raw: bytes[0] as i8,
        })
    }
}
