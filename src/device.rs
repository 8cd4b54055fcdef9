//! RFM96 Register Interface
//!
//! This module provides the register transaction protocol used to reach the radio
//! over SPI. It supports both synchronous and asynchronous operations.
//!
//! Every access is a single chip-select bracketed transaction made of two byte
//! exchanges:
//! 1. The register address, with bit 7 set for a write and cleared for a read
//! 2. A duplex exchange that shifts the value out and the register content in
//!
//! Typed registers from [`registers`](crate::registers) wider than one byte are
//! accessed as consecutive single-byte transactions starting at the register id.
//!
//! # Example
//! ```ignore
//! use rfm96::{Device, OpMode};
//!
//! // Create device with SPI interface
//! let spi = // ... SPI implementation
//! let mut device = Device::new(spi);
//!
//! // Read a register
//! let mode: OpMode = device.read_register()?;
//!
//! // Write a raw register
//! device.write_register_raw(0x0D, 0x00)?;
//! ```

use core::convert::Infallible;

use embedded_hal::spi::Error as _;
use regiface::{ByteArray, ReadableRegister, WritableRegister};

use crate::Error;

/// Address bit selecting write access
pub const WRITE_ACCESS: u8 = 0x80;

/// Register protocol interface for the RFM96 radio.
///
/// This struct wraps an SPI device (which owns chip select) and provides methods
/// to read and write the radio's registers. It supports both synchronous operations
/// through the embedded-hal traits and asynchronous operations through
/// embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI device implementing the required embedded-hal traits
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads one register by address.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn read_register_raw(&mut self, address: u8) -> Result<u8, Error> {
        self.exchange(address & !WRITE_ACCESS, 0x00)
    }

    /// Writes one register by address.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register_raw(&mut self, address: u8, value: u8) -> Result<(), Error> {
        self.exchange(address | WRITE_ACCESS, value).map(|_| ())
    }

    fn exchange(&mut self, address: u8, value: u8) -> Result<u8, Error> {
        let mut data = [value];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address]),
                embedded_hal::spi::Operation::TransferInPlace(&mut data),
            ])
            .map_err(|e| Error::Bus(e.kind()))?;

        Ok(data[0])
    }

    /// Reads a register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Deserialization` - The register holds a reserved encoding
    pub fn read_register<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self.read_register_raw(R::id().wrapping_add(offset as u8))?;
        }

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Writes a value to a device register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = register.to_bytes().unwrap_or_else(|e| match e {});

        for (offset, &byte) in raw_value.as_ref().iter().enumerate() {
            self.write_register_raw(R::id().wrapping_add(offset as u8), byte)?;
        }

        Ok(())
    }

    /// Reads back a register and compares it byte by byte with `expected`.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::ConfigurationFailure` - The first mismatching byte
    pub fn verify_register<R>(&mut self, expected: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = expected.to_bytes().unwrap_or_else(|e| match e {});

        for (offset, &expected) in raw_value.as_ref().iter().enumerate() {
            let address = R::id().wrapping_add(offset as u8);
            let found = self.read_register_raw(address)?;
            if found != expected {
                return Err(Error::ConfigurationFailure {
                    address,
                    expected,
                    found,
                });
            }
        }

        Ok(())
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously reads one register by address.
    ///
    /// This is the async version of [`read_register_raw`](Device::read_register_raw).
    pub async fn read_register_raw_async(&mut self, address: u8) -> Result<u8, Error> {
        self.exchange_async(address & !WRITE_ACCESS, 0x00).await
    }

    /// Asynchronously writes one register by address.
    ///
    /// This is the async version of [`write_register_raw`](Device::write_register_raw).
    pub async fn write_register_raw_async(&mut self, address: u8, value: u8) -> Result<(), Error> {
        self.exchange_async(address | WRITE_ACCESS, value)
            .await
            .map(|_| ())
    }

    async fn exchange_async(&mut self, address: u8, value: u8) -> Result<u8, Error> {
        let mut data = [value];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[address]),
                embedded_hal_async::spi::Operation::TransferInPlace(&mut data),
            ])
            .await
            .map_err(|e| Error::Bus(e.kind()))?;

        Ok(data[0])
    }

    /// Asynchronously reads a register value from the device.
    ///
    /// This is the async version of [`read_register`](Device::read_register).
    pub async fn read_register_async<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self
                .read_register_raw_async(R::id().wrapping_add(offset as u8))
                .await?;
        }

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Asynchronously writes a value to a device register.
    ///
    /// This is the async version of [`write_register`](Device::write_register).
    pub async fn write_register_async<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = register.to_bytes().unwrap_or_else(|e| match e {});

        for (offset, &byte) in raw_value.as_ref().iter().enumerate() {
            self.write_register_raw_async(R::id().wrapping_add(offset as u8), byte)
                .await?;
        }

        Ok(())
    }
}
