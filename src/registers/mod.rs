//! Register definitions for the RFM96 (SX1276/7/8) in LoRa mode
//! Generated from the SX1276/77/78/79 datasheet, rev. 7

mod modem;
mod packet;
mod rf;
mod system;

pub use modem::*;
pub use packet::*;
pub use rf::*;
pub use system::*;
