// Wire protocol for JMicron RAID bridges: checksum and scrambling
// primitives, 512-byte frame assembly, and the sector-channel lifecycle.

pub mod channel;
pub mod crc;
pub mod frame;
pub mod scramble;

pub use channel::{ChannelState, SectorChannel};
pub use frame::Response;
