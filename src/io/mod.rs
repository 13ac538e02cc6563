// Device access layer: the raw-block transport trait the channel is built
// over, sector geometry constants, and the SCSI generic implementation.

use crate::JmResult;

#[cfg(target_os = "linux")]
pub mod sg;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
#[cfg(target_os = "linux")]
pub use sg::{zero_sector, SgDevice};

/// One logical block on the bus. The protocol never transfers anything else.
pub const SECTOR_SIZE: usize = 512;

/// The same block measured in 32-bit words.
pub const SECTOR_WORDS: usize = SECTOR_SIZE / 4;

/// Conventional communication sector used by the vendor tools (inside the
/// reserved boot track, after the MBR).
pub const DEFAULT_SECTOR: u32 = 0x21;

/// Timeout for one protocol-level block transfer.
pub const PROTOCOL_TIMEOUT_MS: u32 = 3_000;

/// Timeout for the standalone zero-fill recovery write.
pub const ZERO_FILL_TIMEOUT_MS: u32 = 5_000;

/// Raw single-block access to the device holding the communication sector.
///
/// The real implementation drives SG_IO pass-through; tests substitute an
/// in-memory fake. Implementations transfer exactly one 512-byte block per
/// call and must not retry on their own.
pub trait BlockTransport {
    fn read_sector(&mut self, lba: u32) -> JmResult<[u8; SECTOR_SIZE]>;

    fn write_sector(&mut self, lba: u32, data: &[u8; SECTOR_SIZE]) -> JmResult<()>;

    /// Human-readable device identification for log and report lines.
    fn describe(&self) -> String;
}

/// Guard the communication sector against landing inside partition data.
///
/// Sector 0x21 is the vendor convention and always allowed. Anything else
/// below 64 is too close to the MBR and partition headers; anything at or
/// beyond 2048 is inside the first partition on every common layout.
pub fn validate_sector(sector: u32) -> JmResult<()> {
    if sector >= 2048 {
        return Err(crate::JmError::InvalidArgument(format!(
            "sector {} reaches into partition data (must be below 2048)",
            sector
        )));
    }
    if sector < 64 && sector != DEFAULT_SECTOR {
        return Err(crate::JmError::InvalidArgument(format!(
            "sector {} is inside the MBR/boot area (only {:#x} is allowed below 64)",
            sector, DEFAULT_SECTOR
        )));
    }
    Ok(())
}
