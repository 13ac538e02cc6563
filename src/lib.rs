pub mod array;
pub mod io;
pub mod monitor;
pub mod probes;
pub mod protocol;
pub mod smart;

// Re-export the main entry points for convenience
pub use array::{ArrayClassification, ArrayHealth};
pub use monitor::{scan_with_transport, RunOutcome, ScanOptions, ScanReport};
pub use smart::{DiskRecord, DiskVerdict, ThresholdPolicy};

#[cfg(target_os = "linux")]
pub use monitor::scan_device;

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

lazy_static! {
    // Global flag for handling SIGINT/SIGTERM interrupts. Arc'd so the same
    // flag can be handed to signal-hook registrations.
    static ref INTERRUPTED: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

/// Set the interrupt flag.
pub fn set_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Check if an interrupt has been received.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Reset the interrupt flag (primarily for testing).
pub fn reset_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Wire SIGINT and SIGTERM to the interrupt flag.
///
/// The signal only raises the flag; device cleanup happens when the scan
/// loop notices the flag and unwinds through the channel guard, never inside
/// handler context. Call once, at process start or right after a channel is
/// opened. The library never installs this implicitly.
pub fn register_interrupt_flags() -> std::io::Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&INTERRUPTED))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&INTERRUPTED))?;
    Ok(())
}

// Error taxonomy for the channel, the probes and the assessor
#[derive(Error, Debug)]
pub enum JmError {
    #[error("cannot open device {path}: {source}")]
    DeviceOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("{path} is not a SCSI generic device (driver version {version})")]
    NotGenericDevice { path: String, version: i32 },

    #[error("pass-through {op} failed: {source}")]
    Ioctl {
        op: &'static str,
        source: std::io::Error,
    },

    #[error("response checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("communication sector {sector:#x} is not empty; refusing to touch it")]
    SectorInUse { sector: u32 },

    #[error("protocol failure: {0}")]
    ProtocolFailure(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type JmResult<T> = Result<T, JmError>;
