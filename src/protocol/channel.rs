// Sector channel lifecycle: backup, wakeup, command exchange, restore.
//
// The channel owns the communication sector for its whole lifetime. The
// pristine sector content is captured once in `open`, before anything is
// written, and written back exactly once on the way out. The restore runs
// either through the explicit `restore_and_close` call or through `Drop`,
// so early returns, panics and interrupt-triggered unwinding all leave the
// sector as it was found. A channel that never wrote (state Opened) also
// never restores; writing the backup onto a sector that was refused for
// being non-empty would itself be a write to live data.

use crate::io::{validate_sector, BlockTransport, SECTOR_SIZE};
use crate::protocol::frame::{self, Response};
use crate::{JmError, JmResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Backup captured, nothing written yet.
    Opened,
    /// Wakeup frames are on the wire; the sector is dirty.
    WakeUpSent,
    /// At least one command has been exchanged.
    InUse,
    /// Backup written back; the channel is spent.
    Restored,
}

pub struct SectorChannel<T: BlockTransport> {
    transport: T,
    sector: u32,
    backup: [u8; SECTOR_SIZE],
    counter: u32,
    state: ChannelState,
}

impl<T: BlockTransport> SectorChannel<T> {
    /// Capture the sector backup and take ownership of the transport.
    ///
    /// Fails closed: when the initial read fails the transport is dropped
    /// (closing the device) and no channel exists.
    pub fn open(mut transport: T, sector: u32) -> JmResult<Self> {
        validate_sector(sector)?;
        let backup = transport.read_sector(sector)?;
        tracing::debug!(sector, "communication sector backed up");
        Ok(SectorChannel {
            transport,
            sector,
            backup,
            counter: 0,
            state: ChannelState::Opened,
        })
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn sector(&self) -> u32 {
        self.sector
    }

    /// The snapshot taken at open time.
    pub fn backup(&self) -> &[u8; SECTOR_SIZE] {
        &self.backup
    }

    /// Whether the sector held only zero bytes when it was opened.
    ///
    /// Callers must check this before `send_wakeup` and walk away when it
    /// is false: a non-empty sector belongs to someone else's data.
    pub fn backup_is_empty(&self) -> bool {
        self.backup.iter().all(|&b| b == 0)
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    /// Write the four priming sectors. Required once before any command;
    /// the bridge reports nothing if this is skipped, later responses just
    /// fail checksum validation.
    pub fn send_wakeup(&mut self) -> JmResult<()> {
        if self.state != ChannelState::Opened {
            return Err(JmError::InvalidArgument(format!(
                "wakeup not possible in state {:?}",
                self.state
            )));
        }
        // Dirty from the first write attempt onward, even a failed one
        self.state = ChannelState::WakeUpSent;
        for wire in frame::build_wakeup_frames() {
            self.transport.write_sector(self.sector, &wire)?;
        }
        tracing::info!(sector = self.sector, "wakeup sequence sent");
        Ok(())
    }

    /// One command/response exchange: write the scrambled frame, read the
    /// sector back, unscramble and validate.
    ///
    /// A `CrcMismatch` leaves the channel usable; the next probe gets a
    /// fresh counter value. Transport errors are fatal to the channel and
    /// the caller is expected to abandon it (the restore still runs).
    pub fn execute(&mut self, payload: &[u8]) -> JmResult<Response> {
        match self.state {
            ChannelState::WakeUpSent | ChannelState::InUse => {}
            other => {
                return Err(JmError::InvalidArgument(format!(
                    "channel not ready for commands in state {:?}",
                    other
                )))
            }
        }
        self.counter += 1;
        self.state = ChannelState::InUse;

        let wire = frame::build_command(self.counter, payload)?;
        self.transport.write_sector(self.sector, &wire)?;
        let raw = self.transport.read_sector(self.sector)?;
        let response = frame::parse_response(&raw)?;
        tracing::trace!(
            counter = self.counter,
            echo = response.echo(),
            "command exchanged"
        );
        Ok(response)
    }

    /// Write the backup snapshot back and consume the channel.
    ///
    /// Prefer this over relying on `Drop`: it surfaces the restore error.
    pub fn restore_and_close(mut self) -> JmResult<()> {
        let result = self.restore_once();
        // Drop must not repeat the write
        self.state = ChannelState::Restored;
        result
    }

    fn restore_once(&mut self) -> JmResult<()> {
        match self.state {
            ChannelState::WakeUpSent | ChannelState::InUse => {
                self.transport.write_sector(self.sector, &self.backup)?;
                tracing::info!(sector = self.sector, "communication sector restored");
                Ok(())
            }
            // Nothing was written, nothing to undo
            ChannelState::Opened | ChannelState::Restored => Ok(()),
        }
    }
}

impl<T: BlockTransport> Drop for SectorChannel<T> {
    fn drop(&mut self) {
        if let Err(err) = self.restore_once() {
            tracing::warn!(
                sector = self.sector,
                error = %err,
                "failed to restore communication sector; run the zero-fill recovery"
            );
        }
        self.state = ChannelState::Restored;
    }
}

#[cfg(target_os = "linux")]
impl SectorChannel<crate::io::SgDevice> {
    /// Open the SCSI generic device at `path` and build a channel on it.
    pub fn open_device(path: &str, sector: u32) -> JmResult<Self> {
        let device = crate::io::SgDevice::open(path)?;
        SectorChannel::open(device, sector)
    }
}
