// SCSI generic pass-through transport. All unsafe lives here.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use libc::{c_int, c_void};

use super::{
    validate_sector, BlockTransport, PROTOCOL_TIMEOUT_MS, SECTOR_SIZE, ZERO_FILL_TIMEOUT_MS,
};
use crate::{JmError, JmResult};

const SG_IO: libc::c_ulong = 0x2285;
const SG_GET_VERSION_NUM: libc::c_ulong = 0x2282;
const SG_DXFER_TO_DEV: c_int = -2;
const SG_DXFER_FROM_DEV: c_int = -3;

const READ_10: u8 = 0x28;
const WRITE_10: u8 = 0x2A;
const CDB_LEN: usize = 10;
const SENSE_LEN: usize = 32;

/// Oldest sg driver version whose SG_IO behaves as required (v3 interface).
const MIN_SG_VERSION: i32 = 30_000;

// Mirror of struct sg_io_hdr from <scsi/sg.h>. libc does not carry it.
#[repr(C)]
struct SgIoHdr {
    interface_id: c_int,
    dxfer_direction: c_int,
    cmd_len: u8,
    mx_sb_len: u8,
    iovec_count: u16,
    dxfer_len: u32,
    dxferp: *mut c_void,
    cmdp: *mut u8,
    sbp: *mut u8,
    timeout: u32,
    flags: u32,
    pack_id: c_int,
    usr_ptr: *mut c_void,
    status: u8,
    masked_status: u8,
    msg_status: u8,
    sb_len_wr: u8,
    host_status: u16,
    driver_status: u16,
    resid: c_int,
    duration: u32,
    info: u32,
}

/// READ(10)/WRITE(10) for exactly one block: big-endian LBA in bytes 2..6,
/// transfer length 1 at byte 8.
fn rw_cdb(opcode: u8, lba: u32) -> [u8; CDB_LEN] {
    let mut cdb = [0u8; CDB_LEN];
    cdb[0] = opcode;
    cdb[2..6].copy_from_slice(&lba.to_be_bytes());
    cdb[8] = 0x01;
    cdb
}

/// An open SCSI generic device node.
pub struct SgDevice {
    file: File,
    path: String,
}

impl SgDevice {
    /// Open a node read-write and verify the pass-through driver is new
    /// enough. The handle is dropped before returning any error.
    pub fn open(path: &str) -> JmResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| JmError::DeviceOpen {
                path: path.to_string(),
                source,
            })?;

        let mut version: c_int = 0;
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), SG_GET_VERSION_NUM, &mut version) };
        if rc < 0 || version < MIN_SG_VERSION {
            return Err(JmError::NotGenericDevice {
                path: path.to_string(),
                version: if rc < 0 { 0 } else { version },
            });
        }
        tracing::debug!("{} pass-through driver version {}", path, version);

        Ok(SgDevice {
            file,
            path: path.to_string(),
        })
    }

    /// One blocking SG_IO round trip. Returns the SCSI status byte; 0 means
    /// the device accepted the command.
    fn pass_through(
        &self,
        op: &'static str,
        cdb: &mut [u8; CDB_LEN],
        direction: c_int,
        data: &mut [u8; SECTOR_SIZE],
        timeout_ms: u32,
    ) -> JmResult<u8> {
        let mut sense = [0u8; SENSE_LEN];
        let mut hdr: SgIoHdr = unsafe { std::mem::zeroed() };
        hdr.interface_id = 'S' as c_int;
        hdr.dxfer_direction = direction;
        hdr.cmd_len = CDB_LEN as u8;
        hdr.mx_sb_len = SENSE_LEN as u8;
        hdr.dxfer_len = SECTOR_SIZE as u32;
        hdr.dxferp = data.as_mut_ptr() as *mut c_void;
        hdr.cmdp = cdb.as_mut_ptr();
        hdr.sbp = sense.as_mut_ptr();
        hdr.timeout = timeout_ms;

        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), SG_IO, &mut hdr) };
        if rc < 0 {
            return Err(JmError::Ioctl {
                op,
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(hdr.status)
    }
}

impl BlockTransport for SgDevice {
    fn read_sector(&mut self, lba: u32) -> JmResult<[u8; SECTOR_SIZE]> {
        let mut cdb = rw_cdb(READ_10, lba);
        let mut data = [0u8; SECTOR_SIZE];
        self.pass_through(
            "READ(10)",
            &mut cdb,
            SG_DXFER_FROM_DEV,
            &mut data,
            PROTOCOL_TIMEOUT_MS,
        )?;
        Ok(data)
    }

    fn write_sector(&mut self, lba: u32, data: &[u8; SECTOR_SIZE]) -> JmResult<()> {
        let mut cdb = rw_cdb(WRITE_10, lba);
        let mut buffer = *data;
        self.pass_through(
            "WRITE(10)",
            &mut cdb,
            SG_DXFER_TO_DEV,
            &mut buffer,
            PROTOCOL_TIMEOUT_MS,
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

/// Overwrite one sector with zeros.
///
/// Recovery hatch for a communication sector left dirty by an abnormal
/// termination. The same range rules as a scan apply, but there is no
/// emptiness check: calling this declares the sector expendable.
pub fn zero_sector(path: &str, sector: u32) -> JmResult<()> {
    validate_sector(sector)?;
    let device = SgDevice::open(path)?;

    let mut cdb = rw_cdb(WRITE_10, sector);
    let mut zeros = [0u8; SECTOR_SIZE];
    let status = device.pass_through(
        "WRITE(10)",
        &mut cdb,
        SG_DXFER_TO_DEV,
        &mut zeros,
        ZERO_FILL_TIMEOUT_MS,
    )?;
    if status != 0 {
        return Err(JmError::ProtocolFailure(
            "device reported nonzero status for the zero fill",
        ));
    }

    tracing::info!("zero-filled sector {:#x} on {}", sector, path);
    Ok(())
}

#[cfg(test)]
mod sg_tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cdb_layout() {
        let cdb = rw_cdb(READ_10, 0x21);
        assert_eq!(cdb, [0x28, 0, 0x00, 0x00, 0x00, 0x21, 0, 0, 0x01, 0]);

        let cdb = rw_cdb(WRITE_10, 0x0102_0304);
        assert_eq!(cdb[0], 0x2A);
        assert_eq!(&cdb[2..6], &[0x01, 0x02, 0x03, 0x04], "LBA is big-endian");
        assert_eq!(cdb[8], 0x01, "always one block");
    }

    #[test]
    fn test_open_rejects_a_regular_file() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();
        match SgDevice::open(path) {
            Err(JmError::NotGenericDevice { version, .. }) => assert_eq!(version, 0),
            other => panic!("expected NotGenericDevice, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_open_reports_missing_device() {
        match SgDevice::open("/nonexistent/sg0") {
            Err(JmError::DeviceOpen { path, .. }) => assert_eq!(path, "/nonexistent/sg0"),
            other => panic!("expected DeviceOpen, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_zero_sector_validates_range_before_touching_the_device() {
        match zero_sector("/nonexistent/sg0", 5) {
            Err(JmError::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {:?}", other.is_ok()),
        }
    }
}
