// In-memory stand-in for a JMicron bridge behind a /dev/sg node.
//
// The fake speaks the real sector protocol: it watches for the wakeup
// sequence, unscrambles command frames, validates their checksum, decodes
// probe payloads on its own (independently of the builders under test),
// and serves scrambled IDENTIFY / SMART responses for configured disks.
// Writes that are not protocol traffic fall through to a raw sector store,
// which is what the backup/restore path exercises.

use crate::io::{BlockTransport, SECTOR_SIZE, SECTOR_WORDS};
use crate::probes::{SmartPage, SMART_PAGE_LEN};
use crate::protocol::{crc, scramble};
use crate::{JmError, JmResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const COMMAND_MAGIC: u32 = 0x197b_0322;
const WAKEUP_MAGIC: u32 = 0x197b_0325;
const WAKEUP_SEQUENCE: [u32; 4] = [0x3c75_a80b, 0x0388_e337, 0x6897_05f3, 0xe00c_523a];
const CHECKSUM_WORD: usize = 0x7F;

pub(crate) fn word_at(bytes: &[u8], index: usize) -> u32 {
    u32::from_le_bytes([
        bytes[index * 4],
        bytes[index * 4 + 1],
        bytes[index * 4 + 2],
        bytes[index * 4 + 3],
    ])
}

fn to_words(bytes: &[u8; SECTOR_SIZE]) -> [u32; SECTOR_WORDS] {
    let mut words = [0u32; SECTOR_WORDS];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

fn from_words(words: &[u32; SECTOR_WORDS]) -> [u8; SECTOR_SIZE] {
    let mut bytes = [0u8; SECTOR_SIZE];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Checksum-seal a plaintext sector and scramble it for the wire.
pub(crate) fn seal_and_scramble(bytes: [u8; SECTOR_SIZE]) -> [u8; SECTOR_SIZE] {
    let mut words = to_words(&bytes);
    words[CHECKSUM_WORD] = crc::checksum(&words[..CHECKSUM_WORD]);
    scramble::scramble(&mut words);
    from_words(&words)
}

/// Encode a string the way ATA IDENTIFY carries it: space-padded to `len`,
/// each adjacent byte pair swapped.
pub(crate) fn ata_encode(text: &str, len: usize) -> Vec<u8> {
    let mut field: Vec<u8> = text.bytes().take(len).collect();
    field.resize(len, b' ');
    for pair in field.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    field
}

/// Build a SMART values page from (id, flags, current, worst, raw) tuples.
/// Entries land at page offset 2, 12 bytes apart.
pub(crate) fn encode_values_page(attrs: &[(u8, u16, u8, u8, u64)]) -> SmartPage {
    let mut page = [0u8; SMART_PAGE_LEN];
    page[0..2].copy_from_slice(&0x0010u16.to_le_bytes());
    for (i, &(id, flags, current, worst, raw)) in attrs.iter().take(30).enumerate() {
        let at = 2 + i * 12;
        page[at] = id;
        page[at + 1..at + 3].copy_from_slice(&flags.to_le_bytes());
        page[at + 3] = current;
        page[at + 4] = worst;
        page[at + 5..at + 11].copy_from_slice(&raw.to_le_bytes()[..6]);
    }
    page
}

/// Build a SMART thresholds page from (id, threshold) pairs.
pub(crate) fn encode_thresholds_page(thresholds: &[(u8, u8)]) -> SmartPage {
    let mut page = [0u8; SMART_PAGE_LEN];
    page[0..2].copy_from_slice(&0x0010u16.to_le_bytes());
    for (i, &(id, threshold)) in thresholds.iter().take(30).enumerate() {
        let at = 2 + i * 12;
        page[at] = id;
        page[at + 1] = threshold;
    }
    page
}

#[derive(Clone)]
pub(crate) struct FakeDisk {
    pub model: String,
    pub serial: String,
    pub firmware: String,
    pub sectors: u64,
    pub values_page: SmartPage,
    pub thresholds_page: SmartPage,
}

impl FakeDisk {
    /// A disk whose SMART pages should assess as PASSED under defaults.
    pub fn healthy(model: &str, serial: &str) -> Self {
        FakeDisk {
            model: model.to_string(),
            serial: serial.to_string(),
            firmware: "82.00A82".to_string(),
            sectors: 8_589_934_592, // 4 TB
            values_page: encode_values_page(&[
                (0x05, 0x0033, 200, 200, 0),
                (0x09, 0x0032, 95, 95, 0x0001_0000_1388), // POH with vendor bits above 32
                (0xC2, 0x0022, 112, 100, 38),
                (0xC5, 0x0032, 200, 200, 0),
            ]),
            thresholds_page: encode_thresholds_page(&[
                (0x05, 140),
                (0x09, 0),
                (0xC2, 0),
                (0xC5, 0),
            ]),
        }
    }

    pub fn with_pages(mut self, values: SmartPage, thresholds: SmartPage) -> Self {
        self.values_page = values;
        self.thresholds_page = thresholds;
        self
    }
}

#[derive(Default)]
struct Inner {
    disks: Vec<Option<FakeDisk>>,
    bitmask_override: Option<u8>,
    rebuilding: bool,
    store: HashMap<u32, [u8; SECTOR_SIZE]>,
    pending_response: Option<[u8; SECTOR_SIZE]>,
    wakeup_seen: Vec<u32>,
    awake: bool,
    counters_seen: Vec<u32>,
    writes: Vec<(u32, [u8; SECTOR_SIZE])>,
    reads: Vec<u32>,
    garble_next_response: bool,
    garble_counters: Vec<u32>,
    garble_all: bool,
    fail_next_read: bool,
    fail_next_write: bool,
}

#[derive(Clone)]
pub(crate) struct FakeController {
    inner: Rc<RefCell<Inner>>,
}

impl FakeController {
    pub fn new() -> Self {
        let inner = Inner {
            disks: vec![None, None, None, None, None],
            ..Inner::default()
        };
        FakeController {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn with_disk(self, slot: usize, disk: FakeDisk) -> Self {
        self.inner.borrow_mut().disks[slot] = Some(disk);
        self
    }

    pub fn with_bitmask(self, bitmask: u8) -> Self {
        self.inner.borrow_mut().bitmask_override = Some(bitmask);
        self
    }

    pub fn with_rebuilding(self, rebuilding: bool) -> Self {
        self.inner.borrow_mut().rebuilding = rebuilding;
        self
    }

    pub fn seed_sector(&self, lba: u32, data: [u8; SECTOR_SIZE]) {
        self.inner.borrow_mut().store.insert(lba, data);
    }

    pub fn sector_content(&self, lba: u32) -> [u8; SECTOR_SIZE] {
        self.inner
            .borrow()
            .store
            .get(&lba)
            .copied()
            .unwrap_or([0u8; SECTOR_SIZE])
    }

    pub fn wakeup_words(&self) -> Vec<u32> {
        self.inner.borrow().wakeup_seen.clone()
    }

    pub fn counters_seen(&self) -> Vec<u32> {
        self.inner.borrow().counters_seen.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes.len()
    }

    pub fn writes_to(&self, lba: u32) -> Vec<[u8; SECTOR_SIZE]> {
        self.inner
            .borrow()
            .writes
            .iter()
            .filter(|(at, _)| *at == lba)
            .map(|(_, data)| *data)
            .collect()
    }

    pub fn garble_next_response(&self) {
        self.inner.borrow_mut().garble_next_response = true;
    }

    /// Garble the response to the command carrying this counter value.
    /// Commands count from 1, so a scan's first exchange is counter 1.
    pub fn garble_response_to(&self, counter: u32) {
        self.inner.borrow_mut().garble_counters.push(counter);
    }

    pub fn garble_every_response(&self) {
        self.inner.borrow_mut().garble_all = true;
    }

    pub fn fail_next_read(&self) {
        self.inner.borrow_mut().fail_next_read = true;
    }

    pub fn fail_next_write(&self) {
        self.inner.borrow_mut().fail_next_write = true;
    }

    fn bitmask(inner: &Inner) -> u8 {
        inner.bitmask_override.unwrap_or_else(|| {
            inner
                .disks
                .iter()
                .enumerate()
                .filter(|(_, d)| d.is_some())
                .fold(0u8, |mask, (slot, _)| mask | (1 << slot))
        })
    }

    fn respond(inner: &mut Inner, plain: &[u8; SECTOR_SIZE]) {
        let counter = word_at(plain, 1);
        inner.counters_seen.push(counter);

        let payload = &plain[8..];
        let mut response = [0u8; SECTOR_SIZE];
        response[0..4].copy_from_slice(&COMMAND_MAGIC.to_le_bytes());
        response[4..8].copy_from_slice(&counter.to_le_bytes());
        response[0x1F0] = Self::bitmask(inner);
        response[0x1F5] = if inner.rebuilding { 0x01 } else { 0x00 };

        let slot = payload[4] as usize;
        let disk = inner.disks.get(slot).and_then(|d| d.as_ref());

        if payload[..4] == [0x00, 0x02, 0x02, 0xff] {
            // IDENTIFY: empty slots answer with a blank identity block
            if let Some(disk) = disk {
                response[0x10..0x30].copy_from_slice(&ata_encode(&disk.model, 32));
                response[0x30..0x40].copy_from_slice(&ata_encode(&disk.serial, 16));
                response[0x50..0x58].copy_from_slice(&ata_encode(&disk.firmware, 8));
                response[0x4A..0x50].copy_from_slice(&disk.sectors.to_le_bytes()[..6]);
            }
        } else if payload[..4] == [0x00, 0x02, 0x03, 0xff] {
            // SMART page read; register selects values (0xd0) or thresholds
            if let Some(disk) = disk {
                let page = match payload[10] {
                    0xd0 => &disk.values_page,
                    0xd1 => &disk.thresholds_page,
                    other => panic!("unexpected SMART register {:#x}", other),
                };
                response[0x20..].copy_from_slice(&page[..]);
            }
        } else {
            panic!("unrecognized probe payload {:02x?}", &payload[..12]);
        }

        let mut wire = seal_and_scramble(response);
        let targeted = inner.garble_counters.contains(&counter);
        if inner.garble_next_response || inner.garble_all || targeted {
            inner.garble_next_response = false;
            wire[17] ^= 0xA5;
        }
        inner.pending_response = Some(wire);
    }
}

impl BlockTransport for FakeController {
    fn read_sector(&mut self, lba: u32) -> JmResult<[u8; SECTOR_SIZE]> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_read {
            inner.fail_next_read = false;
            return Err(JmError::Ioctl {
                op: "READ(10)",
                source: std::io::Error::from_raw_os_error(libc::EIO),
            });
        }
        inner.reads.push(lba);
        if let Some(response) = inner.pending_response.take() {
            return Ok(response);
        }
        Ok(inner.store.get(&lba).copied().unwrap_or([0u8; SECTOR_SIZE]))
    }

    fn write_sector(&mut self, lba: u32, data: &[u8; SECTOR_SIZE]) -> JmResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_write {
            inner.fail_next_write = false;
            return Err(JmError::Ioctl {
                op: "WRITE(10)",
                source: std::io::Error::from_raw_os_error(libc::EIO),
            });
        }
        inner.writes.push((lba, *data));

        // Wakeup frames arrive unscrambled
        if word_at(data, 0) == WAKEUP_MAGIC {
            inner.wakeup_seen.push(word_at(data, 1));
            if inner.wakeup_seen.as_slice() == WAKEUP_SEQUENCE {
                inner.awake = true;
            }
            return Ok(());
        }

        // Scrambled command frames only count once the bridge is awake
        if inner.awake {
            let mut words = to_words(data);
            scramble::unscramble(&mut words);
            let stored = words[CHECKSUM_WORD];
            let computed = crc::checksum(&words[..CHECKSUM_WORD]);
            if words[0] == COMMAND_MAGIC && stored == computed {
                let plain = from_words(&words);
                Self::respond(&mut inner, &plain);
                return Ok(());
            }
        }

        // Anything else is plain data landing on the disk sector
        inner.store.insert(lba, *data);
        Ok(())
    }

    fn describe(&self) -> String {
        "fake JMicron bridge".to_string()
    }
}
