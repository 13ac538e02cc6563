// 512-byte wire frames: command assembly, wakeup sectors, response
// validation. All multi-byte fields are little-endian on the wire and are
// accessed through explicit conversions; nothing here overlays a struct on
// the buffer.

use crate::io::{SECTOR_SIZE, SECTOR_WORDS};
use crate::protocol::{crc, scramble};
use crate::{JmError, JmResult};

/// word0 of every command frame.
pub const COMMAND_MAGIC: u32 = 0x197b_0322;

/// word0 of every wakeup frame.
pub const WAKEUP_MAGIC: u32 = 0x197b_0325;

/// Fixed word at byte 0x1F8 of every wakeup frame.
pub const WAKEUP_TAIL_MAGIC: u32 = 0x10ec_a1db;

/// word1 values of the four wakeup frames, in transmission order.
pub const WAKEUP_SEQUENCE: [u32; 4] = [0x3c75_a80b, 0x0388_e337, 0x6897_05f3, 0xe00c_523a];

/// Word index holding the checksum; it covers all words before it.
pub const CHECKSUM_WORD: usize = 0x7F;

/// Commands and responses carry their payload from this byte offset.
pub const PAYLOAD_OFFSET: usize = 8;

/// Payload bytes available between the header and the checksum word.
pub const MAX_PAYLOAD: usize = CHECKSUM_WORD * 4 - PAYLOAD_OFFSET;

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

fn seal_checksum(words: &mut [u32; SECTOR_WORDS]) {
    words[CHECKSUM_WORD] = crc::checksum(&words[..CHECKSUM_WORD]);
}

/// Assemble and scramble one command frame, ready for the wire.
///
/// `counter` must come from the owning channel session; the bridge rejects
/// nothing here, but stale counters make responses ambiguous.
pub fn build_command(counter: u32, payload: &[u8]) -> JmResult<[u8; SECTOR_SIZE]> {
    if payload.len() > MAX_PAYLOAD {
        return Err(JmError::InvalidArgument(format!(
            "command payload of {} bytes exceeds the {} byte frame capacity",
            payload.len(),
            MAX_PAYLOAD
        )));
    }

    let mut bytes = [0u8; SECTOR_SIZE];
    bytes[0..4].copy_from_slice(&COMMAND_MAGIC.to_le_bytes());
    bytes[4..8].copy_from_slice(&counter.to_le_bytes());
    bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);

    let mut words = to_words(&bytes);
    seal_checksum(&mut words);
    scramble::scramble(&mut words);
    Ok(from_words(&words))
}

/// The four priming sectors written before the bridge accepts commands.
/// Unlike commands, wakeup frames go out unscrambled.
pub fn build_wakeup_frames() -> [[u8; SECTOR_SIZE]; 4] {
    let mut frames = [[0u8; SECTOR_SIZE]; 4];
    for (frame, &seq_word) in frames.iter_mut().zip(WAKEUP_SEQUENCE.iter()) {
        frame[0..4].copy_from_slice(&WAKEUP_MAGIC.to_le_bytes());
        frame[4..8].copy_from_slice(&seq_word.to_le_bytes());
        for offset in 0x10..0x1F8 {
            frame[offset] = (offset & 0xFF) as u8;
        }
        frame[0x1F8..0x1FC].copy_from_slice(&WAKEUP_TAIL_MAGIC.to_le_bytes());

        let mut words = to_words(frame);
        seal_checksum(&mut words);
        *frame = from_words(&words);
    }
    frames
}

/// A validated, unscrambled response sector.
///
/// Probe decoding addresses fields at absolute byte offsets within the full
/// frame, so the whole buffer stays accessible.
#[derive(Debug, Clone)]
pub struct Response {
    bytes: [u8; SECTOR_SIZE],
}

impl Response {
    pub fn as_bytes(&self) -> &[u8; SECTOR_SIZE] {
        &self.bytes
    }

    /// word1 of the response; the bridge echoes a command-related value.
    pub fn echo(&self) -> u32 {
        u32::from_le_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]])
    }

    /// Everything after the 8-byte frame header.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[PAYLOAD_OFFSET..]
    }
}

/// Unscramble a sector read back from the device and validate its checksum.
///
/// A mismatch means the bridge did not answer (no wakeup, wrong sector,
/// foreign data); the caller decides whether to skip or abort. No retry.
pub fn parse_response(wire: &[u8; SECTOR_SIZE]) -> JmResult<Response> {
    let mut words = to_words(wire);
    scramble::unscramble(&mut words);

    let stored = words[CHECKSUM_WORD];
    let computed = crc::checksum(&words[..CHECKSUM_WORD]);
    if stored != computed {
        return Err(JmError::CrcMismatch { stored, computed });
    }

    Ok(Response {
        bytes: from_words(&words),
    })
}
