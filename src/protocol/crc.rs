// CRC-32 variant used by the JMicron sector protocol.
//
// Standard IEEE 802.3 polynomial, but a vendor-specific seed and no final
// XOR. Words are folded in big-endian byte order regardless of the wire
// endianness, so every input word is byte-swapped before its four bytes go
// through the table.

use lazy_static::lazy_static;

const CRC32_POLY: u32 = 0x04C1_1DB7;

/// Seed observed on the bus; not the IEEE default.
pub const CRC_SEED: u32 = 0x5232_5032;

lazy_static! {
    static ref CRC_TABLE: [u32; 256] = build_table();
}

fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = (i as u32) << 24;
        for _ in 0..8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ CRC32_POLY;
            } else {
                crc <<= 1;
            }
        }
        *entry = crc;
    }
    table
}

/// Checksum a run of 32-bit words.
///
/// Pure and deterministic; an empty input returns the seed. The value is
/// length-sensitive: extending the input changes the result.
pub fn checksum(words: &[u32]) -> u32 {
    let table = &*CRC_TABLE;
    let mut crc = CRC_SEED;
    for &word in words {
        let be = word.swap_bytes();
        for shift in [0u32, 8, 16, 24] {
            let byte = (be >> shift) & 0xFF;
            crc = table[((byte ^ (crc >> 24)) & 0xFF) as usize] ^ (crc << 8);
        }
    }
    crc
}
