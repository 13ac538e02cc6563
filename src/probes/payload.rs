// Probe payload construction. These byte sequences are the vendor protocol
// verbatim; the only variable parts are the slot number and the SMART
// register selector.

/// ATA SMART READ DATA register value.
const SMART_READ_VALUES: u8 = 0xd0;

/// ATA SMART READ THRESHOLDS register value.
const SMART_READ_THRESHOLDS: u8 = 0xd1;

/// IDENTIFY DEVICE for one slot. The slot appears twice, at payload bytes
/// 4 and 9.
pub fn identify(slot: u8) -> [u8; 10] {
    [0x00, 0x02, 0x02, 0xff, slot, 0x00, 0x00, 0x00, 0x00, slot]
}

/// SMART READ ATTRIBUTE VALUES for one slot.
pub fn smart_values(slot: u8) -> [u8; 24] {
    smart_page(slot, SMART_READ_VALUES)
}

/// SMART READ ATTRIBUTE THRESHOLDS for one slot.
pub fn smart_thresholds(slot: u8) -> [u8; 24] {
    smart_page(slot, SMART_READ_THRESHOLDS)
}

fn smart_page(slot: u8, register: u8) -> [u8; 24] {
    [
        0x00, 0x02, 0x03, 0xff, slot, 0x02, 0x00, 0xe0, 0x00, 0x00, register, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x4f, 0x00, 0xc2, 0x00, 0xa0, 0x00, 0xb0, 0x00,
    ]
}
