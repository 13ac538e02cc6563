// Per-word XOR obfuscation applied to command and response sectors.
//
// The bridge firmware XORs every one of the 128 words in a sector against a
// fixed mask before it interprets a command, and applies the same transform
// to its responses. The transform is its own inverse. The mask table is an
// opaque constant recovered from the vendor protocol; it has no structure
// worth deriving, only the properties that every word is nonzero and that
// applying it twice restores the input. Replace the table wholesale if a
// different firmware revision is ever observed.

use crate::io::SECTOR_WORDS;

#[rustfmt::skip]
static SCRAMBLE_MASK: [u32; SECTOR_WORDS] = [
    0xeaefcd4b, 0x4e968c5b, 0xeb9e35e5, 0x619a1dd7,
    0xf0f2467a, 0xce627e09, 0x61074ae2, 0x433f5716,
    0x0a78d2f8, 0x3ec5ae66, 0xcc248c13, 0xd3ef7d60,
    0x867b9731, 0xdcae663e, 0x10159718, 0xd8fa16d6,
    0xce0ca37b, 0x097980d0, 0xedea5959, 0x06da3325,
    0xe5686ec8, 0xdae691a5, 0x7de6bd51, 0x8f28cceb,
    0x6d3cd52d, 0xa32256c3, 0x11e1f210, 0xc4cab06b,
    0xb38c263a, 0x6f370620, 0x225187a3, 0x8609dbd0,
    0xc70ac19f, 0x8e24b2a5, 0x3137475a, 0xff735961,
    0x0e55843a, 0x53677775, 0x1f6f2b89, 0xcd3c32e3,
    0x3cf7f63a, 0x97a8a989, 0x0d620289, 0x3191480a,
    0x60e5a4ee, 0x1683c399, 0xf76fc3ea, 0x7815dd04,
    0x17ff2571, 0x4d6cdd4a, 0xedddf60a, 0xe6d86598,
    0xe9e482c7, 0xd5704825, 0xb4952cd5, 0x6017e6bd,
    0x283c3b4a, 0x612a50ea, 0xe529cebe, 0xf7123716,
    0xaf75cd11, 0xbf337ed4, 0x9d0c473f, 0x527d1e7c,
    0x9b4dd316, 0xc9d945a3, 0x12bd5370, 0x59d91a55,
    0x9afe5e6c, 0x39dc30ed, 0x4ba52dd3, 0xd77e3fa1,
    0x21237f95, 0x6faf604f, 0xc48915d9, 0x5d397a64,
    0x2dfe41c5, 0xaf2dc32f, 0x10910e46, 0x986f2ea6,
    0xa7a17c74, 0x84120b09, 0xa9ba3559, 0x4e3c03ab,
    0xd80121fd, 0x5074cfe9, 0xaf881b56, 0xeba0168d,
    0xffcbcbaa, 0x2bad7062, 0x8bc9b23c, 0xbe089d22,
    0x76fecd73, 0x2eacf977, 0x5d130472, 0x2057dac1,
    0xc8786bb3, 0x73b475c2, 0xc3b56a95, 0x8054b39f,
    0xcf957c58, 0xc9fde85e, 0x5da17f12, 0xb4076473,
    0x9f35ab61, 0x28d5678a, 0xcaa72b67, 0x4a5c2991,
    0xb09299db, 0x39b7b648, 0x82395d8e, 0xb17cfdde,
    0x0a85fbaa, 0xd47080af, 0x9e9ef194, 0x7e63177a,
    0x553dbff3, 0x375e4c6e, 0xb4eaec30, 0x65a6932d,
    0x927a62d2, 0xf9187ffd, 0x7177fada, 0x2aa65c55,
    0xd473ec37, 0xa2c3fe39, 0xe440146e, 0x6d2da691,
];

/// XOR the sector's 128 words against the fixed mask, in place.
pub fn scramble(words: &mut [u32; SECTOR_WORDS]) {
    for (word, mask) in words.iter_mut().zip(SCRAMBLE_MASK.iter()) {
        *word ^= mask;
    }
}

/// Inverse of [`scramble`]. The transform is involutive, so this is the
/// same operation; a separate name keeps call sites readable.
pub fn unscramble(words: &mut [u32; SECTOR_WORDS]) {
    scramble(words);
}

#[cfg(test)]
pub(crate) fn mask_words() -> &'static [u32; SECTOR_WORDS] {
    &SCRAMBLE_MASK
}
