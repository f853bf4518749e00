//! Cyclic redundancy checks
//!
//! CRC-32 (ISO-HDLC, the zlib/PNG variant) and CRC-64 (XZ, reflected ECMA-182
//! polynomial). Both are incremental: feeding a previous result back in as the
//! starting value continues the computation, so
//! `crc32(a ++ b) == crc32i(b, crc32(a))`.
//!
//! The CRC-32 entry points are `const fn` so identifiers derived from string
//! literals can be computed at compile time.

const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;
const CRC64_POLYNOMIAL: u64 = 0xC96C_5795_D787_0F42;

const CRC32_TABLE: [u32; 256] = build_crc32_table();
const CRC64_TABLE: [u64; 256] = build_crc64_table();

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut remainder = i as u32;
        let mut bit = 0;
        while bit < 8 {
            remainder = if remainder & 1 == 1 {
                (remainder >> 1) ^ CRC32_POLYNOMIAL
            } else {
                remainder >> 1
            };
            bit += 1;
        }
        table[i] = remainder;
        i += 1;
    }
    table
}

const fn build_crc64_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut remainder = i as u64;
        let mut bit = 0;
        while bit < 8 {
            remainder = if remainder & 1 == 1 {
                (remainder >> 1) ^ CRC64_POLYNOMIAL
            } else {
                remainder >> 1
            };
            bit += 1;
        }
        table[i] = remainder;
        i += 1;
    }
    table
}

/// CRC-32 of `bytes`.
pub const fn crc32(bytes: &[u8]) -> u32 {
    crc32i(bytes, 0)
}

/// Continue a CRC-32 from `previous`, the result of hashing the bytes that
/// precede `bytes`. A `previous` of zero starts a fresh checksum.
pub const fn crc32i(bytes: &[u8], previous: u32) -> u32 {
    let mut remainder = !previous;
    let mut i = 0;
    while i < bytes.len() {
        let index = ((remainder ^ bytes[i] as u32) & 0xFF) as usize;
        remainder = CRC32_TABLE[index] ^ (remainder >> 8);
        i += 1;
    }
    !remainder
}

/// CRC-64 of `bytes`.
pub const fn crc64(bytes: &[u8]) -> u64 {
    crc64i(bytes, 0)
}

/// Continue a CRC-64 from `previous`; see [`crc32i`].
pub const fn crc64i(bytes: &[u8], previous: u64) -> u64 {
    let mut remainder = !previous;
    let mut i = 0;
    while i < bytes.len() {
        let index = ((remainder ^ bytes[i] as u64) & 0xFF) as usize;
        remainder = CRC64_TABLE[index] ^ (remainder >> 8);
        i += 1;
    }
    !remainder
}

/// CRC-32 of a string's UTF-8 bytes.
pub const fn crc32_str(text: &str) -> u32 {
    crc32(text.as_bytes())
}
