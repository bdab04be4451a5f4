#![forbid(unsafe_code)]
//! Little-endian packed-record encoding for binary trace layouts.
//!
//! Trace binary formats are fixed-width, unpadded, little-endian records —
//! the opposite convention from [`crate::primitives::io`]'s sibling module in
//! a storage engine, which would order-preserve big-endian keys. Here there
//! is nothing to compare lexicographically; records are decoded positionally
//! by a caller-supplied field layout (see `crate::reader::binary`).

pub fn get_u32_le(src: &[u8]) -> u32 {
    let bytes: [u8; 4] = src[..4].try_into().expect("4-byte slice");
    u32::from_le_bytes(bytes)
}

pub fn get_u64_le(src: &[u8]) -> u64 {
    let bytes: [u8; 8] = src[..8].try_into().expect("8-byte slice");
    u64::from_le_bytes(bytes)
}

pub fn get_i64_le(src: &[u8]) -> i64 {
    let bytes: [u8; 8] = src[..8].try_into().expect("8-byte slice");
    i64::from_le_bytes(bytes)
}

pub fn get_u16_le(src: &[u8]) -> u16 {
    let bytes: [u8; 2] = src[..2].try_into().expect("2-byte slice");
    u16::from_le_bytes(bytes)
}

pub fn put_u32_le(dst: &mut [u8], v: u32) {
    dst[..4].copy_from_slice(&v.to_le_bytes());
}

pub fn put_u64_le(dst: &mut [u8], v: u64) {
    dst[..8].copy_from_slice(&v.to_le_bytes());
}

pub fn put_i64_le(dst: &mut [u8], v: i64) {
    dst[..8].copy_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_u32() {
        let mut buf = [0u8; 4];
        put_u32_le(&mut buf, 0xdead_beef);
        assert_eq!(get_u32_le(&buf), 0xdead_beef);
    }

    #[test]
    fn roundtrip_i64_negative() {
        let mut buf = [0u8; 8];
        put_i64_le(&mut buf, -1);
        assert_eq!(get_i64_le(&buf), -1);
    }
}
