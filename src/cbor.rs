//! A minimal deterministic CBOR encoder (RFC 8949), covering exactly the
//! shapes the AAD Builder needs: unsigned integers, byte strings, one text
//! string literal, and short definite-length arrays. Not a general CBOR
//! library - no indefinite-length items, no floats, no maps.

use heapless::Vec as HVec;

use crate::error::OscoreError;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_BYTE_STRING: u8 = 2;
const MAJOR_TEXT_STRING: u8 = 3;
const MAJOR_ARRAY: u8 = 4;

/// Appends a CBOR-encoded item of the given major type and argument `n`
/// (RFC 8949 §3: the 5-bit additional information, extended with 1/2/4/8
/// byte encodings as needed).
fn write_head<const N: usize>(
    out: &mut HVec<u8, N>,
    major: u8,
    n: u64,
) -> Result<(), OscoreError> {
    let major = major << 5;
    let err = || OscoreError::BufferTooSmall;

    if n < 24 {
        out.push(major | n as u8).map_err(|_| err())
    } else if n <= u8::MAX as u64 {
        out.push(major | 24).map_err(|_| err())?;
        out.push(n as u8).map_err(|_| err())
    } else if n <= u16::MAX as u64 {
        out.push(major | 25).map_err(|_| err())?;
        out.extend_checked(&(n as u16).to_be_bytes()).map_err(|_| err())
    } else if n <= u32::MAX as u64 {
        out.push(major | 26).map_err(|_| err())?;
        out.extend_checked(&(n as u32).to_be_bytes()).map_err(|_| err())
    } else {
        out.push(major | 27).map_err(|_| err())?;
        out.extend_checked(&n.to_be_bytes()).map_err(|_| err())
    }
}

/// Trivial extension helper since `heapless::Vec` doesn't implement
/// `extend_from_slice` returning a `Result` the way this module wants.
trait ExtendChecked {
    fn extend_checked(&mut self, data: &[u8]) -> Result<(), ()>;
}

impl<const N: usize> ExtendChecked for HVec<u8, N> {
    fn extend_checked(&mut self, data: &[u8]) -> Result<(), ()> {
        for &b in data {
            self.push(b).map_err(|_| ())?;
        }
        Ok(())
    }
}

/// Encodes an unsigned integer (major type 0).
pub fn write_uint<const N: usize>(
    out: &mut HVec<u8, N>,
    value: u64,
) -> Result<(), OscoreError> {
    write_head(out, MAJOR_UNSIGNED, value)
}

/// Encodes a byte string (major type 2).
pub fn write_bstr<const N: usize>(
    out: &mut HVec<u8, N>,
    value: &[u8],
) -> Result<(), OscoreError> {
    write_head(out, MAJOR_BYTE_STRING, value.len() as u64)?;
    out.extend_checked(value).map_err(|_| OscoreError::BufferTooSmall)
}

/// Encodes a text string (major type 3). This crate only ever encodes the
/// literal `"Encrypt0"`, but the helper is general over any `&str` that
/// fits the buffer.
pub fn write_tstr<const N: usize>(
    out: &mut HVec<u8, N>,
    value: &str,
) -> Result<(), OscoreError> {
    write_head(out, MAJOR_TEXT_STRING, value.len() as u64)?;
    out.extend_checked(value.as_bytes())
        .map_err(|_| OscoreError::BufferTooSmall)
}

/// Encodes the header for a definite-length array of `len` elements (major
/// type 4); the caller writes the `len` element encodings itself.
pub fn write_array_head<const N: usize>(
    out: &mut HVec<u8, N>,
    len: u64,
) -> Result<(), OscoreError> {
    write_head(out, MAJOR_ARRAY, len)
}
