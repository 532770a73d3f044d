//! Plaintext Builder (RFC 8613 §5.3): emits
//! `code ∥ serialized(inner_options) ∥ [0xFF ∥ payload]`, the byte string
//! the AEAD encrypts.

use heapless::Vec as HVec;

use crate::{
    error::OscoreError,
    limits::MAX_PLAINTEXT_LEN,
    packet::{write_options, CoapOptionEntry},
};

pub type Plaintext = HVec<u8, MAX_PLAINTEXT_LEN>;

/// Builds the plaintext for a message with the given original code byte,
/// already-classified inner options, and payload.
pub fn build(
    code: u8,
    inner_options: &[CoapOptionEntry],
    payload: &[u8],
) -> Result<Plaintext, OscoreError> {
    let mut out = [0u8; MAX_PLAINTEXT_LEN];
    out[0] = code;
    let mut pos = 1;

    pos += write_options(inner_options, &mut out[pos..])?;

    if !payload.is_empty() {
        if pos >= out.len() {
            return Err(OscoreError::BufferTooSmall);
        }
        out[pos] = 0xFF;
        pos += 1;

        let end = pos + payload.len();
        if end > out.len() {
            return Err(OscoreError::BufferTooSmall);
        }
        out[pos..end].copy_from_slice(payload);
        pos = end;
    }

    Plaintext::from_slice(&out[..pos]).map_err(|_| OscoreError::BufferTooSmall)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_options_no_payload_is_just_the_code() {
        let pt = build(0x01, &[], &[]).unwrap();
        assert_eq!(pt.as_slice(), [0x01]);
    }

    #[test]
    fn payload_gets_marker_only_when_present() {
        let pt = build(0x01, &[], &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(pt.as_slice(), [0x01, 0xFF, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn options_are_serialized_before_payload_marker() {
        let uri_path = CoapOptionEntry::new(11, b"temperature").unwrap();
        let pt = build(0x01, &[uri_path], &[0x01, 0x02, 0x03]).unwrap();

        assert_eq!(pt[0], 0x01);
        assert_eq!(pt[1], 0xBB); // delta=11, length=11
        assert_eq!(&pt[2..13], b"temperature");
        assert_eq!(pt[13], 0xFF);
        assert_eq!(&pt[14..17], [0x01, 0x02, 0x03]);
    }
}
