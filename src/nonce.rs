//! Nonce & PIV Engine (RFC 8613 §5.2): trims a sender sequence number to a
//! Partial IV and derives the AEAD nonce from (sender ID, PIV, common IV).

use heapless::Vec as HVec;

use crate::{
    error::OscoreError,
    limits::{AEAD_NONCE_LEN, MAX_KID_LEN, MAX_PIV_LEN, MAX_SEQ_NUM},
};

/// A minimally-encoded Partial IV: big-endian, no leading zero bytes except
/// for the single `0x00` that represents a sequence number of zero.
pub type Piv = HVec<u8, MAX_PIV_LEN>;

/// Encodes `seq_num` as the minimal big-endian byte sequence RFC 8613 §5.2
/// requires for a Partial IV.
///
/// `seq_num` must be below [`MAX_SEQ_NUM`] (2^40); the caller is expected to
/// have already burned the sequence number via
/// [`crate::context::SecurityContext::acquire_sender_piv`], which enforces
/// that bound before calling this.
pub fn encode_piv(seq_num: u64) -> Piv {
    let bytes = seq_num.to_be_bytes();
    let first_nonzero = bytes.iter().position(|&b| b != 0);
    let mut piv = Piv::new();
    match first_nonzero {
        None => piv.push(0).ok().unwrap(),
        Some(start) => {
            for &b in &bytes[start..] {
                piv.push(b).ok().unwrap();
            }
        }
    }
    piv
}

/// Derives the AEAD nonce per RFC 8613 §5.2:
///
/// ```text
/// ID_PIV_padded = zeroes(nonce_len - 6 - |sender_id|) || len(sender_id) || sender_id
/// PIV_padded    = zeroes(5 - |piv|) || piv
/// pre_nonce     = ID_PIV_padded || PIV_padded
/// nonce         = pre_nonce XOR common_iv
/// ```
pub fn derive_nonce(
    sender_id: &[u8],
    piv: &[u8],
    common_iv: &[u8; AEAD_NONCE_LEN],
) -> Result<[u8; AEAD_NONCE_LEN], OscoreError> {
    if sender_id.len() > AEAD_NONCE_LEN - 6 {
        return Err(OscoreError::IdTooLong);
    }
    if sender_id.len() > MAX_KID_LEN {
        return Err(OscoreError::IdTooLong);
    }

    let mut pre_nonce = [0u8; AEAD_NONCE_LEN];
    let id_piv_padded_len = AEAD_NONCE_LEN - 5;
    let id_start = id_piv_padded_len - 1 - sender_id.len();
    pre_nonce[id_start] = sender_id.len() as u8;
    pre_nonce[id_start + 1..id_piv_padded_len].copy_from_slice(sender_id);

    let piv_start = AEAD_NONCE_LEN - piv.len();
    pre_nonce[piv_start..].copy_from_slice(piv);

    let mut nonce = [0u8; AEAD_NONCE_LEN];
    for i in 0..AEAD_NONCE_LEN {
        nonce[i] = pre_nonce[i] ^ common_iv[i];
    }
    Ok(nonce)
}
