//! AAD Builder (RFC 8613 §5.4, COSE RFC 8152 §5.3): builds the Encrypt0
//! `external_aad` and wraps it into the `enc_structure` passed to the AEAD
//! as associated data.

use heapless::Vec as HVec;

use crate::{cbor, error::OscoreError, limits::MAX_AAD_LEN};

/// The fixed OSCORE version this crate implements (RFC 8613 §5.4).
const OSCORE_VERSION: u64 = 1;

/// AEAD algorithm identifier for AES-CCM-16-64-128 (COSE, RFC 8152 §10.2,
/// value 10).
pub const AEAD_ALG_AES_CCM_16_64_128: i64 = 10;

pub type Aad = HVec<u8, MAX_AAD_LEN>;

/// Builds `external_aad = [oscore_version, [aead_alg], request_kid, request_piv, h'']`
/// as deterministic CBOR.
fn build_external_aad(
    aead_alg: i64,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Aad, OscoreError> {
    let mut out = Aad::new();
    cbor::write_array_head(&mut out, 5)?;
    cbor::write_uint(&mut out, OSCORE_VERSION)?;
    cbor::write_array_head(&mut out, 1)?;
    // aead_alg is a small positive COSE algorithm identifier in this
    // crate's scope (AES-CCM-16-64-128 = 10); negative algorithm
    // identifiers aren't needed here.
    cbor::write_uint(&mut out, aead_alg as u64)?;
    cbor::write_bstr(&mut out, request_kid)?;
    cbor::write_bstr(&mut out, request_piv)?;
    cbor::write_bstr(&mut out, &[])?;
    Ok(out)
}

/// Builds the full `enc_structure = ["Encrypt0", h'', external_aad]` that is
/// passed to the AEAD as associated data.
pub fn build_aad(
    aead_alg: i64,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Aad, OscoreError> {
    let external_aad = build_external_aad(aead_alg, request_kid, request_piv)?;

    let mut out = Aad::new();
    cbor::write_array_head(&mut out, 3)?;
    cbor::write_tstr(&mut out, "Encrypt0")?;
    cbor::write_bstr(&mut out, &[])?;
    cbor::write_bstr(&mut out, &external_aad)?;
    Ok(out)
}
