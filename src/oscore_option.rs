//! OSCORE Option Encoder (RFC 8613 §6.1): builds the flag-byte-prefixed
//! OSCORE option value (CoAP option number 9).

use heapless::Vec as HVec;

use crate::error::OscoreError;
use crate::limits::{MAX_PIV_LEN, OSCORE_OPT_VALUE_LEN};

/// CoAP option number assigned to OSCORE.
pub const OPTION_OSCORE: u16 = 9;

pub type OscoreOptionValue = HVec<u8, OSCORE_OPT_VALUE_LEN>;

/// Builds the full OSCORE option value for a request, an Observe message,
/// or the first message after reboot: flag byte with `k=1` (and `h=1` iff
/// an ID Context is present), the freshly generated PIV, and the KID.
pub fn encode_full(
    piv: &[u8],
    kid: &[u8],
    kid_context: &[u8],
) -> Result<OscoreOptionValue, OscoreError> {
    if piv.len() > MAX_PIV_LEN {
        return Err(OscoreError::OscoreValueTooLong);
    }

    let h = !kid_context.is_empty();
    let flag = (h as u8) << 4 | 1 << 3 | piv.len() as u8;

    let mut out = OscoreOptionValue::new();
    push(&mut out, flag)?;
    extend(&mut out, piv)?;
    if h {
        push(&mut out, kid_context.len() as u8)?;
        extend(&mut out, kid_context)?;
    }
    extend(&mut out, kid)?;
    Ok(out)
}

/// Builds the empty OSCORE option value emitted on a plain response
/// (no PIV, no KID, no KID context - flag byte is entirely zero and the
/// wire encoding is a zero-length option value, so this returns empty).
pub fn encode_empty() -> OscoreOptionValue {
    OscoreOptionValue::new()
}

fn push(out: &mut OscoreOptionValue, byte: u8) -> Result<(), OscoreError> {
    out.push(byte).map_err(|_| OscoreError::OscoreValueTooLong)
}

fn extend(out: &mut OscoreOptionValue, data: &[u8]) -> Result<(), OscoreError> {
    for &b in data {
        push(out, b)?;
    }
    Ok(())
}
