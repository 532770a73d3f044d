//! Assembler (RFC 8613 §4.2): builds the outer CoAP message carrying the
//! OSCORE option and the ciphertext.

use crate::{
    error::OscoreError,
    header::{MessageClass, RequestType, ResponseType},
    oscore_option::OPTION_OSCORE,
    packet::{CoapMessage, CoapOptionEntry, OptionList},
};

/// Rewrites a request/response code to its RFC 8613 §4.2 outer equivalent.
fn outer_code(original: MessageClass, is_observe: bool) -> MessageClass {
    match original {
        MessageClass::Request(_) => {
            if is_observe {
                MessageClass::Request(RequestType::Get)
            } else {
                MessageClass::Request(RequestType::Post)
            }
        }
        MessageClass::Response(_) => {
            if is_observe {
                MessageClass::Response(ResponseType::Content)
            } else {
                MessageClass::Response(ResponseType::Changed)
            }
        }
        other => other,
    }
}

/// Assembles the outer OSCORE-protected message.
///
/// `outer_options` is the Class-U option set from
/// [`crate::option::split`]; `oscore_value` is the encoded OSCORE option
/// value from [`crate::oscore_option`]; `ciphertext` is the AEAD output
/// (ciphertext ∥ tag), which becomes the outer payload.
pub fn assemble(
    input: &CoapMessage,
    outer_options: &OptionList,
    is_observe: bool,
    oscore_value: &[u8],
    ciphertext: &[u8],
) -> Result<CoapMessage, OscoreError> {
    let mut outer = CoapMessage::new();
    outer.header = input.header.clone();
    outer.header.code = outer_code(input.header.code, is_observe);
    outer.set_token(input.get_token())?;

    for entry in outer_options.iter() {
        outer.add_option(entry.number, &entry.value)?;
    }
    outer.add_option(OPTION_OSCORE, oscore_value)?;

    outer.payload =
        crate::packet::Payload::from_slice(ciphertext).map_err(|_| OscoreError::BufferTooSmall)?;

    Ok(outer)
}
