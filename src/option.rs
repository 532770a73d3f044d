//! Option Classifier (RFC 8613 §4.1): partitions a message's options into
//! Class-E ("inner", to be encrypted) and Class-U ("outer", left visible).

use crate::{
    error::OscoreError,
    limits::MAX_OPTION_COUNT,
    packet::{write_options, CoapMessage, CoapOptionEntry, OptionList},
};

/// CoAP option number for Observe (RFC 7641).
pub const OPTION_OBSERVE: u16 = 6;
/// CoAP option number for ECHO (RFC 9175). Classified Class-E: it travels as
/// an inner option so the reboot/replay-window recovery it carries is
/// authenticated, not left visible on the outer message.
pub const OPTION_ECHO: u16 = 252;

/// Whether an option number belongs to Class-E or Class-U under RFC 8613
/// §4.1, or neither (which this crate treats as a hard error rather than
/// silently defaulting to Class-U - see the Open Questions in the design
/// notes for why that default was rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionClass {
    E,
    U,
}

/// Looks up an option number's class. Observe is Class-E here; its dual
/// placement in the outer message is handled separately by [`split`].
fn classify(option_number: u16) -> Option<OptionClass> {
    match option_number {
        1 | 4 | 5 | 6 | 8 | 11 | 12 | 14 | 15 | 17 | 20 | 23 | 27 | 28 | 60
        | OPTION_ECHO => Some(OptionClass::E),
        3 | 7 | 9 | 35 | 39 => Some(OptionClass::U),
        _ => None,
    }
}

/// The result of splitting a message's options into inner and outer sets.
pub struct Split {
    pub inner: OptionList,
    pub outer: OptionList,
    /// Byte length `inner` will occupy once serialized by
    /// [`crate::packet::write_options`] - exactly what the plaintext
    /// builder needs to size its buffer.
    pub inner_serialized_length: usize,
}

/// Splits a message's options per RFC 8613 §4.1.
///
/// `is_request` distinguishes a request's Observe (whose inner copy keeps
/// the original registration/deregistration value) from a response's
/// Observe (whose inner copy is empty; the sequence number only appears in
/// the outer, visible option).
pub fn split(
    msg: &CoapMessage,
    is_request: bool,
) -> Result<Split, OscoreError> {
    let mut inner = OptionList::new();
    let mut outer = OptionList::new();

    for entry in msg.options() {
        if entry.number == OPTION_OBSERVE {
            let inner_value: &[u8] = if is_request { &entry.value } else { &[] };
            push(&mut inner, entry.number, inner_value)?;
            push(&mut outer, entry.number, &entry.value)?;
            continue;
        }

        match classify(entry.number) {
            Some(OptionClass::E) => push(&mut inner, entry.number, &entry.value)?,
            Some(OptionClass::U) => push(&mut outer, entry.number, &entry.value)?,
            None => return Err(OscoreError::UnknownOption),
        }
    }

    let mut scratch = [0u8; crate::limits::MAX_PLAINTEXT_LEN];
    let inner_serialized_length = write_options(&inner, &mut scratch)?;

    Ok(Split {
        inner,
        outer,
        inner_serialized_length,
    })
}

fn push(
    list: &mut OptionList,
    number: u16,
    value: &[u8],
) -> Result<(), OscoreError> {
    let entry = CoapOptionEntry::new(number, value)?;
    list.push(entry).map_err(|_| OscoreError::TooManyOptions)
}

/// Hard cap re-exported for callers that want to pre-check message size
/// before calling [`split`].
pub const MAX_SPLIT_OPTIONS: usize = MAX_OPTION_COUNT;
