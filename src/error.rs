//! The errors surfaced by the `coap2oscore` pipeline.

use core::fmt;
#[cfg(feature = "std")]
use std::error;

/// Every way `coap2oscore` (and its component stages) can fail.
///
/// There is deliberately one flat enum rather than a per-stage family: a
/// caller never needs to match on "which module" raised the error, only on
/// what went wrong and whether the sequence number was consumed (see
/// [`OscoreError::consumed_sequence_number`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscoreError {
    /// The input bytes don't form a well-formed CoAP message.
    InvalidPacket,
    /// The message has more options than [`crate::limits::MAX_OPTION_COUNT`].
    TooManyOptions,
    /// An option number isn't in either the Class-E or Class-U table.
    UnknownOption,
    /// An output buffer is too small to hold the result.
    BufferTooSmall,
    /// `sender_seq_num` has reached `2^40`; the context can no longer send.
    SeqNumOverflow,
    /// `sender_id` is longer than `nonce_len - 6`.
    IdTooLong,
    /// The encoded OSCORE option value exceeds its capacity.
    OscoreValueTooLong,
    /// The AEAD primitive rejected its inputs or failed internally.
    Aead,
}

impl OscoreError {
    /// Whether a failure at this stage can only happen after
    /// [`crate::context::SecurityContext::acquire_sender_piv`] has already
    /// run and burned a sequence number.
    ///
    /// Informational only: the context never rewinds on error regardless,
    /// so this doesn't change caller behavior. It documents why.
    pub fn consumed_sequence_number(&self) -> bool {
        !matches!(
            self,
            OscoreError::InvalidPacket
                | OscoreError::TooManyOptions
                | OscoreError::UnknownOption
        )
    }
}

impl fmt::Display for OscoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OscoreError::InvalidPacket => {
                write!(f, "OSCORE error: invalid CoAP packet")
            }
            OscoreError::TooManyOptions => {
                write!(f, "OSCORE error: too many options")
            }
            OscoreError::UnknownOption => {
                write!(f, "OSCORE error: option not in Class-E or Class-U")
            }
            OscoreError::BufferTooSmall => {
                write!(f, "OSCORE error: output buffer too small")
            }
            OscoreError::SeqNumOverflow => {
                write!(f, "OSCORE error: sender sequence number overflow")
            }
            OscoreError::IdTooLong => {
                write!(f, "OSCORE error: sender ID too long for nonce")
            }
            OscoreError::OscoreValueTooLong => {
                write!(f, "OSCORE error: OSCORE option value too long")
            }
            OscoreError::Aead => {
                write!(f, "OSCORE error: AEAD primitive failure")
            }
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for OscoreError {}
