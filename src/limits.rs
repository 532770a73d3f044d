//! Compile-time capacity bounds.
//!
//! Every buffer the pipeline touches is sized from one of these constants.
//! There is no dynamic allocation anywhere in this crate: exceeding a bound
//! is a typed error, never a panic and never a silent truncation.

/// Upper bound on the number of options a message may carry.
///
/// RFC 7252 doesn't fix a limit; this is an implementation choice for
/// constrained deployments, kept comfortably above what a typical CoAP
/// request/response needs (a handful of Uri-Path/Uri-Query segments plus a
/// few Class-U options).
pub const MAX_OPTION_COUNT: usize = 24;

/// Maximum CoAP token length (RFC 7252 §3: TKL is a 4-bit field, but values
/// 9-15 are reserved).
pub const MAX_TOKEN_LEN: usize = 8;

/// Maximum length of a single option value this crate will hold.
///
/// Not an RFC limit (options like Proxy-Uri can be much larger); a bound
/// constrained endpoints can budget for. Raise it if your deployment needs
/// longer option values.
pub const MAX_OPTION_VALUE_LEN: usize = 256;

/// Maximum size of a whole CoAP message, matching the RFC 7252 recommended
/// size for messages sent over an unreliable transport without path MTU
/// discovery.
pub const MAX_MESSAGE_LEN: usize = 1280;

/// Maximum size of the plaintext handed to the AEAD (code + inner options +
/// payload marker + payload).
pub const MAX_PLAINTEXT_LEN: usize = MAX_MESSAGE_LEN;

/// AES-CCM-16-64-128 fixed parameters (RFC 8613 §3.2.1 default algorithm).
pub const AEAD_KEY_LEN: usize = 16;
pub const AEAD_NONCE_LEN: usize = 13;
pub const AEAD_TAG_LEN: usize = 8;

/// Maximum size of the AEAD output (ciphertext ∥ tag).
pub const MAX_CIPHERTEXT_LEN: usize = MAX_PLAINTEXT_LEN + AEAD_TAG_LEN;

/// Maximum size of the COSE Encrypt0 `enc_structure` passed to the AEAD as
/// associated data.
pub const MAX_AAD_LEN: usize = 64;

/// Maximum length of the sender ID / recipient ID carried as OSCORE KID.
pub const MAX_KID_LEN: usize = 7;

/// Maximum length of the OSCORE ID Context (KID context).
pub const MAX_KID_CONTEXT_LEN: usize = 8;

/// Maximum length of a Partial IV (RFC 8613 §5.2: "at most 5 bytes").
pub const MAX_PIV_LEN: usize = 5;

/// Maximum length of the serialized OSCORE option value: flag byte + PIV +
/// (1-byte length prefix + KID context) + KID.
pub const OSCORE_OPT_VALUE_LEN: usize =
    1 + MAX_PIV_LEN + 1 + MAX_KID_CONTEXT_LEN + MAX_KID_LEN;

/// Sender sequence numbers are Partial IVs, which RFC 8613 bounds to 5
/// bytes; this crate uses the same 2^40 ceiling the reference algorithm
/// does, leaving room below 2^40 - 1 for a reboot replay margin.
pub const MAX_SEQ_NUM: u64 = 1 << 40;

/// Maximum length of a cached ECHO option value (RFC 9175 option number
/// 252), an opaque server-chosen token rather than a fixed-size field.
pub const MAX_ECHO_LEN: usize = 40;
