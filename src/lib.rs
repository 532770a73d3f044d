//! A `#![no_std]`, no-alloc OSCORE (RFC 8613) sender core for constrained
//! CoAP (RFC 7252) endpoints.
//!
//! This crate implements exactly the `coap2oscore` transformation: parsing
//! a plaintext CoAP datagram, classifying its options into Class-E/Class-U,
//! building the plaintext to encrypt, deriving the nonce from a
//! [`SecurityContext`], encrypting it under a caller-supplied
//! [`AeadCipher`], and assembling the OSCORE-protected outer message.
//!
//! It does not implement the reverse `oscore2coap` direction, the EDHOC
//! handshake, or the AEAD primitive itself - those are either out of scope
//! or modeled as a capability the host provides.
//!
//! ## Usage
//! ```rust,ignore
//! use oscore_sender::{coap2oscore, AeadCipher, SecurityContext};
//!
//! let mut ctx = SecurityContext::new(sender_id, sender_key, common_iv, id_context, 0)?;
//! let mut out = [0u8; 1280];
//! let n = coap2oscore(&plaintext_coap_bytes, &mut ctx, &my_aead, &mut out)?;
//! send(&out[..n]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod log;

pub mod limits;

#[cfg_attr(tarpaulin, skip)]
pub mod error;

mod aad;
mod aead;
mod assembler;
mod cbor;
mod context;
mod header;
mod nonce;
mod option;
mod oscore_option;
mod packet;
mod pipeline;
mod plaintext;

pub use aead::AeadCipher;
pub use context::SecurityContext;
pub use error::OscoreError;
pub use header::{Header, HeaderRaw, MessageClass, MessageType, RequestType, ResponseType};
pub use option::OptionClass;
pub use oscore_option::OPTION_OSCORE;
pub use packet::{CoapMessage, CoapOption, CoapOptionEntry};
pub use pipeline::coap2oscore;
