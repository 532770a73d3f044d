//! CoAP message codec (RFC 7252 §3): parses a byte buffer into a structured
//! [`CoapMessage`] and serializes a structured message back to bytes.

use core::convert::TryFrom;
use heapless::Vec as HVec;

use crate::{
    error::OscoreError,
    header::{Header, HeaderRaw},
    limits::{MAX_MESSAGE_LEN, MAX_OPTION_COUNT, MAX_OPTION_VALUE_LEN, MAX_TOKEN_LEN},
};

/// The CoAP options this crate knows the name of.
///
/// Covers exactly the option numbers referenced by the Class-E/Class-U
/// tables (RFC 8613 §4.1) plus OSCORE itself; anything else decodes to
/// [`CoapOption::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoapOption {
    IfMatch,
    UriHost,
    ETag,
    IfNoneMatch,
    Observe,
    UriPort,
    LocationPath,
    Oscore,
    UriPath,
    ContentFormat,
    MaxAge,
    UriQuery,
    Accept,
    LocationQuery,
    Block2,
    Block1,
    ProxyUri,
    ProxyScheme,
    Size1,
    Size2,
    Unknown(u16),
}

impl From<u16> for CoapOption {
    fn from(number: u16) -> CoapOption {
        match number {
            1 => CoapOption::IfMatch,
            3 => CoapOption::UriHost,
            4 => CoapOption::ETag,
            5 => CoapOption::IfNoneMatch,
            6 => CoapOption::Observe,
            7 => CoapOption::UriPort,
            8 => CoapOption::LocationPath,
            9 => CoapOption::Oscore,
            11 => CoapOption::UriPath,
            12 => CoapOption::ContentFormat,
            14 => CoapOption::MaxAge,
            15 => CoapOption::UriQuery,
            17 => CoapOption::Accept,
            20 => CoapOption::LocationQuery,
            23 => CoapOption::Block2,
            27 => CoapOption::Block1,
            28 => CoapOption::Size2,
            35 => CoapOption::ProxyUri,
            39 => CoapOption::ProxyScheme,
            60 => CoapOption::Size1,
            other => CoapOption::Unknown(other),
        }
    }
}

impl From<CoapOption> for u16 {
    fn from(option: CoapOption) -> u16 {
        match option {
            CoapOption::IfMatch => 1,
            CoapOption::UriHost => 3,
            CoapOption::ETag => 4,
            CoapOption::IfNoneMatch => 5,
            CoapOption::Observe => 6,
            CoapOption::UriPort => 7,
            CoapOption::LocationPath => 8,
            CoapOption::Oscore => 9,
            CoapOption::UriPath => 11,
            CoapOption::ContentFormat => 12,
            CoapOption::MaxAge => 14,
            CoapOption::UriQuery => 15,
            CoapOption::Accept => 17,
            CoapOption::LocationQuery => 20,
            CoapOption::Block2 => 23,
            CoapOption::Block1 => 27,
            CoapOption::Size2 => 28,
            CoapOption::ProxyUri => 35,
            CoapOption::ProxyScheme => 39,
            CoapOption::Size1 => 60,
            CoapOption::Unknown(number) => number,
        }
    }
}

/// Capacity bound for a single option's value.
pub type OptionValue = HVec<u8, MAX_OPTION_VALUE_LEN>;
/// Capacity bound for the token.
pub type Token = HVec<u8, MAX_TOKEN_LEN>;
/// Capacity bound for the payload.
pub type Payload = HVec<u8, MAX_MESSAGE_LEN>;

/// One option as it lives inside a [`CoapMessage`]: the absolute option
/// number (not a delta - deltas only exist on the wire) and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct CoapOptionEntry {
    pub number: u16,
    pub value: OptionValue,
}

impl CoapOptionEntry {
    pub fn new(number: u16, value: &[u8]) -> Result<Self, OscoreError> {
        let value = OptionValue::from_slice(value)
            .map_err(|_| OscoreError::BufferTooSmall)?;
        Ok(CoapOptionEntry { number, value })
    }
}

/// A fixed-capacity, ascending-by-number ordered list of options.
pub type OptionList = HVec<CoapOptionEntry, MAX_OPTION_COUNT>;

/// The CoAP message.
///
/// Options are always kept sorted by ascending option number (ties broken
/// by insertion order), matching the order the wire format requires; the
/// codec never has to re-sort before serializing.
#[derive(Debug, Clone, PartialEq)]
pub struct CoapMessage {
    pub header: Header,
    token: Token,
    options: OptionList,
    pub payload: Payload,
}

impl Default for CoapMessage {
    fn default() -> Self {
        CoapMessage {
            header: Header::new(),
            token: Token::new(),
            options: OptionList::new(),
            payload: Payload::new(),
        }
    }
}

impl CoapMessage {
    /// Creates a new, empty message.
    pub fn new() -> CoapMessage {
        Default::default()
    }

    /// Sets the token.
    pub fn set_token(&mut self, token: &[u8]) -> Result<(), OscoreError> {
        let token = Token::from_slice(token)
            .map_err(|_| OscoreError::BufferTooSmall)?;
        self.header.set_token_length(token.len() as u8);
        self.token = token;
        Ok(())
    }

    /// Returns the token.
    pub fn get_token(&self) -> &[u8] {
        &self.token
    }

    /// Returns the options in ascending-number order.
    pub fn options(&self) -> &[CoapOptionEntry] {
        &self.options
    }

    /// Appends an option value, keeping the list sorted by ascending
    /// option number and preserving relative order among same-numbered
    /// options (e.g. successive Uri-Path segments).
    pub fn add_option(
        &mut self,
        number: u16,
        value: &[u8],
    ) -> Result<(), OscoreError> {
        let entry = CoapOptionEntry::new(number, value)?;
        self.options
            .push(entry)
            .map_err(|_| OscoreError::TooManyOptions)?;

        let mut i = self.options.len() - 1;
        while i > 0 && self.options[i - 1].number > number {
            self.options.swap(i - 1, i);
            i -= 1;
        }
        Ok(())
    }

    /// Removes every occurrence of an option number.
    pub fn clear_option(&mut self, number: u16) {
        let mut write = 0;
        for read in 0..self.options.len() {
            if self.options[read].number != number {
                if write != read {
                    self.options.swap(write, read);
                }
                write += 1;
            }
        }
        self.options.truncate(write);
    }

    /// Decodes a byte slice and constructs the equivalent message.
    pub fn from_bytes(buf: &[u8]) -> Result<CoapMessage, OscoreError> {
        let raw_header =
            HeaderRaw::try_from(buf).map_err(|_| OscoreError::InvalidPacket)?;
        let header = Header::from_raw(&raw_header);
        let token_length = header.get_token_length() as usize;

        if token_length > MAX_TOKEN_LEN {
            return Err(OscoreError::InvalidPacket);
        }

        let options_start = 4 + token_length;
        if options_start > buf.len() {
            return Err(OscoreError::InvalidPacket);
        }

        let token = Token::from_slice(&buf[4..options_start])
            .map_err(|_| OscoreError::InvalidPacket)?;

        let mut idx = options_start;
        let mut option_number: u16 = 0;
        let mut options = OptionList::new();

        while idx < buf.len() {
            let byte = buf[idx];
            if byte == 0xFF {
                // A standalone payload marker with no payload bytes after it
                // is invalid (RFC 7252 §3.1), not an empty payload.
                if idx == buf.len() - 1 {
                    return Err(OscoreError::InvalidPacket);
                }
                break;
            }
            idx += 1;

            let mut delta = (byte >> 4) as u16;
            let mut length = (byte & 0x0F) as usize;

            match delta {
                13 => {
                    let ext = *buf.get(idx).ok_or(OscoreError::InvalidPacket)?;
                    delta = ext as u16 + 13;
                    idx += 1;
                }
                14 => {
                    if idx + 1 >= buf.len() {
                        return Err(OscoreError::InvalidPacket);
                    }
                    let ext = u16::from_be_bytes([buf[idx], buf[idx + 1]]);
                    delta = ext
                        .checked_add(269)
                        .ok_or(OscoreError::InvalidPacket)?;
                    idx += 2;
                }
                15 => return Err(OscoreError::InvalidPacket),
                _ => {}
            }

            match length {
                13 => {
                    let ext = *buf.get(idx).ok_or(OscoreError::InvalidPacket)?;
                    length = ext as usize + 13;
                    idx += 1;
                }
                14 => {
                    if idx + 1 >= buf.len() {
                        return Err(OscoreError::InvalidPacket);
                    }
                    let ext = u16::from_be_bytes([buf[idx], buf[idx + 1]]);
                    length = ext as usize + 269;
                    idx += 2;
                }
                15 => return Err(OscoreError::InvalidPacket),
                _ => {}
            }

            option_number = option_number
                .checked_add(delta)
                .ok_or(OscoreError::InvalidPacket)?;

            let end = idx.checked_add(length).ok_or(OscoreError::InvalidPacket)?;
            if end > buf.len() {
                return Err(OscoreError::InvalidPacket);
            }
            let value = &buf[idx..end];

            let entry = CoapOptionEntry::new(option_number, value)
                .map_err(|_| OscoreError::InvalidPacket)?;
            options
                .push(entry)
                .map_err(|_| OscoreError::TooManyOptions)?;

            idx += length;
        }

        let payload = if idx < buf.len() {
            // Skip the 0xFF payload marker.
            Payload::from_slice(&buf[idx + 1..])
                .map_err(|_| OscoreError::InvalidPacket)?
        } else {
            Payload::new()
        };

        Ok(CoapMessage {
            header,
            token,
            options,
            payload,
        })
    }

    /// Serializes the message into `out`, returning the number of bytes
    /// written.
    pub fn to_bytes(&self, out: &mut [u8]) -> Result<usize, OscoreError> {
        if out.len() < 4 {
            return Err(OscoreError::BufferTooSmall);
        }
        self.header.to_raw().serialize_into(&mut out[0..4])?;

        let mut pos = 4;
        if !self.token.is_empty() {
            let end = pos + self.token.len();
            if end > out.len() {
                return Err(OscoreError::BufferTooSmall);
            }
            out[pos..end].copy_from_slice(&self.token);
            pos = end;
        }

        pos += write_options(&self.options, &mut out[pos..])?;

        if !self.payload.is_empty() {
            if pos >= out.len() {
                return Err(OscoreError::BufferTooSmall);
            }
            out[pos] = 0xFF;
            pos += 1;

            let end = pos + self.payload.len();
            if end > out.len() {
                return Err(OscoreError::BufferTooSmall);
            }
            out[pos..end].copy_from_slice(&self.payload);
            pos = end;
        }

        Ok(pos)
    }
}

/// Serializes an ascending-by-number option list, writing delta/length
/// headers and extensions per RFC 7252 §3.1. Shared by the codec and by
/// the assembler, which must serialize outer options the same way.
pub fn write_options(
    options: &[CoapOptionEntry],
    out: &mut [u8],
) -> Result<usize, OscoreError> {
    let mut pos = 0;
    let mut previous_number: u16 = 0;

    for entry in options {
        let delta = entry.number - previous_number;
        previous_number = entry.number;
        let value = &entry.value;

        let (delta_nibble, delta_ext_len) = nibble_and_ext_len(delta);
        let (len_nibble, len_ext_len) = nibble_and_ext_len(value.len() as u16);

        let header_len = 1 + delta_ext_len + len_ext_len;
        if pos + header_len + value.len() > out.len() {
            return Err(OscoreError::BufferTooSmall);
        }

        out[pos] = (delta_nibble << 4) | len_nibble;
        pos += 1;

        pos += write_extension(delta, delta_ext_len, &mut out[pos..]);
        pos += write_extension(value.len() as u16, len_ext_len, &mut out[pos..]);

        out[pos..pos + value.len()].copy_from_slice(value);
        pos += value.len();
    }

    Ok(pos)
}

/// Returns the 4-bit nibble to emit and how many extension bytes follow it,
/// per the delta/length encoding rule shared by both fields.
fn nibble_and_ext_len(value: u16) -> (u8, usize) {
    if value <= 12 {
        (value as u8, 0)
    } else if value < 269 {
        (13, 1)
    } else {
        (14, 2)
    }
}

fn write_extension(value: u16, ext_len: usize, out: &mut [u8]) -> usize {
    match ext_len {
        0 => 0,
        1 => {
            out[0] = (value - 13) as u8;
            1
        }
        2 => {
            let biased = value - 269;
            out[0..2].copy_from_slice(&biased.to_be_bytes());
            2
        }
        _ => unreachable!(),
    }
}
