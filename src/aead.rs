//! The AEAD primitive is out of scope for this crate (RFC 8613 treats it as
//! a pluggable algorithm): callers supply an implementation of
//! [`AeadCipher`], modeled as a capability interface rather than a boxed
//! trait object, since this crate never allocates.

use crate::{
    error::OscoreError,
    limits::{AEAD_KEY_LEN, AEAD_NONCE_LEN, MAX_CIPHERTEXT_LEN},
};

/// A synchronous AEAD encryption primitive, fixed to the parameters RFC
/// 8613's default algorithm (AES-CCM-16-64-128) uses: a 128-bit key, a
/// 13-byte nonce, and an 8-byte tag.
pub trait AeadCipher {
    /// Encrypts `plaintext` under `key`/`nonce`/`aad`, writing
    /// ciphertext ∥ tag into `out` and returning the number of bytes
    /// written.
    fn encrypt(
        &self,
        key: &[u8; AEAD_KEY_LEN],
        nonce: &[u8; AEAD_NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
        out: &mut [u8; MAX_CIPHERTEXT_LEN],
    ) -> Result<usize, OscoreError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::limits::AEAD_TAG_LEN;

    /// A deterministic stand-in AEAD used only by this crate's own tests:
    /// "ciphertext" is the plaintext XORed byte-wise with the nonce
    /// (repeated), and the tag is an XOR-fold of key, nonce, and aad. Not a
    /// real AEAD construction; it exists purely so the pipeline's tests can
    /// assert a reversible transform without depending on a real cipher
    /// crate.
    pub struct MockAead;

    impl AeadCipher for MockAead {
        fn encrypt(
            &self,
            key: &[u8; AEAD_KEY_LEN],
            nonce: &[u8; AEAD_NONCE_LEN],
            aad: &[u8],
            plaintext: &[u8],
            out: &mut [u8; MAX_CIPHERTEXT_LEN],
        ) -> Result<usize, OscoreError> {
            if plaintext.len() + AEAD_TAG_LEN > out.len() {
                return Err(OscoreError::BufferTooSmall);
            }

            for (i, &b) in plaintext.iter().enumerate() {
                out[i] = b ^ nonce[i % nonce.len()];
            }

            let mut tag = [0u8; AEAD_TAG_LEN];
            for (i, &b) in key.iter().enumerate() {
                tag[i % AEAD_TAG_LEN] ^= b;
            }
            for (i, &b) in nonce.iter().enumerate() {
                tag[i % AEAD_TAG_LEN] ^= b;
            }
            for (i, &b) in aad.iter().enumerate() {
                tag[i % AEAD_TAG_LEN] ^= b;
            }

            out[plaintext.len()..plaintext.len() + AEAD_TAG_LEN].copy_from_slice(&tag);
            Ok(plaintext.len() + AEAD_TAG_LEN)
        }
    }

    #[test]
    fn mock_aead_appends_tag() {
        let aead = MockAead;
        let key = [0u8; AEAD_KEY_LEN];
        let nonce = [0u8; AEAD_NONCE_LEN];
        let mut out = [0u8; MAX_CIPHERTEXT_LEN];
        let n = aead
            .encrypt(&key, &nonce, &[], b"hi", &mut out)
            .unwrap();
        assert_eq!(n, 2 + AEAD_TAG_LEN);
        assert_eq!(&out[..2], b"hi"); // zero key/nonce -> identity XOR
    }
}
