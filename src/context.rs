//! Security Context (RFC 8613 §3): the long-lived state an OSCORE sender
//! carries across messages.
//!
//! Mutation is serialized by whatever discipline the embedding application
//! chooses (a blocking mutex, a single-threaded executor, ...) - this type
//! itself makes no synchronization promise, matching the corpus convention
//! of leaving that choice to the host.

use heapless::Vec as HVec;

use crate::{
    error::OscoreError,
    limits::{
        AEAD_KEY_LEN, AEAD_NONCE_LEN, MAX_ECHO_LEN, MAX_KID_CONTEXT_LEN,
        MAX_KID_LEN, MAX_SEQ_NUM,
    },
    nonce::{self, Piv},
};

/// Bootstrap material plus the state this crate mutates while sending.
pub struct SecurityContext {
    // Common context, fixed at bootstrap.
    common_iv: [u8; AEAD_NONCE_LEN],
    id_context: HVec<u8, MAX_KID_CONTEXT_LEN>,

    // Sender context.
    sender_id: HVec<u8, MAX_KID_LEN>,
    sender_key: [u8; AEAD_KEY_LEN],
    sender_seq_num: u64,

    // Request/response cache, mutated per outbound message.
    request_piv: Piv,
    request_kid: HVec<u8, MAX_KID_LEN>,
    cached_nonce: [u8; AEAD_NONCE_LEN],

    /// ECHO option value (option number 252) cached from the first
    /// post-reboot response, for replay-window recovery.
    echo_opt_val: HVec<u8, MAX_ECHO_LEN>,
    /// Set on construction; cleared after the first response carrying an
    /// ECHO inner option is processed.
    reboot: bool,
}

impl SecurityContext {
    /// Builds a fresh context from bootstrap material. `sender_seq_num`
    /// should be restored from durable storage if this isn't the context's
    /// first use, since RFC 8613 §3.4 requires it never be reused.
    pub fn new(
        sender_id: &[u8],
        sender_key: [u8; AEAD_KEY_LEN],
        common_iv: [u8; AEAD_NONCE_LEN],
        id_context: &[u8],
        sender_seq_num: u64,
    ) -> Result<Self, OscoreError> {
        let sender_id = HVec::from_slice(sender_id).map_err(|_| OscoreError::IdTooLong)?;
        let id_context =
            HVec::from_slice(id_context).map_err(|_| OscoreError::OscoreValueTooLong)?;

        Ok(SecurityContext {
            common_iv,
            id_context,
            sender_id,
            sender_key,
            sender_seq_num,
            request_piv: Piv::new(),
            request_kid: HVec::new(),
            cached_nonce: [0u8; AEAD_NONCE_LEN],
            echo_opt_val: HVec::new(),
            reboot: true,
        })
    }

    pub fn sender_id(&self) -> &[u8] {
        &self.sender_id
    }

    pub fn sender_key(&self) -> &[u8; AEAD_KEY_LEN] {
        &self.sender_key
    }

    pub fn id_context(&self) -> &[u8] {
        &self.id_context
    }

    pub fn is_reboot(&self) -> bool {
        self.reboot
    }

    pub fn echo_opt_val(&self) -> &[u8] {
        &self.echo_opt_val
    }

    pub fn request_piv(&self) -> &[u8] {
        &self.request_piv
    }

    pub fn request_kid(&self) -> &[u8] {
        &self.request_kid
    }

    /// Post-increments `sender_seq_num`, returning the PIV derived from the
    /// pre-increment value and caching the nonce derived from it.
    ///
    /// The sequence number is burned before the caller has confirmed the
    /// rest of the pipeline succeeds; it is never rewound on a later
    /// failure (see [`OscoreError::consumed_sequence_number`]).
    pub fn acquire_sender_piv(&mut self) -> Result<Piv, OscoreError> {
        if self.sender_seq_num >= MAX_SEQ_NUM {
            return Err(OscoreError::SeqNumOverflow);
        }
        let used = self.sender_seq_num;
        self.sender_seq_num += 1;

        let piv = nonce::encode_piv(used);
        let nonce = nonce::derive_nonce(&self.sender_id, &piv, &self.common_iv)?;
        self.cached_nonce = nonce;
        Ok(piv)
    }

    /// Stores `piv`/`kid` as the request cache, consulted by later response
    /// processing under the same exchange.
    pub fn remember_request(&mut self, piv: &[u8], kid: &[u8]) -> Result<(), OscoreError> {
        self.request_piv = Piv::from_slice(piv).map_err(|_| OscoreError::OscoreValueTooLong)?;
        self.request_kid =
            HVec::from_slice(kid).map_err(|_| OscoreError::OscoreValueTooLong)?;
        Ok(())
    }

    /// Records the ECHO option (number 252) from the first post-reboot
    /// response's inner options, and clears the reboot flag. A no-op for
    /// any later response: only the first post-reboot response is cached,
    /// matching the Design Notes' restricted ECHO handling.
    pub fn cache_echo(&mut self, echo_value: &[u8]) -> Result<(), OscoreError> {
        if self.reboot {
            self.echo_opt_val =
                HVec::from_slice(echo_value).map_err(|_| OscoreError::OscoreValueTooLong)?;
            self.reboot = false;
        }
        Ok(())
    }

    /// Returns the nonce cached by the most recent [`Self::acquire_sender_piv`]
    /// call, or derives one from the cached `request_piv`/`request_kid` for a
    /// plain response that doesn't acquire a fresh PIV of its own.
    pub fn nonce(&self) -> [u8; AEAD_NONCE_LEN] {
        self.cached_nonce
    }

    /// Derives the nonce to use for a plain response, from the cached
    /// request's KID/PIV rather than a freshly acquired one.
    pub fn response_nonce(&self) -> Result<[u8; AEAD_NONCE_LEN], OscoreError> {
        nonce::derive_nonce(&self.request_kid, &self.request_piv, &self.common_iv)
    }
}
