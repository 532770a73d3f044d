//! The `coap2oscore` pipeline: the single entry point wiring together the
//! CoAP Codec, Option Classifier, Plaintext Builder, Nonce/PIV Engine, AAD
//! Builder, AEAD primitive, and Assembler.

use crate::{
    aad,
    aead::AeadCipher,
    assembler,
    context::SecurityContext,
    error::OscoreError,
    header::{MessageClass, MessageType},
    limits::MAX_CIPHERTEXT_LEN,
    option::{self, OPTION_ECHO, OPTION_OBSERVE},
    oscore_option,
    packet::CoapMessage,
    plaintext,
};

/// Transforms a plaintext CoAP message into its OSCORE-protected form.
///
/// `input` is the plaintext CoAP datagram; `ctx` is the caller-synchronized
/// security context (see [`crate::context::SecurityContext`] and §5 of the
/// design notes on concurrency); `aead` is the host-supplied AEAD
/// primitive. Writes the protected datagram into `out`, returning the
/// number of bytes written.
///
/// An empty ACK (code 0.00, type ACK) is returned byte-identical with no
/// context mutation, per RFC 8613 §4.2's messaging-layer bypass.
pub fn coap2oscore<A: AeadCipher>(
    input: &[u8],
    ctx: &mut SecurityContext,
    aead: &A,
    out: &mut [u8],
) -> Result<usize, OscoreError> {
    let msg = CoapMessage::from_bytes(input)?;

    if msg.header.code == MessageClass::Empty
        && msg.header.get_type() == MessageType::Acknowledgement
    {
        coap_debug!("messaging-layer bypass: empty ACK, no context mutation");

        if out.len() < input.len() {
            return Err(OscoreError::BufferTooSmall);
        }
        out[..input.len()].copy_from_slice(input);
        return Ok(input.len());
    }

    let is_request = matches!(msg.header.code, MessageClass::Request(_));
    let split = option::split(&msg, is_request)?;
    let is_observe = split.inner.iter().any(|e| e.number == OPTION_OBSERVE);

    // §4.6: Observe forces the same full OSCORE option (fresh PIV, k=1,
    // KID=sender_id) as a request or the first message after reboot.
    let want_full = is_request || is_observe || ctx.is_reboot();
    // §4.5 names only two buckets for the AAD's request_kid/request_piv:
    // requests and new responses after reboot get fresh values; every other
    // response - including a steady-state Observe notification - reuses the
    // cached values from the matching request. Observe is not a third bucket
    // here, unlike in `want_full` above.
    let fresh_aad = is_request || ctx.is_reboot();

    let (piv, nonce) = if want_full {
        let piv = ctx.acquire_sender_piv()?;
        coap_debug!("sequence number consumed, acquiring fresh PIV");
        if is_request {
            ctx.remember_request(&piv, ctx.sender_id())?;
        }
        let nonce = ctx.nonce();
        (piv, nonce)
    } else {
        let piv = crate::nonce::Piv::from_slice(ctx.request_piv())
            .map_err(|_| OscoreError::OscoreValueTooLong)?;
        let nonce = ctx.response_nonce()?;
        (piv, nonce)
    };

    let option_kid: &[u8] = if want_full { ctx.sender_id() } else { ctx.request_kid() };
    let (aad_kid, aad_piv): (&[u8], &[u8]) = if fresh_aad {
        (ctx.sender_id(), &piv)
    } else {
        (ctx.request_kid(), ctx.request_piv())
    };

    let original_code: u8 = msg.header.code.into();
    let pt = plaintext::build(original_code, &split.inner, &msg.payload)?;

    let aad_bytes = aad::build_aad(aad::AEAD_ALG_AES_CCM_16_64_128, aad_kid, aad_piv)?;

    let mut ct_buf = [0u8; MAX_CIPHERTEXT_LEN];
    let ct_len = aead
        .encrypt(ctx.sender_key(), &nonce, &aad_bytes, &pt, &mut ct_buf)
        .map_err(|_| OscoreError::Aead)?;

    let oscore_value = if want_full {
        oscore_option::encode_full(&piv, option_kid, ctx.id_context())?
    } else {
        oscore_option::encode_empty()
    };

    let outer = assembler::assemble(
        &msg,
        &split.outer,
        is_observe,
        &oscore_value,
        &ct_buf[..ct_len],
    )?;

    if !is_request {
        if let Some(echo) = split.inner.iter().find(|e| e.number == OPTION_ECHO) {
            ctx.cache_echo(&echo.value)?;
            coap_info!("cached ECHO from first post-reboot response");
        }
    }

    outer.to_bytes(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{aead::test_support::MockAead, limits::AEAD_KEY_LEN};

    fn test_context() -> SecurityContext {
        test_context_at_seq(20)
    }

    fn test_context_at_seq(seq: u64) -> SecurityContext {
        SecurityContext::new(
            &[0x00],
            [0u8; AEAD_KEY_LEN],
            [
                0x46, 0x3A, 0xA4, 0x15, 0x17, 0xA4, 0x66, 0x9C, 0x11, 0x4D,
                0x2A, 0x96, 0x85,
            ],
            &[],
            seq,
        )
        .unwrap()
    }

    fn build_request() -> CoapMessage {
        let mut msg = CoapMessage::new();
        use crate::header::{MessageClass as MC, RequestType};
        msg.header.code = MC::Request(RequestType::Get);
        msg.header.message_id = 1;
        msg.add_option(11, b"temperature").unwrap(); // Uri-Path
        msg.payload = crate::packet::Payload::from_slice(&[0x01, 0x02, 0x03]).unwrap();
        msg
    }

    fn build_plain_response(message_id: u16, payload: &[u8]) -> CoapMessage {
        let mut msg = CoapMessage::new();
        use crate::header::{MessageClass as MC, ResponseType};
        msg.header.code = MC::Response(ResponseType::Changed);
        msg.header.message_id = message_id;
        msg.payload = crate::packet::Payload::from_slice(payload).unwrap();
        msg
    }

    fn build_plain_response_with_echo(message_id: u16, echo: &[u8]) -> CoapMessage {
        let mut msg = build_plain_response(message_id, b"");
        msg.add_option(OPTION_ECHO, echo).unwrap();
        msg
    }

    fn build_notification(message_id: u16, observe_seq: &[u8], payload: &[u8]) -> CoapMessage {
        let mut msg = CoapMessage::new();
        use crate::header::{MessageClass as MC, ResponseType};
        msg.header.code = MC::Response(ResponseType::Content);
        msg.header.message_id = message_id;
        msg.add_option(OPTION_OBSERVE, observe_seq).unwrap();
        msg.payload = crate::packet::Payload::from_slice(payload).unwrap();
        msg
    }

    const COMMON_IV: [u8; crate::limits::AEAD_NONCE_LEN] = [
        0x46, 0x3A, 0xA4, 0x15, 0x17, 0xA4, 0x66, 0x9C, 0x11, 0x4D, 0x2A, 0x96,
        0x85,
    ];

    fn send(msg: &CoapMessage, ctx: &mut SecurityContext) -> ([u8; 128], usize) {
        let mut in_buf = [0u8; 64];
        let n = msg.to_bytes(&mut in_buf).unwrap();
        let aead = MockAead;
        let mut out = [0u8; 128];
        let out_len = coap2oscore(&in_buf[..n], ctx, &aead, &mut out).unwrap();
        (out, out_len)
    }

    #[test]
    fn scenario_1_request_produces_expected_oscore_option() {
        let mut ctx = test_context();
        let req = build_request();
        let mut in_buf = [0u8; 64];
        let n = req.to_bytes(&mut in_buf).unwrap();

        let aead = MockAead;
        let mut out = [0u8; 128];
        let out_len = coap2oscore(&in_buf[..n], &mut ctx, &aead, &mut out).unwrap();

        let outer = CoapMessage::from_bytes(&out[..out_len]).unwrap();
        use crate::header::{MessageClass as MC, RequestType};
        assert_eq!(outer.header.code, MC::Request(RequestType::Post));

        let oscore_opt = outer
            .options()
            .iter()
            .find(|o| o.number == crate::oscore_option::OPTION_OSCORE)
            .unwrap();
        assert_eq!(oscore_opt.value.as_slice(), [0x09, 0x14, 0x00]);
    }

    #[test]
    fn scenario_4_empty_ack_bypasses_unchanged() {
        let mut ctx = test_context();
        let input = [0x60, 0x00, 0x12, 0x34];
        let aead = MockAead;
        let mut out = [0u8; 16];

        let n = coap2oscore(&input, &mut ctx, &aead, &mut out).unwrap();

        assert_eq!(&out[..n], &input);
        assert_eq!(ctx.request_piv(), &[] as &[u8]);
    }

    #[test]
    fn scenario_5_sequence_overflow() {
        let mut ctx = test_context_at_seq(crate::limits::MAX_SEQ_NUM - 1);
        ctx.acquire_sender_piv().unwrap();

        let req = build_request();
        let mut in_buf = [0u8; 64];
        let n = req.to_bytes(&mut in_buf).unwrap();

        let aead = MockAead;
        let mut out = [0u8; 128];
        assert_eq!(
            coap2oscore(&in_buf[..n], &mut ctx, &aead, &mut out).unwrap_err(),
            OscoreError::SeqNumOverflow
        );
    }

    #[test]
    fn piv_strictly_increases_across_successive_requests() {
        let mut ctx = test_context();
        let aead = MockAead;

        let mut last_piv = 0u64;
        for _ in 0..3 {
            let req = build_request();
            let mut in_buf = [0u8; 64];
            let n = req.to_bytes(&mut in_buf).unwrap();
            let mut out = [0u8; 128];
            let out_len = coap2oscore(&in_buf[..n], &mut ctx, &aead, &mut out).unwrap();
            let outer = CoapMessage::from_bytes(&out[..out_len]).unwrap();
            let piv_bytes = &outer
                .options()
                .iter()
                .find(|o| o.number == crate::oscore_option::OPTION_OSCORE)
                .unwrap()
                .value[1..2];
            let piv = piv_bytes[0] as u64;
            assert!(piv > last_piv);
            last_piv = piv;
        }
    }

    #[test]
    fn scenario_6_first_post_reboot_response_caches_echo() {
        let mut ctx = test_context();
        assert!(ctx.is_reboot());

        let response = build_plain_response_with_echo(1, &[0x9F, 0x01]);
        send(&response, &mut ctx);

        assert!(!ctx.is_reboot());
        assert_eq!(ctx.echo_opt_val(), [0x9F, 0x01]);
    }

    #[test]
    fn scenario_2_notification_reuses_cached_request_kid_piv_in_aad() {
        let mut ctx = test_context();

        // Establish the exchange: the original request, then the first
        // post-reboot response (clears `ctx.is_reboot()`).
        let req = build_request();
        send(&req, &mut ctx);
        let first_response = build_plain_response_with_echo(2, &[0x9F, 0x01]);
        send(&first_response, &mut ctx);
        assert!(!ctx.is_reboot());

        let cached_kid = heapless::Vec::<u8, 8>::from_slice(ctx.request_kid()).unwrap();
        let cached_piv = heapless::Vec::<u8, 8>::from_slice(ctx.request_piv()).unwrap();
        assert_eq!(cached_kid.as_slice(), [0x00]);
        assert_eq!(cached_piv.as_slice(), [0x14]); // the request's own PIV

        // Third exchange on this context: a steady-state Observe
        // notification, neither a request nor the first post-reboot
        // response.
        let notification = build_notification(3, &[0x05], b"22.5");
        let (out, out_len) = send(&notification, &mut ctx);
        let outer = CoapMessage::from_bytes(&out[..out_len]).unwrap();

        // The notification still gets its own fresh PIV for the OSCORE
        // option and its encryption nonce (§4.6) - this is the context's
        // third acquired PIV (0x16), not the cached request PIV.
        let oscore_opt = outer
            .options()
            .iter()
            .find(|o| o.number == crate::oscore_option::OPTION_OSCORE)
            .unwrap();
        assert_eq!(oscore_opt.value.as_slice(), [0x09, 0x16, 0x00]);

        let fresh_piv = [0x16u8];
        let expected_nonce =
            crate::nonce::derive_nonce(&[0x00], &fresh_piv, &COMMON_IV).unwrap();

        // The AAD must bind to the *cached* request's kid/piv (§4.5),
        // not the notification's own fresh piv - this is exactly the
        // conflation the pipeline used to get wrong.
        let expected_aad = crate::aad::build_aad(
            crate::aad::AEAD_ALG_AES_CCM_16_64_128,
            &cached_kid,
            &cached_piv,
        )
        .unwrap();

        let mut inner_opts = crate::packet::OptionList::new();
        inner_opts
            .push(crate::packet::CoapOptionEntry::new(OPTION_OBSERVE, &[]).unwrap())
            .unwrap();
        let expected_pt = crate::plaintext::build(0x45, &inner_opts, b"22.5").unwrap();

        let mut expected_ct = [0u8; crate::limits::MAX_CIPHERTEXT_LEN];
        let expected_ct_len = MockAead
            .encrypt(
                &[0u8; AEAD_KEY_LEN],
                &expected_nonce,
                &expected_aad,
                &expected_pt,
                &mut expected_ct,
            )
            .unwrap();

        assert_eq!(&outer.payload[..], &expected_ct[..expected_ct_len]);
    }

    #[test]
    fn scenario_3_plain_response_uses_cached_request_kid_piv() {
        let mut ctx = test_context();

        let req = build_request();
        send(&req, &mut ctx);
        let first_response = build_plain_response_with_echo(2, &[0x9F, 0x01]);
        send(&first_response, &mut ctx);
        assert!(!ctx.is_reboot());

        let cached_kid = heapless::Vec::<u8, 8>::from_slice(ctx.request_kid()).unwrap();
        let cached_piv = heapless::Vec::<u8, 8>::from_slice(ctx.request_piv()).unwrap();

        let response = build_plain_response(3, b"done");
        let (out, out_len) = send(&response, &mut ctx);
        let outer = CoapMessage::from_bytes(&out[..out_len]).unwrap();

        let oscore_opt = outer
            .options()
            .iter()
            .find(|o| o.number == crate::oscore_option::OPTION_OSCORE)
            .unwrap();
        assert!(oscore_opt.value.is_empty());

        let expected_nonce =
            crate::nonce::derive_nonce(&cached_kid, &cached_piv, &COMMON_IV).unwrap();
        let expected_aad = crate::aad::build_aad(
            crate::aad::AEAD_ALG_AES_CCM_16_64_128,
            &cached_kid,
            &cached_piv,
        )
        .unwrap();
        let expected_pt = crate::plaintext::build(0x44, &[], b"done").unwrap();

        let mut expected_ct = [0u8; crate::limits::MAX_CIPHERTEXT_LEN];
        let expected_ct_len = MockAead
            .encrypt(
                &[0u8; AEAD_KEY_LEN],
                &expected_nonce,
                &expected_aad,
                &expected_pt,
                &mut expected_ct,
            )
            .unwrap();

        assert_eq!(&outer.payload[..], &expected_ct[..expected_ct_len]);
    }
}
