//! Property-based tests for session token signing and verification
//!
//! These tests verify:
//! - Issued tokens verify back to the same session before expiry
//! - Any single-character change to a token is rejected
//! - Flipping bits in the decoded payload or signature fails the MAC check
//! - Tokens never verify under a different key
//! - Malformed tokens never cause panics

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use proptest::prelude::*;
use pulpu_auth::{Identity, InvalidSession, Provider, SecretKey, issue, verify};
use time::{Duration, OffsetDateTime};

// ============================================================================
// Strategies
// ============================================================================

fn arb_identity() -> impl Strategy<Value = Identity> {
    (
        "[a-zA-Z0-9]{1,30}",
        proptest::option::of("[A-Za-z ]{1,40}"),
        proptest::option::of("[a-z0-9_.+-]+@[a-z0-9.-]+\\.[a-z]{2,4}"),
        proptest::option::of(("[a-z_]{3,12}", any::<i64>())),
    )
        .prop_map(|(user_id, name, email, attribute)| {
            let mut identity = Identity::new(Provider::Google, user_id);
            identity.name = name;
            identity.email = email;
            if let Some((key, value)) = attribute {
                identity = identity.with_attribute(key, value.into());
            }
            identity
        })
}

fn arb_key() -> impl Strategy<Value = SecretKey> {
    prop::collection::vec(any::<u8>(), 32..64).prop_map(|bytes| SecretKey::new(bytes).unwrap())
}

/// Instants between 2000 and 2100, with sub-second precision.
fn arb_instant() -> impl Strategy<Value = OffsetDateTime> {
    (946_684_800i64..4_102_444_800i64, 0u32..1_000_000_000u32).prop_map(|(secs, nanos)| {
        OffsetDateTime::from_unix_timestamp(secs).unwrap() + Duration::nanoseconds(nanos.into())
    })
}

fn arb_duration() -> impl Strategy<Value = Duration> {
    (1i64..30 * 86_400).prop_map(Duration::seconds)
}

fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        // No separator
        "[a-zA-Z0-9_-]{0,60}",
        // Too many segments
        "[a-zA-Z0-9_-]{1,20}\\.[a-zA-Z0-9_-]{1,20}\\.[a-zA-Z0-9_-]{1,20}",
        // Characters outside base64url
        "[!@#$%^&*()+/=]{1,30}\\.[a-zA-Z0-9_-]{10,40}",
        // Arbitrary printable garbage
        "[ -~]{0,80}",
        // Well-formed base64 segments that were never signed
        (any::<Vec<u8>>(), any::<[u8; 32]>()).prop_map(|(payload, sig)| {
            format!("{}.{}", URL_SAFE_NO_PAD.encode(payload), URL_SAFE_NO_PAD.encode(sig))
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: verify(issue(i)) returns i until the session expires
    #[test]
    fn prop_issue_verify_roundtrip(
        identity in arb_identity(),
        key in arb_key(),
        now in arb_instant(),
        duration in arb_duration(),
    ) {
        let token = issue(identity.clone(), now, duration, &key).unwrap();

        let session = verify(token.as_str(), now, &key).unwrap();
        prop_assert_eq!(&session.identity, &identity);
        prop_assert_eq!(session.expires_at, now + duration);

        let last_valid = now + duration - Duration::nanoseconds(1);
        prop_assert!(verify(token.as_str(), last_valid, &key).is_ok());
        prop_assert_eq!(
            verify(token.as_str(), now + duration, &key),
            Err(InvalidSession::Expired)
        );
    }

    /// Property: changing any single character invalidates the token
    #[test]
    fn prop_single_char_change_rejected(
        identity in arb_identity(),
        key in arb_key(),
        now in arb_instant(),
        position in any::<prop::sample::Index>(),
        replacement in "[a-zA-Z0-9_.-]",
    ) {
        let token = issue(identity, now, Duration::hours(1), &key).unwrap().into_string();
        let index = position.index(token.len());
        let replacement = replacement.chars().next().unwrap();
        prop_assume!(token.as_bytes()[index] != replacement as u8);

        let mut tampered = token.into_bytes();
        tampered[index] = replacement as u8;
        let tampered = String::from_utf8(tampered).unwrap();

        prop_assert!(verify(&tampered, now, &key).is_err());
    }

    /// Property: flipping bits in any decoded byte is a signature mismatch
    #[test]
    fn prop_flipped_byte_is_signature_mismatch(
        identity in arb_identity(),
        key in arb_key(),
        now in arb_instant(),
        in_signature in any::<bool>(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let token = issue(identity, now, Duration::hours(1), &key).unwrap();
        let (payload, signature) = token.as_str().split_once('.').unwrap();
        let mut payload = URL_SAFE_NO_PAD.decode(payload).unwrap();
        let mut signature = URL_SAFE_NO_PAD.decode(signature).unwrap();

        let target = if in_signature { &mut signature } else { &mut payload };
        let index = position.index(target.len());
        target[index] ^= mask;

        let tampered = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(&signature)
        );
        prop_assert_eq!(
            verify(&tampered, now, &key),
            Err(InvalidSession::SignatureMismatch)
        );
    }

    /// Property: a token never verifies under another key
    #[test]
    fn prop_wrong_key_rejected(
        identity in arb_identity(),
        key in arb_key(),
        other in arb_key(),
        now in arb_instant(),
    ) {
        prop_assume!(key != other);
        let token = issue(identity, now, Duration::hours(1), &key).unwrap();
        prop_assert_eq!(
            verify(token.as_str(), now, &other),
            Err(InvalidSession::SignatureMismatch)
        );
    }

    /// Property: malformed input is rejected without panicking
    #[test]
    fn prop_malformed_never_panics(token in arb_malformed_token(), key in arb_key()) {
        prop_assert!(verify(&token, OffsetDateTime::UNIX_EPOCH, &key).is_err());
    }

    /// Property: short keys are refused
    #[test]
    fn prop_short_key_rejected(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assert!(SecretKey::new(bytes).is_err());
    }
}
