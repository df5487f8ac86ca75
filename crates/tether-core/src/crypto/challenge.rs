// ============================================
// File: crates/tether-core/src/crypto/challenge.rs
// ============================================
//! # Challenge / Response
//!
//! ## Creation Reason
//! Proves possession of a long-term signing key AND binds that proof to
//! the ephemeral key exchange of this very connection, so a response can
//! neither be replayed on another connection nor relayed by a
//! man-in-the-middle who substituted their own KX keys.
//!
//! ## Signed Transcript
//! ```text
//! ┌──────────────────┬────────────────────┬────────────────────┐
//! │ challenge nonce  │ responder KX pub   │ verifier KX pub    │
//! │ 32 bytes         │ 32 bytes           │ 32 bytes           │
//! └──────────────────┴────────────────────┴────────────────────┘
//! ```
//! The responder signs with its own KX key first; the verifier rebuilds
//! the transcript with the peer's KX key first. Both sides agree on the
//! bytes only if nobody tampered with the KX messages.
//!
//! ## Main Functionality
//! - [`issue_challenge`]: fresh random nonce
//! - [`respond`]: sign the transcript
//! - [`verify_response`]: check signature, then trust
//! - `VerifiedIdentity`: proof-of-verification token
//!
//! ## ⚠️ Important Note for Next Developer
//! - `VerifiedIdentity` can only be minted by `verify_response`; session
//!   keys demand one. Do not add a public constructor.
//! - Nonces come from `OsRng`, never `thread_rng`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use super::identity::{verify, Signature, SigningKeyPair, SigningPublicKey};
use super::kx::KxPublicKey;
use super::{CHALLENGE_NONCE_SIZE, X25519_PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};
use crate::trust::{TrustDecision, TrustStore};

/// Length of the signed transcript.
const TRANSCRIPT_SIZE: usize = CHALLENGE_NONCE_SIZE + X25519_PUBLIC_KEY_SIZE * 2;

// ============================================
// Challenge
// ============================================

/// Random nonce a verifier asks its peer to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge([u8; CHALLENGE_NONCE_SIZE]);

impl Challenge {
    /// Wraps a nonce received from the wire.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHALLENGE_NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the nonce bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHALLENGE_NONCE_SIZE] {
        &self.0
    }
}

/// Issues a fresh challenge from the OS RNG.
#[must_use]
pub fn issue_challenge() -> Challenge {
    let mut nonce = [0u8; CHALLENGE_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    Challenge(nonce)
}

// ============================================
// ChallengeResponse
// ============================================

/// Responder's public key plus its signature over the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Claimed long-term identity of the responder.
    pub responder: SigningPublicKey,
    /// Signature over `nonce ‖ responder KX ‖ verifier KX`.
    pub signature: Signature,
}

fn transcript(
    challenge: &Challenge,
    responder_kx: &KxPublicKey,
    verifier_kx: &KxPublicKey,
) -> [u8; TRANSCRIPT_SIZE] {
    let mut out = [0u8; TRANSCRIPT_SIZE];
    out[..CHALLENGE_NONCE_SIZE].copy_from_slice(challenge.as_bytes());
    out[CHALLENGE_NONCE_SIZE..CHALLENGE_NONCE_SIZE + X25519_PUBLIC_KEY_SIZE]
        .copy_from_slice(responder_kx.as_bytes());
    out[CHALLENGE_NONCE_SIZE + X25519_PUBLIC_KEY_SIZE..].copy_from_slice(verifier_kx.as_bytes());
    out
}

/// Answers `challenge` with `identity`.
///
/// `local_kx` is our own key-exchange public key, `peer_kx` the one we
/// received from the verifier.
#[must_use]
pub fn respond(
    challenge: &Challenge,
    local_kx: &KxPublicKey,
    peer_kx: &KxPublicKey,
    identity: &SigningKeyPair,
) -> ChallengeResponse {
    let message = transcript(challenge, local_kx, peer_kx);
    ChallengeResponse {
        responder: identity.public_key(),
        signature: identity.sign(&message),
    }
}

// ============================================
// Verification
// ============================================

/// Identity that passed both signature and trust checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedIdentity {
    public_key: SigningPublicKey,
}

impl VerifiedIdentity {
    /// The verified peer key.
    #[must_use]
    pub const fn public_key(&self) -> SigningPublicKey {
        self.public_key
    }
}

/// Outcome of [`verify_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyResult {
    /// Signature valid and key trusted.
    Accepted(VerifiedIdentity),
    /// Signature valid but key not in the trust store.
    UnknownKey,
    /// Signature did not verify.
    SignatureInvalid,
}

impl VerifyResult {
    /// Converts into a `Result`, mapping rejections to core errors.
    ///
    /// # Errors
    /// `UnknownKey` or `SignatureInvalid` respectively.
    pub fn into_result(self) -> Result<VerifiedIdentity> {
        match self {
            Self::Accepted(identity) => Ok(identity),
            Self::UnknownKey => Err(CoreError::UnknownKey),
            Self::SignatureInvalid => Err(CoreError::SignatureInvalid),
        }
    }
}

/// Checks `response` against the `challenge` we issued.
///
/// `local_kx` is our KX public key, `peer_kx` the responder's. The
/// signature is checked before the trust store so that `UnknownKey` is
/// only ever reported for a key whose holder is actually on the line.
pub fn verify_response(
    challenge: &Challenge,
    response: &ChallengeResponse,
    local_kx: &KxPublicKey,
    peer_kx: &KxPublicKey,
    trust: &dyn TrustStore,
) -> VerifyResult {
    let message = transcript(challenge, peer_kx, local_kx);
    if !verify(&response.responder, &message, &response.signature) {
        debug!(peer = %response.responder.fingerprint(), "Challenge signature rejected");
        return VerifyResult::SignatureInvalid;
    }

    match trust.lookup(&response.responder) {
        TrustDecision::Allowed => VerifyResult::Accepted(VerifiedIdentity {
            public_key: response.responder,
        }),
        TrustDecision::Unknown => {
            debug!(peer = %response.responder.fingerprint(), "Peer key not trusted");
            VerifyResult::UnknownKey
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KxKeyPair;
    use crate::trust::MemoryTrustStore;

    struct Fixture {
        verifier_kx: KxPublicKey,
        responder_kx: KxPublicKey,
        responder: SigningKeyPair,
        trust: MemoryTrustStore,
    }

    fn fixture() -> Fixture {
        let responder = SigningKeyPair::generate();
        let trust: MemoryTrustStore = std::iter::once(responder.public_key()).collect();
        Fixture {
            verifier_kx: KxKeyPair::generate().public_key(),
            responder_kx: KxKeyPair::generate().public_key(),
            responder,
            trust,
        }
    }

    #[test]
    fn test_challenges_are_fresh() {
        assert_ne!(issue_challenge(), issue_challenge());
    }

    #[test]
    fn test_valid_response_accepted() {
        let f = fixture();
        let challenge = issue_challenge();
        let response = respond(&challenge, &f.responder_kx, &f.verifier_kx, &f.responder);

        let result = verify_response(
            &challenge,
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &f.trust,
        );
        match result {
            VerifyResult::Accepted(identity) => {
                assert_eq!(identity.public_key(), f.responder.public_key());
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn test_untrusted_key() {
        let f = fixture();
        let challenge = issue_challenge();
        let response = respond(&challenge, &f.responder_kx, &f.verifier_kx, &f.responder);

        let result = verify_response(
            &challenge,
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &MemoryTrustStore::new(),
        );
        assert_eq!(result, VerifyResult::UnknownKey);
        assert!(matches!(result.into_result(), Err(CoreError::UnknownKey)));
    }

    #[test]
    fn test_wrong_challenge_rejected() {
        let f = fixture();
        let response = respond(
            &issue_challenge(),
            &f.responder_kx,
            &f.verifier_kx,
            &f.responder,
        );

        let result = verify_response(
            &issue_challenge(),
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &f.trust,
        );
        assert_eq!(result, VerifyResult::SignatureInvalid);
    }

    #[test]
    fn test_substituted_kx_key_rejected() {
        let f = fixture();
        let challenge = issue_challenge();
        let attacker_kx = KxKeyPair::generate().public_key();
        // Responder saw the attacker's key instead of the verifier's
        let response = respond(&challenge, &f.responder_kx, &attacker_kx, &f.responder);

        let result = verify_response(
            &challenge,
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &f.trust,
        );
        assert_eq!(result, VerifyResult::SignatureInvalid);
    }

    #[test]
    fn test_swapped_kx_order_rejected() {
        let f = fixture();
        let challenge = issue_challenge();
        let response = respond(&challenge, &f.verifier_kx, &f.responder_kx, &f.responder);

        let result = verify_response(
            &challenge,
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &f.trust,
        );
        assert_eq!(result, VerifyResult::SignatureInvalid);
    }

    #[test]
    fn test_claimed_identity_must_match_signer() {
        let f = fixture();
        let impostor = SigningKeyPair::generate();
        let challenge = issue_challenge();
        let mut response = respond(&challenge, &f.responder_kx, &f.verifier_kx, &impostor);
        response.responder = f.responder.public_key();

        let result = verify_response(
            &challenge,
            &response,
            &f.verifier_kx,
            &f.responder_kx,
            &f.trust,
        );
        assert_eq!(result, VerifyResult::SignatureInvalid);
    }
}
