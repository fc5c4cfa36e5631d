//! Stateless user tokens.
//!
//! A token is `base64url(identity || HMAC-SHA256(secret, identity))`. Nothing
//! is stored server-side: a token is valid iff its trailing 32 bytes are the
//! MAC of its leading 16 bytes under the process secret.
//!
//! ```text
//!  0               16                                    48
//!  ├── identity ───┼──────────── HMAC-SHA256 ────────────┤
//! ```
//!
//! Verification is binary. A malformed string and a well-formed forgery are
//! both just `None`; callers cannot tell them apart.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of an [`Identity`] in bytes.
pub const IDENTITY_LEN: usize = 16;

/// Length of the HMAC-SHA256 tag appended to the identity.
pub const MAC_LEN: usize = 32;

// ── Identity ─────────────────────────────────────────────────────────────────

/// Random bytes naming a user. Created once, immutable thereafter.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    pub fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Draws a fresh identity from the OS random source.
    ///
    /// # Panics
    ///
    /// Panics if the OS random source is unavailable. There is no sensible
    /// way to keep minting users without one.
    pub fn random() -> Self {
        let mut bytes = [0u8; IDENTITY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .unwrap_or_else(|e| panic!("secure random source unavailable: {e}"));
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

// ── Token ────────────────────────────────────────────────────────────────────

/// The wire form of an [`Identity`], as handed to clients.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── TokenCodec ───────────────────────────────────────────────────────────────

/// Issues and verifies tokens under a single secret.
///
/// Holds only the keyed MAC state, so one codec can be shared by every
/// request behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        Self { mac }
    }

    /// Mints a token for a brand new random identity.
    pub fn issue(&self) -> Token {
        self.issue_for(&Identity::random())
    }

    /// Derives the token of an existing identity. Deterministic.
    pub fn issue_for(&self, identity: &Identity) -> Token {
        let mut mac = self.mac.clone();
        mac.update(identity.as_bytes());

        let mut raw = Vec::with_capacity(IDENTITY_LEN + MAC_LEN);
        raw.extend_from_slice(identity.as_bytes());
        raw.extend_from_slice(&mac.finalize().into_bytes());

        Token(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Returns the identity a token names, or `None` for anything that is not
    /// a token this codec issued.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let raw = URL_SAFE_NO_PAD.decode(token).ok()?;
        if raw.len() != IDENTITY_LEN + MAC_LEN {
            return None;
        }

        let (id, tag) = raw.split_at(IDENTITY_LEN);
        let mut mac = self.mac.clone();
        mac.update(id);
        // verify_slice compares in constant time.
        mac.verify_slice(tag).ok()?;

        let bytes: [u8; IDENTITY_LEN] = id.try_into().ok()?;
        Some(Identity(bytes))
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenCodec { .. }")
    }
}
