// Shared secret established by the webhook handshake
//
// A single writer lock guards the value. A handshake racing a verification is
// tolerated: the verifier sees either the previous or the new secret, never a
// partially written one.
// The value is kept as raw header bytes; a header value need not be UTF-8.

use parking_lot::RwLock;

/// Process-wide holder for the handshake secret
#[derive(Debug, Default)]
pub struct SecretStore {
    secret: RwLock<Vec<u8>>,
}

impl SecretStore {
    /// Create an empty store (no handshake yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored secret unconditionally
    pub fn replace(&self, secret: impl Into<Vec<u8>>) {
        *self.secret.write() = secret.into();
    }

    /// Snapshot of the current secret
    pub fn current(&self) -> Vec<u8> {
        self.secret.read().clone()
    }

    /// True until the first handshake stores a non-empty value
    pub fn is_empty(&self) -> bool {
        self.secret.read().is_empty()
    }
}
