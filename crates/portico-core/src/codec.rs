use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::Result;

/// Login identity as handed over by the caller; the secret is still encrypted
#[derive(Clone, Default)]
pub struct Credentials {
    pub user_id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Reversible protection for secrets at rest
///
/// `decrypt` must not panic on malformed input; it returns `None` instead.
pub trait CredentialCodec: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> String;
    fn decrypt(&self, ciphertext: &str) -> Option<String>;
}

/// Base64 transport encoding. Not a cipher: only for development setups
/// where the secret store is already trusted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Codec;

impl CredentialCodec for Base64Codec {
    fn encrypt(&self, plaintext: &str) -> String {
        STANDARD.encode(plaintext.as_bytes())
    }

    fn decrypt(&self, ciphertext: &str) -> Option<String> {
        let bytes = STANDARD.decode(ciphertext.trim()).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Where `login_with_stored_credentials` reads the saved login from
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn stored_credentials(&self) -> Result<Option<Credentials>>;
}
