//! Authorization tokens issued against validated payments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payment::Payment;

/// Domain separator for [`Token::derive`].
pub const TOKEN_DOMAIN: &[u8] = b"paystore:token:v1\0";

/// A single-use authorization token handed to a receiver.
///
/// Tokens are opaque. The store only remembers that it issued one; it does
/// not deduplicate, so callers must supply values with enough entropy.
/// [`Token::derive`] is one way to get such a value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Derive a token from the payment it authorizes.
    ///
    /// blake3 over the domain separator and every payment field, each
    /// length-prefixed so adjacent fields cannot be shifted into each other.
    pub fn derive(payment: &Payment) -> Self {
        let value = payment.value.to_string();
        let fields: [&[u8]; 5] = [
            payment.channel_id.as_str().as_bytes(),
            value.as_bytes(),
            &[payment.v],
            payment.r.as_bytes(),
            payment.s.as_bytes(),
        ];

        let mut hasher = blake3::Hasher::new();
        hasher.update(TOKEN_DOMAIN);
        for field in fields {
            hasher.update(&(field.len() as u64).to_be_bytes());
            hasher.update(field);
        }
        Self(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.0.get(..16).unwrap_or(&self.0);
        write!(f, "Token({})", shown)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
