//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests.

use rand::RngCore;

use paystore_core::{Address, Amount, Channel, ChannelId, Payment, Token};

/// Sender used by [`channel`].
pub const SENDER: &str = "0xA";
/// Receiver used by [`channel`].
pub const RECEIVER: &str = "0xB";

/// An unspent channel from [`SENDER`] to [`RECEIVER`].
pub fn channel(channel_id: &str, value: u64) -> Channel {
    Channel::new(
        ChannelId::new(channel_id),
        Address::new(SENDER),
        Address::new(RECEIVER),
        value,
        0u64,
    )
}

/// A payment with placeholder signature components.
pub fn payment(channel_id: &str, value: u64) -> Payment {
    Payment::new(ChannelId::new(channel_id), value, 27, "0xr", "0xs")
}

/// A random 32-byte channel id.
pub fn random_channel_id() -> ChannelId {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    ChannelId::from_bytes(&bytes)
}

/// A random 32-byte hex token.
pub fn random_token() -> Token {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Token::new(hex::encode(bytes))
}

/// A channel plus a sender that signs increasing cumulative payments.
pub struct ChannelFixture {
    pub channel: Channel,
    nonce: u64,
}

impl ChannelFixture {
    /// A fresh channel with a random id.
    pub fn new(value: u64) -> Self {
        let mut channel = channel("", value);
        channel.channel_id = random_channel_id();
        Self { channel, nonce: 0 }
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel.channel_id
    }

    /// A payment claiming `cumulative` in total.
    ///
    /// Each call gets distinct signature components, so equal values still
    /// produce distinct payments and tokens.
    pub fn pay(&mut self, cumulative: u64) -> Payment {
        self.nonce += 1;
        Payment {
            channel_id: self.channel.channel_id.clone(),
            value: Amount::from(cumulative),
            v: 27 + (self.nonce % 2) as u8,
            r: format!("0x{:064x}", self.nonce),
            s: format!("0x{:064x}", u64::MAX - self.nonce),
        }
    }

    /// A payment and the token derived from it.
    pub fn pay_with_token(&mut self, cumulative: u64) -> (Payment, Token) {
        let payment = self.pay(cumulative);
        let token = Token::derive(&payment);
        (payment, token)
    }
}
