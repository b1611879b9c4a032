//! Persisted document shapes and field names.

use paystore_core::{ChannelId, Payment, Token};
use paystore_store::{Document, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub(crate) const CHANNEL_ID: &str = "channelId";
pub(crate) const SENDER: &str = "sender";
pub(crate) const RECEIVER: &str = "receiver";
pub(crate) const SPENT: &str = "spent";
pub(crate) const TOKEN: &str = "token";

/// A journal entry: the payment plus the token it was issued with, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PaymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    #[serde(flatten)]
    pub payment: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRecord {
    pub token: Token,
    pub channel_id: ChannelId,
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<T>, StoreError> {
    docs.iter().map(Document::decode).collect()
}

pub(crate) fn decode_payments(docs: &[Document]) -> Result<Vec<Payment>, StoreError> {
    Ok(decode_all::<PaymentRecord>(docs)?
        .into_iter()
        .map(|record| record.payment)
        .collect())
}
