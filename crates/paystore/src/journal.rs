//! The payment journal: an append-only log of payments per channel.
//!
//! Payments carry cumulative values, so the current claim on a channel is
//! the payment with the largest value, never the most recently appended
//! one. A replayed older payment therefore cannot roll the claim back.

use std::sync::Arc;

use paystore_core::{max_by_value, ChannelId, InvariantViolation, Namespace, Payment, RecordKind};
use paystore_store::{Document, Filter, RecordStore};

use crate::error::{NotFound, Result};
use crate::records::{decode_payments, PaymentRecord, CHANNEL_ID};

pub struct PaymentJournal<S> {
    store: Arc<S>,
    namespace: Namespace,
}

impl<S> Clone for PaymentJournal<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl<S: RecordStore> PaymentJournal<S> {
    pub fn new(store: Arc<S>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    fn kind(&self) -> String {
        self.namespace.qualify(RecordKind::Payment)
    }

    /// Record a payment against `channel_id`. Never overwrites.
    pub async fn append(&self, channel_id: &ChannelId, payment: &Payment) -> Result<()> {
        if &payment.channel_id != channel_id {
            return Err(InvariantViolation::ChannelMismatch {
                expected: channel_id.clone(),
                payment: payment.channel_id.clone(),
            }
            .into());
        }

        let record = PaymentRecord {
            token: None,
            payment: payment.clone(),
        };
        self.store
            .insert(&Document::encode(self.kind(), &record)?)
            .await?;

        tracing::debug!(channel_id = %channel_id, value = %payment.value, "appended payment");
        Ok(())
    }

    /// Every payment recorded for the channel, in append order.
    pub async fn payments(&self, channel_id: &ChannelId) -> Result<Vec<Payment>> {
        let filter = Filter::new().eq(CHANNEL_ID, channel_id.as_str());
        let docs = self.store.find(&self.kind(), &filter).await?;
        Ok(decode_payments(&docs)?)
    }

    /// The payment with the greatest value for the channel.
    ///
    /// Among equal values the earliest appended wins. A channel with no
    /// payments yields `NotFound`.
    pub async fn max_payment(&self, channel_id: &ChannelId) -> Result<Payment> {
        tracing::trace!(channel_id = %channel_id, "looking up max payment");

        let payments = self.payments(channel_id).await?;
        tracing::trace!(channel_id = %channel_id, count = payments.len(), "found payments");

        let max = max_by_value(&payments)
            .cloned()
            .ok_or_else(|| NotFound::Payments(channel_id.clone()))?;

        tracing::debug!(channel_id = %channel_id, value = %max.value, "found max payment");
        Ok(max)
    }
}
