//! The channel ledger: stored channels and their spend.
//!
//! There is no separate "open channel" call. The first [`ChannelLedger::save`]
//! for a channel id materializes the record; every later save only ratchets
//! `spent` upward. Each save runs its existence check and its write inside
//! one store transaction, so two concurrent first saves cannot both insert
//! and two concurrent spend updates cannot lose each other.

use std::sync::Arc;

use paystore_core::{
    max_by_value, plan_save, plan_spend, Address, Amount, Channel, ChannelContract, ChannelId,
    LiveChannel, Namespace, RecordKind, SpendTransition,
};
use paystore_store::{Document, Filter, Mutation, RecordStore, Transaction};

use crate::error::{NotFound, Result, StorageError};
use crate::records::{decode_all, decode_payments, CHANNEL_ID, RECEIVER, SENDER, SPENT};

/// Stored payment channels, enriched with live contract state on lookup.
pub struct ChannelLedger<S> {
    store: Arc<S>,
    namespace: Namespace,
    contract: Arc<dyn ChannelContract>,
}

impl<S> Clone for ChannelLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace.clone(),
            contract: self.contract.clone(),
        }
    }
}

impl<S: RecordStore> ChannelLedger<S> {
    pub fn new(store: Arc<S>, namespace: Namespace, contract: Arc<dyn ChannelContract>) -> Self {
        Self {
            store,
            namespace,
            contract,
        }
    }

    fn kind(&self) -> String {
        self.namespace.qualify(RecordKind::Channel)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All channels from `sender` to `receiver`.
    pub async fn find_by_sender_receiver(
        &self,
        sender: &Address,
        receiver: &Address,
    ) -> Result<Vec<Channel>> {
        let filter = Filter::new()
            .eq(SENDER, sender.as_str())
            .eq(RECEIVER, receiver.as_str());
        let docs = self.store.find(&self.kind(), &filter).await?;
        Ok(decode_all(&docs)?)
    }

    /// Channels from `sender` to `receiver` with the given id.
    ///
    /// Normally zero or one; callers must cope with more.
    pub async fn find_by_sender_receiver_channel_id(
        &self,
        sender: &Address,
        receiver: &Address,
        channel_id: &ChannelId,
    ) -> Result<Vec<Channel>> {
        let filter = Filter::new()
            .eq(SENDER, sender.as_str())
            .eq(RECEIVER, receiver.as_str())
            .eq(CHANNEL_ID, channel_id.as_str());
        let docs = self.store.find(&self.kind(), &filter).await?;
        Ok(decode_all(&docs)?)
    }

    /// The stored channel, without consulting the contract.
    pub async fn get(&self, channel_id: &ChannelId) -> Result<Option<Channel>> {
        let doc = self
            .store
            .find_one(&self.kind(), &by_id(channel_id))
            .await?;
        Ok(doc.map(|d| d.decode()).transpose()?)
    }

    /// The stored channel together with its live state from the contract.
    ///
    /// Fails if the contract cannot be consulted; a channel is never
    /// returned with a guessed state.
    pub async fn find_by_channel_id(&self, channel_id: &ChannelId) -> Result<LiveChannel> {
        let channel = self
            .get(channel_id)
            .await?
            .ok_or_else(|| NotFound::Channel(channel_id.clone()))?;

        let state = self.contract.channel_state(channel_id).await?;
        tracing::trace!(channel_id = %channel_id, ?state, "resolved live channel state");

        Ok(LiveChannel { channel, state })
    }

    /// Every stored channel in this namespace.
    pub async fn list_all(&self) -> Result<Vec<Channel>> {
        let docs = self.store.find(&self.kind(), &Filter::new()).await?;
        Ok(decode_all(&docs)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert the channel if unknown, otherwise move its spend to `channel.spent`.
    ///
    /// Only `spent` is ever taken from an existing channel's update. Rejects
    /// a spend above the stored deposit or below the stored spend.
    pub async fn save(&self, channel: &Channel) -> Result<SpendTransition> {
        let kind = self.kind();
        let channel_id = channel.channel_id.clone();
        let channel = channel.clone();

        let transition = self
            .store
            .transaction(move |tx| -> Result<SpendTransition> {
                let filter = by_id(&channel.channel_id);
                let existing = load_channel(tx, &kind, &filter)?;

                if let Some(stored) = &existing {
                    if !stored.same_terms(&channel) {
                        tracing::warn!(
                            channel_id = %channel.channel_id,
                            "save carries different channel terms; keeping stored terms"
                        );
                    }
                }

                let transition = plan_save(existing.as_ref(), &channel)?;
                apply(tx, &kind, &filter, &transition)?;
                Ok(transition)
            })
            .await?;

        log_transition(&channel_id, &transition);
        Ok(transition)
    }

    /// Move the spend of an existing channel.
    pub async fn save_spending(&self, channel_id: &ChannelId, spent: Amount) -> Result<SpendTransition> {
        let kind = self.kind();
        let id = channel_id.clone();

        let transition = self
            .store
            .transaction(move |tx| -> Result<SpendTransition> {
                let filter = by_id(&id);
                let stored = load_channel(tx, &kind, &filter)?
                    .ok_or_else(|| NotFound::Channel(id.clone()))?;

                let transition = plan_spend(&stored, spent)?;
                apply(tx, &kind, &filter, &transition)?;
                Ok(transition)
            })
            .await?;

        log_transition(channel_id, &transition);
        Ok(transition)
    }

    /// Ratchet the channel's spend to its largest journaled payment.
    ///
    /// Reading the journal and updating the channel happen in one
    /// transaction, so concurrent payments on the same channel cannot leave
    /// a smaller claim on top of a larger one.
    pub async fn sync_spend(&self, channel_id: &ChannelId) -> Result<Channel> {
        let kind = self.kind();
        let payment_kind = self.namespace.qualify(RecordKind::Payment);
        let id = channel_id.clone();

        let (channel, transition) = self
            .store
            .transaction(move |tx| -> Result<(Channel, SpendTransition)> {
                let filter = by_id(&id);
                let mut stored = load_channel(tx, &kind, &filter)?
                    .ok_or_else(|| NotFound::Channel(id.clone()))?;

                let payments = decode_payments(&tx.find(&payment_kind, &filter)?)?;
                let claimed = max_by_value(&payments)
                    .map(|p| p.value)
                    .ok_or_else(|| NotFound::Payments(id.clone()))?;

                let transition = plan_spend(&stored, claimed)?;
                apply(tx, &kind, &filter, &transition)?;

                stored.spent = claimed;
                Ok((stored, transition))
            })
            .await?;

        log_transition(channel_id, &transition);
        Ok(channel)
    }
}

fn by_id(channel_id: &ChannelId) -> Filter {
    Filter::new().eq(CHANNEL_ID, channel_id.as_str())
}

fn load_channel(
    tx: &mut dyn Transaction,
    kind: &str,
    filter: &Filter,
) -> std::result::Result<Option<Channel>, StorageError> {
    Ok(tx
        .find_one(kind, filter)?
        .map(|doc| doc.decode::<Channel>())
        .transpose()?)
}

fn apply(
    tx: &mut dyn Transaction,
    kind: &str,
    filter: &Filter,
    transition: &SpendTransition,
) -> std::result::Result<(), StorageError> {
    match transition {
        SpendTransition::Opened(channel) => {
            tx.insert(&Document::encode(kind, channel)?)?;
        }
        SpendTransition::Advanced { to, .. } => {
            let mutation = Mutation::new().set_serialized(SPENT, to)?;
            tx.update(kind, filter, &mutation)?;
        }
        SpendTransition::Unchanged => {}
    }
    Ok(())
}

/// Log a committed transition.
fn log_transition(channel_id: &ChannelId, transition: &SpendTransition) {
    match transition {
        SpendTransition::Opened(channel) => tracing::debug!(
            channel_id = %channel_id,
            value = %channel.value,
            spent = %channel.spent,
            "stored new channel"
        ),
        SpendTransition::Advanced { from, to } => {
            tracing::debug!(channel_id = %channel_id, %from, %to, "advanced channel spend")
        }
        SpendTransition::Unchanged => {
            tracing::trace!(channel_id = %channel_id, "channel spend unchanged")
        }
    }
}
