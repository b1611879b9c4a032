//! The authoritative channel contract, as seen from the store.

use async_trait::async_trait;

use crate::channel::ChannelState;
use crate::error::ContractError;
use crate::types::ChannelId;

/// Read access to the ledger that owns the truth about a channel.
///
/// The store consults it whenever it hands out a [`LiveChannel`]; a failure
/// here fails the lookup.
///
/// [`LiveChannel`]: crate::channel::LiveChannel
#[async_trait]
pub trait ChannelContract: Send + Sync {
    /// Current lifecycle state of the channel.
    async fn channel_state(&self, channel_id: &ChannelId) -> Result<ChannelState, ContractError>;
}
