//! A channel contract double with scripted answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use paystore_core::{ChannelContract, ChannelId, ChannelState, ContractError};

/// Answers `channel_state` from a table.
///
/// Channels missing from the table get the fallback state, or
/// `UnknownChannel` when there is none. `set_unavailable(true)` makes every
/// call fail, to exercise fail-closed lookups.
#[derive(Default)]
pub struct StaticContract {
    states: RwLock<HashMap<ChannelId, ChannelState>>,
    fallback: Option<ChannelState>,
    unavailable: AtomicBool,
}

impl StaticContract {
    /// A contract that knows no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// A contract that reports every channel as open.
    pub fn all_open() -> Self {
        Self {
            fallback: Some(ChannelState::Open),
            ..Self::default()
        }
    }

    pub fn set_state(&self, channel_id: ChannelId, state: ChannelState) {
        self.states.write().unwrap().insert(channel_id, state);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChannelContract for StaticContract {
    async fn channel_state(&self, channel_id: &ChannelId) -> Result<ChannelState, ContractError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ContractError::Unavailable("contract offline".into()));
        }

        let known = self.states.read().unwrap().get(channel_id).copied();
        known
            .or(self.fallback)
            .ok_or_else(|| ContractError::UnknownChannel(channel_id.clone()))
    }
}
