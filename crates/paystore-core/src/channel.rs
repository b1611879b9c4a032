//! Payment channels and the spend state machine.
//!
//! A channel moves through three phases as far as this layer is concerned:
//!
//! ```text
//! Absent --save--> Open --save (spent ratchets up)--> Open --(contract)--> Settled
//! ```
//!
//! `Absent -> Open` and the spend ratchet are decided by [`plan_save`].
//! Settlement happens on the contract and is only ever observed here,
//! through [`ChannelState`].

use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::types::{Address, Amount, ChannelId};

/// Lifecycle state of a channel as reported by the channel contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Open,
    Settling,
    Settled,
}

impl ChannelState {
    /// Whether the channel still accepts payments.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// The locally stored view of a payment channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: ChannelId,
    pub sender: Address,
    pub receiver: Address,
    /// Total deposit. Fixed once the channel is first stored.
    pub value: Amount,
    /// Cumulative amount claimed so far.
    pub spent: Amount,
}

impl Channel {
    pub fn new(
        channel_id: ChannelId,
        sender: Address,
        receiver: Address,
        value: impl Into<Amount>,
        spent: impl Into<Amount>,
    ) -> Self {
        Self {
            channel_id,
            sender,
            receiver,
            value: value.into(),
            spent: spent.into(),
        }
    }

    /// Check `spent <= value`.
    pub fn check_bounds(&self) -> Result<(), InvariantViolation> {
        check_spend(&self.channel_id, self.value, self.spent)
    }

    /// Whether `other` agrees with this channel on everything but `spent`.
    pub fn same_terms(&self, other: &Channel) -> bool {
        self.channel_id == other.channel_id
            && self.sender == other.sender
            && self.receiver == other.receiver
            && self.value == other.value
    }
}

/// A stored channel enriched with its live contract state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveChannel {
    pub channel: Channel,
    pub state: ChannelState,
}

/// What a save does to the stored record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpendTransition {
    /// No record existed; the full channel is inserted.
    Opened(Channel),
    /// The stored spend moves up.
    Advanced { from: Amount, to: Amount },
    /// The stored spend already equals the requested one.
    Unchanged,
}

/// Decide how `incoming` is applied on top of what is stored.
///
/// Only `spent` is taken from `incoming` when a record already exists; the
/// bound is checked against the stored deposit.
pub fn plan_save(
    existing: Option<&Channel>,
    incoming: &Channel,
) -> Result<SpendTransition, InvariantViolation> {
    match existing {
        None => {
            incoming.check_bounds()?;
            Ok(SpendTransition::Opened(incoming.clone()))
        }
        Some(stored) => plan_spend(stored, incoming.spent),
    }
}

/// Decide how a new spend figure is applied to a stored channel.
pub fn plan_spend(stored: &Channel, spent: Amount) -> Result<SpendTransition, InvariantViolation> {
    check_spend(&stored.channel_id, stored.value, spent)?;

    if spent < stored.spent {
        return Err(InvariantViolation::SpendDecrease {
            channel_id: stored.channel_id.clone(),
            current: stored.spent,
            attempted: spent,
        });
    }

    if spent == stored.spent {
        Ok(SpendTransition::Unchanged)
    } else {
        Ok(SpendTransition::Advanced {
            from: stored.spent,
            to: spent,
        })
    }
}

fn check_spend(channel_id: &ChannelId, value: Amount, spent: Amount) -> Result<(), InvariantViolation> {
    if spent > value {
        return Err(InvariantViolation::SpendExceedsDeposit {
            channel_id: channel_id.clone(),
            spent,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn channel(value: u64, spent: u64) -> Channel {
        Channel::new(
            ChannelId::new("c1"),
            Address::new("0xA"),
            Address::new("0xB"),
            value,
            spent,
        )
    }

    #[test]
    fn test_first_save_opens() {
        let incoming = channel(100, 0);
        let plan = plan_save(None, &incoming).unwrap();
        assert_eq!(plan, SpendTransition::Opened(incoming));
    }

    #[test]
    fn test_first_save_rejects_overspend() {
        let err = plan_save(None, &channel(100, 101)).unwrap_err();
        assert!(matches!(err, InvariantViolation::SpendExceedsDeposit { .. }));
    }

    #[test]
    fn test_spend_advances() {
        let stored = channel(100, 0);
        let plan = plan_save(Some(&stored), &channel(100, 30)).unwrap();
        assert_eq!(
            plan,
            SpendTransition::Advanced {
                from: Amount(0),
                to: Amount(30)
            }
        );
    }

    #[test]
    fn test_spend_decrease_rejected() {
        let stored = channel(100, 30);
        let err = plan_save(Some(&stored), &channel(100, 20)).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::SpendDecrease {
                channel_id: ChannelId::new("c1"),
                current: Amount(30),
                attempted: Amount(20),
            }
        );
    }

    #[test]
    fn test_equal_spend_is_unchanged() {
        let stored = channel(100, 30);
        let plan = plan_save(Some(&stored), &channel(100, 30)).unwrap();
        assert_eq!(plan, SpendTransition::Unchanged);
    }

    #[test]
    fn test_bound_uses_stored_deposit() {
        // A caller cannot raise the deposit through save.
        let stored = channel(100, 30);
        let err = plan_save(Some(&stored), &channel(1_000, 500)).unwrap_err();
        assert!(matches!(
            err,
            InvariantViolation::SpendExceedsDeposit { value: Amount(100), .. }
        ));
    }

    proptest! {
        #[test]
        fn accepted_spends_never_decrease(spends in prop::collection::vec(0u64..=100, 1..40)) {
            let mut stored = channel(100, 0);
            for spent in spends {
                match plan_spend(&stored, Amount::from(spent)) {
                    Ok(SpendTransition::Advanced { from, to }) => {
                        prop_assert!(to > from);
                        stored.spent = to;
                    }
                    Ok(_) => prop_assert_eq!(stored.spent, Amount::from(spent)),
                    Err(_) => prop_assert!(Amount::from(spent) < stored.spent),
                }
            }
        }
    }
}
