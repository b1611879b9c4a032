//! Signed off-chain payments.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, ChannelId};

/// One signed claim against a channel.
///
/// `value` is cumulative: it is the total the sender has authorized over
/// the channel's lifetime, not the increment since the previous payment.
/// The signature components are carried through untouched; callers verify
/// them before handing the payment to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub channel_id: ChannelId,
    pub value: Amount,
    pub v: u8,
    pub r: String,
    pub s: String,
}

impl Payment {
    pub fn new(
        channel_id: ChannelId,
        value: impl Into<Amount>,
        v: u8,
        r: impl Into<String>,
        s: impl Into<String>,
    ) -> Self {
        Self {
            channel_id,
            value: value.into(),
            v,
            r: r.into(),
            s: s.into(),
        }
    }
}

/// Pick the payment with the greatest value.
///
/// Ties keep the earliest payment in iteration order, so the result is
/// deterministic for an insertion-ordered input.
pub fn max_by_value<'a, I>(payments: I) -> Option<&'a Payment>
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments.into_iter().fold(None, |best, candidate| match best {
        Some(current) if current.value >= candidate.value => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payment(value: u64, r: &str) -> Payment {
        Payment::new(ChannelId::new("c1"), value, 27, r, "0xs")
    }

    #[test]
    fn test_max_by_value_empty() {
        assert!(max_by_value(&Vec::<Payment>::new()).is_none());
    }

    #[test]
    fn test_max_by_value_prefers_first_on_tie() {
        let payments = vec![payment(10, "a"), payment(30, "b"), payment(30, "c")];
        let best = max_by_value(&payments).unwrap();
        assert_eq!(best.r, "b");
    }

    #[test]
    fn test_payment_document_field_names() {
        let json = serde_json::to_value(payment(5, "0xr")).unwrap();
        assert_eq!(json["channelId"], "c1");
        assert_eq!(json["value"], "5");
        assert_eq!(json["v"], 27);
    }

    proptest! {
        #[test]
        fn max_by_value_returns_maximum(values in prop::collection::vec(any::<u64>(), 1..50)) {
            let payments: Vec<Payment> = values.iter().map(|v| payment(*v, "r")).collect();
            let best = max_by_value(&payments).unwrap();
            prop_assert_eq!(best.value, Amount::from(*values.iter().max().unwrap()));
        }
    }
}
