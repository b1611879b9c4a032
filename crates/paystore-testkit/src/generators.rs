//! Proptest generators for property-based testing.

use proptest::prelude::*;

use paystore_core::{Amount, ChannelId, Payment};

/// Generate an amount up to `max` inclusive.
pub fn amount(max: u64) -> impl Strategy<Value = Amount> {
    (0..=max).prop_map(Amount::from)
}

/// Generate a short channel id.
pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    "c[0-9a-f]{1,8}".prop_map(ChannelId::new)
}

/// Generate a namespace prefix (possibly empty, meaning unprefixed).
pub fn namespace_prefix() -> impl Strategy<Value = String> {
    "[a-z]{0,6}"
}

/// Generate opaque signature components.
pub fn signature() -> impl Strategy<Value = (u8, String, String)> {
    (27u8..=28, any::<[u8; 32]>(), any::<[u8; 32]>())
        .prop_map(|(v, r, s)| (v, format!("0x{}", hex::encode(r)), format!("0x{}", hex::encode(s))))
}

/// Generate a payment on `channel_id` with a value up to `max`.
pub fn payment_on(channel_id: ChannelId, max: u64) -> impl Strategy<Value = Payment> {
    (amount(max), signature()).prop_map(move |(value, (v, r, s))| Payment {
        channel_id: channel_id.clone(),
        value,
        v,
        r,
        s,
    })
}

/// Generate a non-empty batch of cumulative payment values for one channel.
pub fn payment_values(max: u64, len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..=max, 1..=len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paystore_core::{Namespace, RecordKind};

    proptest! {
        #[test]
        fn distinct_prefixes_qualify_apart(a in namespace_prefix(), b in namespace_prefix(), id in channel_id()) {
            prop_assume!(a != b);
            prop_assert!(id.as_str().starts_with('c'));
            prop_assert_ne!(
                Namespace::new(a).qualify(RecordKind::Channel),
                Namespace::new(b).qualify(RecordKind::Channel)
            );
        }


        #[test]
        fn payments_stay_on_their_channel(payment in payment_on(ChannelId::new("c1"), 1_000)) {
            prop_assert_eq!(payment.channel_id, ChannelId::new("c1"));
            prop_assert!(payment.value <= Amount(1_000));
        }
    }
}
