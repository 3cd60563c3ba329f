use alloc::vec::Vec;

use veil_objects::{
    call::CallRequest,
    kernel::PublicAccumulatedData,
    side_effect::{LogHash, Ordered},
};

use super::silo::SiloedData;

/// Splits items into those emitted before `threshold` and those emitted at or after it.
pub fn split_by_counter<T: Ordered + Clone>(items: &[T], threshold: u32) -> (Vec<T>, Vec<T>) {
    items.iter().cloned().partition(|item| item.counter() < threshold)
}

/// Splits siloed side effects and enqueued public calls into their non-revertible and revertible
/// halves.
///
/// Public calls are split by their start counter. Gas is left for the caller to meter.
pub fn split_to_public(
    data: &SiloedData,
    public_call_stack: &[CallRequest],
    threshold: u32,
) -> (PublicAccumulatedData, PublicAccumulatedData) {
    let (non_revertible_note_hashes, revertible_note_hashes) =
        split_by_counter(&data.note_hashes, threshold);
    let (non_revertible_nullifiers, revertible_nullifiers) =
        split_by_counter(&data.nullifiers, threshold);
    let (non_revertible_msgs, revertible_msgs) = split_by_counter(&data.l2_to_l1_msgs, threshold);
    let (non_revertible_encrypted, revertible_encrypted) =
        split_by_counter(&data.encrypted_logs_hashes, threshold);
    let (non_revertible_unencrypted, revertible_unencrypted) =
        split_by_counter(&data.unencrypted_logs_hashes, threshold);
    let (non_revertible_calls, revertible_calls) = split_by_counter(public_call_stack, threshold);

    let non_revertible = PublicAccumulatedData {
        note_hashes: non_revertible_note_hashes,
        nullifiers: non_revertible_nullifiers,
        l2_to_l1_msgs: non_revertible_msgs,
        encrypted_log_preimages_length: preimages_length(&non_revertible_encrypted),
        unencrypted_log_preimages_length: preimages_length(&non_revertible_unencrypted),
        encrypted_logs_hashes: non_revertible_encrypted,
        unencrypted_logs_hashes: non_revertible_unencrypted,
        public_call_stack: non_revertible_calls,
        ..Default::default()
    };
    let revertible = PublicAccumulatedData {
        note_hashes: revertible_note_hashes,
        nullifiers: revertible_nullifiers,
        l2_to_l1_msgs: revertible_msgs,
        encrypted_log_preimages_length: preimages_length(&revertible_encrypted),
        unencrypted_log_preimages_length: preimages_length(&revertible_unencrypted),
        encrypted_logs_hashes: revertible_encrypted,
        unencrypted_logs_hashes: revertible_unencrypted,
        public_call_stack: revertible_calls,
        ..Default::default()
    };

    (non_revertible, revertible)
}

/// Returns the total preimage length of `logs`, saturating on overflow.
pub fn preimages_length(logs: &[LogHash]) -> u32 {
    logs.iter().fold(0u32, |total, log| total.saturating_add(log.length))
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use veil_objects::{Felt, side_effect::SideEffect};

    use super::*;

    #[test]
    fn threshold_counter_is_revertible() {
        let items: Vec<_> =
            (1..=4u32).map(|counter| SideEffect::new(Felt::from(counter), counter)).collect();

        let (non_revertible, revertible) = split_by_counter(&items, 3);

        assert_eq!(non_revertible, items[..2]);
        assert_eq!(revertible, items[2..]);
    }

    #[test]
    fn log_lengths_follow_the_split() {
        let data = SiloedData {
            encrypted_logs_hashes: vec![
                LogHash::new(Felt::new(1), 2, 10),
                LogHash::new(Felt::new(2), 5, 7),
            ],
            ..Default::default()
        };
        let calls = [CallRequest {
            hash: Felt::new(3),
            start_side_effect_counter: 6,
            end_side_effect_counter: 6,
            ..Default::default()
        }];

        let (non_revertible, revertible) = split_to_public(&data, &calls, 4);

        assert_eq!(non_revertible.encrypted_log_preimages_length, 10);
        assert_eq!(revertible.encrypted_log_preimages_length, 7);
        assert!(non_revertible.public_call_stack.is_empty());
        assert_eq!(revertible.public_call_stack, calls);
    }
}
