use alloc::vec::Vec;

use veil_objects::{
    Felt,
    hash::{
        compute_unique_siloed_note_hash, silo_l2_to_l1_message, silo_log_hash, silo_nullifier,
    },
    side_effect::{
        LogHash, ScopedL2ToL1Message, ScopedLogHash, ScopedNoteHash, ScopedNullifier, SideEffect,
    },
};

// SILOED DATA
// ================================================================================================

/// Side effects bound to the contracts which emitted them, in side-effect order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SiloedData {
    pub note_hashes: Vec<SideEffect>,
    pub nullifiers: Vec<SideEffect>,
    pub l2_to_l1_msgs: Vec<SideEffect>,
    pub encrypted_logs_hashes: Vec<LogHash>,
    pub unencrypted_logs_hashes: Vec<LogHash>,
}

// SILOING
// ================================================================================================

/// Silos nullifiers by their contract.
///
/// Nullifiers scoped to the zero address are protocol nullifiers and are kept unchanged.
pub fn silo_nullifiers(nullifiers: &[ScopedNullifier]) -> Vec<SideEffect> {
    nullifiers
        .iter()
        .map(|nullifier| {
            let value = if nullifier.contract_address.is_zero() {
                nullifier.inner.value
            } else {
                silo_nullifier(nullifier.contract_address, nullifier.inner.value)
            };
            SideEffect::new(value, nullifier.inner.counter)
        })
        .collect()
}

/// Silos note hashes by their contract and makes them unique using the first nullifier of the
/// transaction and their position in the final array.
pub fn silo_note_hashes(note_hashes: &[ScopedNoteHash], first_nullifier: Felt) -> Vec<SideEffect> {
    note_hashes
        .iter()
        .enumerate()
        .map(|(index, note_hash)| {
            let value = compute_unique_siloed_note_hash(
                note_hash.contract_address,
                note_hash.inner.value,
                first_nullifier,
                index,
            );
            SideEffect::new(value, note_hash.inner.counter)
        })
        .collect()
}

pub fn silo_l2_to_l1_messages(messages: &[ScopedL2ToL1Message]) -> Vec<SideEffect> {
    messages
        .iter()
        .map(|message| {
            let value = silo_l2_to_l1_message(
                message.contract_address,
                message.inner.recipient,
                message.inner.content,
            );
            SideEffect::new(value, message.inner.counter)
        })
        .collect()
}

/// Silos log hashes by their contract, keeping the preimage lengths.
pub fn silo_log_hashes(logs: &[ScopedLogHash]) -> Vec<LogHash> {
    logs.iter()
        .map(|log| {
            LogHash::new(
                silo_log_hash(log.contract_address, log.inner.value),
                log.inner.counter,
                log.inner.length,
            )
        })
        .collect()
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use veil_objects::{
        ZERO,
        address::ContractAddress,
        side_effect::{NoteHash, Nullifier, Scoped},
        testing::dummy_address,
    };

    use super::*;

    #[test]
    fn protocol_nullifier_is_not_siloed() {
        let nullifiers = [
            Scoped::new(Nullifier::new(Felt::new(5), ZERO, 0), ContractAddress::ZERO),
            Scoped::new(Nullifier::new(Felt::new(5), ZERO, 3), dummy_address(2)),
        ];

        let siloed = silo_nullifiers(&nullifiers);

        assert_eq!(siloed[0], SideEffect::new(Felt::new(5), 0));
        assert_eq!(siloed[1], SideEffect::new(silo_nullifier(dummy_address(2), Felt::new(5)), 3));
    }

    #[test]
    fn equal_note_hashes_become_unique() {
        let note_hash = NoteHash::new(Felt::new(8), 1);
        let note_hashes = [
            Scoped::new(note_hash, dummy_address(1)),
            Scoped::new(NoteHash { counter: 2, ..note_hash }, dummy_address(1)),
        ];

        let siloed = silo_note_hashes(&note_hashes, Felt::new(77));

        assert_ne!(siloed[0].value, siloed[1].value);
        assert_eq!(
            siloed[1].value,
            compute_unique_siloed_note_hash(dummy_address(1), Felt::new(8), Felt::new(77), 1)
        );
    }
}
