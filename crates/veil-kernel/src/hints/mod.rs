//! Untrusted hints consumed by the kernel tail.
//!
//! The tail never searches or sorts on its own: every such result is supplied as a hint and the
//! tail only verifies it. [TailHintsBuilder] computes honest hints from the accumulated kernel
//! output and the membership witnesses of settled values.

use alloc::vec::Vec;

use veil_objects::{
    Felt,
    address::ContractAddress,
    call::CallRequest,
    crypto::merkle::MerklePath,
    hash::compute_npk_m_hash,
    kernel::PrivateKernelCircuitPublicInputs,
    side_effect::{
        ScopedL2ToL1Message, ScopedLogHash, ScopedNoteHash, ScopedNullifier, ScopedReadRequest,
    },
};

pub use crate::composer::{ReadRequestHint, SortedArray};
use crate::{
    composer::{find_transient_links, remove_transient_pairs},
    errors::KernelError,
};

// TAIL HINTS
// ================================================================================================

/// Hints for [PrivateKernel::tail](crate::PrivateKernel::tail) and
/// [PrivateKernel::tail_to_public](crate::PrivateKernel::tail_to_public).
///
/// Read request hints and key validation hints follow the order of the accumulated requests.
/// Transient links and squashed arrays refer to the sorted note hashes and nullifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailHints {
    pub note_hash_read_request_hints: Vec<ReadRequestHint>,
    pub nullifier_read_request_hints: Vec<ReadRequestHint>,
    /// Master nullifier secret justifying each key validation request.
    pub key_validation_hints: Vec<Felt>,
    pub sorted_note_hashes: SortedArray<ScopedNoteHash>,
    pub sorted_nullifiers: SortedArray<ScopedNullifier>,
    pub sorted_l2_to_l1_msgs: SortedArray<ScopedL2ToL1Message>,
    pub sorted_encrypted_logs_hashes: SortedArray<ScopedLogHash>,
    pub sorted_unencrypted_logs_hashes: SortedArray<ScopedLogHash>,
    pub sorted_public_call_requests: SortedArray<CallRequest>,
    /// For each sorted nullifier, the index of the sorted note hash it nullifies, if that note
    /// hash was created in the same transaction.
    pub transient_links: Vec<Option<usize>>,
    pub squashed_note_hashes: Vec<ScopedNoteHash>,
    pub squashed_nullifiers: Vec<ScopedNullifier>,
}

// TAIL WITNESSES
// ================================================================================================

/// Position and sibling path of a leaf in one of the historical trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipWitness {
    pub leaf_index: u64,
    pub path: MerklePath,
}

impl MembershipWitness {
    pub fn new(leaf_index: u64, path: MerklePath) -> Self {
        Self { leaf_index, path }
    }
}

/// Data from outside the transaction needed to build [TailHints].
#[derive(Debug, Clone, Default)]
pub struct TailWitnesses {
    note_hashes: Vec<(Felt, MembershipWitness)>,
    nullifiers: Vec<(ContractAddress, Felt, MembershipWitness)>,
    master_secrets: Vec<Felt>,
}

impl TailWitnesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the witness of a settled note hash, identified by its unique siloed value.
    pub fn with_settled_note_hash(mut self, note_hash: Felt, witness: MembershipWitness) -> Self {
        self.note_hashes.push((note_hash, witness));
        self
    }

    /// Adds the witness of a settled nullifier, identified by its contract and unsiloed value.
    pub fn with_settled_nullifier(
        mut self,
        contract_address: ContractAddress,
        nullifier: Felt,
        witness: MembershipWitness,
    ) -> Self {
        self.nullifiers.push((contract_address, nullifier, witness));
        self
    }

    /// Adds a master nullifier secret which may justify key validation requests.
    pub fn with_master_secret(mut self, sk_m: Felt) -> Self {
        self.master_secrets.push(sk_m);
        self
    }

    pub fn extend_master_secrets(&mut self, secrets: impl IntoIterator<Item = Felt>) {
        self.master_secrets.extend(secrets);
    }

    fn note_hash_witness(&self, note_hash: Felt) -> Option<&MembershipWitness> {
        self.note_hashes
            .iter()
            .find(|(value, _)| *value == note_hash)
            .map(|(_, witness)| witness)
    }

    fn nullifier_witness(
        &self,
        contract_address: ContractAddress,
        nullifier: Felt,
    ) -> Option<&MembershipWitness> {
        self.nullifiers
            .iter()
            .find(|(address, value, _)| *address == contract_address && *value == nullifier)
            .map(|(_, _, witness)| witness)
    }

    fn master_secret(&self, npk_m_hash: Felt) -> Option<Felt> {
        self.master_secrets.iter().copied().find(|&sk_m| compute_npk_m_hash(sk_m) == npk_m_hash)
    }
}

// TAIL HINTS BUILDER
// ================================================================================================

/// Computes honest [TailHints] for the output of the last private kernel iteration.
pub struct TailHintsBuilder<'a> {
    witnesses: &'a TailWitnesses,
}

impl<'a> TailHintsBuilder<'a> {
    pub fn new(witnesses: &'a TailWitnesses) -> Self {
        Self { witnesses }
    }

    /// Builds the hints for `previous`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A read request matches no pending value and no witness was supplied for it.
    /// - No supplied master secret matches a key validation request.
    pub fn build(&self, previous: &PrivateKernelCircuitPublicInputs) -> Result<TailHints, KernelError> {
        let end = &previous.end;
        let requests = &previous.validation_requests;

        let note_hash_read_request_hints = read_request_hints(
            "note hash",
            &requests.note_hash_read_requests,
            |request| {
                end.note_hashes.iter().position(|note_hash| {
                    note_hash.inner.value == request.inner.value
                        && note_hash.contract_address == request.contract_address
                        && note_hash.inner.counter < request.inner.counter
                })
            },
            |request| self.witnesses.note_hash_witness(request.inner.value),
        )?;

        let nullifier_read_request_hints = read_request_hints(
            "nullifier",
            &requests.nullifier_read_requests,
            |request| {
                end.nullifiers.iter().position(|nullifier| {
                    nullifier.inner.value == request.inner.value
                        && nullifier.contract_address == request.contract_address
                        && nullifier.inner.counter < request.inner.counter
                })
            },
            |request| {
                self.witnesses.nullifier_witness(request.contract_address, request.inner.value)
            },
        )?;

        let key_validation_hints = requests
            .key_validation_requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                self.witnesses
                    .master_secret(request.inner.npk_m_hash)
                    .ok_or(KernelError::KeyValidationFailed { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sorted_note_hashes = SortedArray::sort(&end.note_hashes);
        let sorted_nullifiers = SortedArray::sort(&end.nullifiers);
        let transient_links =
            find_transient_links(&sorted_note_hashes.sorted, &sorted_nullifiers.sorted);
        let squashed = remove_transient_pairs(
            &sorted_note_hashes.sorted,
            &sorted_nullifiers.sorted,
            &transient_links,
        );

        Ok(TailHints {
            note_hash_read_request_hints,
            nullifier_read_request_hints,
            key_validation_hints,
            sorted_note_hashes,
            sorted_nullifiers,
            sorted_l2_to_l1_msgs: SortedArray::sort(&end.l2_to_l1_msgs),
            sorted_encrypted_logs_hashes: SortedArray::sort(&end.encrypted_logs_hashes),
            sorted_unencrypted_logs_hashes: SortedArray::sort(&end.unencrypted_logs_hashes),
            sorted_public_call_requests: SortedArray::sort(&end.public_call_stack),
            transient_links,
            squashed_note_hashes: squashed.note_hashes,
            squashed_nullifiers: squashed.nullifiers,
        })
    }
}

/// Resolves each read request to a pending value if one exists and to a settled witness
/// otherwise.
fn read_request_hints<'w>(
    name: &'static str,
    requests: &[ScopedReadRequest],
    find_pending: impl Fn(&ScopedReadRequest) -> Option<usize>,
    find_settled: impl Fn(&ScopedReadRequest) -> Option<&'w MembershipWitness>,
) -> Result<Vec<ReadRequestHint>, KernelError> {
    requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            if let Some(index) = find_pending(request) {
                return Ok(ReadRequestHint::Pending { index });
            }
            let witness =
                find_settled(request).ok_or(KernelError::ReadRequestUnresolved { name, index })?;
            Ok(ReadRequestHint::Settled {
                leaf_index: witness.leaf_index,
                path: witness.path.clone(),
            })
        })
        .collect()
}
