use alloc::vec::Vec;

use veil_objects::{
    Digest, Felt, ZERO,
    address::ContractAddress,
    crypto::merkle::MerklePath,
    hash::{compute_app_nullifier_secret_key, compute_npk_m_hash, silo_nullifier},
    side_effect::{
        Scoped, ScopedKeyValidationRequest, ScopedNoteHash, ScopedNullifier, ScopedReadRequest,
        SideEffect,
    },
};

use crate::{errors::KernelError, host::MembershipOracle};

// READ REQUEST HINTS
// ================================================================================================

/// Tells the kernel where the value claimed by a read request can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRequestHint {
    /// The value was emitted earlier in this transaction, at `index` of the accumulated array.
    Pending { index: usize },
    /// The value is a leaf of the tree committed to by the historical block header.
    Settled { leaf_index: u64, path: MerklePath },
}

/// Returns the note hash tree leaf holding `note_hash`.
pub fn note_hash_leaf(note_hash: Felt) -> Digest {
    Digest::new([note_hash, ZERO, ZERO, ZERO])
}

/// Returns the nullifier tree leaf holding the siloed form of `nullifier`.
pub fn nullifier_leaf(contract_address: ContractAddress, nullifier: Felt) -> Digest {
    Digest::new([silo_nullifier(contract_address, nullifier), ZERO, ZERO, ZERO])
}

// VERIFICATION
// ================================================================================================

/// Verifies that every note hash read request is satisfied by a pending note hash or by a leaf of
/// the note hash tree with root `root`.
///
/// # Errors
/// Returns an error if the number of hints differs from the number of requests, or if any
/// request is not satisfied by its hint.
pub fn verify_note_hash_read_requests<M: MembershipOracle + ?Sized>(
    requests: &[ScopedReadRequest],
    note_hashes: &[ScopedNoteHash],
    hints: &[ReadRequestHint],
    root: Digest,
    oracle: &M,
) -> Result<(), KernelError> {
    let pending: Vec<_> = note_hashes
        .iter()
        .map(|note_hash| {
            Scoped::new(
                SideEffect::new(note_hash.inner.value, note_hash.inner.counter),
                note_hash.contract_address,
            )
        })
        .collect();

    verify_read_requests("note hash", requests, &pending, hints, root, oracle, |request| {
        note_hash_leaf(request.inner.value)
    })
}

/// Verifies that every nullifier read request is satisfied by a pending nullifier or by a leaf of
/// the nullifier tree with root `root`.
///
/// # Errors
/// Returns an error if the number of hints differs from the number of requests, or if any
/// request is not satisfied by its hint.
pub fn verify_nullifier_read_requests<M: MembershipOracle + ?Sized>(
    requests: &[ScopedReadRequest],
    nullifiers: &[ScopedNullifier],
    hints: &[ReadRequestHint],
    root: Digest,
    oracle: &M,
) -> Result<(), KernelError> {
    let pending: Vec<_> = nullifiers
        .iter()
        .map(|nullifier| {
            Scoped::new(
                SideEffect::new(nullifier.inner.value, nullifier.inner.counter),
                nullifier.contract_address,
            )
        })
        .collect();

    verify_read_requests("nullifier", requests, &pending, hints, root, oracle, |request| {
        nullifier_leaf(request.contract_address, request.inner.value)
    })
}

/// Verifies every key validation request against the master nullifier secret hinted for it.
///
/// # Errors
/// Returns an error if the number of hints differs from the number of requests, or if a hinted
/// secret derives a different public key hash or app secret than the request claims.
pub fn verify_key_validation_requests(
    requests: &[ScopedKeyValidationRequest],
    master_secrets: &[Felt],
) -> Result<(), KernelError> {
    if master_secrets.len() != requests.len() {
        return Err(KernelError::MalformedHints {
            name: "key validation",
            expected: requests.len(),
            actual: master_secrets.len(),
        });
    }

    for (index, (request, &sk_m)) in requests.iter().zip(master_secrets).enumerate() {
        let valid = compute_npk_m_hash(sk_m) == request.inner.npk_m_hash
            && compute_app_nullifier_secret_key(sk_m, request.contract_address)
                == request.inner.sk_app;
        if !valid {
            return Err(KernelError::KeyValidationFailed { index });
        }
    }

    Ok(())
}

// HELPERS
// ================================================================================================

/// Checks each read request against its hint.
///
/// A pending hint must point at a value with the same contract emitted before the request. A
/// settled hint must prove membership of the request's leaf under `root`.
fn verify_read_requests<M, F>(
    name: &'static str,
    requests: &[ScopedReadRequest],
    pending: &[Scoped<SideEffect>],
    hints: &[ReadRequestHint],
    root: Digest,
    oracle: &M,
    settled_leaf: F,
) -> Result<(), KernelError>
where
    M: MembershipOracle + ?Sized,
    F: Fn(&ScopedReadRequest) -> Digest,
{
    if hints.len() != requests.len() {
        return Err(KernelError::MalformedHints {
            name,
            expected: requests.len(),
            actual: hints.len(),
        });
    }

    for (index, (request, hint)) in requests.iter().zip(hints).enumerate() {
        let resolved = match hint {
            ReadRequestHint::Pending { index: pending_index } => {
                pending.get(*pending_index).is_some_and(|value| {
                    value.inner.value == request.inner.value
                        && value.contract_address == request.contract_address
                        && value.inner.counter < request.inner.counter
                })
            },
            ReadRequestHint::Settled { leaf_index, path } => {
                oracle.verify_membership(settled_leaf(request), *leaf_index, path, root)
            },
        };
        if !resolved {
            return Err(KernelError::ReadRequestUnresolved { name, index });
        }
    }

    Ok(())
}

// TESTS
// ================================================================================================
