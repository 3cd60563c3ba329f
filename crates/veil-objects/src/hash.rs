//! Domain-separated hash functions used by the kernel.
//!
//! Every value computed here is prefixed with a domain separator so that two hashes computed for
//! different purposes can never collide, even when their inputs are identical.

use alloc::vec::Vec;

use crate::{
    DOMAIN_APP_NULLIFIER_SECRET, DOMAIN_FUNCTION_ARGS, DOMAIN_NOTE_HASH_NONCE,
    DOMAIN_NOTE_NULLIFIER, DOMAIN_NULLIFIER_PUBLIC_KEY, DOMAIN_SILOED_L2_TO_L1_MSG,
    DOMAIN_SILOED_LOG_HASH, DOMAIN_SILOED_NOTE_HASH, DOMAIN_SILOED_NULLIFIER,
    DOMAIN_UNIQUE_NOTE_HASH, Digest, Felt, Hasher, ZERO, address::ContractAddress,
};

/// Hashes the provided elements prefixed by the domain separator.
pub fn hash_with_domain(domain: u64, elements: &[Felt]) -> Digest {
    let mut input = Vec::with_capacity(elements.len() + 1);
    input.push(Felt::new(domain));
    input.extend_from_slice(elements);
    Hasher::hash_elements(&input)
}

/// Same as [hash_with_domain] but reduces the digest to a single field element.
pub fn hash_to_felt(domain: u64, elements: &[Felt]) -> Felt {
    hash_with_domain(domain, elements).as_elements()[0]
}

/// Returns the commitment to the arguments of a function call.
///
/// Calls without arguments commit to zero.
pub fn hash_args(args: &[Felt]) -> Felt {
    if args.is_empty() {
        return ZERO;
    }
    hash_to_felt(DOMAIN_FUNCTION_ARGS, args)
}

// SILOING
// ================================================================================================

/// Binds a note hash to the contract which created it.
pub fn silo_note_hash(contract_address: ContractAddress, note_hash: Felt) -> Felt {
    hash_to_felt(DOMAIN_SILOED_NOTE_HASH, &[contract_address.as_felt(), note_hash])
}

/// Returns the nonce of the note hash at position `index` of a transaction whose first nullifier
/// is `first_nullifier`.
pub fn compute_note_hash_nonce(first_nullifier: Felt, index: usize) -> Felt {
    hash_to_felt(DOMAIN_NOTE_HASH_NONCE, &[first_nullifier, Felt::new(index as u64)])
}

/// Makes a siloed note hash unique across transactions.
pub fn compute_unique_note_hash(nonce: Felt, siloed_note_hash: Felt) -> Felt {
    hash_to_felt(DOMAIN_UNIQUE_NOTE_HASH, &[nonce, siloed_note_hash])
}

/// Computes the value inserted into the note hash tree for a note hash emitted at position
/// `index` of a transaction.
pub fn compute_unique_siloed_note_hash(
    contract_address: ContractAddress,
    note_hash: Felt,
    first_nullifier: Felt,
    index: usize,
) -> Felt {
    let siloed = silo_note_hash(contract_address, note_hash);
    compute_unique_note_hash(compute_note_hash_nonce(first_nullifier, index), siloed)
}

/// Binds a nullifier to the contract which emitted it.
pub fn silo_nullifier(contract_address: ContractAddress, nullifier: Felt) -> Felt {
    hash_to_felt(DOMAIN_SILOED_NULLIFIER, &[contract_address.as_felt(), nullifier])
}

/// Binds an L2-to-L1 message to the contract which sent it.
pub fn silo_l2_to_l1_message(
    contract_address: ContractAddress,
    recipient: Felt,
    content: Felt,
) -> Felt {
    hash_to_felt(DOMAIN_SILOED_L2_TO_L1_MSG, &[contract_address.as_felt(), recipient, content])
}

/// Binds a log hash to the contract which emitted it.
pub fn silo_log_hash(contract_address: ContractAddress, log_hash: Felt) -> Felt {
    hash_to_felt(DOMAIN_SILOED_LOG_HASH, &[contract_address.as_felt(), log_hash])
}

// KEYS
// ================================================================================================

/// Returns the hash of the master nullifier public key derived from the master secret.
pub fn compute_npk_m_hash(sk_m: Felt) -> Felt {
    hash_to_felt(DOMAIN_NULLIFIER_PUBLIC_KEY, &[sk_m])
}

/// Derives the app-siloed nullifier secret of `app` from the master secret.
pub fn compute_app_nullifier_secret_key(sk_m: Felt, app: ContractAddress) -> Felt {
    hash_to_felt(DOMAIN_APP_NULLIFIER_SECRET, &[sk_m, app.as_felt()])
}

/// Computes the nullifier of a note from its note hash and the app-siloed nullifier secret.
pub fn compute_note_nullifier(note_hash: Felt, sk_app: Felt) -> Felt {
    hash_to_felt(DOMAIN_NOTE_NULLIFIER, &[note_hash, sk_app])
}

// TESTS
// ================================================================================================
