use alloc::vec::Vec;

use veil_objects::{
    Digest, Felt,
    address::{ContractAddress, FunctionData},
    call::{CallContext, PrivateCallStackItem, PublicCallStackItem},
    crypto::merkle::{MerkleError, MerklePath},
    side_effect::KeyValidationRequest,
};

use crate::{
    context::SideEffectCounter,
    errors::{ExecutorError, KeyProviderError},
};

// NESTED CALL
// ================================================================================================

/// A nested call as requested by a private invocation.
///
/// `call_context` is the context the callee is expected to observe. For private calls its start
/// counter is the next counter the shared [SideEffectCounter] will hand out; for enqueued public
/// calls it is the counter already consumed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedCall {
    pub contract_address: ContractAddress,
    pub function_data: FunctionData,
    pub args: Vec<Felt>,
    pub args_hash: Felt,
    pub call_context: CallContext,
}

// CALL EXECUTOR
// ================================================================================================

/// The [CallExecutor] trait defines the interface through which a private invocation issues
/// nested calls.
///
/// Implementations run private callees to completion before returning, so the caller observes
/// the side-effect counter advanced past the callee's whole window.
pub trait CallExecutor {
    /// Executes a private function and returns its finished call stack item.
    ///
    /// The callee must draw its counters from `counter`: its start counter is the next value of
    /// `counter` and its end counter is the last value it consumed.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The called contract or function is unknown to the executor.
    /// - The callee failed.
    fn execute_private_call(
        &mut self,
        counter: &mut SideEffectCounter,
        call: &NestedCall,
    ) -> Result<PrivateCallStackItem, ExecutorError>;

    /// Enqueues a public or VM function call for execution after the private part of the
    /// transaction.
    fn enqueue_public_call(&mut self, call: &NestedCall)
    -> Result<PublicCallStackItem, ExecutorError>;

    /// Enqueues the public teardown call of the transaction.
    fn enqueue_public_teardown_call(
        &mut self,
        call: &NestedCall,
    ) -> Result<PublicCallStackItem, ExecutorError>;
}

// SECRET KEY PROVIDER
// ================================================================================================

/// The [SecretKeyProvider] trait defines the interface through which a private invocation obtains
/// nullifier secrets of accounts.
pub trait SecretKeyProvider {
    /// Returns the app-siloed nullifier secret of the account whose master nullifier public key
    /// hashes to `npk_m_hash`, siloed for `app`.
    ///
    /// # Errors
    /// Returns an error if the provider does not hold the keys of the account.
    fn get_key_validation_request(
        &self,
        npk_m_hash: Felt,
        app: ContractAddress,
    ) -> Result<KeyValidationRequest, KeyProviderError>;
}

// MEMBERSHIP ORACLE
// ================================================================================================

/// Answers whether a leaf at a given index is consistent with a merkle root.
///
/// Used both for settled read requests against the historical trees and for proving that a
/// function belongs to the private function tree of a contract class.
pub trait MembershipOracle {
    /// Returns the root of the tree in which `leaf` sits at `leaf_index` with the given siblings.
    fn compute_root(
        &self,
        leaf: Digest,
        leaf_index: u64,
        path: &MerklePath,
    ) -> Result<Digest, MerkleError>;

    /// Returns true if `leaf` sits at `leaf_index` of the tree with the specified `root`.
    fn verify_membership(
        &self,
        leaf: Digest,
        leaf_index: u64,
        path: &MerklePath,
        root: Digest,
    ) -> bool {
        self.compute_root(leaf, leaf_index, path).is_ok_and(|computed| computed == root)
    }
}

/// A [MembershipOracle] which hashes the sibling path directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct MerklePathOracle;

impl MembershipOracle for MerklePathOracle {
    fn compute_root(
        &self,
        leaf: Digest,
        leaf_index: u64,
        path: &MerklePath,
    ) -> Result<Digest, MerkleError> {
        path.compute_root(leaf_index, leaf)
    }
}
