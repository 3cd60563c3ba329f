use alloc::vec::Vec;

use crate::{
    BoundedVec, CapacityError, Felt, MAX_ENCRYPTED_LOGS_PER_TX, MAX_KEY_VALIDATION_REQUESTS_PER_TX,
    MAX_L2_TO_L1_MSGS_PER_TX, MAX_NOTE_HASH_READ_REQUESTS_PER_TX, MAX_NOTE_HASHES_PER_TX,
    MAX_NULLIFIER_READ_REQUESTS_PER_TX, MAX_NULLIFIERS_PER_TX,
    MAX_PRIVATE_CALL_STACK_LENGTH_PER_TX, MAX_PUBLIC_CALL_STACK_LENGTH_PER_TX,
    MAX_UNENCRYPTED_LOGS_PER_TX,
    call::CallRequest,
    gas::Gas,
    side_effect::{
        LogHash, ScopedKeyValidationRequest, ScopedL2ToL1Message, ScopedLogHash, ScopedNoteHash,
        ScopedNullifier, ScopedReadRequest, SideEffect,
    },
    transaction::RollupValidationRequests,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// PRIVATE ACCUMULATED DATA
// ================================================================================================

/// Side effects accumulated by the kernel over all private invocations processed so far.
///
/// Values are scoped by the storage contract which emitted them and are kept in the order the
/// kernel processed their invocations, which is not necessarily the side-effect order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateAccumulatedDataBuilder {
    pub note_hashes: BoundedVec<ScopedNoteHash, MAX_NOTE_HASHES_PER_TX>,
    pub nullifiers: BoundedVec<ScopedNullifier, MAX_NULLIFIERS_PER_TX>,
    pub l2_to_l1_msgs: BoundedVec<ScopedL2ToL1Message, MAX_L2_TO_L1_MSGS_PER_TX>,
    pub encrypted_logs_hashes: BoundedVec<ScopedLogHash, MAX_ENCRYPTED_LOGS_PER_TX>,
    pub unencrypted_logs_hashes: BoundedVec<ScopedLogHash, MAX_UNENCRYPTED_LOGS_PER_TX>,
    pub encrypted_log_preimages_length: u32,
    pub unencrypted_log_preimages_length: u32,
    pub private_call_stack: BoundedVec<CallRequest, MAX_PRIVATE_CALL_STACK_LENGTH_PER_TX>,
    pub public_call_stack: BoundedVec<CallRequest, MAX_PUBLIC_CALL_STACK_LENGTH_PER_TX>,
}

impl PrivateAccumulatedDataBuilder {
    pub fn push_encrypted_log_hash(&mut self, log: ScopedLogHash) -> Result<(), CapacityError> {
        self.encrypted_logs_hashes.push(log)?;
        self.encrypted_log_preimages_length =
            self.encrypted_log_preimages_length.saturating_add(log.inner.length);
        Ok(())
    }

    pub fn push_unencrypted_log_hash(&mut self, log: ScopedLogHash) -> Result<(), CapacityError> {
        self.unencrypted_logs_hashes.push(log)?;
        self.unencrypted_log_preimages_length =
            self.unencrypted_log_preimages_length.saturating_add(log.inner.length);
        Ok(())
    }
}

impl Default for PrivateAccumulatedDataBuilder {
    fn default() -> Self {
        Self {
            note_hashes: BoundedVec::new("note hashes"),
            nullifiers: BoundedVec::new("nullifiers"),
            l2_to_l1_msgs: BoundedVec::new("L2-to-L1 messages"),
            encrypted_logs_hashes: BoundedVec::new("encrypted log hashes"),
            unencrypted_logs_hashes: BoundedVec::new("unencrypted log hashes"),
            encrypted_log_preimages_length: 0,
            unencrypted_log_preimages_length: 0,
            private_call_stack: BoundedVec::new("private call stack"),
            public_call_stack: BoundedVec::new("public call stack"),
        }
    }
}

// VALIDATION REQUESTS
// ================================================================================================

/// Claims made by private invocations which the kernel must resolve before the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequestsBuilder {
    pub note_hash_read_requests: BoundedVec<ScopedReadRequest, MAX_NOTE_HASH_READ_REQUESTS_PER_TX>,
    pub nullifier_read_requests: BoundedVec<ScopedReadRequest, MAX_NULLIFIER_READ_REQUESTS_PER_TX>,
    pub key_validation_requests:
        BoundedVec<ScopedKeyValidationRequest, MAX_KEY_VALIDATION_REQUESTS_PER_TX>,
    pub for_rollup: RollupValidationRequests,
}

impl Default for ValidationRequestsBuilder {
    fn default() -> Self {
        Self {
            note_hash_read_requests: BoundedVec::new("note hash read requests"),
            nullifier_read_requests: BoundedVec::new("nullifier read requests"),
            key_validation_requests: BoundedVec::new("key validation requests"),
            for_rollup: RollupValidationRequests::default(),
        }
    }
}

// COMBINED ACCUMULATED DATA
// ================================================================================================

/// The final, siloed side effects of a transaction with no public part.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CombinedAccumulatedData {
    /// Unique siloed note hashes, in side-effect order.
    pub note_hashes: Vec<Felt>,
    /// Siloed nullifiers, in side-effect order. The first one is the protocol nullifier.
    pub nullifiers: Vec<Felt>,
    pub l2_to_l1_msgs: Vec<Felt>,
    pub encrypted_logs_hashes: Vec<Felt>,
    pub unencrypted_logs_hashes: Vec<Felt>,
    pub encrypted_log_preimages_length: u32,
    pub unencrypted_log_preimages_length: u32,
    pub gas_used: Gas,
}

impl Serializable for CombinedAccumulatedData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        for values in [
            &self.note_hashes,
            &self.nullifiers,
            &self.l2_to_l1_msgs,
            &self.encrypted_logs_hashes,
            &self.unencrypted_logs_hashes,
        ] {
            target.write_usize(values.len());
            target.write_many(values);
        }
        target.write_u32(self.encrypted_log_preimages_length);
        target.write_u32(self.unencrypted_log_preimages_length);
        self.gas_used.write_into(target);
    }
}

impl Deserializable for CombinedAccumulatedData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let note_hashes = read_vec(source)?;
        let nullifiers = read_vec(source)?;
        let l2_to_l1_msgs = read_vec(source)?;
        let encrypted_logs_hashes = read_vec(source)?;
        let unencrypted_logs_hashes = read_vec(source)?;
        let encrypted_log_preimages_length = source.read_u32()?;
        let unencrypted_log_preimages_length = source.read_u32()?;
        let gas_used = Gas::read_from(source)?;

        Ok(Self {
            note_hashes,
            nullifiers,
            l2_to_l1_msgs,
            encrypted_logs_hashes,
            unencrypted_logs_hashes,
            encrypted_log_preimages_length,
            unencrypted_log_preimages_length,
            gas_used,
        })
    }
}

// PUBLIC ACCUMULATED DATA
// ================================================================================================

/// One half (revertible or non-revertible) of the siloed side effects of a transaction whose
/// execution continues in the public phase.
///
/// Values keep their counters so that public execution can interleave its own side effects.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublicAccumulatedData {
    pub note_hashes: Vec<SideEffect>,
    pub nullifiers: Vec<SideEffect>,
    pub l2_to_l1_msgs: Vec<SideEffect>,
    pub encrypted_logs_hashes: Vec<LogHash>,
    pub unencrypted_logs_hashes: Vec<LogHash>,
    pub encrypted_log_preimages_length: u32,
    pub unencrypted_log_preimages_length: u32,
    pub public_call_stack: Vec<CallRequest>,
    pub gas_used: Gas,
}

impl Serializable for PublicAccumulatedData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        for values in [&self.note_hashes, &self.nullifiers, &self.l2_to_l1_msgs] {
            target.write_usize(values.len());
            target.write_many(values);
        }
        for logs in [&self.encrypted_logs_hashes, &self.unencrypted_logs_hashes] {
            target.write_usize(logs.len());
            target.write_many(logs);
        }
        target.write_u32(self.encrypted_log_preimages_length);
        target.write_u32(self.unencrypted_log_preimages_length);
        target.write_usize(self.public_call_stack.len());
        target.write_many(&self.public_call_stack);
        self.gas_used.write_into(target);
    }
}

impl Deserializable for PublicAccumulatedData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let note_hashes = read_vec(source)?;
        let nullifiers = read_vec(source)?;
        let l2_to_l1_msgs = read_vec(source)?;
        let encrypted_logs_hashes = read_vec(source)?;
        let unencrypted_logs_hashes = read_vec(source)?;
        let encrypted_log_preimages_length = source.read_u32()?;
        let unencrypted_log_preimages_length = source.read_u32()?;
        let public_call_stack = read_vec(source)?;
        let gas_used = Gas::read_from(source)?;

        Ok(Self {
            note_hashes,
            nullifiers,
            l2_to_l1_msgs,
            encrypted_logs_hashes,
            unencrypted_logs_hashes,
            encrypted_log_preimages_length,
            unencrypted_log_preimages_length,
            public_call_stack,
            gas_used,
        })
    }
}

// HELPERS
// ================================================================================================

fn read_vec<R: ByteReader, T: Deserializable>(
    source: &mut R,
) -> Result<Vec<T>, DeserializationError> {
    let len = source.read_usize()?;
    source.read_many::<T>(len)
}
