use alloc::vec::Vec;

use super::{CallContext, CallRequest};
use crate::{
    DOMAIN_PRIVATE_PUBLIC_INPUTS, Felt, ONE, ZERO,
    hash::hash_to_felt,
    side_effect::{KeyValidationRequest, L2ToL1Message, LogHash, NoteHash, Nullifier, ReadRequest},
    transaction::{HistoricalHeader, TxContext},
};

// PRIVATE CIRCUIT PUBLIC INPUTS
// ================================================================================================

/// Everything a finished private function invocation declares to the kernel.
///
/// Every sequence is padded with empty values up to its per-call capacity. Non-empty values
/// always form a prefix of the sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrivateCircuitPublicInputs {
    pub call_context: CallContext,
    pub args_hash: Felt,
    pub returns_hash: Felt,

    /// Side effects with a counter below this value are non-revertible. Zero if the invocation did
    /// not end the setup phase.
    pub min_revertible_side_effect_counter: u32,
    pub is_fee_payer: bool,
    pub max_block_number: Option<u32>,

    pub note_hash_read_requests: Vec<ReadRequest>,
    pub nullifier_read_requests: Vec<ReadRequest>,
    pub key_validation_requests: Vec<KeyValidationRequest>,

    pub note_hashes: Vec<NoteHash>,
    pub nullifiers: Vec<Nullifier>,
    pub private_call_requests: Vec<CallRequest>,
    pub public_call_requests: Vec<CallRequest>,
    pub public_teardown_call_request: CallRequest,
    pub l2_to_l1_msgs: Vec<L2ToL1Message>,
    pub encrypted_logs_hashes: Vec<LogHash>,
    pub unencrypted_logs_hashes: Vec<LogHash>,

    pub start_side_effect_counter: u32,
    pub end_side_effect_counter: u32,

    pub historical_header: HistoricalHeader,
    pub tx_context: TxContext,
}

impl PrivateCircuitPublicInputs {
    /// Returns the commitment to all public inputs of the invocation.
    pub fn hash(&self) -> Felt {
        let mut elements = Vec::new();

        self.call_context.append_elements(&mut elements);
        elements.push(self.args_hash);
        elements.push(self.returns_hash);
        elements.push(Felt::from(self.min_revertible_side_effect_counter));
        elements.push(bool_to_felt(self.is_fee_payer));
        elements.push(bool_to_felt(self.max_block_number.is_some()));
        elements.push(Felt::from(self.max_block_number.unwrap_or_default()));

        for request in self.note_hash_read_requests.iter().chain(&self.nullifier_read_requests) {
            elements.extend_from_slice(&[request.value, Felt::from(request.counter)]);
        }
        for request in self.key_validation_requests.iter() {
            elements.extend_from_slice(&[request.npk_m_hash, request.sk_app]);
        }
        for note_hash in self.note_hashes.iter() {
            elements.extend_from_slice(&[
                note_hash.value,
                Felt::from(note_hash.counter),
                Felt::from(note_hash.nullifier_counter),
            ]);
        }
        for nullifier in self.nullifiers.iter() {
            elements.extend_from_slice(&[
                nullifier.value,
                nullifier.note_hash,
                Felt::from(nullifier.counter),
            ]);
        }
        for request in self
            .private_call_requests
            .iter()
            .chain(&self.public_call_requests)
            .chain([&self.public_teardown_call_request])
        {
            request.append_elements(&mut elements);
        }
        for msg in self.l2_to_l1_msgs.iter() {
            elements.extend_from_slice(&[msg.recipient, msg.content, Felt::from(msg.counter)]);
        }
        for log in self.encrypted_logs_hashes.iter().chain(&self.unencrypted_logs_hashes) {
            elements.extend_from_slice(&[log.value, Felt::from(log.counter), Felt::from(log.length)]);
        }

        elements.push(Felt::from(self.start_side_effect_counter));
        elements.push(Felt::from(self.end_side_effect_counter));
        self.historical_header.append_elements(&mut elements);
        self.tx_context.append_elements(&mut elements);

        hash_to_felt(DOMAIN_PRIVATE_PUBLIC_INPUTS, &elements)
    }

    /// Returns true if the invocation emitted any state-changing side effect.
    ///
    /// Read requests and nested calls do not change state by themselves.
    pub fn has_state_changes(&self) -> bool {
        use crate::side_effect::Empty;

        self.note_hashes.iter().any(|n| !n.is_empty())
            || self.nullifiers.iter().any(|n| !n.is_empty())
            || self.l2_to_l1_msgs.iter().any(|m| !m.is_empty())
            || self.encrypted_logs_hashes.iter().any(|l| !l.is_empty())
            || self.unencrypted_logs_hashes.iter().any(|l| !l.is_empty())
    }
}

fn bool_to_felt(value: bool) -> Felt {
    if value { ONE } else { ZERO }
}
