use veil_objects::{
    TransactionRequestError, ZERO,
    address::ContractAddress,
    call::{CallStackItem, PrivateCallStackItem},
    kernel::PrivateKernelCircuitPublicInputs,
    side_effect::{Empty, Nullifier, Scoped},
    transaction::{TxConstants, TxRequest},
};

use crate::{
    composer::link_note_hashes,
    context::SideEffectCounter,
    errors::{CallStackError, KernelError},
    execution::PrivateCallData,
    host::MembershipOracle,
    validator::validate_private_call,
};

mod tail;

// PRIVATE KERNEL
// ================================================================================================

/// The private kernel folds the private call frames of a transaction into a single accumulated
/// output, one frame per iteration, and finally composes that output into the public inputs of
/// the transaction.
///
/// The first iteration ([PrivateKernel::init]) binds the transaction request to the entry frame.
/// Every further iteration ([PrivateKernel::inner]) pops one request from the accumulated private
/// call stack and processes the frame it commits to.
pub struct PrivateKernel<M> {
    oracle: M,
}

impl<M: MembershipOracle> PrivateKernel<M> {
    pub fn new(oracle: M) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &M {
        &self.oracle
    }

    // ITERATIONS
    // --------------------------------------------------------------------------------------------

    /// Processes the entry frame of a transaction.
    ///
    /// The protocol nullifier, the hash of the transaction request, becomes the first accumulated
    /// nullifier. It carries counter zero and is scoped to no contract.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The transaction request does not match the entry frame.
    /// - The entry frame fails validation.
    /// - Propagating the frame's side effects would overflow an accumulated array.
    pub fn init(
        &self,
        tx_request: &TxRequest,
        call: &PrivateCallData,
    ) -> Result<PrivateKernelCircuitPublicInputs, KernelError> {
        let item = &call.call_stack_item;
        validate_tx_request(tx_request, item).map_err(KernelError::InvalidTxRequest)?;
        validate_private_call(call, &self.oracle)?;

        let mut public_inputs = PrivateKernelCircuitPublicInputs::new(TxConstants {
            historical_header: item.public_inputs.historical_header,
            tx_context: tx_request.tx_context,
        });

        let protocol_nullifier = tx_request.hash();
        public_inputs
            .end
            .nullifiers
            .push(Scoped::new(Nullifier::new(protocol_nullifier, ZERO, 0), ContractAddress::ZERO))?;

        propagate_call(&mut public_inputs, call)?;

        log::debug!(
            "Processed entry call frame [contract={}, selector={}, protocol_nullifier={}]",
            item.contract_address,
            item.function_data.selector,
            protocol_nullifier
        );

        Ok(public_inputs)
    }

    /// Processes the frame committed to by the top of the accumulated private call stack.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The accumulated private call stack is empty.
    /// - The frame's call stack item does not hash to the popped request.
    /// - The frame was executed against different transaction constants.
    /// - The frame fails validation.
    /// - Propagating the frame's side effects would overflow an accumulated array.
    pub fn inner(
        &self,
        previous: PrivateKernelCircuitPublicInputs,
        call: &PrivateCallData,
    ) -> Result<PrivateKernelCircuitPublicInputs, KernelError> {
        let mut public_inputs = previous;
        let item = &call.call_stack_item;

        let request = public_inputs
            .end
            .private_call_stack
            .pop()
            .ok_or(KernelError::EmptyPrivateCallStack)?;
        let item_hash = item.hash();
        if request.hash != item_hash {
            return Err(CallStackError::CallRequestHashMismatch {
                index: 0,
                expected: request.hash,
                actual: item_hash,
            }
            .into());
        }

        let constants = &public_inputs.constants;
        if item.public_inputs.historical_header != constants.historical_header
            || item.public_inputs.tx_context != constants.tx_context
        {
            return Err(KernelError::ConstantsMismatch);
        }

        validate_private_call(call, &self.oracle)?;
        propagate_call(&mut public_inputs, call)?;

        log::debug!(
            "Processed nested call frame [contract={}, selector={}, pending_calls={}]",
            item.contract_address,
            item.function_data.selector,
            public_inputs.end.private_call_stack.len()
        );

        Ok(public_inputs)
    }
}

// HELPERS
// ================================================================================================

/// Checks that the entry frame is the call described by the transaction request.
fn validate_tx_request(
    tx_request: &TxRequest,
    item: &PrivateCallStackItem,
) -> Result<(), TransactionRequestError> {
    let inputs = &item.public_inputs;

    if !tx_request.function_data.kind.is_private() {
        return Err(TransactionRequestError::FirstCallNotPrivate);
    }
    if tx_request.origin != item.contract_address {
        return Err(TransactionRequestError::OriginMismatch {
            origin: tx_request.origin,
            contract_address: item.contract_address,
        });
    }
    if tx_request.function_data != item.function_data {
        return Err(TransactionRequestError::FunctionDataMismatch);
    }
    if tx_request.args_hash != inputs.args_hash {
        return Err(TransactionRequestError::ArgsHashMismatch);
    }
    if tx_request.tx_context != inputs.tx_context {
        return Err(TransactionRequestError::TxContextMismatch {
            expected: tx_request.tx_context,
            actual: inputs.tx_context,
        });
    }

    let call_context = inputs.call_context;
    if call_context.is_delegate_call
        || call_context.is_static_call
        || !call_context.msg_sender.is_zero()
        || call_context.start_side_effect_counter != SideEffectCounter::FIRST
    {
        return Err(TransactionRequestError::InvalidFirstCallContext(call_context));
    }

    Ok(())
}

/// Appends the declarations of a validated frame to the accumulated output.
///
/// Side effects are scoped to the frame's storage contract. Note hashes nullified within the
/// transaction are relinked to their nullifiers over everything accumulated so far. Private call
/// requests are pushed in reverse so the first request of the frame is popped first.
fn propagate_call(
    public_inputs: &mut PrivateKernelCircuitPublicInputs,
    call: &PrivateCallData,
) -> Result<(), KernelError> {
    let inputs = &call.call_stack_item.public_inputs;
    let contract_address = inputs.call_context.storage_contract_address;

    let requests = &mut public_inputs.validation_requests;
    for request in non_empty(&inputs.note_hash_read_requests) {
        requests.note_hash_read_requests.push(Scoped::new(*request, contract_address))?;
    }
    for request in non_empty(&inputs.nullifier_read_requests) {
        requests.nullifier_read_requests.push(Scoped::new(*request, contract_address))?;
    }
    for request in non_empty(&inputs.key_validation_requests) {
        requests.key_validation_requests.push(Scoped::new(*request, contract_address))?;
    }
    requests.for_rollup.restrict_max_block_number(inputs.max_block_number);

    let end = &mut public_inputs.end;
    for note_hash in non_empty(&inputs.note_hashes) {
        end.note_hashes.push(Scoped::new(*note_hash, contract_address))?;
    }
    for nullifier in non_empty(&inputs.nullifiers) {
        end.nullifiers.push(Scoped::new(*nullifier, contract_address))?;
    }
    // a note and its nullifier may come from different frames
    link_note_hashes(&mut end.note_hashes, &end.nullifiers);
    for message in non_empty(&inputs.l2_to_l1_msgs) {
        end.l2_to_l1_msgs.push(Scoped::new(*message, contract_address))?;
    }
    for log in non_empty(&inputs.encrypted_logs_hashes) {
        end.push_encrypted_log_hash(Scoped::new(*log, contract_address))?;
    }
    for log in non_empty(&inputs.unencrypted_logs_hashes) {
        end.push_unencrypted_log_hash(Scoped::new(*log, contract_address))?;
    }
    for request in non_empty(&inputs.private_call_requests).rev() {
        end.private_call_stack.push(*request)?;
    }
    for request in non_empty(&inputs.public_call_requests) {
        end.public_call_stack.push(*request)?;
    }

    if inputs.min_revertible_side_effect_counter != 0 {
        if public_inputs.min_revertible_side_effect_counter != 0 {
            return Err(KernelError::MinRevertibleCounterAlreadySet);
        }
        public_inputs.min_revertible_side_effect_counter =
            inputs.min_revertible_side_effect_counter;
    }

    if !inputs.public_teardown_call_request.is_empty() {
        if !public_inputs.public_teardown_call_request.is_empty() {
            return Err(KernelError::TeardownAlreadySet);
        }
        public_inputs.public_teardown_call_request = inputs.public_teardown_call_request;
    }

    if inputs.is_fee_payer {
        if !public_inputs.fee_payer.is_zero() {
            return Err(KernelError::FeePayerAlreadySet);
        }
        public_inputs.fee_payer = contract_address;
    }

    Ok(())
}

fn non_empty<T: Empty>(items: &[T]) -> impl DoubleEndedIterator<Item = &T> {
    items.iter().filter(|item| !item.is_empty())
}
