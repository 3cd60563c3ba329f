use alloc::vec::Vec;

use veil_objects::{
    Felt,
    address::FunctionSelector,
    gas::GasSettings,
    kernel::PrivateKernelCircuitPublicInputs,
    side_effect::{Empty, Ordered},
    testing::{generous_gas_settings, tx_constants},
    transaction::{TxConstants, TxRequest},
};

use crate::{
    KernelError, MerklePathOracle, PrivateCallData, PrivateKernel, TransactionTrace,
    testing::{MockContract, MockExecutor},
};

mod pipeline;
mod tail;

pub const ENTRYPOINT: FunctionSelector = FunctionSelector::new(1);
pub const HELPER: FunctionSelector = FunctionSelector::new(2);
pub const PUBLIC_FN: FunctionSelector = FunctionSelector::new(3);

// HELPERS
// ================================================================================================

pub fn constants() -> TxConstants {
    tx_constants(generous_gas_settings())
}

pub fn executor(contracts: impl IntoIterator<Item = MockContract>) -> MockExecutor {
    executor_with_gas(contracts, generous_gas_settings())
}

pub fn executor_with_gas(
    contracts: impl IntoIterator<Item = MockContract>,
    gas_settings: GasSettings,
) -> MockExecutor {
    contracts
        .into_iter()
        .fold(MockExecutor::new(tx_constants(gas_settings)), MockExecutor::with_contract)
}

/// Executes the entry point of `origin` and returns the transaction request and trace.
pub fn execute(
    executor: &mut MockExecutor,
    origin: &MockContract,
    args: &[Felt],
) -> (TxRequest, TransactionTrace) {
    executor.execute_transaction(origin.address(), ENTRYPOINT, args).unwrap()
}

pub fn kernel() -> PrivateKernel<MerklePathOracle> {
    PrivateKernel::new(MerklePathOracle)
}

/// Runs the init and inner iterations over every frame of `trace`.
pub fn accumulate(
    tx_request: &TxRequest,
    trace: &TransactionTrace,
) -> Result<PrivateKernelCircuitPublicInputs, KernelError> {
    let kernel = kernel();
    let mut frames = trace.kernel_order().into_iter();
    let entry = frames.next().ok_or(KernelError::EmptyTrace)?;

    let mut public_inputs = kernel.init(tx_request, entry)?;
    for call in frames {
        public_inputs = kernel.inner(public_inputs, call)?;
    }
    Ok(public_inputs)
}

/// Returns the frames of `trace` in kernel processing order.
pub fn frames(trace: &TransactionTrace) -> Vec<PrivateCallData> {
    trace.kernel_order().into_iter().cloned().collect()
}

/// Returns every counter declared by a frame, including its window bounds.
pub fn declared_counters(call: &PrivateCallData) -> Vec<u32> {
    let inputs = &call.call_stack_item.public_inputs;
    let mut counters = vec![inputs.start_side_effect_counter, inputs.end_side_effect_counter];
    counters.extend(non_empty_counters(&inputs.note_hashes));
    counters.extend(non_empty_counters(&inputs.nullifiers));
    counters.extend(non_empty_counters(&inputs.note_hash_read_requests));
    counters.extend(non_empty_counters(&inputs.nullifier_read_requests));
    counters.extend(non_empty_counters(&inputs.l2_to_l1_msgs));
    counters.extend(non_empty_counters(&inputs.encrypted_logs_hashes));
    counters.extend(non_empty_counters(&inputs.unencrypted_logs_hashes));
    counters.extend(non_empty_counters(&inputs.public_call_requests));
    counters
}

fn non_empty_counters<T: Empty + Ordered>(items: &[T]) -> impl Iterator<Item = u32> + '_ {
    items.iter().filter(|item| !item.is_empty()).map(Ordered::counter)
}
